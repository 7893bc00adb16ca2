//! Flattening of WebVTT caption files into plain transcript text.
//!
//! Auto-generated tracks repeat part of the previous cue in every new cue, so a line is
//! kept only the first time it is seen anywhere in the file.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

const HEADER: &str = "WEBVTT";
const TIMING_ARROW: &str = "-->";
const METADATA_KEYWORDS: [&str; 2] = ["Kind:", "Language:"];

lazy_static! {
    static ref INLINE_TAG: Regex = Regex::new(r"<[^>]+>").expect("valid tag pattern");
}

/// Strip inline markup and surrounding whitespace from a cue line
fn clean_line(line: &str) -> String {
    INLINE_TAG.replace_all(line, "").trim().to_string()
}

fn is_discarded(raw: &str, clean: &str) -> bool {
    clean.is_empty()
        || clean == HEADER
        || clean.starts_with("WEBVTT ")
        || raw.contains(TIMING_ARROW)
        || METADATA_KEYWORDS.iter().any(|k| clean.starts_with(k))
}

/// Turn raw caption markup into a single space-joined transcript.
///
/// Header, timing and metadata lines are dropped; every remaining line appears once,
/// at the position of its first occurrence. Returns an empty string when nothing is kept.
pub fn parse(raw: &str) -> String {
    let mut seen: HashSet<String> = HashSet::new();
    let mut kept: Vec<String> = Vec::new();

    for line in raw.lines() {
        let clean = clean_line(line);
        if is_discarded(line, &clean) {
            continue;
        }
        if seen.insert(clean.clone()) {
            kept.push(clean);
        }
    }

    kept.join(" ").trim().to_string()
}
