//! Caption Fetcher
//!
//! Downloads the caption track of a video with yt-dlp, flattens it with the caption parser
//! and removes the temporary files. Every fetch writes under its own unique file stem, so
//! concurrent requests never read or delete each other's files.

use async_trait::async_trait;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use tokio::process::Command;

use crate::caption_parser;
use crate::config::{defaults, FetcherConfig};
use crate::error::FetchError;
use crate::file_utils;

/// Anything able to turn a video URL into transcript text
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn fetch_transcript(&self, url: &str) -> Result<String, FetchError>;
}

/// Temporary caption files of a single fetch, removed when dropped
struct CaptionScratch {
    dir: PathBuf,
    stem: String,
}

impl CaptionScratch {
    fn new(dir: &Path, prefix: &str) -> Self {
        Self {
            dir: dir.to_path_buf(),
            stem: file_utils::generate_unique_stem(prefix),
        }
    }

    fn output_template(&self) -> PathBuf {
        self.dir.join(&self.stem)
    }

}

impl Drop for CaptionScratch {
    fn drop(&mut self) {
        let removed = file_utils::purge_prefix(&self.dir, &self.stem);
        if removed > 0 {
            debug!("Removed {} temporary file(s) for {}", removed, self.stem);
        }
    }
}

/// yt-dlp backed transcript source
#[derive(Clone, Debug)]
pub struct CaptionFetcher {
    config: FetcherConfig,
}

impl CaptionFetcher {
    pub fn new(config: FetcherConfig) -> Self {
        Self { config }
    }

    /// Remove caption files left in the temp directory by a previous process.
    ///
    /// Run once before serving; files of in-flight fetches share the same prefix.
    pub fn sweep_leftovers(&self) -> usize {
        let prefix = format!("{}_", self.config.file_prefix);
        let removed = file_utils::purge_prefix(&self.config.temp_dir, &prefix);
        if removed > 0 {
            info!(
                "Removed {} leftover caption file(s) from {}",
                removed,
                self.config.temp_dir.display()
            );
        }
        removed
    }

    /// Build the download tool invocation for one fetch
    fn build_command(&self, url: &str, output_template: &Path) -> Command {
        let mut command = Command::new(&self.config.command);

        // a dropped request must not leave the tool writing files after cleanup
        command.kill_on_drop(true);

        command
            .arg("--skip-download")
            .arg("--write-subs")
            .arg("--write-auto-subs")
            .arg("--sub-langs")
            .arg(&self.config.language)
            .arg("--sub-format")
            .arg(defaults::CAPTION_FORMAT)
            .arg("--quiet")
            .arg("--no-warnings")
            .arg("--user-agent")
            .arg(&self.config.user_agent)
            .arg("-o")
            .arg(output_template);

        if self.config.cookies_file.is_file() {
            info!(
                "Found {} - using it for authentication",
                self.config.cookies_file.display()
            );
            command.arg("--cookies").arg(&self.config.cookies_file);
        } else {
            warn!(
                "No cookie file found at {}; the request might be blocked",
                self.config.cookies_file.display()
            );
        }

        command.arg("--").arg(url);
        command
    }

    async fn run_download(&self, url: &str, output_template: &Path) -> Result<(), FetchError> {
        info!("Downloading captions via {} for {}", self.config.command, url);

        let output = self
            .build_command(url, output_template)
            .output()
            .await
            .map_err(|e| FetchError::Download(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                format!("{} exited with {}", self.config.command, output.status)
            } else {
                stderr
            };
            return Err(FetchError::Download(message));
        }

        Ok(())
    }
}

#[async_trait]
impl TranscriptSource for CaptionFetcher {
    async fn fetch_transcript(&self, url: &str) -> Result<String, FetchError> {
        let scratch = CaptionScratch::new(&self.config.temp_dir, &self.config.file_prefix);

        self.run_download(url, &scratch.output_template()).await?;

        let files =
            file_utils::find_caption_files(&scratch.dir, &scratch.stem, defaults::CAPTION_FORMAT)?;
        let caption_file = files
            .first()
            .ok_or_else(|| FetchError::NoSubtitles(self.config.language.clone()))?;

        info!("Reading caption file: {}", caption_file.display());
        let raw = tokio::fs::read_to_string(caption_file).await?;
        let transcript = caption_parser::parse(&raw);

        info!("Extracted {} chars of transcript", transcript.len());
        Ok(transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &Path) -> FetcherConfig {
        FetcherConfig {
            command: "yt-dlp".to_string(),
            temp_dir: dir.to_path_buf(),
            file_prefix: "temp_transcript".to_string(),
            cookies_file: dir.join("cookies.txt"),
            language: "en".to_string(),
            user_agent: "test-agent".to_string(),
        }
    }

    fn args_of(command: &Command) -> Vec<String> {
        command
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn command_requests_english_vtt_without_video() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = CaptionFetcher::new(config_in(dir.path()));
        let template = dir.path().join("temp_transcript_x");
        let args = args_of(&fetcher.build_command("https://youtu.be/abc", &template));

        assert!(args.contains(&"--skip-download".to_string()));
        assert!(args.contains(&"--write-auto-subs".to_string()));
        let langs = args.iter().position(|a| a == "--sub-langs").unwrap();
        assert_eq!(args[langs + 1], "en");
        let format = args.iter().position(|a| a == "--sub-format").unwrap();
        assert_eq!(args[format + 1], "vtt");
        assert!(!args.contains(&"--cookies".to_string()));
        assert_eq!(args.last().unwrap(), "https://youtu.be/abc");
    }

    #[test]
    fn command_uses_cookie_file_when_present() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cookies.txt"), "# Netscape HTTP Cookie File\n").unwrap();
        let fetcher = CaptionFetcher::new(config_in(dir.path()));
        let args = args_of(&fetcher.build_command("u", &dir.path().join("t")));

        let cookies = args.iter().position(|a| a == "--cookies").unwrap();
        assert!(args[cookies + 1].ends_with("cookies.txt"));
    }

    #[test]
    fn scratch_files_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let scratch = CaptionScratch::new(dir.path(), "temp_transcript");
            let path = dir.path().join(format!("{}.en.vtt", scratch.stem));
            std::fs::write(&path, "WEBVTT").unwrap();
            path
        };
        assert!(!path.exists());
    }

    #[test]
    fn sweep_removes_stale_files_with_prefix_only() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join("temp_transcript_deadbeef.en.vtt");
        let unrelated = dir.path().join("notes.vtt");
        std::fs::write(&stale, "WEBVTT").unwrap();
        std::fs::write(&unrelated, "WEBVTT").unwrap();

        let fetcher = CaptionFetcher::new(config_in(dir.path()));
        assert_eq!(fetcher.sweep_leftovers(), 1);
        assert!(!stale.exists());
        assert!(unrelated.exists());
    }
}
