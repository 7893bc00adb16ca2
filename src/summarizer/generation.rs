//! Beam search decoding for encoder-decoder models.
//!
//! The search only needs next-token logits for a set of decoder prefixes, so it is written
//! against the [`DecoderStep`] trait and knows nothing about tensors. Scores follow the usual
//! seq2seq conventions: log-softmax over the vocabulary, then repetition penalty, n-gram
//! blocking and minimum-length suppression of the end token.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::config::GenerationConfig;
use crate::error::SummarizeError;

/// One decoder forward pass over a batch of equally long prefixes
pub trait DecoderStep {
    /// Returns one row of vocabulary logits per prefix, for the position after its last token
    fn next_logits(&mut self, prefixes: &[Vec<u32>]) -> Result<Vec<Vec<f32>>, SummarizeError>;
}

/// Token ids that frame the decoder sequence
#[derive(Debug, Clone, Copy)]
pub struct SpecialTokens {
    pub decoder_start: u32,
    pub eos: u32,
}

#[derive(Debug, Clone)]
struct Beam {
    tokens: Vec<u32>,
    score: f32,
}

/// Finished hypotheses, keeping the best `capacity` by length-normalized score
struct Hypotheses {
    capacity: usize,
    length_penalty: f32,
    early_stopping: bool,
    entries: Vec<(f32, Vec<u32>)>,
}

impl Hypotheses {
    fn new(config: &GenerationConfig) -> Self {
        Self {
            capacity: config.num_beams,
            length_penalty: config.length_penalty,
            early_stopping: config.early_stopping,
            entries: Vec::with_capacity(config.num_beams + 1),
        }
    }

    fn normalized(&self, sum_logprobs: f32, len: usize) -> f32 {
        sum_logprobs / (len.max(1) as f32).powf(self.length_penalty)
    }

    fn worst(&self) -> f32 {
        self.entries
            .iter()
            .map(|(s, _)| *s)
            .fold(f32::INFINITY, f32::min)
    }

    fn add(&mut self, tokens: Vec<u32>, sum_logprobs: f32) {
        let score = self.normalized(sum_logprobs, tokens.len());
        if self.entries.len() < self.capacity || score > self.worst() {
            self.entries.push((score, tokens));
            if self.entries.len() > self.capacity {
                let worst_idx = self
                    .entries
                    .iter()
                    .enumerate()
                    .min_by(|a, b| a.1 .0.partial_cmp(&b.1 .0).unwrap_or(Ordering::Equal))
                    .map(|(i, _)| i)
                    .unwrap_or(0);
                self.entries.remove(worst_idx);
            }
        }
    }

    /// Whether no running beam can still improve the finished set
    fn is_done(&self, best_running_sum: f32, cur_len: usize) -> bool {
        if self.entries.len() < self.capacity {
            return false;
        }
        if self.early_stopping {
            return true;
        }
        self.worst() >= self.normalized(best_running_sum, cur_len)
    }

    fn best(self) -> Option<Vec<u32>> {
        self.entries
            .into_iter()
            .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal))
            .map(|(_, tokens)| tokens)
    }
}

/// Numerically stable log-softmax
pub fn log_softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() {
        return vec![f32::NEG_INFINITY; logits.len()];
    }
    let sum: f32 = logits.iter().map(|l| (l - max).exp()).sum();
    let log_sum = sum.ln() + max;
    logits.iter().map(|l| l - log_sum).collect()
}

/// Scale down every token already present in `previous`.
///
/// Negative scores are multiplied and positive ones divided, so the token always becomes
/// less likely regardless of sign.
pub fn apply_repetition_penalty(scores: &mut [f32], previous: &[u32], penalty: f32) {
    if penalty == 1.0 {
        return;
    }
    let unique: HashSet<u32> = previous.iter().copied().collect();
    for token in unique {
        if let Some(score) = scores.get_mut(token as usize) {
            *score = if *score < 0.0 {
                *score * penalty
            } else {
                *score / penalty
            };
        }
    }
}

/// Tokens that would complete an n-gram already present in `tokens`
pub fn banned_ngram_tokens(tokens: &[u32], n: usize) -> HashSet<u32> {
    let mut banned = HashSet::new();
    if n == 0 || tokens.len() + 1 < n {
        return banned;
    }
    let prefix = &tokens[tokens.len() + 1 - n..];
    for window in tokens.windows(n) {
        if &window[..n - 1] == prefix {
            banned.insert(window[n - 1]);
        }
    }
    banned
}

/// Processed log-probabilities for the token following `tokens`
fn next_token_scores(
    logits: &[f32],
    tokens: &[u32],
    special: SpecialTokens,
    config: &GenerationConfig,
) -> Vec<f32> {
    let mut scores = log_softmax(logits);
    apply_repetition_penalty(&mut scores, tokens, config.repetition_penalty);
    for token in banned_ngram_tokens(tokens, config.no_repeat_ngram_size) {
        if let Some(score) = scores.get_mut(token as usize) {
            *score = f32::NEG_INFINITY;
        }
    }
    if tokens.len() < config.min_length {
        if let Some(score) = scores.get_mut(special.eos as usize) {
            *score = f32::NEG_INFINITY;
        }
    }
    scores
}

/// Run beam search and return the best sequence without the start and end tokens
pub fn beam_search<D: DecoderStep>(
    decoder: &mut D,
    special: SpecialTokens,
    config: &GenerationConfig,
) -> Result<Vec<u32>, SummarizeError> {
    let num_beams = config.num_beams.max(1);
    let mut hypotheses = Hypotheses::new(config);
    let mut beams = vec![Beam {
        tokens: vec![special.decoder_start],
        score: 0.0,
    }];

    while beams[0].tokens.len() < config.max_length {
        let cur_len = beams[0].tokens.len();
        let prefixes: Vec<Vec<u32>> = beams.iter().map(|b| b.tokens.clone()).collect();
        let logits = decoder.next_logits(&prefixes)?;
        if logits.len() != beams.len() {
            return Err(SummarizeError::Generation(format!(
                "decoder returned {} rows for {} beams",
                logits.len(),
                beams.len()
            )));
        }

        let mut candidates: Vec<(f32, usize, u32)> = Vec::new();
        for (beam_idx, (beam, row)) in beams.iter().zip(logits.iter()).enumerate() {
            let scores = next_token_scores(row, &beam.tokens, special, config);
            candidates.extend(
                scores
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| s.is_finite())
                    .map(|(token, s)| (beam.score + s, beam_idx, token as u32)),
            );
        }
        candidates.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
        candidates.truncate(2 * num_beams);

        let mut next_beams = Vec::with_capacity(num_beams);
        for (rank, (score, beam_idx, token)) in candidates.into_iter().enumerate() {
            if token == special.eos {
                if rank < num_beams {
                    hypotheses.add(beams[beam_idx].tokens.clone(), score);
                }
                continue;
            }
            let mut tokens = beams[beam_idx].tokens.clone();
            tokens.push(token);
            next_beams.push(Beam { tokens, score });
            if next_beams.len() == num_beams {
                break;
            }
        }

        // every continuation blocked: the current beams are finalized as they are
        if next_beams.is_empty() {
            break;
        }
        if hypotheses.is_done(next_beams[0].score, cur_len + 1) {
            beams.clear();
            break;
        }
        beams = next_beams;
    }

    for beam in beams {
        hypotheses.add(beam.tokens, beam.score);
    }

    let best = hypotheses
        .best()
        .ok_or_else(|| SummarizeError::Generation("beam search produced no sequence".into()))?;
    Ok(best
        .into_iter()
        .skip(1)
        .filter(|t| *t != special.eos)
        .collect())
}
