// src/core/types.rs
use serde::{Deserialize, Serialize};

/// Number of letters in the Latin alphabet. Every shift and key letter lives in `0..ALPHABET_LEN`.
pub const ALPHABET_LEN: usize = 26;

/// A key length together with how English-like its interleaved columns look.
/// Higher `score` is better.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyLengthCandidate {
    pub length: usize,
    pub score: f64,
    /// Average Index of Coincidence over the `length` columns.
    pub average_ic: f64,
}

/// One possible Caesar shift for a single key position.
/// `metric` is chi-squared minus half the distribution bonus; lower is better.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShiftOption {
    pub shift: u8,
    pub metric: f64,
}

impl ShiftOption {
    /// The key letter that produces this shift ('A' is a shift of 0).
    pub fn letter(&self) -> char {
        (b'A' + self.shift) as char
    }
}

/// Outcome of scoring a plaintext against the weighted dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WordStats {
    pub recognized: usize,
    pub total_words: usize,
    /// `recognized / total_words * 100`, or 0 when there are no words. Always in `[0, 100]`.
    pub percentage: f64,
    /// Sum of matched weights divided by `total_words`.
    pub weighted_score: f64,
}

/// A key that was decrypted and scored, with everything needed to show it to a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredKey {
    pub key: String,
    pub stats: WordStats,
    pub plaintext: String,
}

/// Full quality rating of a key: dictionary hits blended with letter statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyQuality {
    pub key: String,
    pub plaintext: String,
    pub stats: WordStats,
    pub chi_squared: f64,
    /// `0.7 * percentage + 15 * weighted_score - 0.2 * chi_squared`.
    pub quality: f64,
}

/// An alternative result offered next to the winner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub key: String,
    pub stats: WordStats,
    pub chi_squared: f64,
    pub quality: f64,
    /// First 100 characters of the plaintext, with "..." appended when cut.
    pub preview: String,
}

/// Everything a successful crack produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrackReport {
    pub key: String,
    pub stats: WordStats,
    pub plaintext: String,
    /// The key lengths the search considered, best first.
    pub key_lengths: Vec<KeyLengthCandidate>,
    pub alternatives: Vec<RankedCandidate>,
    /// True when the winning key came out of the refinement engine with an improvement.
    pub refined: bool,
    pub iterations: usize,
    pub narrative: Vec<String>,
}

/// How a crack run ended when it was not cancelled and the input was valid.
#[derive(Debug, Clone, PartialEq)]
pub enum CrackOutcome {
    Solved(CrackReport),
    /// Analysis finished but nothing cleared the plausibility floor.
    NoViableResult {
        key_lengths: Vec<KeyLengthCandidate>,
        narrative: Vec<String>,
    },
}

impl CrackOutcome {
    pub fn report(&self) -> Option<&CrackReport> {
        match self {
            CrackOutcome::Solved(report) => Some(report),
            CrackOutcome::NoViableResult { .. } => None,
        }
    }

    pub fn narrative(&self) -> &[String] {
        match self {
            CrackOutcome::Solved(report) => &report.narrative,
            CrackOutcome::NoViableResult { narrative, .. } => narrative,
        }
    }
}

/// Turns a list of shifts into an uppercase key string.
pub fn shifts_to_key(shifts: &[u8]) -> String {
    shifts.iter().map(|&s| (b'A' + s % ALPHABET_LEN as u8) as char).collect()
}

/// Cuts a plaintext down to a display preview.
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shifts_render_as_letters() {
        assert_eq!(shifts_to_key(&[10, 4, 24]), "KEY");
        assert_eq!(shifts_to_key(&[]), "");
    }

    #[test]
    fn preview_marks_truncation() {
        assert_eq!(preview("short", 100), "short");
        assert_eq!(preview("abcdef", 3), "abc...");
    }
}
