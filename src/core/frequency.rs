// src/core/frequency.rs
use crate::core::types::ALPHABET_LEN;
use std::collections::HashMap;

/// Index of Coincidence of ordinary English text.
pub const ENGLISH_IC: f64 = 0.067;

/// Relative letter frequencies of English, indexed by `letter - 'A'`.
pub const ENGLISH_FREQUENCIES: [f64; ALPHABET_LEN] = [
    0.0812, 0.0149, 0.0271, 0.0432, 0.1202, 0.0230, 0.0203, 0.0592, 0.0731, 0.0010, 0.0069,
    0.0398, 0.0261, 0.0695, 0.0768, 0.0182, 0.0011, 0.0602, 0.0628, 0.0910, 0.0288, 0.0111,
    0.0209, 0.0017, 0.0211, 0.0007,
];

/// A reference language model: expected frequency of every letter A-Z.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyTable {
    expected: [f64; ALPHABET_LEN],
}

impl FrequencyTable {
    pub const fn english() -> Self {
        Self { expected: ENGLISH_FREQUENCIES }
    }

    pub fn new(expected: [f64; ALPHABET_LEN]) -> Self {
        Self { expected }
    }

    /// Expected frequency of an uppercase letter, 0 for anything else.
    pub fn expected(&self, letter: char) -> f64 {
        letter_index(letter).map_or(0.0, |i| self.expected[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, f64)> + '_ {
        self.expected
            .iter()
            .enumerate()
            .map(|(i, &f)| ((b'A' + i as u8) as char, f))
    }
}

impl Default for FrequencyTable {
    fn default() -> Self {
        Self::english()
    }
}

/// The table every analysis uses unless told otherwise.
pub static ENGLISH: FrequencyTable = FrequencyTable::english();

/// Position of an ASCII letter in the alphabet, ignoring case.
pub fn letter_index(c: char) -> Option<usize> {
    if c.is_ascii_alphabetic() {
        Some((c.to_ascii_uppercase() as u8 - b'A') as usize)
    } else {
        None
    }
}

fn letter_counts(text: &str) -> ([usize; ALPHABET_LEN], usize) {
    let mut counts = [0usize; ALPHABET_LEN];
    let mut total = 0;
    for i in text.chars().filter_map(letter_index) {
        counts[i] += 1;
        total += 1;
    }
    (counts, total)
}

/// Probability that two letters drawn from `text` are equal.
/// Only ASCII letters count; returns 0 when there are fewer than two of them.
pub fn index_of_coincidence(text: &str) -> f64 {
    let (counts, n) = letter_counts(text);
    if n <= 1 {
        return 0.0;
    }
    let sum: usize = counts.iter().map(|&c| c * c.saturating_sub(1)).sum();
    sum as f64 / (n * (n - 1)) as f64
}

/// Relative frequency of each letter present in `text`.
/// Letters that never occur are absent from the map; a text without letters yields an empty map.
pub fn letter_frequencies(text: &str) -> HashMap<char, f64> {
    let (counts, total) = letter_counts(text);
    if total == 0 {
        return HashMap::new();
    }
    counts
        .iter()
        .enumerate()
        .filter(|&(_, &c)| c > 0)
        .map(|(i, &c)| ((b'A' + i as u8) as char, c as f64 / total as f64))
        .collect()
}

/// Chi-squared distance between observed frequencies and the reference table.
/// Lower means more like the reference language. Letters the reference gives
/// zero weight are skipped; letters missing from `observed` count as 0.
pub fn chi_squared(observed: &HashMap<char, f64>, reference: &FrequencyTable) -> f64 {
    reference
        .iter()
        .filter(|&(_, expected)| expected > 0.0)
        .map(|(letter, expected)| {
            let seen = observed.get(&letter).copied().unwrap_or(0.0);
            (seen - expected).powi(2) / expected
        })
        .sum()
}
