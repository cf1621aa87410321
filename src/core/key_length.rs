// src/core/key_length.rs
use crate::core::frequency::{index_of_coincidence, ENGLISH_IC};
use crate::core::types::KeyLengthCandidate;

/// Longest key the estimator will ever consider.
pub const MAX_KEY_LENGTH: usize = 15;

/// Distributes the letters of `text` over `key_length` columns: the i-th letter
/// (counting letters only) goes to column `i % key_length`. Non-letters are dropped.
pub fn split_sequences(text: &str, key_length: usize) -> Vec<String> {
    if key_length == 0 {
        return Vec::new();
    }
    let mut sequences = vec![String::new(); key_length];
    for (i, c) in text.chars().filter(|c| c.is_ascii_alphabetic()).enumerate() {
        sequences[i % key_length].push(c);
    }
    sequences
}

/// Average Index of Coincidence over the columns of a `key_length`-way split.
pub fn average_ic(text: &str, key_length: usize) -> f64 {
    let sequences = split_sequences(text, key_length);
    if sequences.is_empty() {
        return 0.0;
    }
    let total: f64 = sequences.iter().map(|s| index_of_coincidence(s)).sum();
    total / sequences.len() as f64
}

/// Scores every key length in `1..=max_key_length` (capped at [`MAX_KEY_LENGTH`]) by how
/// close its average column IC is to English, and returns them best first.
/// Ties keep ascending length order.
pub fn estimate_key_lengths(text: &str, max_key_length: usize) -> Vec<KeyLengthCandidate> {
    let max = max_key_length.clamp(1, MAX_KEY_LENGTH);
    let mut candidates: Vec<KeyLengthCandidate> = (1..=max)
        .map(|length| {
            let avg = average_ic(text, length);
            KeyLengthCandidate {
                length,
                score: 1.0 - (avg - ENGLISH_IC).abs() * 10.0,
                average_ic: avg,
            }
        })
        .collect();

    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cipher::encrypt;

    const PLAINTEXT: &str = "It was the best of times and it was the worst of times, it was the age \
        of wisdom and it was the age of foolishness, it was the epoch of belief and it was the \
        epoch of incredulity, it was the season of light and it was the season of darkness, it \
        was the spring of hope and it was the winter of despair, we had everything before us and \
        we had nothing before us, we were all going direct to heaven and we were all going direct \
        the other way. In short the period was so far like the present period that some of its \
        noisiest authorities insisted on its being received for good or for evil in the superlative \
        degree of comparison only. There were a king with a large jaw and a queen \
        with a plain face on the throne of England.";

    #[test]
    fn splits_letters_round_robin() {
        let seqs = split_sequences("ab, cd-ef", 3);
        assert_eq!(seqs, vec!["ad", "be", "cf"]);
        assert!(split_sequences("abc", 0).is_empty());
    }

    #[test]
    fn scores_every_length_up_to_the_cap() {
        let lengths = estimate_key_lengths(PLAINTEXT, 40);
        assert_eq!(lengths.len(), MAX_KEY_LENGTH);
        let lengths = estimate_key_lengths(PLAINTEXT, 0);
        assert_eq!(lengths.len(), 1);
        assert_eq!(lengths[0].length, 1);
    }

    #[test]
    fn results_are_sorted_best_first() {
        let lengths = estimate_key_lengths(PLAINTEXT, 10);
        assert!(lengths.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn finds_a_five_letter_key_in_the_top_three() {
        let cipher = encrypt(PLAINTEXT, "CRANE");
        let letters = cipher.chars().filter(|c| c.is_ascii_alphabetic()).count();
        assert!(letters >= 500);

        let top: Vec<usize> = estimate_key_lengths(&cipher, 15)
            .iter()
            .take(3)
            .map(|c| c.length)
            .collect();
        assert!(top.contains(&5), "top lengths were {:?}", top);
    }
}
