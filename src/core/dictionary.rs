// src/core/dictionary.rs
use crate::core::cipher::decrypt;
use crate::core::frequency::{chi_squared, letter_frequencies, ENGLISH};
use crate::core::types::{KeyQuality, ScoredKey, WordStats};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Words ranked above this index get the common-word bonus.
const COMMON_RANK: usize = 500;
const COMMON_BONUS: f64 = 0.8;
const PER_EXTRA_LETTER: f64 = 0.3;

/// A read-only map from lowercase word to a positive weight.
/// Longer and more frequent words weigh more. Built once and then shared between workers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dictionary {
    weights: HashMap<String, f64>,
}

impl Dictionary {
    /// Builds weights from a word list ordered most frequent first.
    /// Entries that are empty or contain non-letters are skipped; the first copy of a duplicate wins.
    pub fn from_ranked_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut weights = HashMap::new();
        for (rank, word) in words.into_iter().enumerate() {
            let word = word.as_ref().trim().to_ascii_lowercase();
            if word.is_empty() || !word.chars().all(|c| c.is_ascii_alphabetic()) {
                continue;
            }
            let mut weight = 1.0;
            if word.len() > 2 {
                weight += (word.len() - 2) as f64 * PER_EXTRA_LETTER;
            }
            if rank < COMMON_RANK {
                weight += COMMON_BONUS;
            }
            weights.entry(word).or_insert(weight);
        }
        Self { weights }
    }

    /// Takes weights as they are, lowercasing keys. Non-positive weights are dropped.
    pub fn from_weights(weights: HashMap<String, f64>) -> Self {
        let weights = weights
            .into_iter()
            .filter(|(_, w)| *w > 0.0)
            .map(|(word, w)| (word.to_ascii_lowercase(), w))
            .collect();
        Self { weights }
    }

    pub fn weight(&self, word: &str) -> Option<f64> {
        self.weights.get(word).copied()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.weights.contains_key(word)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Counts how many words of `text` the dictionary knows.
    ///
    /// Tokens are maximal runs of ASCII letters, lowercased. Every token counts towards
    /// the total, but single letters are never looked up, so "a" and "I" can only lower
    /// the percentage.
    pub fn score_words(&self, text: &str) -> WordStats {
        let mut total_words = 0;
        let mut recognized = 0;
        let mut total_weight = 0.0;

        for token in text.split(|c: char| !c.is_ascii_alphabetic()).filter(|t| !t.is_empty()) {
            total_words += 1;
            if token.len() < 2 {
                continue;
            }
            if let Some(weight) = self.weight(&token.to_ascii_lowercase()) {
                recognized += 1;
                total_weight += weight;
            }
        }

        if total_words == 0 {
            return WordStats::default();
        }
        WordStats {
            recognized,
            total_words,
            percentage: recognized as f64 / total_words as f64 * 100.0,
            weighted_score: total_weight / total_words as f64,
        }
    }

    /// Decrypts with `key` and scores the plaintext.
    pub fn score_key(&self, ciphertext: &str, key: &str) -> ScoredKey {
        let plaintext = decrypt(ciphertext, key);
        let stats = self.score_words(&plaintext);
        ScoredKey { key: key.to_string(), stats, plaintext }
    }

    /// Blends dictionary hits with letter statistics into one quality number.
    pub fn rate_key_quality(&self, ciphertext: &str, key: &str) -> KeyQuality {
        let ScoredKey { key, stats, plaintext } = self.score_key(ciphertext, key);
        let chi = chi_squared(&letter_frequencies(&plaintext), &ENGLISH);
        KeyQuality {
            key,
            stats,
            chi_squared: chi,
            quality: stats.percentage * 0.7 + stats.weighted_score * 15.0 - chi * 0.2,
            plaintext,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict() -> Dictionary {
        Dictionary::from_ranked_words(["the", "cat", "sat", "on", "mat", "elephant"])
    }

    #[test]
    fn weights_favour_long_and_common_words() {
        let d = dict();
        assert!((d.weight("on").unwrap() - 1.8).abs() < 1e-12);
        assert!((d.weight("elephant").unwrap() - (1.0 + 6.0 * 0.3 + 0.8)).abs() < 1e-12);

        let long_tail: Vec<String> = (0..600).map(|i| format!("w{}", i)).collect();
        let mut words: Vec<&str> = long_tail.iter().map(|s| s.as_str()).collect();
        words.push("zebra");
        let d = Dictionary::from_ranked_words(words);
        // the w-entries contain digits and are skipped, so zebra keeps rank 600
        assert!((d.weight("zebra").unwrap() - 1.9).abs() < 1e-12);
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn first_duplicate_wins_and_case_is_folded() {
        let d = Dictionary::from_ranked_words(["Dog", "dog "]);
        assert_eq!(d.len(), 1);
        assert!(d.contains("dog"));
    }

    #[test]
    fn from_weights_drops_non_positive() {
        let mut map = HashMap::new();
        map.insert("Good".to_string(), 2.0);
        map.insert("bad".to_string(), 0.0);
        let d = Dictionary::from_weights(map);
        assert_eq!(d.weight("good"), Some(2.0));
        assert!(!d.contains("bad"));
    }

    #[test]
    fn scores_recognized_words() {
        let stats = dict().score_words("The cat sat on the MAT!");
        assert_eq!(stats.total_words, 6);
        assert_eq!(stats.recognized, 6);
        assert!((stats.percentage - 100.0).abs() < 1e-12);
        assert!(stats.weighted_score > 1.0);
    }

    #[test]
    fn single_letters_count_but_never_match() {
        let d = Dictionary::from_weights([("a".to_string(), 5.0)].into_iter().collect());
        let stats = d.score_words("a a a");
        assert_eq!(stats.total_words, 3);
        assert_eq!(stats.recognized, 0);
        assert_eq!(stats.percentage, 0.0);
    }

    #[test]
    fn empty_text_scores_zero() {
        assert_eq!(dict().score_words(" 123 ... "), WordStats::default());
    }

    #[test]
    fn more_known_words_never_lower_the_percentage() {
        let d = dict();
        let mut tokens = vec!["xq", "zv", "kk", "pw", "jj", "qq"];
        let mut last = d.score_words(&tokens.join(" ")).percentage;
        for (i, word) in ["the", "cat", "sat", "on", "mat", "elephant"].iter().enumerate() {
            tokens[i] = *word;
            let next = d.score_words(&tokens.join(" ")).percentage;
            assert!(next >= last);
            assert!((0.0..=100.0).contains(&next));
            last = next;
        }
        assert_eq!(last, 100.0);
    }

    #[test]
    fn quality_rewards_the_right_key() {
        let d = dict();
        let cipher = crate::core::cipher::encrypt("the cat sat on the mat", "KEY");
        let right = d.rate_key_quality(&cipher, "KEY");
        let wrong = d.rate_key_quality(&cipher, "QRS");
        assert_eq!(right.plaintext, "the cat sat on the mat");
        assert!(right.quality > wrong.quality);
    }
}
