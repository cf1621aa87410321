// src/config.rs
use crate::core::candidates::DEFAULT_CANDIDATE_CAP;
use crate::core::key_length::MAX_KEY_LENGTH;
use crate::core::shifts::DEFAULT_SHIFT_OPTIONS;
use crate::core::types::ALPHABET_LEN;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Everything that steers a crack run. Missing fields in a JSON file fall back to defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrackConfig {
    pub max_key_length: usize,
    /// Word recognition (percent) at which a key is accepted.
    pub target_recognition: f64,
    /// Iteration budget of a single refinement.
    pub max_iterations: usize,
    pub use_known_key: bool,
    pub known_key: Option<String>,
    pub use_predefined_keys: bool,

    /// How many of the best key lengths get expanded into candidates.
    pub top_key_lengths: usize,
    pub shift_options: usize,
    pub candidate_cap: usize,
    /// How many scored candidates go on to refinement.
    pub refine_pool: usize,
    /// Candidates at or below this recognition are thrown away.
    pub plausibility_floor: f64,
    /// A predefined key at this recognition ends the run immediately.
    pub early_accept: f64,
    /// A predefined key above this recognition is kept as a fallback.
    pub baseline_accept: f64,
    pub max_alternatives: usize,
    /// Worker threads. `None` uses the hardware thread count minus one.
    pub workers: Option<usize>,
    /// Seeds the refinement RNGs for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for CrackConfig {
    fn default() -> Self {
        Self {
            max_key_length: 10,
            target_recognition: 90.0,
            max_iterations: 25,
            use_known_key: false,
            known_key: None,
            use_predefined_keys: false,
            top_key_lengths: 3,
            shift_options: DEFAULT_SHIFT_OPTIONS,
            candidate_cap: DEFAULT_CANDIDATE_CAP,
            refine_pool: 15,
            plausibility_floor: 15.0,
            early_accept: 80.0,
            baseline_accept: 50.0,
            max_alternatives: 10,
            workers: None,
            seed: None,
        }
    }
}

fn clamp_logged<T: PartialOrd + Copy + std::fmt::Display>(name: &str, value: T, min: T, max: T) -> T {
    let clamped = if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    };
    if clamped != value {
        warn!("config: {} = {} is out of range, using {}", name, value, clamped);
    }
    clamped
}

impl CrackConfig {
    /// Returns a copy with every field pulled into its allowed range.
    pub fn validated(&self) -> Self {
        let mut cfg = self.clone();
        cfg.max_key_length = clamp_logged("max_key_length", cfg.max_key_length, 1, MAX_KEY_LENGTH);
        cfg.target_recognition = clamp_logged("target_recognition", cfg.target_recognition, 50.0, 100.0);
        cfg.max_iterations = clamp_logged("max_iterations", cfg.max_iterations, 5, 5000);
        cfg.top_key_lengths = clamp_logged("top_key_lengths", cfg.top_key_lengths, 1, MAX_KEY_LENGTH);
        cfg.shift_options = clamp_logged("shift_options", cfg.shift_options, 1, ALPHABET_LEN);
        cfg.candidate_cap = clamp_logged("candidate_cap", cfg.candidate_cap, 1, usize::MAX);
        cfg.refine_pool = clamp_logged("refine_pool", cfg.refine_pool, 1, usize::MAX);
        cfg.plausibility_floor = clamp_logged("plausibility_floor", cfg.plausibility_floor, 0.0, 100.0);
        cfg.early_accept = clamp_logged("early_accept", cfg.early_accept, 0.0, 100.0);
        cfg.baseline_accept = clamp_logged("baseline_accept", cfg.baseline_accept, 0.0, 100.0);
        if let Some(w) = cfg.workers {
            cfg.workers = Some(clamp_logged("workers", w, 1, usize::MAX));
        }
        cfg
    }

    /// The known key, if the caller asked for it and it has at least one letter.
    pub fn known_key(&self) -> Option<&str> {
        if !self.use_known_key {
            return None;
        }
        self.known_key
            .as_deref()
            .filter(|k| k.chars().any(|c| c.is_ascii_alphabetic()))
    }

    pub fn from_json_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let reader = BufReader::new(File::open(path)?);
        let cfg: CrackConfig = serde_json::from_reader(reader)?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_already_valid() {
        let cfg = CrackConfig::default();
        assert_eq!(cfg.validated(), cfg);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let cfg = CrackConfig {
            max_key_length: 40,
            target_recognition: 10.0,
            max_iterations: 1,
            shift_options: 0,
            workers: Some(0),
            ..CrackConfig::default()
        }
        .validated();
        assert_eq!(cfg.max_key_length, 15);
        assert_eq!(cfg.target_recognition, 50.0);
        assert_eq!(cfg.max_iterations, 5);
        assert_eq!(cfg.shift_options, 1);
        assert_eq!(cfg.workers, Some(1));
    }

    #[test]
    fn known_key_needs_the_flag_and_letters() {
        let mut cfg = CrackConfig { known_key: Some("LEMON".into()), ..CrackConfig::default() };
        assert_eq!(cfg.known_key(), None);
        cfg.use_known_key = true;
        assert_eq!(cfg.known_key(), Some("LEMON"));
        cfg.known_key = Some("123".into());
        assert_eq!(cfg.known_key(), None);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: CrackConfig = serde_json::from_str(r#"{ "max_iterations": 100, "seed": 7 }"#).unwrap();
        assert_eq!(cfg.max_iterations, 100);
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.max_key_length, 10);
    }
}
