// File: src/refine.rs
use crate::core::cipher::{decrypt_with_shifts, key_shifts};
use crate::core::dictionary::Dictionary;
use crate::core::types::{shifts_to_key, WordStats, ALPHABET_LEN};
use log::trace;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Iterations without improvement after which the search starts swapping letters.
pub const STAGNATION_WINDOW: usize = 5;
/// A progress sample is kept every this many iterations.
pub const SAMPLE_EVERY: usize = 5;

/// Where a refinement currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefinementPhase {
    Searching,
    /// No improvement for more than [`STAGNATION_WINDOW`] iterations.
    Stagnating,
    /// Reached the target recognition.
    Converged,
    /// Ran out of iterations.
    Exhausted,
}

/// Mutable state of one refinement run. Owned by that run alone.
#[derive(Debug, Clone)]
pub struct RefinementState {
    /// The key a move is being tried on.
    pub current_key: Vec<u8>,
    pub best_key: Vec<u8>,
    pub best_stats: WordStats,
    pub iteration: usize,
    pub last_improved_iteration: usize,
}

impl RefinementState {
    pub fn best_score(&self) -> f64 {
        self.best_stats.percentage
    }

    fn stalled_for(&self) -> usize {
        self.iteration - self.last_improved_iteration
    }

    pub fn phase(&self, target: f64, max_iterations: usize) -> RefinementPhase {
        if self.best_score() >= target {
            RefinementPhase::Converged
        } else if self.iteration >= max_iterations {
            RefinementPhase::Exhausted
        } else if self.stalled_for() > STAGNATION_WINDOW {
            RefinementPhase::Stagnating
        } else {
            RefinementPhase::Searching
        }
    }
}

/// Snapshot of the search taken every [`SAMPLE_EVERY`] iterations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSample {
    pub iteration: usize,
    pub score: f64,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinementOutcome {
    pub key: String,
    pub stats: WordStats,
    pub plaintext: String,
    pub iterations: usize,
    /// True when the final key scores strictly better than the seed.
    pub improved: bool,
    pub converged: bool,
    /// The observer stopped the run early; the result is whatever was best at that point.
    pub interrupted: bool,
    pub samples: Vec<ProgressSample>,
}

/// Strict hill climber over key letters, scored by dictionary recognition.
///
/// Each iteration tries single-letter substitutions first (random letter order per
/// position, first improvement wins). Once stagnating it also tries swapping
/// neighbouring letters. When nothing helps, a random multi-letter mutation is tried
/// whose size grows the longer the search has been stuck. A move is only ever kept
/// if it strictly raises the recognition percentage.
pub struct RefinementEngine<'a> {
    dictionary: &'a Dictionary,
    target: f64,
    max_iterations: usize,
}

impl<'a> RefinementEngine<'a> {
    pub fn new(dictionary: &'a Dictionary, target: f64, max_iterations: usize) -> Self {
        Self { dictionary, target, max_iterations }
    }

    pub fn refine<R: Rng + ?Sized>(&self, seed_key: &str, ciphertext: &str, rng: &mut R) -> RefinementOutcome {
        self.refine_observed(seed_key, ciphertext, rng, |_| true)
    }

    /// Runs the search, calling `observe` at the start of every iteration.
    /// Stops with `interrupted` set as soon as `observe` answers false.
    pub fn refine_observed<R, F>(
        &self,
        seed_key: &str,
        ciphertext: &str,
        rng: &mut R,
        mut observe: F,
    ) -> RefinementOutcome
    where
        R: Rng + ?Sized,
        F: FnMut(&RefinementState) -> bool,
    {
        let seed = key_shifts(seed_key);
        let seed_stats = self.score(ciphertext, &seed);
        let mut state = RefinementState {
            current_key: seed.clone(),
            best_key: seed,
            best_stats: seed_stats,
            iteration: 0,
            last_improved_iteration: 0,
        };
        let mut samples = Vec::new();
        let mut interrupted = false;

        if !state.best_key.is_empty() {
            loop {
                match state.phase(self.target, self.max_iterations) {
                    RefinementPhase::Converged | RefinementPhase::Exhausted => break,
                    RefinementPhase::Searching | RefinementPhase::Stagnating => {}
                }
                state.iteration += 1;
                if !observe(&state) {
                    interrupted = true;
                    break;
                }
                if state.iteration % SAMPLE_EVERY == 0 {
                    samples.push(ProgressSample {
                        iteration: state.iteration,
                        score: state.best_score(),
                        key: shifts_to_key(&state.best_key),
                    });
                }

                let stagnating = state.stalled_for() > STAGNATION_WINDOW;
                let moved = self.try_substitutions(&mut state, ciphertext, rng)
                    || (stagnating && self.try_swaps(&mut state, ciphertext))
                    || self.try_perturbation(&mut state, ciphertext, rng);

                trace!(
                    "refine iteration {} key {} score {:.2} moved {}",
                    state.iteration,
                    shifts_to_key(&state.best_key),
                    state.best_score(),
                    moved
                );
            }
        }

        let plaintext = decrypt_with_shifts(ciphertext, &state.best_key);
        RefinementOutcome {
            key: shifts_to_key(&state.best_key),
            stats: state.best_stats,
            plaintext,
            iterations: state.iteration,
            improved: state.best_stats.percentage > seed_stats.percentage,
            converged: state.best_score() >= self.target,
            interrupted,
            samples,
        }
    }

    fn score(&self, ciphertext: &str, shifts: &[u8]) -> WordStats {
        self.dictionary.score_words(&decrypt_with_shifts(ciphertext, shifts))
    }

    /// Scores `state.current_key` and adopts it if it is strictly better.
    fn adopt_if_better(&self, state: &mut RefinementState, ciphertext: &str) -> bool {
        let stats = self.score(ciphertext, &state.current_key);
        if stats.percentage > state.best_stats.percentage {
            state.best_key.clone_from(&state.current_key);
            state.best_stats = stats;
            state.last_improved_iteration = state.iteration;
            true
        } else {
            state.current_key.clone_from(&state.best_key);
            false
        }
    }

    fn try_substitutions<R: Rng + ?Sized>(&self, state: &mut RefinementState, ciphertext: &str, rng: &mut R) -> bool {
        let mut order: Vec<u8> = (0..ALPHABET_LEN as u8).collect();
        for pos in 0..state.best_key.len() {
            order.shuffle(rng);
            for &letter in &order {
                if letter == state.best_key[pos] {
                    continue;
                }
                state.current_key[pos] = letter;
                if self.adopt_if_better(state, ciphertext) {
                    return true;
                }
            }
        }
        false
    }

    fn try_swaps(&self, state: &mut RefinementState, ciphertext: &str) -> bool {
        for pos in 0..state.best_key.len().saturating_sub(1) {
            if state.best_key[pos] == state.best_key[pos + 1] {
                continue;
            }
            state.current_key.swap(pos, pos + 1);
            if self.adopt_if_better(state, ciphertext) {
                return true;
            }
        }
        false
    }

    fn try_perturbation<R: Rng + ?Sized>(&self, state: &mut RefinementState, ciphertext: &str, rng: &mut R) -> bool {
        let len = state.best_key.len();
        for _ in 0..perturbation_size(len, state.stalled_for()) {
            let pos = rng.gen_range(0..len);
            state.current_key[pos] = rng.gen_range(0..ALPHABET_LEN as u8);
        }
        self.adopt_if_better(state, ciphertext)
    }
}

/// Number of random letters a perturbation rewrites: one at first, one more every
/// three stalled iterations, never more than half the key (and at least one).
pub fn perturbation_size(key_len: usize, stalled: usize) -> usize {
    (stalled / 3 + 1).min((key_len / 2).max(1))
}
