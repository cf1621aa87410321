use crate::config::CrackConfig;
use crate::coordinator::{default_worker_count, rank_by_recognition, CancellationToken, Coordinator};
use crate::core::candidates::generate_keys;
use crate::core::cipher::key_shifts;
use crate::core::dictionary::Dictionary;
use crate::core::frequency::ENGLISH;
use crate::core::key_length::{estimate_key_lengths, split_sequences};
use crate::core::shifts::best_shifts;
use crate::core::types::{
    preview, shifts_to_key, CrackOutcome, CrackReport, KeyLengthCandidate, KeyQuality, RankedCandidate,
    ScoredKey,
};
use crate::error::{CrackError, CrackResult};
use crate::persistence::load_dictionary;
use crate::progress::{ProgressObserver, ProgressUpdate, SilentProgress};
use crate::refine::RefinementOutcome;
use log::{debug, info};
use std::path::Path;
use std::sync::Arc;

const PREVIEW_CHARS: usize = 100;

/// Collects the human-readable story of a run and mirrors it to the progress observer.
struct Narrator {
    lines: Vec<String>,
    progress: Arc<dyn ProgressObserver>,
}

impl Narrator {
    fn new(progress: Arc<dyn ProgressObserver>) -> Self {
        Self { lines: Vec::new(), progress }
    }

    fn say(&mut self, line: String) {
        info!("{}", line);
        self.progress.on_progress(ProgressUpdate::message(line.clone()));
        self.lines.push(line);
    }
}

/// A key that made it to the final round.
struct Finalist {
    result: ScoredKey,
    refined: bool,
    iterations: usize,
}

// The engine owns the static data (dictionary, predefined keys) and the configuration.
// Each crack call builds its own coordinator, so runs never share mutable state.
pub struct CrackEngine {
    dictionary: Option<Arc<Dictionary>>,
    predefined_keys: Vec<String>,
    config: CrackConfig,
}

impl CrackEngine {
    pub fn new(config: CrackConfig) -> Self {
        Self {
            dictionary: None,
            predefined_keys: Vec::new(),
            config,
        }
    }

    pub fn with_dictionary(mut self, dictionary: Dictionary) -> Self {
        self.set_dictionary(dictionary);
        self
    }

    pub fn set_dictionary(&mut self, dictionary: Dictionary) {
        info!("Dictionary installed with {} words", dictionary.len());
        self.dictionary = Some(Arc::new(dictionary));
    }

    /// Loads a word list or compiled snapshot from disk and installs it.
    pub fn load_dictionary(&mut self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let dictionary = load_dictionary(path)?;
        self.set_dictionary(dictionary);
        Ok(())
    }

    pub fn set_predefined_keys(&mut self, keys: Vec<String>) {
        self.predefined_keys = keys;
    }

    pub fn predefined_keys(&self) -> &[String] {
        &self.predefined_keys
    }

    pub fn config(&self) -> &CrackConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut CrackConfig {
        &mut self.config
    }

    /// True once a non-empty dictionary is installed.
    pub fn is_ready(&self) -> bool {
        self.dictionary.as_ref().map_or(false, |d| !d.is_empty())
    }

    fn ready_dictionary(&self) -> CrackResult<Arc<Dictionary>> {
        match &self.dictionary {
            Some(d) if !d.is_empty() => Ok(Arc::clone(d)),
            _ => Err(CrackError::DictionaryUnavailable),
        }
    }

    fn coordinator(
        &self,
        config: &CrackConfig,
        cancel: &CancellationToken,
        progress: &Arc<dyn ProgressObserver>,
    ) -> CrackResult<Coordinator> {
        let workers = config.workers.unwrap_or_else(default_worker_count);
        Coordinator::new(workers, cancel.clone(), Arc::clone(progress))
    }

    /// Runs a full analysis without progress reporting or outside cancellation.
    pub fn crack(&self, ciphertext: &str) -> CrackResult<CrackOutcome> {
        self.crack_with(ciphertext, &CancellationToken::new(), Arc::new(SilentProgress))
    }

    pub fn crack_with(
        &self,
        ciphertext: &str,
        cancel: &CancellationToken,
        progress: Arc<dyn ProgressObserver>,
    ) -> CrackResult<CrackOutcome> {
        let dictionary = self.ready_dictionary()?;
        let letters: String = ciphertext.chars().filter(|c| c.is_ascii_alphabetic()).collect();
        if letters.is_empty() {
            return Err(CrackError::InvalidInput(
                "Please enter valid ciphertext with letters.".to_string(),
            ));
        }
        if cancel.is_cancelled() {
            return Err(CrackError::Cancelled);
        }

        let cfg = self.config.validated();
        let coordinator = self.coordinator(&cfg, cancel, &progress)?;
        let mut narrator = Narrator::new(progress);
        let text: Arc<str> = Arc::from(ciphertext);
        narrator.say("Analyzing ciphertext...".to_string());

        // 1. A known key short-circuits the whole search.
        if let Some(key) = cfg.known_key() {
            let key = shifts_to_key(&key_shifts(key));
            let quality = dictionary.rate_key_quality(ciphertext, &key);
            narrator.say(format!("Key: {} (Word recognition: {:.2}%)", key, quality.stats.percentage));
            return Ok(CrackOutcome::Solved(report_from_quality(quality, Vec::new(), Vec::new(), narrator.lines)));
        }

        // 2. Predefined keys: accept outright when strong, otherwise keep the best as a baseline.
        let mut baseline: Option<ScoredKey> = None;
        if cfg.use_predefined_keys {
            if self.predefined_keys.is_empty() {
                narrator.say("No predefined keys available.".to_string());
            } else {
                narrator.say(format!("Testing {} predefined keys...", self.predefined_keys.len()));
                let mut tested = coordinator.test_predefined_keys(
                    Arc::clone(&text),
                    Arc::clone(&dictionary),
                    self.predefined_keys.clone(),
                )?;
                let best_score = tested.first().map_or(0.0, |b| b.stats.percentage);
                if !tested.is_empty() && best_score >= cfg.early_accept {
                    let best = tested.remove(0);
                    narrator.say(format!("Found high-probability key: {} ({:.2}%)", best.key, best_score));
                    let alternatives = tested
                        .into_iter()
                        .take(cfg.max_alternatives)
                        .map(ranked_from_quality)
                        .collect();
                    return Ok(CrackOutcome::Solved(report_from_quality(
                        best,
                        Vec::new(),
                        alternatives,
                        narrator.lines,
                    )));
                }
                match tested.into_iter().next() {
                    Some(best) if best.stats.percentage > cfg.baseline_accept => {
                        narrator.say(format!(
                            "Potential key found via predefined keys: {} ({:.2}%). Continuing analysis...",
                            best.key, best.stats.percentage
                        ));
                        baseline = Some(ScoredKey {
                            key: best.key,
                            stats: best.stats,
                            plaintext: best.plaintext,
                        });
                    }
                    _ => narrator.say(
                        "No strong matches found in predefined keys. Continuing with analysis...".to_string(),
                    ),
                }
            }
        }

        // 3. Rank key lengths by Index of Coincidence and keep the best few.
        let key_lengths: Vec<KeyLengthCandidate> = estimate_key_lengths(&letters, cfg.max_key_length)
            .into_iter()
            .take(cfg.top_key_lengths)
            .collect();
        let listed: Vec<String> = key_lengths.iter().map(|k| k.length.to_string()).collect();
        narrator.say(format!("Testing key lengths: {}...", listed.join(", ")));

        // 4. Per length: best shifts per column, expanded into a capped set of keys.
        let mut keys = Vec::new();
        for candidate in &key_lengths {
            if cancel.is_cancelled() {
                return Err(CrackError::Cancelled);
            }
            let options: Vec<_> = split_sequences(&letters, candidate.length)
                .iter()
                .map(|seq| best_shifts(seq, cfg.shift_options, &ENGLISH))
                .collect();
            let generated = generate_keys(&options, cfg.candidate_cap);
            debug!(
                "key length {} (avg IC {:.4}): {} candidates",
                candidate.length,
                candidate.average_ic,
                generated.len()
            );
            keys.extend(generated);
        }

        // 5. Score every candidate in parallel, then rank globally.
        narrator.say(format!("Scoring {} key candidates...", keys.len()));
        let scored = coordinator.score_candidates(Arc::clone(&text), Arc::clone(&dictionary), keys)?;
        let mut plausible: Vec<ScoredKey> = scored
            .into_iter()
            .filter(|s| s.stats.percentage > cfg.plausibility_floor)
            .collect();
        rank_by_recognition(&mut plausible);
        plausible.truncate(cfg.refine_pool);

        if plausible.is_empty() && baseline.is_none() {
            narrator.say("No viable keys found. Try adjusting parameters or providing more ciphertext.".to_string());
            return Ok(CrackOutcome::NoViableResult {
                key_lengths,
                narrative: narrator.lines,
            });
        }

        // 6. Refine whatever is still below target.
        let mut finalists: Vec<Finalist> = Vec::new();
        if !plausible.is_empty() {
            narrator.say(format!(
                "Refining {} candidates towards {:.0}% recognition (best so far: {} at {:.2}%)...",
                plausible.len(),
                cfg.target_recognition,
                plausible[0].key,
                plausible[0].stats.percentage
            ));
            let refined = coordinator.refine_candidates(
                Arc::clone(&text),
                Arc::clone(&dictionary),
                plausible,
                cfg.target_recognition,
                cfg.max_iterations,
                cfg.seed,
            )?;
            finalists.extend(refined.into_iter().map(|r| Finalist {
                result: r.result,
                refined: r.refined,
                iterations: r.iterations,
            }));
        }
        if let Some(result) = baseline {
            finalists.push(Finalist { result, refined: false, iterations: 0 });
        }

        // 7. Pick the winner; the rest become alternatives.
        finalists.sort_by(|a, b| {
            b.result
                .stats
                .percentage
                .total_cmp(&a.result.stats.percentage)
                .then(b.result.stats.weighted_score.total_cmp(&a.result.stats.weighted_score))
        });
        let mut finalists = finalists.into_iter();
        let best = match finalists.next() {
            Some(best) => best,
            None => {
                return Ok(CrackOutcome::NoViableResult {
                    key_lengths,
                    narrative: narrator.lines,
                })
            }
        };
        let mut seen = vec![best.result.key.clone()];
        let alternatives: Vec<RankedCandidate> = finalists
            .filter(|f| {
                if seen.contains(&f.result.key) {
                    false
                } else {
                    seen.push(f.result.key.clone());
                    true
                }
            })
            .take(cfg.max_alternatives)
            .map(|f| ranked_from_quality(dictionary.rate_key_quality(ciphertext, &f.result.key)))
            .collect();

        narrator.say(format!(
            "Key: {} (Word recognition: {:.2}%)",
            best.result.key, best.result.stats.percentage
        ));

        Ok(CrackOutcome::Solved(CrackReport {
            key: best.result.key,
            stats: best.result.stats,
            plaintext: best.result.plaintext,
            key_lengths,
            alternatives,
            refined: best.refined,
            iterations: best.iterations,
            narrative: narrator.lines,
        }))
    }

    /// Refines one given key on a worker thread, streaming per-iteration status lines.
    /// A worker that crashes surfaces as [`CrackError::WorkerFailed`], never as a cancel.
    pub fn refine_key(
        &self,
        ciphertext: &str,
        key: &str,
        cancel: &CancellationToken,
        progress: Arc<dyn ProgressObserver>,
    ) -> CrackResult<RefinementOutcome> {
        let dictionary = self.ready_dictionary()?;
        if !ciphertext.chars().any(|c| c.is_ascii_alphabetic()) {
            return Err(CrackError::InvalidInput("Please enter valid ciphertext with letters.".to_string()));
        }
        let key = shifts_to_key(&key_shifts(key));
        if key.is_empty() {
            return Err(CrackError::InvalidInput("The key has no letters.".to_string()));
        }
        let cfg = self.config.validated();
        let coordinator = self.coordinator(&cfg, cancel, &progress)?;
        coordinator
            .refine_single(
                Arc::from(ciphertext),
                dictionary,
                key,
                cfg.target_recognition,
                cfg.max_iterations,
                cfg.seed,
            )
    }
}

fn ranked_from_quality(quality: KeyQuality) -> RankedCandidate {
    RankedCandidate {
        preview: preview(&quality.plaintext, PREVIEW_CHARS),
        key: quality.key,
        stats: quality.stats,
        chi_squared: quality.chi_squared,
        quality: quality.quality,
    }
}

fn report_from_quality(
    quality: KeyQuality,
    key_lengths: Vec<KeyLengthCandidate>,
    alternatives: Vec<RankedCandidate>,
    narrative: Vec<String>,
) -> CrackReport {
    CrackReport {
        key: quality.key,
        stats: quality.stats,
        plaintext: quality.plaintext,
        key_lengths,
        alternatives,
        refined: false,
        iterations: 0,
        narrative,
    }
}
