// File: src/coordinator.rs
use crate::core::cipher::key_shifts;
use crate::core::dictionary::Dictionary;
use crate::core::types::{shifts_to_key, KeyQuality, ScoredKey};
use crate::error::{CrackError, CrackResult};
use crate::progress::{ProgressObserver, ProgressUpdate};
use crate::refine::{RefinementEngine, RefinementOutcome};
use log::{debug, trace, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::ops::Range;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Cooperative stop flag shared by the caller, the orchestrator and every worker.
/// Cancelling is permanent and may happen at any time.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Hardware threads minus one for the orchestrator, never less than one.
pub fn default_worker_count() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .saturating_sub(1)
        .max(1)
}

/// Splits `0..total` into at most `workers` contiguous, non-empty ranges that cover it exactly.
/// Range sizes differ by at most one, larger ranges first.
pub fn partition(total: usize, workers: usize) -> Vec<Range<usize>> {
    let units = workers.max(1).min(total);
    if units == 0 {
        return Vec::new();
    }
    let base = total / units;
    let extra = total % units;
    let mut start = 0;
    (0..units)
        .map(|i| {
            let len = base + usize::from(i < extra);
            let range = start..start + len;
            start += len;
            range
        })
        .collect()
}

/// A slice of work owned by exactly one worker.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkUnit<T> {
    pub worker: usize,
    pub items: Vec<T>,
}

/// Moves `items` into contiguous work units following [`partition`].
pub fn split_into_units<T>(items: Vec<T>, workers: usize) -> Vec<WorkUnit<T>> {
    let ranges = partition(items.len(), workers);
    let mut rest = items.into_iter();
    ranges
        .into_iter()
        .enumerate()
        .map(|(worker, range)| WorkUnit {
            worker,
            items: rest.by_ref().take(range.len()).collect(),
        })
        .collect()
}

enum WorkerMessage<R> {
    Done { worker: usize, results: Vec<R> },
    /// The worker saw the cancellation flag and stopped early.
    Stopped { worker: usize },
    Failed { worker: usize, reason: String },
    Progress { worker: usize, message: String },
}

/// Hands a worker a way to report narrative lines back to the orchestrator.
pub struct WorkerContext {
    worker: usize,
    cancel: CancellationToken,
    sender: Box<dyn Fn(usize, String) + Send>,
}

impl WorkerContext {
    pub fn worker(&self) -> usize {
        self.worker
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn report(&self, message: String) {
        (self.sender)(self.worker, message);
    }
}

/// A candidate after the refinement stage.
#[derive(Debug, Clone, PartialEq)]
pub struct RefinedCandidate {
    pub seed_key: String,
    pub result: ScoredKey,
    /// True when refinement improved on the seed.
    pub refined: bool,
    pub iterations: usize,
}

/// Fans independent work out to a fixed pool of threads and gathers the results.
///
/// Workers own their slice, read the shared ciphertext and dictionary, and send
/// back their results once. The orchestrator only dispatches, listens, reports
/// progress and merges; ranking happens after everyone has reported.
///
/// The pool is built once and reused by every stage run through this coordinator.
pub struct Coordinator {
    workers: usize,
    pool: ThreadPool,
    cancel: CancellationToken,
    progress: Arc<dyn ProgressObserver>,
}

/// What one [`Coordinator::run`] gathered before it stopped listening.
struct Gathered<R> {
    results: Vec<R>,
    failures: Vec<String>,
}

impl Coordinator {
    pub fn new(workers: usize, cancel: CancellationToken, progress: Arc<dyn ProgressObserver>) -> CrackResult<Self> {
        let workers = workers.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("vcrack-worker-{}", i))
            .build()
            .map_err(|e| CrackError::WorkerFailed(format!("could not start {} workers: {}", workers, e)))?;
        Ok(Self { workers, pool, cancel, progress })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Runs `job` once per work unit on the pool and concatenates the results in
    /// unit order. A unit whose job panics is logged and left out. Returns
    /// [`CrackError::Cancelled`] if the token is set before all units have finished.
    pub fn run<T, R, F>(&self, label: &str, items: Vec<T>, job: F) -> CrackResult<Vec<R>>
    where
        T: Send,
        R: Send + 'static,
        F: Fn(Vec<T>, &WorkerContext) -> Option<Vec<R>> + Sync,
    {
        self.gather(label, items, job).map(|g| g.results)
    }

    /// Runs `job` on a single item and returns its result. A crashed worker is
    /// reported as [`CrackError::WorkerFailed`] rather than as an empty result.
    pub fn run_one<T, R, F>(&self, label: &str, item: T, job: F) -> CrackResult<R>
    where
        T: Send,
        R: Send + 'static,
        F: Fn(T, &WorkerContext) -> Option<R> + Sync,
    {
        let Gathered { mut results, failures } = self.gather(label, vec![item], |items, ctx| {
            let item = items.into_iter().next()?;
            job(item, ctx).map(|r| vec![r])
        })?;
        match results.pop() {
            Some(result) => Ok(result),
            None => Err(CrackError::WorkerFailed(
                failures.into_iter().next().unwrap_or_else(|| format!("{}: no result", label)),
            )),
        }
    }

    fn gather<T, R, F>(&self, label: &str, items: Vec<T>, job: F) -> CrackResult<Gathered<R>>
    where
        T: Send,
        R: Send + 'static,
        F: Fn(Vec<T>, &WorkerContext) -> Option<Vec<R>> + Sync,
    {
        if self.cancel.is_cancelled() {
            return Err(CrackError::Cancelled);
        }
        let units = split_into_units(items, self.workers);
        if units.is_empty() {
            return Ok(Gathered { results: Vec::new(), failures: Vec::new() });
        }

        let unit_count = units.len();
        debug!("{}: dispatching {} work units", label, unit_count);
        let (tx, rx) = mpsc::channel::<WorkerMessage<R>>();
        let mut slots: Vec<Option<Vec<R>>> = (0..unit_count).map(|_| None).collect();
        let mut failures = Vec::new();
        let mut reported = 0;
        let mut stopped = 0;
        let job = &job;
        let cancel = &self.cancel;

        // Leaving the scope waits for every unit; workers poll the same flag, so that is quick after a cancel.
        self.pool.in_place_scope(|scope| {
            for WorkUnit { worker, items } in units {
                let tx = tx.clone();
                scope.spawn(move |_| {
                    let progress_tx = tx.clone();
                    let ctx = WorkerContext {
                        worker,
                        cancel: cancel.clone(),
                        sender: Box::new(move |worker, message| {
                            let _ = progress_tx.send(WorkerMessage::Progress { worker, message });
                        }),
                    };
                    let message = match catch_unwind(AssertUnwindSafe(|| job(items, &ctx))) {
                        Ok(Some(results)) => WorkerMessage::Done { worker, results },
                        Ok(None) => WorkerMessage::Stopped { worker },
                        Err(panic) => WorkerMessage::Failed { worker, reason: panic_reason(panic) },
                    };
                    let _ = tx.send(message);
                });
            }
            drop(tx);

            while reported < unit_count {
                if cancel.is_cancelled() {
                    break;
                }
                match rx.recv_timeout(POLL_INTERVAL) {
                    Ok(WorkerMessage::Done { worker, results }) => {
                        reported += 1;
                        debug!("{}: worker {} returned {} results", label, worker, results.len());
                        slots[worker] = Some(results);
                        self.report_share(label, reported, unit_count);
                    }
                    Ok(WorkerMessage::Stopped { worker }) => {
                        reported += 1;
                        stopped += 1;
                        debug!("{}: worker {} stopped early", label, worker);
                    }
                    Ok(WorkerMessage::Failed { worker, reason }) => {
                        reported += 1;
                        warn!("{}: worker {} failed: {}", label, worker, reason);
                        self.progress.on_progress(ProgressUpdate::message(format!(
                            "Worker {} failed ({}); continuing with the remaining results.",
                            worker + 1,
                            reason
                        )));
                        failures.push(reason);
                        self.report_share(label, reported, unit_count);
                    }
                    Ok(WorkerMessage::Progress { worker, message }) => {
                        trace!("{}: worker {}: {}", label, worker, message);
                        self.progress.on_progress(ProgressUpdate::message(message));
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        });

        // A cancel that lands after every unit finished does not void the run.
        let interrupted = reported < unit_count || stopped > 0;
        if interrupted && self.cancel.is_cancelled() {
            debug!("{}: cancelled, discarding partial results", label);
            return Err(CrackError::Cancelled);
        }
        if reported < unit_count {
            return Err(CrackError::WorkerFailed(format!(
                "{}: {} of {} workers never reported",
                label,
                unit_count - reported,
                unit_count
            )));
        }
        Ok(Gathered { results: slots.into_iter().flatten().flatten().collect(), failures })
    }

    fn report_share(&self, label: &str, reported: usize, total: usize) {
        let percent = reported as f64 / total as f64 * 100.0;
        self.progress.on_progress(ProgressUpdate::with_percent(
            percent,
            format!("{}: {}/{} workers finished", label, reported, total),
        ));
    }

    /// Decrypts and scores every key. Results come back in input order, unranked.
    pub fn score_candidates(
        &self,
        ciphertext: Arc<str>,
        dictionary: Arc<Dictionary>,
        keys: Vec<String>,
    ) -> CrackResult<Vec<ScoredKey>> {
        self.run("Scoring candidates", keys, move |keys, ctx| {
            let mut out = Vec::with_capacity(keys.len());
            for key in keys {
                if ctx.is_cancelled() {
                    return None;
                }
                out.push(dictionary.score_key(&ciphertext, &key));
            }
            Some(out)
        })
    }

    /// Tests a list of ready-made keys, rating each with the composite quality.
    /// Keys are reduced to uppercase letters and those left empty are skipped.
    /// The result is ranked by recognition.
    pub fn test_predefined_keys(
        &self,
        ciphertext: Arc<str>,
        dictionary: Arc<Dictionary>,
        keys: Vec<String>,
    ) -> CrackResult<Vec<KeyQuality>> {
        let keys: Vec<String> = keys
            .iter()
            .map(|k| shifts_to_key(&key_shifts(k)))
            .filter(|k| !k.is_empty())
            .collect();
        let mut results = self.run("Testing predefined keys", keys, move |keys, ctx| {
            let mut out = Vec::with_capacity(keys.len());
            for key in keys {
                if ctx.is_cancelled() {
                    return None;
                }
                out.push(dictionary.rate_key_quality(&ciphertext, &key));
            }
            Some(out)
        })?;
        results.sort_by(|a, b| b.stats.percentage.total_cmp(&a.stats.percentage));
        Ok(results)
    }

    /// Refines every candidate that is still below `target`; the rest pass through.
    pub fn refine_candidates(
        &self,
        ciphertext: Arc<str>,
        dictionary: Arc<Dictionary>,
        candidates: Vec<ScoredKey>,
        target: f64,
        max_iterations: usize,
        seed: Option<u64>,
    ) -> CrackResult<Vec<RefinedCandidate>> {
        self.run("Refining candidates", candidates, move |candidates, ctx| {
            let mut rng = worker_rng(seed, ctx.worker());
            let engine = RefinementEngine::new(&dictionary, target, max_iterations);
            let mut out = Vec::with_capacity(candidates.len());
            for candidate in candidates {
                if ctx.is_cancelled() {
                    return None;
                }
                if candidate.stats.percentage >= target {
                    out.push(RefinedCandidate {
                        seed_key: candidate.key.clone(),
                        result: candidate,
                        refined: false,
                        iterations: 0,
                    });
                    continue;
                }
                let outcome = engine.refine_observed(&candidate.key, &ciphertext, &mut rng, |_| !ctx.is_cancelled());
                if outcome.interrupted {
                    return None;
                }
                out.push(RefinedCandidate {
                    seed_key: candidate.key,
                    refined: outcome.improved,
                    iterations: outcome.iterations,
                    result: ScoredKey {
                        key: outcome.key,
                        stats: outcome.stats,
                        plaintext: outcome.plaintext,
                    },
                });
            }
            Some(out)
        })
    }

    /// Runs a single refinement on one worker, relaying its per-iteration status lines.
    pub fn refine_single(
        &self,
        ciphertext: Arc<str>,
        dictionary: Arc<Dictionary>,
        key: String,
        target: f64,
        max_iterations: usize,
        seed: Option<u64>,
    ) -> CrackResult<RefinementOutcome> {
        self.run_one("Refining key", key, move |key, ctx| {
            let mut rng = worker_rng(seed, ctx.worker());
            let engine = RefinementEngine::new(&dictionary, target, max_iterations);
            let outcome = engine.refine_observed(&key, &ciphertext, &mut rng, |state| {
                ctx.report(format!(
                    "Refining key (iteration {}/{}). Current recognition: {:.2}%",
                    state.iteration,
                    max_iterations,
                    state.best_score()
                ));
                !ctx.is_cancelled()
            });
            if outcome.interrupted {
                None
            } else {
                Some(outcome)
            }
        })
    }
}

/// Orders results by recognition, then weighted score, best first.
/// Full ties keep their generation order.
pub fn rank_by_recognition(results: &mut [ScoredKey]) {
    results.sort_by(|a, b| {
        b.stats
            .percentage
            .total_cmp(&a.stats.percentage)
            .then(b.stats.weighted_score.total_cmp(&a.stats.weighted_score))
    });
}

fn worker_rng(seed: Option<u64>, worker: usize) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(worker as u64)),
        None => StdRng::from_entropy(),
    }
}

fn panic_reason(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
