// src/progress.rs
use std::sync::mpsc::Sender;
use std::sync::Mutex;

/// One status message from a running analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    /// Share of the current stage that is done, in `[0, 100]`. `None` for plain narrative lines.
    pub percent: Option<f64>,
    pub message: String,
}

impl ProgressUpdate {
    pub fn message(message: impl Into<String>) -> Self {
        Self { percent: None, message: message.into() }
    }

    pub fn with_percent(percent: f64, message: impl Into<String>) -> Self {
        Self { percent: Some(percent.clamp(0.0, 100.0)), message: message.into() }
    }
}

/// Receives progress from the engine. Implementations must be cheap; they run on the
/// orchestrating thread between worker completions.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, update: ProgressUpdate);
}

/// Drops every update.
pub struct SilentProgress;

impl ProgressObserver for SilentProgress {
    fn on_progress(&self, _update: ProgressUpdate) {}
}

/// Forwards updates into a channel so a UI thread can render them.
/// A closed receiver is ignored.
pub struct ChannelProgress {
    sender: Mutex<Sender<ProgressUpdate>>,
}

impl ChannelProgress {
    pub fn new(sender: Sender<ProgressUpdate>) -> Self {
        Self { sender: Mutex::new(sender) }
    }
}

impl ProgressObserver for ChannelProgress {
    fn on_progress(&self, update: ProgressUpdate) {
        if let Ok(sender) = self.sender.lock() {
            let _ = sender.send(update);
        }
    }
}

/// Keeps every update in memory. Handy in tests.
#[derive(Default)]
pub struct RecordingProgress {
    updates: Mutex<Vec<ProgressUpdate>>,
}

impl RecordingProgress {
    pub fn updates(&self) -> Vec<ProgressUpdate> {
        self.updates.lock().map(|u| u.clone()).unwrap_or_default()
    }
}

impl ProgressObserver for RecordingProgress {
    fn on_progress(&self, update: ProgressUpdate) {
        if let Ok(mut updates) = self.updates.lock() {
            updates.push(update);
        }
    }
}
