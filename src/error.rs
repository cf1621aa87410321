// src/error.rs

/// Failures the cracking engine reports to its caller.
///
/// Finding no plausible key is not an error; see `CrackOutcome::NoViableResult`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrackError {
    /// The ciphertext was empty or had no letters to analyse.
    InvalidInput(String),

    /// No dictionary has been installed yet. Retry once it is loaded.
    DictionaryUnavailable,

    /// The run observed its cancellation token. Partial results were discarded.
    Cancelled,

    /// A worker could not be started or crashed before producing its result.
    WorkerFailed(String),
}

impl CrackError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, CrackError::DictionaryUnavailable)
    }
}

impl std::fmt::Display for CrackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CrackError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            CrackError::DictionaryUnavailable => {
                write!(f, "Dictionary is still loading. Please wait a moment.")
            }
            CrackError::Cancelled => write!(f, "Analysis cancelled"),
            CrackError::WorkerFailed(reason) => write!(f, "Worker failed: {}", reason),
        }
    }
}

impl std::error::Error for CrackError {}

pub type CrackResult<T> = Result<T, CrackError>;
