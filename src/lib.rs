// src/lib.rs

pub mod config;
pub mod coordinator;
pub mod core;
pub mod error;
pub mod persistence;
pub mod progress;
pub mod refine;

pub use crate::config::CrackConfig;
pub use crate::coordinator::CancellationToken;
pub use crate::core::dictionary::Dictionary;
pub use crate::core::engine::CrackEngine;
pub use crate::core::types::{CrackOutcome, CrackReport};
pub use crate::error::{CrackError, CrackResult};
