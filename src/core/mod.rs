// src/core/mod.rs
pub mod candidates;
pub mod cipher;
pub mod dictionary;
pub mod engine;
pub mod frequency;
pub mod key_length;
pub mod shifts;
pub mod types;
