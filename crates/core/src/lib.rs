//! Core types and configuration for the candidate screener.
//!
//! This crate provides shared types used across all other crates:
//! - Typed cells produced by the tabular parser
//! - Candidate records, ranking stats and join keys
//! - Quality bands and gate presets
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use types::*;
