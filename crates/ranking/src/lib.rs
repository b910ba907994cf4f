//! Ranking enrichment and quality classification for the candidate screener.
//!
//! This crate handles:
//! - Join index of per-universe ranking stats and record enrichment
//! - Quality band classification with the trade-count override
//! - Gate preset resolution and evaluation

pub mod band;
pub mod gate;
pub mod join_index;

pub use band::BandClassifier;
pub use gate::{evaluate_gate, resolve_preset, GateOutcome};
pub use join_index::{JoinDiagnostics, JoinIndex};
