//! Input ingestion and normalization for the candidate screener.
//!
//! This crate handles:
//! - Delimited text parsing into typed cells
//! - Column aliasing onto canonical candidate and stats records
//! - Manifest, strategy descriptor and archive snapshot documents

pub mod documents;
pub mod normalizer;
pub mod table;

pub use documents::{ArchiveSnapshot, DescriptorPaths, Manifest, ManifestEntry, StrategyDescriptor};
pub use normalizer::{normalize_candidate, normalize_json_candidate, normalize_stats};
pub use table::{parse_table, Row, Table, TableParser};
