//! Join index of ranking stats keyed by (universe, symbol).
//!
//! Built from independently loaded per-universe stats sources. A source that
//! failed to load is skipped and recorded; every other universe still lands in
//! the index.

use screener_core::{CandidateRecord, JoinKey, RankingStats, Result};
use screener_ingestion::{normalize_stats, Table};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// What happened while building the index.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JoinDiagnostics {
    /// Universes whose stats source could not be loaded, sorted.
    pub missing_sources: Vec<String>,
    /// Stats rows accepted per universe.
    pub loaded_counts: BTreeMap<String, usize>,
    /// Keys seen more than once within a universe (last row kept).
    pub duplicate_keys: usize,
    /// Rows dropped for lacking a symbol.
    pub rows_without_symbol: usize,
}

/// Lookup of ranking stats by join key.
#[derive(Debug, Clone, Default)]
pub struct JoinIndex {
    entries: HashMap<JoinKey, RankingStats>,
    diagnostics: JoinDiagnostics,
}

impl JoinIndex {
    /// Build an index from `(universe, stats source)` pairs.
    pub fn build<I, U>(sources: I) -> Self
    where
        I: IntoIterator<Item = (U, Result<Table>)>,
        U: Into<String>,
    {
        let mut index = Self::default();

        for (universe, source) in sources {
            let universe = universe.into();
            match source {
                Ok(table) => index.insert_universe(&universe, &table),
                Err(e) => {
                    warn!(universe = %universe, error = %e, "stats source unavailable, skipping");
                    index.diagnostics.missing_sources.push(universe.trim().to_string());
                }
            }
        }

        index.diagnostics.missing_sources.sort();
        index.diagnostics.missing_sources.dedup();

        debug!(
            keys = index.entries.len(),
            missing = index.diagnostics.missing_sources.len(),
            "built join index"
        );
        index
    }

    fn insert_universe(&mut self, universe: &str, table: &Table) {
        let mut accepted = 0usize;

        for row in table.rows() {
            let Some((symbol, stats)) = normalize_stats(row) else {
                self.diagnostics.rows_without_symbol += 1;
                continue;
            };
            let key = JoinKey::new(universe, &symbol);
            if self.entries.insert(key, stats).is_some() {
                // Last parsed row wins.
                warn!(universe = %universe, symbol = %symbol, "duplicate stats row");
                self.diagnostics.duplicate_keys += 1;
            }
            accepted += 1;
        }

        *self
            .diagnostics
            .loaded_counts
            .entry(universe.trim().to_string())
            .or_default() += accepted;
    }

    /// Stats for a key.
    pub fn lookup(&self, key: &JoinKey) -> Option<&RankingStats> {
        self.entries.get(key)
    }

    /// Copies of `records` with `stats` set from this index (or cleared).
    ///
    /// The input is untouched and repeated calls give identical output.
    pub fn enrich(&self, records: &[CandidateRecord]) -> Vec<CandidateRecord> {
        records
            .iter()
            .map(|record| record.with_stats(self.lookup(&record.key()).cloned()))
            .collect()
    }

    pub fn diagnostics(&self) -> &JoinDiagnostics {
        &self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
