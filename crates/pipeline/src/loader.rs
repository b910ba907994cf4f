//! Strategy loading: descriptor, view sources, stats join.
//!
//! Only the descriptor is required. A failed view source leaves that view
//! empty and a failed stats source leaves its universe unenriched; both are
//! recorded in [`Diagnostics`] and the load still succeeds.

use crate::fetch::Fetcher;
use crate::schema::ViewKind;
use crate::session::Session;
use futures::future::join_all;
use screener_core::{CandidateRecord, Config, Error, Result};
use screener_ingestion::{
    normalize_candidate, normalize_json_candidate, ArchiveSnapshot, Manifest, ManifestEntry,
    StrategyDescriptor, TableParser,
};
use screener_ranking::JoinIndex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info, warn};

/// What went wrong or was skipped during a load.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    /// Universes whose stats could not be loaded, sorted.
    pub missing_sources: Vec<String>,
    /// Stats rows joined per universe.
    pub loaded_counts: BTreeMap<String, usize>,
    /// Records per view after normalization.
    pub view_counts: BTreeMap<ViewKind, usize>,
    pub duplicate_keys: usize,
    /// Candidate rows dropped for lacking a symbol.
    pub skipped_rows: usize,
    /// Stats rows dropped for lacking a symbol.
    pub skipped_stats_rows: usize,
    /// Human-readable failures of optional sources.
    pub errors: Vec<String>,
}

/// A fully loaded strategy, ready to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadedStrategy {
    pub session: Session,
    pub views: BTreeMap<ViewKind, Vec<CandidateRecord>>,
    pub diagnostics: Diagnostics,
}

impl LoadedStrategy {
    /// Records of a view; empty if the view had no source.
    pub fn records(&self, view: ViewKind) -> &[CandidateRecord] {
        self.views.get(&view).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Loads manifests and strategies through a [`Fetcher`].
#[derive(Debug, Clone)]
pub struct Loader<F> {
    fetcher: F,
    config: Config,
}

impl<F: Fetcher> Loader<F> {
    pub fn new(fetcher: F, config: Config) -> Self {
        Self { fetcher, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    fn excerpt_chars(&self) -> usize {
        self.config.loader.excerpt_chars
    }

    /// Fetch and parse the manifest at the configured path.
    pub async fn load_manifest(&self) -> Result<Manifest> {
        let path = &self.config.loader.manifest_path;
        let text = self.fetcher.fetch_text(path).await?;
        let manifest = Manifest::from_json(&text, self.excerpt_chars())?;
        debug!(path = %path, strategies = manifest.strategies.len(), "loaded manifest");
        Ok(manifest)
    }

    /// Load one strategy, stamping its session with `generation`.
    pub async fn load(&self, entry: &ManifestEntry, generation: u64) -> Result<LoadedStrategy> {
        let text = self.fetcher.fetch_text(&entry.path).await?;
        let descriptor = StrategyDescriptor::from_json(&text, self.excerpt_chars())?;
        info!(
            strategy = %descriptor.strategy_id,
            as_of = %descriptor.as_of,
            generation,
            "loading strategy"
        );

        let mut diagnostics = Diagnostics::default();
        let raw = self.load_views(&descriptor, &mut diagnostics).await;

        let universes: BTreeSet<String> = raw
            .iter()
            .filter(|(view, _)| view.is_enrichable())
            .flat_map(|(_, records)| records.iter().map(|r| r.universe.trim().to_string()))
            .filter(|u| !u.is_empty())
            .collect();
        let index = self.load_stats(&descriptor, &universes).await;

        let join = index.diagnostics();
        diagnostics.missing_sources = join.missing_sources.clone();
        diagnostics.loaded_counts = join.loaded_counts.clone();
        diagnostics.duplicate_keys = join.duplicate_keys;
        diagnostics.skipped_stats_rows = join.rows_without_symbol;
        diagnostics.errors.extend(
            join.missing_sources
                .iter()
                .map(|u| Error::MissingJoinSource(u.clone()).to_string()),
        );

        let views: BTreeMap<ViewKind, Vec<CandidateRecord>> = raw
            .into_iter()
            .map(|(view, records)| {
                diagnostics.view_counts.insert(view, records.len());
                let records = if view.is_enrichable() {
                    index.enrich(&records)
                } else {
                    records
                };
                (view, records)
            })
            .collect();

        info!(
            strategy = %descriptor.strategy_id,
            joined = index.len(),
            missing = diagnostics.missing_sources.len(),
            errors = diagnostics.errors.len(),
            "strategy loaded"
        );

        let name = if entry.name.trim().is_empty() {
            entry.id.clone()
        } else {
            entry.name.clone()
        };
        Ok(LoadedStrategy {
            session: Session {
                generation,
                strategy_id: descriptor.strategy_id,
                name,
                as_of: descriptor.as_of,
                generated: descriptor.generated,
            },
            views,
            diagnostics,
        })
    }

    async fn load_views(
        &self,
        descriptor: &StrategyDescriptor,
        diagnostics: &mut Diagnostics,
    ) -> Vec<(ViewKind, Vec<CandidateRecord>)> {
        let parser = TableParser::from_config(&self.config.parser);
        let default_universe = descriptor.default_universe();

        let fetches = ViewKind::ALL.into_iter().filter_map(|view| {
            descriptor
                .csv_path(view.key())
                .map(|path| async move { (view, self.fetcher.fetch_text(path).await) })
        });
        let mut delimited: HashMap<ViewKind, Result<String>> = join_all(fetches).await.into_iter().collect();

        let archive = match descriptor.paths.archive.as_deref() {
            Some(path) if ViewKind::ALL.iter().any(|v| !delimited.contains_key(v)) => {
                match self.load_archive(path).await {
                    Ok(archive) => Some(archive),
                    Err(e) => {
                        warn!(path = %path, error = %e, "archive unavailable");
                        diagnostics.errors.push(e.to_string());
                        None
                    }
                }
            }
            _ => None,
        };

        let mut views = Vec::with_capacity(ViewKind::ALL.len());
        for view in ViewKind::ALL {
            let records: Vec<CandidateRecord> = match delimited.remove(&view) {
                Some(Ok(text)) => {
                    let table = parser.parse(&text);
                    if table.is_empty() && !text.trim().is_empty() {
                        debug!(view = %view, "view source parsed to zero rows");
                    }
                    table
                        .rows()
                        .iter()
                        .map(|row| normalize_candidate(row, default_universe))
                        .collect()
                }
                Some(Err(e)) => {
                    warn!(view = %view, error = %e, "view source unavailable");
                    diagnostics.errors.push(format!("{}: {}", view, e));
                    Vec::new()
                }
                None => match archive.as_ref().and_then(|a| a.rows(view.archive_paths())) {
                    Some(rows) => rows
                        .into_iter()
                        .map(|object| normalize_json_candidate(object, default_universe))
                        .collect(),
                    None => {
                        debug!(view = %view, "no source for view");
                        Vec::new()
                    }
                },
            };

            let before = records.len();
            let records: Vec<CandidateRecord> = records.into_iter().filter(|r| !r.symbol.is_empty()).collect();
            diagnostics.skipped_rows += before - records.len();
            views.push((view, records));
        }
        views
    }

    async fn load_archive(&self, path: &str) -> Result<ArchiveSnapshot> {
        let text = self.fetcher.fetch_text(path).await?;
        ArchiveSnapshot::from_json(&text, self.excerpt_chars())
    }

    async fn load_stats(&self, descriptor: &StrategyDescriptor, universes: &BTreeSet<String>) -> JoinIndex {
        let parser = &TableParser::from_config(&self.config.parser);
        let fetches = universes.iter().map(|universe| {
            let path = descriptor.stats_path(universe);
            async move {
                let table = self.fetcher.fetch_text(&path).await.map(|text| parser.parse(&text));
                (universe.as_str(), table)
            }
        });
        JoinIndex::build(join_all(fetches).await)
    }
}
