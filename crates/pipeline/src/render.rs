//! Display pipeline: classify and gate, then filter, then sort.

use crate::filter::filter_records;
use crate::schema::{build_rows, DisplayRow, ViewKind};
use crate::sorter::sort_records;
use screener_core::config::DisplayConfig;
use screener_core::{CandidateRecord, Config, GateMode, SortSpec};
use screener_ranking::{resolve_preset, BandClassifier};
use tracing::debug;

/// Per-render choices made by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayOptions {
    pub query: Option<String>,
    pub sort: SortSpec,
    pub tie_breaks: Vec<SortSpec>,
    /// Gate preset name; `None` uses the configured default.
    pub gate: Option<String>,
    pub gate_mode: GateMode,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self::from_config(&DisplayConfig::default())
    }
}

impl DisplayOptions {
    pub fn from_config(config: &DisplayConfig) -> Self {
        Self {
            query: None,
            sort: config.sort.clone(),
            tie_breaks: config.tie_breaks.clone(),
            gate: None,
            gate_mode: config.gate_mode,
        }
    }
}

/// Rows of `view` ready for display.
pub fn render(
    records: &[CandidateRecord],
    view: ViewKind,
    options: &DisplayOptions,
    config: &Config,
) -> Vec<DisplayRow> {
    let classifier = BandClassifier::from_config(&config.classifier);
    let preset = resolve_preset(&config.gates, options.gate.as_deref());

    let mut rows = build_rows(view, records, &classifier, &preset);
    if options.gate_mode == GateMode::Hide {
        rows.retain(|row| row.gate.pass);
    }
    let rows = filter_records(&rows, options.query.as_deref());
    let rows = sort_records(&rows, &options.sort, &options.tie_breaks);

    debug!(
        view = %view,
        preset = %preset.name,
        input = records.len(),
        shown = rows.len(),
        "rendered view"
    );
    rows
}
