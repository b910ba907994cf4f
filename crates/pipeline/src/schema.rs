//! Declarative per-view column schemas.
//!
//! Each view is an ordered list of columns; one generic function turns
//! records into display rows from that list.

use screener_core::{CandidateRecord, Cell, GatePreset, Hold, QualityBand};
use screener_ranking::{evaluate_gate, BandClassifier, GateOutcome};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Views exposed by an archive snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    #[serde(rename = "active")]
    ActiveCandidates,
    #[serde(rename = "edge")]
    EdgeCandidates,
    TradePlan,
    PositionPlan,
}

impl ViewKind {
    pub const ALL: [ViewKind; 4] = [
        ViewKind::ActiveCandidates,
        ViewKind::EdgeCandidates,
        ViewKind::TradePlan,
        ViewKind::PositionPlan,
    ];

    /// Stable key used in descriptors and on the command line.
    pub fn key(self) -> &'static str {
        match self {
            ViewKind::ActiveCandidates => "active",
            ViewKind::EdgeCandidates => "edge",
            ViewKind::TradePlan => "trade_plan",
            ViewKind::PositionPlan => "position_plan",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.key() == key.trim())
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewKind::ActiveCandidates => "Active candidates",
            ViewKind::EdgeCandidates => "Edge candidates",
            ViewKind::TradePlan => "Trade plan",
            ViewKind::PositionPlan => "Position plan",
        }
    }

    /// Archive locations tried in order for this view's rows.
    pub fn archive_paths(self) -> &'static [&'static str] {
        match self {
            ViewKind::ActiveCandidates => &["candidates.active", "active_candidates", "active"],
            ViewKind::EdgeCandidates => &["candidates.edge", "edge_candidates", "edge"],
            ViewKind::TradePlan => &["plans.trade", "trade_plan"],
            ViewKind::PositionPlan => &["plans.position", "position_plan"],
        }
    }

    /// Whether records of this view get ranking stats attached.
    pub fn is_enrichable(self) -> bool {
        !matches!(self, ViewKind::PositionPlan)
    }

    /// Columns shown for this view, in order.
    pub fn schema(self) -> &'static [ColumnSpec] {
        match self {
            ViewKind::ActiveCandidates => ACTIVE_COLUMNS,
            ViewKind::EdgeCandidates => EDGE_COLUMNS,
            ViewKind::TradePlan => TRADE_PLAN_COLUMNS,
            ViewKind::PositionPlan => POSITION_PLAN_COLUMNS,
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One display column.
#[derive(Clone, Copy)]
pub struct ColumnSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub numeric: bool,
    pub derive: fn(&CandidateRecord, QualityBand) -> Cell,
}

impl fmt::Debug for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnSpec")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("numeric", &self.numeric)
            .finish()
    }
}

const fn column(
    key: &'static str,
    label: &'static str,
    numeric: bool,
    derive: fn(&CandidateRecord, QualityBand) -> Cell,
) -> ColumnSpec {
    ColumnSpec {
        key,
        label,
        numeric,
        derive,
    }
}

const SYMBOL: ColumnSpec = column("symbol", "Symbol", false, |r, _| Cell::Text(r.symbol.clone()));
const UNIVERSE: ColumnSpec = column("universe", "Universe", false, |r, _| Cell::Text(r.universe.clone()));
const BUY: ColumnSpec = column("buy", "Buy", true, |r, _| r.buy.into());
const SL: ColumnSpec = column("sl", "SL", true, |r, _| r.sl.into());
const TP: ColumnSpec = column("tp", "TP", true, |r, _| r.tp.into());
const RR: ColumnSpec = column("rr", "R:R", true, |r, _| r.rr.into());
const HOLD: ColumnSpec = column("hold", "Hold", true, |r, _| match r.hold {
    Some(Hold::Bars(n)) => Cell::Number(f64::from(n)),
    Some(days) => Cell::Text(days.to_string()),
    None => Cell::Null,
});
const SHARES: ColumnSpec = column("shares", "Shares", true, |r, _| r.shares.map(|s| s as f64).into());
const RISK_USD: ColumnSpec = column("risk_usd", "Risk $", true, |r, _| r.risk_usd.into());
const FEE_USD: ColumnSpec = column("fee_usd", "Fee $", true, |r, _| r.fee_usd.into());
const TRADES: ColumnSpec = column("trades", "Trades", true, |r, _| {
    r.stats.as_ref().and_then(|s| s.trades).map(f64::from).into()
});
const SCORE: ColumnSpec = column("score", "Score", true, |r, _| r.stats.as_ref().and_then(|s| s.score).into());
const MEAN_R: ColumnSpec = column("meanR", "Mean R", true, |r, _| r.stats.as_ref().and_then(|s| s.mean_r).into());
const PF: ColumnSpec = column("pf", "PF", true, |r, _| r.stats.as_ref().and_then(|s| s.pf).into());
const BAND: ColumnSpec = column("band", "Quality", false, |_, band| match band {
    QualityBand::Na => Cell::Null,
    other => Cell::Text(other.as_str().to_string()),
});

const ACTIVE_COLUMNS: &[ColumnSpec] = &[SYMBOL, UNIVERSE, BUY, SL, TP, RR, HOLD, TRADES, SCORE, MEAN_R, PF, BAND];
const EDGE_COLUMNS: &[ColumnSpec] = &[SYMBOL, UNIVERSE, BUY, RR, TRADES, SCORE, MEAN_R, PF, BAND];
const TRADE_PLAN_COLUMNS: &[ColumnSpec] = &[SYMBOL, UNIVERSE, BUY, SL, TP, SHARES, RISK_USD, FEE_USD, RR, SCORE, BAND];
const POSITION_PLAN_COLUMNS: &[ColumnSpec] = &[SYMBOL, UNIVERSE, BUY, SL, TP, SHARES, RISK_USD, HOLD];

/// Every known column, for keys a view does not display.
const ALL_COLUMNS: &[ColumnSpec] = &[
    SYMBOL, UNIVERSE, BUY, SL, TP, RR, HOLD, SHARES, RISK_USD, FEE_USD, TRADES, SCORE, MEAN_R, PF, BAND,
];

/// Column definition by key across all views.
pub fn column_by_key(key: &str) -> Option<&'static ColumnSpec> {
    ALL_COLUMNS.iter().find(|c| c.key == key)
}

/// A derived cell in a display row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayCell {
    pub key: &'static str,
    pub value: Cell,
}

/// A record prepared for display: schema cells plus classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayRow {
    pub record: CandidateRecord,
    pub band: QualityBand,
    pub gate: GateOutcome,
    pub cells: Vec<DisplayCell>,
}

impl DisplayRow {
    /// Value used to order rows by `key`.
    ///
    /// The band orders by rank rather than label; keys outside the view's
    /// schema fall back to the shared column table.
    pub fn sort_value(&self, key: &str) -> Cell {
        if key == BAND.key {
            return match self.band {
                QualityBand::Na => Cell::Null,
                band => Cell::Number(band as u8 as f64),
            };
        }
        if let Some(cell) = self.cells.iter().find(|c| c.key == key) {
            return cell.value.clone();
        }
        column_by_key(key)
            .map(|c| (c.derive)(&self.record, self.band))
            .unwrap_or(Cell::Null)
    }
}

/// Classify, gate and derive schema cells for each record, preserving order.
pub fn build_rows(
    view: ViewKind,
    records: &[CandidateRecord],
    classifier: &BandClassifier,
    preset: &GatePreset,
) -> Vec<DisplayRow> {
    let schema = view.schema();
    // Unenriched views carry no stats to gate on.
    let preset = view.is_enrichable().then_some(preset);
    records
        .iter()
        .map(|record| {
            let band = classifier.classify_record(record);
            let cells = schema
                .iter()
                .map(|col| DisplayCell {
                    key: col.key,
                    value: (col.derive)(record, band),
                })
                .collect();
            DisplayRow {
                record: record.clone(),
                band,
                gate: evaluate_gate(record, preset),
                cells,
            }
        })
        .collect()
}
