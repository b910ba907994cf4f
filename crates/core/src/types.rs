//! Core data types for the candidate screener.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A typed cell value from delimited or JSON input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// Integer, decimal or scientific-notation literal.
    Number(f64),
    /// Any other non-empty value, trimmed.
    Text(String),
    /// Empty or absent value.
    Null,
}

/// Text values that mean "no value" when sorting.
const NA_SENTINELS: &[&str] = &["na", "n/a", "nan", "null", "none", "-", "\u{2014}"];

impl Cell {
    /// Parse a raw field into a typed cell.
    ///
    /// Empty -> `Null`; numeric literal -> `Number`; otherwise the trimmed text.
    pub fn parse(raw: &str) -> Self {
        let s = raw.trim();
        if s.is_empty() {
            return Cell::Null;
        }
        if is_numeric_literal(s) {
            if let Ok(v) = s.parse::<f64>() {
                return Cell::Number(v);
            }
        }
        Cell::Text(s.to_string())
    }

    /// Like [`Cell::parse`], but also accepts a single comma as decimal separator.
    pub fn parse_locale(raw: &str) -> Self {
        match Cell::parse(raw) {
            Cell::Text(t) if t.matches(',').count() == 1 && !t.contains('.') => {
                let dotted = t.replace(',', ".");
                match Cell::parse(&dotted) {
                    n @ Cell::Number(_) => n,
                    _ => Cell::Text(t),
                }
            }
            other => other,
        }
    }

    /// Convert a JSON scalar into a cell. Arrays and objects become `Null`.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Cell::Null,
            serde_json::Value::Bool(b) => Cell::Text(b.to_string()),
            serde_json::Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Null),
            serde_json::Value::String(s) => Cell::parse(s),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => Cell::Null,
        }
    }

    /// Numeric value, if this is a number.
    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Text value, if this is text.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Whether the cell counts as missing for ordering purposes.
    pub fn is_na(&self) -> bool {
        match self {
            Cell::Null => true,
            Cell::Number(v) => v.is_nan(),
            Cell::Text(s) => {
                let t = s.trim();
                t.is_empty() || NA_SENTINELS.iter().any(|na| t.eq_ignore_ascii_case(na))
            }
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(v) => write!(f, "{}", v),
            Cell::Text(s) => f.write_str(s),
            Cell::Null => Ok(()),
        }
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Number(v)
    }
}

impl From<Option<f64>> for Cell {
    fn from(v: Option<f64>) -> Self {
        v.map(Cell::Number).unwrap_or(Cell::Null)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

/// Match `[+-]?(d+(.d*)?|.d+)([eE][+-]?d+)?` without allocating.
pub fn is_numeric_literal(s: &str) -> bool {
    let b = s.as_bytes();
    let mut i = 0;

    if i < b.len() && (b[i] == b'+' || b[i] == b'-') {
        i += 1;
    }

    let int_start = i;
    while i < b.len() && b[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;

    if i < b.len() && b[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        digits += i - frac_start;
    }
    if digits == 0 {
        return false;
    }

    if i < b.len() && (b[i] == b'e' || b[i] == b'E') {
        i += 1;
        if i < b.len() && (b[i] == b'+' || b[i] == b'-') {
            i += 1;
        }
        let exp_start = i;
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }

    i == b.len()
}

/// Planned holding period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hold {
    /// Number of bars.
    Bars(u32),
    /// Inclusive range of days.
    Days { min: u32, max: u32 },
}

impl fmt::Display for Hold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hold::Bars(n) => write!(f, "{}", n),
            Hold::Days { min, max } if min == max => write!(f, "{}d", min),
            Hold::Days { min, max } => write!(f, "{}-{}d", min, max),
        }
    }
}

/// Risk overlay attached upstream. Carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiskOverlay(pub serde_json::Value);

/// Historical performance statistics for one (universe, symbol).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RankingStats {
    /// Number of backtest trades.
    pub trades: Option<u32>,
    /// Composite ranking score.
    pub score: Option<f64>,
    /// Mean R-multiple per trade.
    #[serde(rename = "meanR")]
    pub mean_r: Option<f64>,
    /// Profit factor. `f64::INFINITY` marks zero losing trades.
    #[serde(default, with = "profit_factor")]
    pub pf: Option<f64>,
}

/// Profit factor wire form: infinity travels as the string `"inf"`.
mod profit_factor {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(pf: &Option<f64>, s: S) -> Result<S::Ok, S::Error> {
        match pf {
            Some(v) if v.is_infinite() && v.is_sign_positive() => s.serialize_str("inf"),
            Some(v) => s.serialize_f64(*v),
            None => s.serialize_none(),
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        Num(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(match Option::<Wire>::deserialize(d)? {
            Some(Wire::Num(v)) => Some(v),
            Some(Wire::Text(t)) => super::parse_profit_factor(&t),
            None => None,
        })
    }
}

/// Parse a profit factor, mapping `inf`-like text to positive infinity.
pub fn parse_profit_factor(raw: &str) -> Option<f64> {
    let t = raw.trim();
    let lowered = t.to_ascii_lowercase();
    match lowered.as_str() {
        "inf" | "+inf" | "infinity" | "+infinity" => Some(f64::INFINITY),
        _ => Cell::parse_locale(t).as_f64(),
    }
}

/// Composite join key: trimmed universe and symbol, compared case-sensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JoinKey {
    pub universe: String,
    pub symbol: String,
}

impl JoinKey {
    pub fn new(universe: &str, symbol: &str) -> Self {
        Self {
            universe: universe.trim().to_string(),
            symbol: symbol.trim().to_string(),
        }
    }
}

impl fmt::Display for JoinKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.universe, self.symbol)
    }
}

/// A prospective trade setup, optionally enriched with ranking stats.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub universe: String,
    pub symbol: String,
    /// Entry price.
    pub buy: Option<f64>,
    /// Stop-loss price.
    pub sl: Option<f64>,
    /// Take-profit price.
    pub tp: Option<f64>,
    /// Reward/risk ratio, explicit or derived from buy/sl/tp.
    pub rr: Option<f64>,
    pub hold: Option<Hold>,
    pub shares: Option<i64>,
    pub risk_usd: Option<f64>,
    pub fee_usd: Option<f64>,
    pub stats: Option<RankingStats>,
    pub overlay: Option<RiskOverlay>,
}

impl CandidateRecord {
    /// Create an empty record for a universe and symbol.
    pub fn new(universe: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            universe: universe.into(),
            symbol: symbol.into(),
            ..Default::default()
        }
    }

    /// Join key for stats lookup.
    pub fn key(&self) -> JoinKey {
        JoinKey::new(&self.universe, &self.symbol)
    }

    /// Reward/risk derived as `(tp - buy) / (buy - sl)`.
    ///
    /// `None` when any input is missing or `buy - sl <= 0`.
    pub fn derive_rr(buy: Option<f64>, sl: Option<f64>, tp: Option<f64>) -> Option<f64> {
        let (buy, sl, tp) = (buy?, sl?, tp?);
        let risk = buy - sl;
        if risk <= 0.0 || !risk.is_finite() {
            return None;
        }
        let rr = (tp - buy) / risk;
        rr.is_finite().then_some(rr)
    }

    /// Copy of this record with `stats` replaced (never merged).
    pub fn with_stats(&self, stats: Option<RankingStats>) -> Self {
        Self {
            stats,
            ..self.clone()
        }
    }
}

/// Presentation-only quality classification, ordered `Na < Red < ... < Strong`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QualityBand {
    Na,
    Red,
    Yellow,
    Green,
    Strong,
}

impl QualityBand {
    pub fn as_str(self) -> &'static str {
        match self {
            QualityBand::Na => "NA",
            QualityBand::Red => "RED",
            QualityBand::Yellow => "YELLOW",
            QualityBand::Green => "GREEN",
            QualityBand::Strong => "STRONG",
        }
    }
}

impl fmt::Display for QualityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name of the preset that imposes no thresholds.
pub const GATE_OFF: &str = "off";

/// Named set of per-metric minimum thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatePreset {
    pub name: String,
    #[serde(default, alias = "tradesMin")]
    pub trades_min: Option<u32>,
    #[serde(default, alias = "scoreMin")]
    pub score_min: Option<f64>,
    #[serde(default, alias = "pfMin")]
    pub pf_min: Option<f64>,
    #[serde(default, alias = "meanRMin")]
    pub mean_r_min: Option<f64>,
}

impl GatePreset {
    /// The always-passing preset.
    pub fn off() -> Self {
        Self {
            name: GATE_OFF.to_string(),
            trades_min: None,
            score_min: None,
            pf_min: None,
            mean_r_min: None,
        }
    }

    /// Whether this preset can never reject a record.
    pub fn is_off(&self) -> bool {
        self.name == GATE_OFF
            || (self.trades_min.is_none()
                && self.score_min.is_none()
                && self.pf_min.is_none()
                && self.mean_r_min.is_none())
    }
}

/// How gate-failing records are presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateMode {
    /// Drop records that fail the gate.
    #[default]
    Hide,
    /// Keep them, carrying the failure reasons.
    Annotate,
}

/// Sort direction for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// A column key with its own direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            direction: SortDirection::Desc,
        }
    }
}
