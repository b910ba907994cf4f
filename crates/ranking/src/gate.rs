//! Gate preset resolution and evaluation.
//!
//! A gate checks a record's stats against a preset's minimums in the fixed
//! order trades, score, pf, meanR, so failure reasons read the same on every
//! render. Unknown preset names fail open to "off".

use screener_core::config::GateConfig;
use screener_core::{CandidateRecord, Error, GatePreset, Result};
use serde::Serialize;
use tracing::warn;

/// Result of evaluating one record against one preset.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct GateOutcome {
    pub pass: bool,
    /// Failure reasons, e.g. `"trades < 20"` or `"no pf"`.
    pub reasons: Vec<String>,
}

impl GateOutcome {
    fn passed() -> Self {
        Self {
            pass: true,
            reasons: Vec::new(),
        }
    }
}

/// Look up a preset, reporting unknown names.
pub fn try_resolve_preset(config: &GateConfig, name: &str) -> Result<GatePreset> {
    config
        .preset(name)
        .ok_or_else(|| Error::InvalidGatePreset(name.to_string()))
}

/// Look up a preset; `None` means the configured default. Unknown names give "off".
pub fn resolve_preset(config: &GateConfig, name: Option<&str>) -> GatePreset {
    let name = name.unwrap_or(&config.default_preset);
    try_resolve_preset(config, name).unwrap_or_else(|e| {
        warn!(error = %e, "falling back to gate preset \"off\"");
        GatePreset::off()
    })
}

/// Evaluate a record against a preset. A missing or "off" preset always passes.
pub fn evaluate_gate(record: &CandidateRecord, preset: Option<&GatePreset>) -> GateOutcome {
    let Some(preset) = preset.filter(|p| !p.is_off()) else {
        return GateOutcome::passed();
    };

    let stats = record.stats.as_ref();
    let checks = [
        (
            "trades",
            preset.trades_min.map(f64::from),
            stats.and_then(|s| s.trades).map(f64::from),
        ),
        ("score", preset.score_min, stats.and_then(|s| s.score)),
        ("pf", preset.pf_min, stats.and_then(|s| s.pf)),
        ("meanR", preset.mean_r_min, stats.and_then(|s| s.mean_r)),
    ];

    let reasons: Vec<String> = checks
        .iter()
        .filter_map(|(metric, min, value)| {
            let min = (*min)?;
            match value.filter(|v| !v.is_nan()) {
                None => Some(format!("no {}", metric)),
                Some(v) if v < min => Some(format!("{} < {}", metric, min)),
                Some(_) => None,
            }
        })
        .collect();

    GateOutcome {
        pass: reasons.is_empty(),
        reasons,
    }
}
