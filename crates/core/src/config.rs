//! Configuration structures for the candidate screener.
//!
//! Every section has a `Default`, so a TOML file only needs the keys it overrides.

use crate::error::{Error, Result, DEFAULT_EXCERPT_CHARS};
use crate::types::{GateMode, GatePreset, SortSpec, GATE_OFF};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration for the screener.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Quality band configuration.
    pub classifier: ClassifierConfig,
    /// Gate preset configuration.
    pub gates: GateConfig,
    /// Delimited text parsing configuration.
    pub parser: ParserConfig,
    /// Default display ordering and gating.
    pub display: DisplayConfig,
    /// Input location configuration.
    pub loader: LoaderConfig,
}

impl Config {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Reject values no pipeline stage can work with.
    pub fn validate(&self) -> Result<()> {
        let delimiter = self.parser.delimiter;
        if delimiter == '"' || delimiter == '\n' || delimiter == '\r' {
            return Err(Error::config(format!(
                "delimiter {:?} collides with quoting or line breaks",
                delimiter
            )));
        }
        if !delimiter.is_ascii() {
            return Err(Error::config(format!("delimiter {:?} is not ASCII", delimiter)));
        }
        if self.display.sort.key.trim().is_empty() {
            return Err(Error::config("display.sort.key must not be empty"));
        }
        for preset in &self.gates.presets {
            if preset.name.trim().is_empty() {
                return Err(Error::config("gate preset without a name"));
            }
        }
        Ok(())
    }
}

/// Quality band configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Below this many trades a record is NA regardless of score.
    pub min_trades: u32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self { min_trades: 20 }
    }
}

/// Gate preset configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Preset applied when the caller names none.
    pub default_preset: String,
    /// Extra presets; a name matching a built-in replaces it.
    pub presets: Vec<GatePreset>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            default_preset: GATE_OFF.to_string(),
            presets: Vec::new(),
        }
    }
}

impl GateConfig {
    /// Built-in presets.
    pub fn builtin_presets() -> Vec<GatePreset> {
        vec![
            GatePreset::off(),
            GatePreset {
                name: "loose".to_string(),
                trades_min: Some(10),
                score_min: Some(0.5),
                pf_min: None,
                mean_r_min: None,
            },
            GatePreset {
                name: "standard".to_string(),
                trades_min: Some(20),
                score_min: Some(1.0),
                pf_min: Some(1.2),
                mean_r_min: Some(0.05),
            },
            GatePreset {
                name: "strict".to_string(),
                trades_min: Some(30),
                score_min: Some(1.5),
                pf_min: Some(1.5),
                mean_r_min: Some(0.1),
            },
        ]
    }

    /// Look up a preset by name, configured presets first.
    pub fn preset(&self, name: &str) -> Option<GatePreset> {
        let name = name.trim();
        self.presets
            .iter()
            .find(|p| p.name == name)
            .cloned()
            .or_else(|| Self::builtin_presets().into_iter().find(|p| p.name == name))
    }

    /// All preset names, built-ins first, without duplicates.
    pub fn preset_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Self::builtin_presets().into_iter().map(|p| p.name).collect();
        for preset in &self.presets {
            if !names.contains(&preset.name) {
                names.push(preset.name.clone());
            }
        }
        names
    }
}

/// Delimited text parsing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Field delimiter.
    pub delimiter: char,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self { delimiter: ',' }
    }
}

/// Default display ordering and gating.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Primary sort key.
    pub sort: SortSpec,
    /// Keys consulted in order on a primary tie.
    pub tie_breaks: Vec<SortSpec>,
    /// What happens to gate-failing records.
    pub gate_mode: GateMode,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            sort: SortSpec::desc("score"),
            tie_breaks: vec![SortSpec::desc("trades"), SortSpec::asc("symbol")],
            gate_mode: GateMode::Hide,
        }
    }
}

/// Input location configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Manifest path relative to the data root.
    pub manifest_path: String,
    /// Characters of offending input quoted in parse errors.
    pub excerpt_chars: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            manifest_path: "manifest.json".to_string(),
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
        }
    }
}
