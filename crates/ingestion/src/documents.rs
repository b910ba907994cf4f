//! Manifest, strategy descriptor and archive snapshot documents.
//!
//! These arrive as JSON from the upstream pipeline. Structural failures (missing
//! required fields, wrong shapes) surface as parse errors quoting a bounded
//! excerpt of the offending text.

use chrono::{DateTime, NaiveDate, Utc};
use screener_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One strategy listed in the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Location of the strategy descriptor.
    pub path: String,
}

/// Available strategies.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Manifest {
    pub strategies: Vec<ManifestEntry>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ManifestWire {
    List(Vec<ManifestEntry>),
    Wrapped { strategies: Vec<ManifestEntry> },
}

impl Manifest {
    /// Parse a manifest: a bare array or `{ "strategies": [...] }`.
    pub fn from_json(text: &str, excerpt_chars: usize) -> Result<Self> {
        let wire: ManifestWire = serde_json::from_str(text)
            .map_err(|e| Error::parse("manifest", e, text, excerpt_chars))?;
        let strategies = match wire {
            ManifestWire::List(list) => list,
            ManifestWire::Wrapped { strategies } => strategies,
        };
        Ok(Self { strategies })
    }

    /// Entry by strategy id.
    pub fn find(&self, id: &str) -> Option<&ManifestEntry> {
        self.strategies.iter().find(|s| s.id == id)
    }
}

/// File locations named by a strategy descriptor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DescriptorPaths {
    /// Per-view delimited files, keyed by view key.
    #[serde(default)]
    pub csv: BTreeMap<String, String>,
    /// Archive snapshot (JSON).
    #[serde(default)]
    pub archive: Option<String>,
    /// Directory holding per-universe stats files.
    pub rankings_dir: String,
}

/// Per-strategy descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyDescriptor {
    #[serde(alias = "strategy", alias = "id")]
    pub strategy_id: String,
    pub as_of: NaiveDate,
    #[serde(default)]
    pub generated: Option<DateTime<Utc>>,
    pub paths: DescriptorPaths,
    /// Universe for view rows that carry none.
    #[serde(default)]
    pub universe: Option<String>,
    /// Appended to the universe name in stats file names.
    #[serde(default)]
    pub trend_suffix: String,
}

impl StrategyDescriptor {
    /// Parse a descriptor.
    pub fn from_json(text: &str, excerpt_chars: usize) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| Error::parse("strategy descriptor", e, text, excerpt_chars))
    }

    /// Stats file for a universe: `{rankings_dir}/{universe}{trend_suffix}.csv`.
    pub fn stats_path(&self, universe: &str) -> String {
        let dir = self.paths.rankings_dir.trim_end_matches('/');
        let file = format!("{}{}.csv", universe, self.trend_suffix);
        if dir.is_empty() {
            file
        } else {
            format!("{}/{}", dir, file)
        }
    }

    /// Universe applied to view rows without one; empty when unset.
    pub fn default_universe(&self) -> &str {
        self.universe.as_deref().map(str::trim).unwrap_or_default()
    }

    /// Delimited file configured for a view, if any.
    pub fn csv_path(&self, view_key: &str) -> Option<&str> {
        self.paths.csv.get(view_key).map(String::as_str)
    }
}

/// Archive snapshot: nested JSON exposing arrays of raw rows per view.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveSnapshot {
    root: serde_json::Value,
}

impl ArchiveSnapshot {
    /// Parse an archive snapshot. The top level must be an object.
    pub fn from_json(text: &str, excerpt_chars: usize) -> Result<Self> {
        let root: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| Error::parse("archive snapshot", e, text, excerpt_chars))?;
        if !root.is_object() {
            return Err(Error::parse(
                "archive snapshot",
                "top level is not an object",
                text,
                excerpt_chars,
            ));
        }
        Ok(Self { root })
    }

    /// Row objects at the first dotted path that resolves to an array.
    ///
    /// Non-object array members are skipped. `None` if no path resolves.
    pub fn rows(
        &self,
        paths: &[&str],
    ) -> Option<Vec<&serde_json::Map<String, serde_json::Value>>> {
        paths.iter().find_map(|path| {
            let array = self.lookup(path)?.as_array()?;
            Some(array.iter().filter_map(|v| v.as_object()).collect())
        })
    }

    fn lookup(&self, dotted: &str) -> Option<&serde_json::Value> {
        dotted
            .split('.')
            .try_fold(&self.root, |node, segment| node.get(segment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIPTOR: &str = r#"{
        "strategy_id": "swing",
        "as_of": "2024-05-03",
        "generated": "2024-05-03T18:30:00Z",
        "paths": {
            "csv": {"active": "swing/active.csv"},
            "archive": "swing/archive.json",
            "rankings_dir": "swing/rankings/"
        },
        "universe": " dax ",
        "trend_suffix": "_trend"
    }"#;

    #[test]
    fn test_manifest_both_shapes() {
        let bare = Manifest::from_json(r#"[{"id":"a","name":"A","path":"a.json"}]"#, 200).unwrap();
        let wrapped =
            Manifest::from_json(r#"{"strategies":[{"id":"a","name":"A","path":"a.json"}]}"#, 200)
                .unwrap();
        assert_eq!(bare, wrapped);
        assert_eq!(bare.find("a").unwrap().path, "a.json");
        assert!(bare.find("b").is_none());
    }

    #[test]
    fn test_descriptor_parse() {
        let d = StrategyDescriptor::from_json(DESCRIPTOR, 200).unwrap();
        assert_eq!(d.strategy_id, "swing");
        assert_eq!(d.as_of, NaiveDate::from_ymd_opt(2024, 5, 3).unwrap());
        assert!(d.generated.is_some());
        assert_eq!(d.stats_path("dax"), "swing/rankings/dax_trend.csv");
        assert_eq!(d.csv_path("active"), Some("swing/active.csv"));
        assert_eq!(d.csv_path("edge"), None);
        assert_eq!(d.default_universe(), "dax");
    }

    #[test]
    fn test_descriptor_strategy_alias() {
        let d = StrategyDescriptor::from_json(
            r#"{"strategy":"x","as_of":"2024-01-02","paths":{"rankings_dir":""}}"#,
            200,
        )
        .unwrap();
        assert_eq!(d.strategy_id, "x");
        assert_eq!(d.trend_suffix, "");
        assert_eq!(d.stats_path("dax"), "dax.csv");
        assert_eq!(d.default_universe(), "");
    }

    #[test]
    fn test_descriptor_missing_field_reports_excerpt() {
        let text = format!(r#"{{"strategy_id":"x","paths":{{"rankings_dir":"r"}},"pad":"{}"}}"#, "z".repeat(400));
        let err = StrategyDescriptor::from_json(&text, 40).unwrap_err();
        match err {
            Error::Parse { what, message, excerpt } => {
                assert_eq!(what, "strategy descriptor");
                assert!(message.contains("as_of"));
                assert_eq!(excerpt.chars().count(), 43);
                assert!(excerpt.starts_with("{\"strategy_id\""));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_archive_rows_by_path() {
        let archive = ArchiveSnapshot::from_json(
            r#"{"candidates": {"active": [{"symbol": "A"}, 3, {"symbol": "B"}]}, "trade_plan": []}"#,
            200,
        )
        .unwrap();
        let rows = archive.rows(&["active_candidates", "candidates.active"]).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(archive.rows(&["trade_plan"]).unwrap().len(), 0);
        assert!(archive.rows(&["position_plan"]).is_none());
    }

    #[test]
    fn test_archive_rejects_non_object() {
        assert!(matches!(
            ArchiveSnapshot::from_json("[1,2]", 200),
            Err(Error::Parse { .. })
        ));
    }
}
