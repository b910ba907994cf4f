use approx::assert_relative_eq;
use screener_core::{Cell, Config, QualityBand, Result};
use screener_ingestion::ManifestEntry;
use screener_pipeline::{DisplayOptions, Fetcher, FsFetcher, MemoryFetcher, Screener, ViewKind};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Notify;

const MANIFEST: &str = r#"{"strategies": [{"id": "swing", "name": "Swing", "path": "swing/descriptor.json"}]}"#;

const DESCRIPTOR: &str = r#"{
    "strategy_id": "swing",
    "as_of": "2024-05-03",
    "generated": "2024-05-03T18:30:00Z",
    "paths": {
        "csv": {"active": "swing/active.csv"},
        "rankings_dir": "swing/rankings"
    }
}"#;

const ACTIVE: &str = "universe,symbol,buy,sl,tp\ndax,ABC,100,90,130\nftse,XYZ,50,45,60\n";
const DAX_STATS: &str = "symbol,trades,score,mean_R,profit_factor\nABC,30,2.1,0.12,1.4\n";

fn write(root: &Path, path: &str, text: &str) {
    let full = root.join(path);
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(full, text).unwrap();
}

#[tokio::test]
async fn test_load_and_render_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "manifest.json", MANIFEST);
    write(dir.path(), "swing/descriptor.json", DESCRIPTOR);
    write(dir.path(), "swing/active.csv", ACTIVE);
    write(dir.path(), "swing/rankings/dax.csv", DAX_STATS);

    let screener = Screener::new(FsFetcher::new(dir.path()), Config::default());
    let manifest = screener.manifest().await.unwrap();
    let entry = manifest.find("swing").unwrap();

    let loaded = screener.select(entry).await.unwrap().unwrap();
    assert_eq!(loaded.session.name, "Swing");
    // ftse has no stats file; dax still joins.
    assert_eq!(loaded.diagnostics.missing_sources, vec!["ftse".to_string()]);
    assert_eq!(loaded.diagnostics.loaded_counts.get("dax"), Some(&1));

    let rows = screener
        .render(ViewKind::ActiveCandidates, &DisplayOptions::default())
        .unwrap();
    assert_eq!(rows.len(), 2);

    let abc = &rows[0];
    assert_eq!(abc.record.symbol, "ABC");
    assert_relative_eq!(abc.record.rr.unwrap(), 3.0, epsilon = 1e-12);
    assert_eq!(abc.band, QualityBand::Green);
    assert_eq!(abc.sort_value("pf"), Cell::Number(1.4));

    let xyz = &rows[1];
    assert_eq!(xyz.record.symbol, "XYZ");
    assert_relative_eq!(xyz.record.rr.unwrap(), 2.0, epsilon = 1e-12);
    assert!(xyz.record.stats.is_none());
    assert_eq!(xyz.band, QualityBand::Na);

    // Views without a source render empty.
    assert!(screener
        .render(ViewKind::TradePlan, &DisplayOptions::default())
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_render_before_selection() {
    let screener = Screener::new(MemoryFetcher::new(), Config::default());
    assert!(screener.current().is_none());
    assert!(screener
        .render(ViewKind::ActiveCandidates, &DisplayOptions::default())
        .is_none());
}

/// Holds back one path until released.
struct GatedFetcher {
    inner: MemoryFetcher,
    gated: String,
    release: Arc<Notify>,
}

impl Fetcher for GatedFetcher {
    async fn fetch_text(&self, path: &str) -> Result<String> {
        if path == self.gated {
            self.release.notified().await;
        }
        self.inner.fetch_text(path).await
    }
}

fn entry(id: &str) -> ManifestEntry {
    ManifestEntry {
        id: id.to_string(),
        name: id.to_string(),
        path: format!("{id}/descriptor.json"),
    }
}

fn strategy(fetcher: &MemoryFetcher, id: &str) {
    fetcher.insert(
        format!("{id}/descriptor.json"),
        format!(
            r#"{{"strategy_id": "{id}", "as_of": "2024-05-03",
                "paths": {{"csv": {{"active": "{id}/active.csv"}}, "rankings_dir": "{id}"}}}}"#
        ),
    );
    fetcher.insert(format!("{id}/active.csv"), ACTIVE);
    fetcher.insert(format!("{id}/dax.csv"), DAX_STATS);
}

#[tokio::test]
async fn test_stale_selection_is_discarded() {
    let inner = MemoryFetcher::new();
    strategy(&inner, "slow");
    strategy(&inner, "fast");
    let release = Arc::new(Notify::new());
    let fetcher = GatedFetcher {
        inner,
        gated: "slow/descriptor.json".to_string(),
        release: release.clone(),
    };
    let screener = Screener::new(fetcher, Config::default());

    let slow_entry = entry("slow");
    let fast_entry = entry("fast");
    let slow = screener.select(&slow_entry);
    let fast = async {
        let loaded = screener.select(&fast_entry).await;
        release.notify_one();
        loaded
    };
    let (slow, fast) = tokio::join!(slow, fast);

    assert!(slow.unwrap().is_none());
    assert_eq!(fast.unwrap().unwrap().session.strategy_id, "fast");
    let current = screener.current().unwrap();
    assert_eq!(current.session.strategy_id, "fast");
    assert_eq!(current.session.generation, 2);
}

#[tokio::test]
async fn test_failed_selection_keeps_previous() {
    let fetcher = MemoryFetcher::new();
    strategy(&fetcher, "good");
    let screener = Screener::new(fetcher, Config::default());

    screener.select(&entry("good")).await.unwrap();
    assert!(screener.select(&entry("missing")).await.is_err());
    assert_eq!(screener.current().unwrap().session.strategy_id, "good");
}
