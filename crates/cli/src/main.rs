//! Candidate screener command-line front end.
//!
//! **Usage:**
//! ```bash
//! screener --root ./site list
//! screener --root ./site show --strategy swing --view edge --gate standard
//! ```
//!
//! Results go to stdout as JSON; logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use screener_core::{Cell, Config, GateMode, SortDirection, SortSpec};
use screener_pipeline::{DisplayOptions, DisplayRow, FsFetcher, Screener, ViewKind};
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Screen strategy candidates against ranking stats
#[derive(Parser, Debug)]
#[command(name = "screener", version)]
struct Cli {
    /// Data root holding the manifest and strategy files
    #[arg(long, env = "SCREENER_ROOT", default_value = ".")]
    root: PathBuf,

    /// TOML configuration file
    #[arg(long, env = "SCREENER_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List strategies in the manifest
    List,
    /// List gate presets
    Presets,
    /// Render one view of a strategy
    Show(ShowArgs),
}

#[derive(clap::Args, Debug)]
struct ShowArgs {
    /// Strategy id (default: first manifest entry)
    #[arg(long, short)]
    strategy: Option<String>,

    /// View: active, edge, trade_plan or position_plan
    #[arg(long, default_value = "active")]
    view: String,

    /// Case-insensitive symbol or universe filter
    #[arg(long, short)]
    query: Option<String>,

    /// Primary sort key (default from config)
    #[arg(long)]
    sort: Option<String>,

    /// Sort the --sort key descending
    #[arg(long, requires = "sort")]
    desc: bool,

    /// Flip the primary sort direction
    #[arg(long)]
    reverse: bool,

    /// Gate preset name
    #[arg(long)]
    gate: Option<String>,

    /// Keep gate-failing rows and list their reasons
    #[arg(long)]
    annotate: bool,

    /// Include load diagnostics in the output
    #[arg(long)]
    diagnostics: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("screener=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load(path).with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };
    let screener = Screener::new(FsFetcher::new(&cli.root), config);

    let output = match &cli.command {
        Command::List => {
            let manifest = screener.manifest().await.context("loading manifest")?;
            serde_json::to_value(&manifest.strategies)?
        }
        Command::Presets => {
            let gates = &screener.config().gates;
            let presets: Vec<_> = gates
                .preset_names()
                .iter()
                .filter_map(|name| gates.preset(name))
                .collect();
            json!({ "default": gates.default_preset, "presets": presets })
        }
        Command::Show(args) => show(&screener, args).await?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn show(screener: &Screener<FsFetcher>, args: &ShowArgs) -> Result<Value> {
    let view = ViewKind::from_key(&args.view).with_context(|| {
        let known: Vec<_> = ViewKind::ALL.iter().map(|v| v.key()).collect();
        format!("unknown view {:?}, expected one of {}", args.view, known.join(", "))
    })?;

    let manifest = screener.manifest().await.context("loading manifest")?;
    let entry = match &args.strategy {
        Some(id) => manifest
            .find(id)
            .with_context(|| format!("strategy {:?} not in manifest", id))?,
        None => manifest
            .strategies
            .first()
            .context("manifest lists no strategies")?,
    };

    let loaded = screener
        .select(entry)
        .await
        .with_context(|| format!("loading strategy {}", entry.id))?
        .context("selection superseded")?;

    let options = display_options(screener.config(), args);
    let rows = screener.render(view, &options).unwrap_or_default();
    info!(strategy = %entry.id, view = %view, rows = rows.len(), "rendered");

    let mut output = json!({
        "session": loaded.session,
        "view": view,
        "label": view.label(),
        "rows": rows.iter().map(row_json).collect::<Vec<_>>(),
    });
    if args.diagnostics {
        output["diagnostics"] = serde_json::to_value(&loaded.diagnostics)?;
    }
    Ok(output)
}

fn display_options(config: &Config, args: &ShowArgs) -> DisplayOptions {
    let mut options = DisplayOptions::from_config(&config.display);
    options.query = args.query.clone();
    options.gate = args.gate.clone();
    if let Some(key) = &args.sort {
        options.sort = SortSpec {
            key: key.clone(),
            direction: if args.desc {
                SortDirection::Desc
            } else {
                SortDirection::Asc
            },
        };
    }
    if args.reverse {
        options.sort.direction = options.sort.direction.flipped();
    }
    if args.annotate {
        options.gate_mode = GateMode::Annotate;
    }
    options
}

fn row_json(row: &DisplayRow) -> Value {
    let mut object: Map<String, Value> = row
        .cells
        .iter()
        .map(|cell| (cell.key.to_string(), cell_json(&cell.value)))
        .collect();
    if !row.gate.pass {
        object.insert("gate".to_string(), json!(row.gate.reasons));
    }
    Value::Object(object)
}

/// JSON has no infinity; an unbounded profit factor prints as "inf".
fn cell_json(cell: &Cell) -> Value {
    match cell {
        Cell::Number(n) if n.is_infinite() => {
            Value::String(if *n > 0.0 { "inf" } else { "-inf" }.to_string())
        }
        Cell::Number(n) => json!(n),
        Cell::Text(s) => Value::String(s.clone()),
        Cell::Null => Value::Null,
    }
}
