//! Loading, session handling and display for the candidate screener.
//!
//! This crate handles:
//! - Fetching descriptors, view sources and stats through a [`Fetcher`]
//! - Generation-guarded strategy selection
//! - Per-view schemas, filtering and multi-key sorting

pub mod fetch;
pub mod filter;
pub mod loader;
pub mod render;
pub mod schema;
pub mod screener;
pub mod session;
pub mod sorter;

pub use fetch::{Fetcher, FsFetcher, MemoryFetcher};
pub use filter::{filter_records, Searchable};
pub use loader::{Diagnostics, LoadedStrategy, Loader};
pub use render::{render, DisplayOptions};
pub use schema::{build_rows, ColumnSpec, DisplayCell, DisplayRow, ViewKind};
pub use screener::Screener;
pub use session::{LoadTicket, Selector, Session};
pub use sorter::{compare_cells, sort_records, SortValue};
