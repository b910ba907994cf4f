//! Selection controller tying the loader to the generation guard.

use crate::fetch::Fetcher;
use crate::loader::{LoadedStrategy, Loader};
use crate::render::{render, DisplayOptions};
use crate::schema::{DisplayRow, ViewKind};
use crate::session::Selector;
use screener_core::{Config, Result};
use screener_ingestion::{Manifest, ManifestEntry};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Loads strategies on selection and renders the current one.
#[derive(Debug)]
pub struct Screener<F> {
    loader: Loader<F>,
    selector: Selector,
}

impl<F: Fetcher> Screener<F> {
    pub fn new(fetcher: F, config: Config) -> Self {
        Self {
            loader: Loader::new(fetcher, config),
            selector: Selector::new(),
        }
    }

    pub fn config(&self) -> &Config {
        self.loader.config()
    }

    pub async fn manifest(&self) -> Result<Manifest> {
        self.loader.load_manifest().await
    }

    /// Select a strategy and load it.
    ///
    /// Returns `Ok(None)` when a newer selection started while this one was
    /// loading; its result (or error) is then dropped.
    pub async fn select(&self, entry: &ManifestEntry) -> Result<Option<Arc<LoadedStrategy>>> {
        let ticket = self.selector.begin();
        let outcome = self.loader.load(entry, ticket.generation()).await;

        if !self.selector.is_current(ticket) {
            debug!(strategy = %entry.id, generation = ticket.generation(), "selection superseded");
            return Ok(None);
        }
        let loaded = outcome?;
        if self.selector.commit(ticket, loaded) {
            Ok(self.selector.current())
        } else {
            Ok(None)
        }
    }

    /// The committed strategy, if any.
    pub fn current(&self) -> Option<Arc<LoadedStrategy>> {
        self.selector.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<LoadedStrategy>>> {
        self.selector.subscribe()
    }

    /// Render a view of the committed strategy.
    pub fn render(&self, view: ViewKind, options: &DisplayOptions) -> Option<Vec<DisplayRow>> {
        let current = self.current()?;
        Some(render(current.records(view), view, options, self.config()))
    }
}
