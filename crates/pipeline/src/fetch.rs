//! Text resource fetching.
//!
//! The loader only ever needs "give me the text at this path". Filesystem
//! and in-memory sources implement the same trait so the pipeline can be
//! driven from disk, a test fixture, or anything else that yields text.

use screener_core::{Error, Result};
use std::collections::HashMap;
use std::future::Future;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Async source of text resources addressed by relative path.
pub trait Fetcher: Send + Sync {
    fn fetch_text(&self, path: &str) -> impl Future<Output = Result<String>> + Send;
}

/// Reads resources from a directory tree.
#[derive(Debug, Clone)]
pub struct FsFetcher {
    root: PathBuf,
}

impl FsFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path.trim());
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || relative.as_os_str().is_empty() {
            return Err(Error::fetch(path, "path must stay inside the data root"));
        }
        Ok(self.root.join(relative))
    }
}

impl Fetcher for FsFetcher {
    async fn fetch_text(&self, path: &str) -> Result<String> {
        let full = self.resolve(path)?;
        debug!(path = %full.display(), "reading");
        tokio::fs::read_to_string(&full)
            .await
            .map_err(|e| Error::fetch(path, e))
    }
}

/// In-memory resources, shared between clones.
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher {
    files: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a resource.
    pub fn insert(&self, path: impl Into<String>, text: impl Into<String>) {
        if let Ok(mut files) = self.files.write() {
            files.insert(path.into(), text.into());
        }
    }

    pub fn with(self, path: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }

    pub fn remove(&self, path: &str) {
        if let Ok(mut files) = self.files.write() {
            files.remove(path);
        }
    }

    fn get(&self, path: &str) -> Result<String> {
        let files = self
            .files
            .read()
            .map_err(|_| Error::fetch(path, "resource table poisoned"))?;
        files
            .get(path)
            .cloned()
            .ok_or_else(|| Error::fetch(path, "not found"))
    }
}

impl Fetcher for MemoryFetcher {
    async fn fetch_text(&self, path: &str) -> Result<String> {
        self.get(path)
    }
}
