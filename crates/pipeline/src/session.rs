//! Strategy selection with a generation guard.
//!
//! Every selection bumps a generation counter and hands out a ticket. A load
//! may only publish its result if its ticket is still the latest one, so a
//! slow load for an earlier selection can never overwrite a newer one.

use crate::loader::LoadedStrategy;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Identity of a loaded strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub generation: u64,
    pub strategy_id: String,
    pub name: String,
    pub as_of: NaiveDate,
    pub generated: Option<DateTime<Utc>>,
}

/// Proof of which selection a load belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

impl LoadTicket {
    pub fn generation(self) -> u64 {
        self.0
    }
}

/// Holds the current selection and rejects stale loads.
#[derive(Debug)]
pub struct Selector {
    generation: AtomicU64,
    current: watch::Sender<Option<Arc<LoadedStrategy>>>,
}

impl Default for Selector {
    fn default() -> Self {
        Self::new()
    }
}

impl Selector {
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self {
            generation: AtomicU64::new(0),
            current,
        }
    }

    /// Start a new selection, invalidating every earlier ticket.
    pub fn begin(&self) -> LoadTicket {
        LoadTicket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.0
    }

    /// Publish `loaded` if `ticket` is still current. Stale results are dropped.
    pub fn commit(&self, ticket: LoadTicket, loaded: LoadedStrategy) -> bool {
        let applied = self.current.send_if_modified(|slot| {
            if !self.is_current(ticket) {
                return false;
            }
            *slot = Some(Arc::new(loaded));
            true
        });
        if !applied {
            debug!(
                generation = ticket.0,
                latest = self.generation.load(Ordering::SeqCst),
                "discarding stale load"
            );
        }
        applied
    }

    /// The last committed strategy, if any.
    pub fn current(&self) -> Option<Arc<LoadedStrategy>> {
        self.current.borrow().clone()
    }

    /// Watch committed selections.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<LoadedStrategy>>> {
        self.current.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::Diagnostics;
    use std::collections::BTreeMap;

    fn loaded(id: &str, generation: u64) -> LoadedStrategy {
        LoadedStrategy {
            session: Session {
                generation,
                strategy_id: id.to_string(),
                name: id.to_string(),
                as_of: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                generated: None,
            },
            views: BTreeMap::new(),
            diagnostics: Diagnostics::default(),
        }
    }

    #[test]
    fn test_tickets_increase() {
        let selector = Selector::new();
        let a = selector.begin();
        let b = selector.begin();
        assert!(b.generation() > a.generation());
        assert!(!selector.is_current(a));
        assert!(selector.is_current(b));
    }

    #[test]
    fn test_stale_commit_discarded() {
        let selector = Selector::new();
        let first = selector.begin();
        let second = selector.begin();

        assert!(selector.commit(second, loaded("B", second.generation())));
        assert!(!selector.commit(first, loaded("A", first.generation())));
        assert_eq!(selector.current().unwrap().session.strategy_id, "B");
    }

    #[test]
    fn test_nothing_committed_initially() {
        assert!(Selector::new().current().is_none());
    }

    #[tokio::test]
    async fn test_subscribers_see_commits() {
        let selector = Selector::new();
        let mut rx = selector.subscribe();
        let ticket = selector.begin();
        assert!(selector.commit(ticket, loaded("A", ticket.generation())));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_ref().unwrap().session.strategy_id, "A");
    }
}
