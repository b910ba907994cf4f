//! Free-text filtering on symbol or universe.

use crate::schema::DisplayRow;
use screener_core::CandidateRecord;

/// Something that can be matched by a free-text query.
pub trait Searchable {
    fn symbol(&self) -> &str;
    fn universe(&self) -> &str;
}

impl Searchable for CandidateRecord {
    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn universe(&self) -> &str {
        &self.universe
    }
}

impl Searchable for DisplayRow {
    fn symbol(&self) -> &str {
        &self.record.symbol
    }

    fn universe(&self) -> &str {
        &self.record.universe
    }
}

/// Items whose symbol or universe contains `query`, ignoring case.
///
/// An absent or blank query keeps everything. Order is preserved.
pub fn filter_records<T: Searchable + Clone>(items: &[T], query: Option<&str>) -> Vec<T> {
    let needle = query.map(str::trim).unwrap_or_default().to_lowercase();
    if needle.is_empty() {
        return items.to_vec();
    }
    items
        .iter()
        .filter(|item| {
            item.symbol().to_lowercase().contains(&needle) || item.universe().to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}
