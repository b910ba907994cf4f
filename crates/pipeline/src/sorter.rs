//! Stable multi-key ordering over heterogeneous cells.
//!
//! Within one key, NA values always sort last and numbers always precede
//! text, whichever the direction. Only comparisons between two numbers or
//! two strings follow the direction. Text compares case-insensitively.

use crate::schema::DisplayRow;
use ordered_float::OrderedFloat;
use screener_core::{Cell, SortDirection, SortSpec};
use std::cmp::Ordering;

/// Something that exposes a comparable value per sort key.
pub trait SortValue {
    fn sort_value(&self, key: &str) -> Cell;
}

impl SortValue for DisplayRow {
    fn sort_value(&self, key: &str) -> Cell {
        DisplayRow::sort_value(self, key)
    }
}

/// Normalized sort key for one cell.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Key {
    Number(OrderedFloat<f64>),
    Text(String),
    Na,
}

impl Key {
    fn from_cell(cell: &Cell) -> Self {
        if cell.is_na() {
            return Key::Na;
        }
        match cell {
            Cell::Number(n) => Key::Number(OrderedFloat(*n)),
            Cell::Text(s) => Key::Text(s.trim().to_lowercase()),
            Cell::Null => Key::Na,
        }
    }
}

fn directed(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

/// Compare two cells under one direction.
pub fn compare_cells(a: &Cell, b: &Cell, direction: SortDirection) -> Ordering {
    compare_keys(&Key::from_cell(a), &Key::from_cell(b), direction)
}

fn compare_keys(a: &Key, b: &Key, direction: SortDirection) -> Ordering {
    match (a, b) {
        (Key::Na, Key::Na) => Ordering::Equal,
        (Key::Na, _) => Ordering::Greater,
        (_, Key::Na) => Ordering::Less,
        (Key::Number(_), Key::Text(_)) => Ordering::Less,
        (Key::Text(_), Key::Number(_)) => Ordering::Greater,
        (Key::Number(x), Key::Number(y)) => directed(x.cmp(y), direction),
        (Key::Text(x), Key::Text(y)) => directed(x.cmp(y), direction),
    }
}

/// Sorted copy of `items` by `primary`, then each tie-break in order.
///
/// The sort is stable: items equal on every key keep their input order.
pub fn sort_records<T: SortValue + Clone>(items: &[T], primary: &SortSpec, tie_breaks: &[SortSpec]) -> Vec<T> {
    let specs: Vec<&SortSpec> = std::iter::once(primary).chain(tie_breaks).collect();

    // Keys are derived once per item rather than once per comparison.
    let keys: Vec<Vec<Key>> = items
        .iter()
        .map(|item| specs.iter().map(|s| Key::from_cell(&item.sort_value(&s.key))).collect())
        .collect();

    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| {
        specs
            .iter()
            .enumerate()
            .map(|(i, spec)| compare_keys(&keys[a][i], &keys[b][i], spec.direction))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    });

    order.into_iter().map(|i| items[i].clone()).collect()
}
