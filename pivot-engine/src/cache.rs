//! FILENAME: pivot-engine/src/cache.rs
//! Pivot Cache - Internal representation used while pivoting.
//!
//! Architecture:
//! - Each distinct column key is stored once and referenced by a `ColumnId`
//! - Row keys are hashed as small vectors of normalized values
//! - Row groups keep member record indices in source order
//!
//! Nothing here outlives a single pivot call.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use pivot_value::{CellError, CellValue};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::definition::ColumnOrder;

// ============================================================================
// VALUE NORMALIZATION
// ============================================================================

/// Index of a distinct column key, in first-appearance order.
pub type ColumnId = u32;

/// A normalized, hashable representation of a `CellValue`.
/// Used as keys for column interning and row grouping.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheValue {
    Empty,
    Number(OrderedFloat),
    Text(String),
    Boolean(bool),
    Error(CellError),
}

impl From<&CellValue> for CacheValue {
    fn from(value: &CellValue) -> Self {
        match value {
            CellValue::Empty => CacheValue::Empty,
            CellValue::Number(n) => CacheValue::Number(OrderedFloat(*n)),
            CellValue::Text(s) => CacheValue::Text(s.clone()),
            CellValue::Boolean(b) => CacheValue::Boolean(*b),
            CellValue::Error(e) => CacheValue::Error(*e),
        }
    }
}

impl From<CellValue> for CacheValue {
    fn from(value: CellValue) -> Self {
        match value {
            CellValue::Text(s) => CacheValue::Text(s),
            other => CacheValue::from(&other),
        }
    }
}

impl From<&CacheValue> for CellValue {
    fn from(value: &CacheValue) -> Self {
        match value {
            CacheValue::Empty => CellValue::Empty,
            CacheValue::Number(n) => CellValue::Number(n.0),
            CacheValue::Text(s) => CellValue::Text(s.clone()),
            CacheValue::Boolean(b) => CellValue::Boolean(*b),
            CacheValue::Error(e) => CellValue::Error(*e),
        }
    }
}

/// Wrapper around f64 that implements Eq and Hash for use as HashMap keys.
/// NaN values are treated as equal to each other, and 0.0 equals -0.0.
#[derive(Debug, Clone, Copy)]
pub struct OrderedFloat(pub f64);

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        if self.0.is_nan() && other.0.is_nan() {
            true
        } else {
            self.0 == other.0
        }
    }
}

impl Eq for OrderedFloat {}

impl Hash for OrderedFloat {
    fn hash<H: Hasher>(&self, state: &mut H) {
        if self.0.is_nan() {
            // All NaN values hash to the same thing
            u64::MAX.hash(state);
        } else if self.0 == 0.0 {
            0u64.hash(state);
        } else {
            self.0.to_bits().hash(state);
        }
    }
}

/// Comparison used for sorted column order.
/// Empty < numbers < text < booleans < errors.
pub fn compare_cache_values(a: &CacheValue, b: &CacheValue) -> Ordering {
    match (a, b) {
        (CacheValue::Empty, CacheValue::Empty) => Ordering::Equal,
        (CacheValue::Empty, _) => Ordering::Less,
        (_, CacheValue::Empty) => Ordering::Greater,

        (CacheValue::Number(na), CacheValue::Number(nb)) => na.0.total_cmp(&nb.0),
        (CacheValue::Number(_), _) => Ordering::Less,
        (_, CacheValue::Number(_)) => Ordering::Greater,

        (CacheValue::Text(ta), CacheValue::Text(tb)) => ta.cmp(tb),
        (CacheValue::Text(_), _) => Ordering::Less,
        (_, CacheValue::Text(_)) => Ordering::Greater,

        (CacheValue::Boolean(ba), CacheValue::Boolean(bb)) => ba.cmp(bb),
        (CacheValue::Boolean(_), _) => Ordering::Less,
        (_, CacheValue::Boolean(_)) => Ordering::Greater,

        (CacheValue::Error(ea), CacheValue::Error(eb)) => {
            ea.to_string().cmp(&eb.to_string())
        }
    }
}

// ============================================================================
// COLUMN KEY CACHE
// ============================================================================

/// Distinct column keys of one pivot.
/// Stores each non-empty key once; empty keys are never interned.
#[derive(Debug, Clone, Default)]
pub struct ColumnKeyCache {
    /// Map from value to its ID (for deduplication during build).
    value_to_id: FxHashMap<CacheValue, ColumnId>,

    /// Distinct values indexed by ColumnId (first-appearance order).
    id_to_value: Vec<CacheValue>,

    /// Number of interned lookups that hit an empty key.
    empty_hits: usize,
}

impl ColumnKeyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a value and returns its ColumnId.
    /// Returns None for an empty key: it has no column.
    pub fn intern(&mut self, value: CacheValue) -> Option<ColumnId> {
        if let CacheValue::Empty = value {
            self.empty_hits += 1;
            return None;
        }

        if let Some(&id) = self.value_to_id.get(&value) {
            return Some(id);
        }

        let id = self.id_to_value.len() as ColumnId;
        self.id_to_value.push(value.clone());
        self.value_to_id.insert(value, id);
        Some(id)
    }

    /// Looks up an existing key without interning it.
    pub fn lookup(&self, value: &CacheValue) -> Option<ColumnId> {
        self.value_to_id.get(value).copied()
    }

    pub fn get_value(&self, id: ColumnId) -> Option<&CacheValue> {
        self.id_to_value.get(id as usize)
    }

    /// Number of distinct non-empty keys.
    pub fn unique_count(&self) -> usize {
        self.id_to_value.len()
    }

    /// How many records had an empty column key.
    pub fn empty_count(&self) -> usize {
        self.empty_hits
    }

    /// Returns all ColumnIds in the requested output order.
    pub fn ordered_ids(&self, order: ColumnOrder) -> Vec<ColumnId> {
        let mut ids: Vec<ColumnId> = (0..self.id_to_value.len() as ColumnId).collect();
        match order {
            ColumnOrder::DataSourceOrder => {}
            ColumnOrder::Ascending => ids.sort_by(|&a, &b| self.compare_ids(a, b)),
            ColumnOrder::Descending => ids.sort_by(|&a, &b| self.compare_ids(b, a)),
        }
        ids
    }

    fn compare_ids(&self, a: ColumnId, b: ColumnId) -> Ordering {
        compare_cache_values(&self.id_to_value[a as usize], &self.id_to_value[b as usize])
    }
}

// ============================================================================
// ROW GROUPING
// ============================================================================

/// Normalized row key. Most keys have few fields, so they stay inline.
pub type RowKeyValues = SmallVec<[CacheValue; 4]>;

/// One output row in the making: the key and the records that share it.
#[derive(Debug, Clone)]
pub struct RowGroup {
    /// Key values as produced by the row accessors, one per field.
    pub key: Vec<CellValue>,

    /// Indices of member records in the source, ascending.
    pub members: Vec<usize>,
}

/// Row groups in first-encounter order.
#[derive(Debug, Clone, Default)]
pub struct RowGroups {
    index: FxHashMap<RowKeyValues, usize>,
    groups: Vec<RowGroup>,
}

impl RowGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record to the group for `key`, creating it if needed.
    pub fn add(&mut self, key: Vec<CellValue>, record_index: usize) {
        let normalized: RowKeyValues = key.iter().map(CacheValue::from).collect();

        if let Some(&group_idx) = self.index.get(&normalized) {
            self.groups[group_idx].members.push(record_index);
            return;
        }

        self.index.insert(normalized, self.groups.len());
        self.groups.push(RowGroup {
            key,
            members: vec![record_index],
        });
    }

    /// Finds the group whose key equals `key`.
    pub fn find(&self, key: &[CellValue]) -> Option<&RowGroup> {
        let normalized: RowKeyValues = key.iter().map(CacheValue::from).collect();
        self.index.get(&normalized).map(|&i| &self.groups[i])
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RowGroup> {
        self.groups.iter()
    }
}
