//! Natural-key to surrogate-key reconciliation.
//!
//! # Responsibility
//! - Build a lookup from a composite natural key to the opaque storage id of
//!   the row currently holding it.
//! - Partition pending values into "update row by id" and "insert new row".
//!
//! # Invariants
//! - A key lands in exactly one of the two batches.
//! - The index is built from one read and never reused across saves.
//! - Duplicate keys in storage resolve to the first row read.

use std::collections::HashMap;
use std::hash::Hash;

/// Natural key → storage id lookup built from one fresh read.
#[derive(Debug, Clone)]
pub struct PersistedIndex<K, Id> {
    ids: HashMap<K, Id>,
    duplicate_rows: usize,
}

impl<K: Eq + Hash, Id> PersistedIndex<K, Id> {
    /// Builds the index from rows using the given key/id projections.
    pub fn build<T, I>(rows: I, key_of: impl Fn(&T) -> K, id_of: impl Fn(&T) -> Id) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let mut ids = HashMap::new();
        let mut duplicate_rows = 0usize;
        for row in rows {
            let key = key_of(&row);
            if ids.contains_key(&key) {
                duplicate_rows += 1;
                continue;
            }
            ids.insert(key, id_of(&row));
        }
        Self {
            ids,
            duplicate_rows,
        }
    }

    pub fn get(&self, key: &K) -> Option<&Id> {
        self.ids.get(key)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Rows skipped because an earlier row already claimed their key.
    pub fn duplicate_rows(&self) -> usize {
        self.duplicate_rows
    }
}

/// Result of splitting pending values against a `PersistedIndex`.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition<K, V, Id> {
    /// Values whose key already has a backing row.
    pub updates: Vec<(Id, V)>,
    /// Values with no backing row yet.
    pub inserts: Vec<(K, V)>,
}

impl<K, V, Id> Partition<K, V, Id> {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.inserts.is_empty()
    }
}

/// Splits `pending` into updates (key found in `index`) and inserts.
///
/// Input order is preserved inside each batch.
pub fn partition<K, V, Id, I>(pending: I, index: &PersistedIndex<K, Id>) -> Partition<K, V, Id>
where
    K: Eq + Hash,
    Id: Clone,
    I: IntoIterator<Item = (K, V)>,
{
    let mut updates = Vec::new();
    let mut inserts = Vec::new();
    for (key, value) in pending {
        match index.get(&key) {
            Some(id) => updates.push((id.clone(), value)),
            None => inserts.push((key, value)),
        }
    }
    Partition { updates, inserts }
}
