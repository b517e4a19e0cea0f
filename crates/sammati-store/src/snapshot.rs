//! Immutable point-in-time views of consent state.

use sammati_core::{ConsentKey, ConsentRecord};
use std::collections::HashMap;
use std::sync::Arc;

/// An immutable view of the store at one instant.
///
/// Snapshots share the underlying map via `Arc`, so taking one is a single
/// map clone and reading one never takes a lock. The validation engine only
/// ever sees snapshots, which guarantees it cannot observe a record
/// mid-mutation.
#[derive(Debug, Clone)]
pub struct ConsentSnapshot {
    records: Arc<HashMap<ConsentKey, ConsentRecord>>,
}

impl ConsentSnapshot {
    pub(crate) fn new(records: HashMap<ConsentKey, ConsentRecord>) -> Self {
        Self {
            records: Arc::new(records),
        }
    }

    /// Look up the current record for a key.
    #[must_use]
    pub fn get(&self, key: &ConsentKey) -> Option<&ConsentRecord> {
        self.records.get(key)
    }

    /// Number of records in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the snapshot holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over all records.
    pub fn iter(&self) -> impl Iterator<Item = &ConsentRecord> {
        self.records.values()
    }
}
