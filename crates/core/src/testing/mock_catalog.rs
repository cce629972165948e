//! Mock catalog store for testing.

use std::collections::BTreeMap;
use std::sync::Mutex;

use super::lock;
use crate::catalog::{CatalogError, CatalogRecord, CatalogSearchQuery, CatalogStore};

/// Mock implementation of the CatalogStore trait.
///
/// Keeps records in memory and can be told to fail the next call.
#[derive(Debug, Default)]
pub struct MockCatalogStore {
    records: Mutex<BTreeMap<i64, CatalogRecord>>,
    persist_calls: Mutex<usize>,
    next_error: Mutex<Option<CatalogError>>,
}

impl MockCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next operation fail with `error`.
    pub fn fail_next(&self, error: CatalogError) {
        *lock(&self.next_error) = Some(error);
    }

    /// Everything stored, ordered by id.
    pub fn persisted(&self) -> Vec<CatalogRecord> {
        lock(&self.records).values().cloned().collect()
    }

    /// Number of `persist` calls, failed ones included.
    pub fn persist_calls(&self) -> usize {
        *lock(&self.persist_calls)
    }

    fn take_error(&self) -> Result<(), CatalogError> {
        match lock(&self.next_error).take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl CatalogStore for MockCatalogStore {
    fn persist(&self, records: &[CatalogRecord]) -> Result<usize, CatalogError> {
        *lock(&self.persist_calls) += 1;
        self.take_error()?;

        let mut stored = lock(&self.records);
        for record in records {
            stored.insert(record.id, record.clone());
        }
        Ok(records.len())
    }

    fn get(&self, id: i64) -> Result<CatalogRecord, CatalogError> {
        self.take_error()?;
        lock(&self.records)
            .get(&id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    fn search(&self, query: &CatalogSearchQuery) -> Result<Vec<CatalogRecord>, CatalogError> {
        self.take_error()?;
        let needle = query.query.to_lowercase();
        Ok(lock(&self.records)
            .values()
            .filter(|r| r.display_name.to_lowercase().contains(&needle))
            .take(query.limit as usize)
            .cloned()
            .collect())
    }

    fn count(&self) -> Result<u64, CatalogError> {
        self.take_error()?;
        Ok(lock(&self.records).len() as u64)
    }
}
