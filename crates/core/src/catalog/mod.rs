//! Beatmap set catalog - the local mirror of the remote listing.
//!
//! One row per beatmap set, keyed by the set id. Writes are upserts, so
//! re-applying the same records is harmless.

mod sqlite;
mod types;

pub use sqlite::SqliteCatalog;
pub use types::*;

/// Trait for beatmap set catalog storage.
pub trait CatalogStore: Send + Sync {
    /// Insert or replace `records`, in order, committing every `batch_size`
    /// records.
    ///
    /// A failing batch is rolled back but batches committed before it stay.
    /// Returns the number of records written.
    fn persist(&self, records: &[CatalogRecord]) -> Result<usize, CatalogError>;

    /// Get a beatmap set by id.
    fn get(&self, id: i64) -> Result<CatalogRecord, CatalogError>;

    /// Search beatmap sets whose name contains `query`.
    fn search(&self, query: &CatalogSearchQuery) -> Result<Vec<CatalogRecord>, CatalogError>;

    /// Number of beatmap sets in the catalog.
    fn count(&self) -> Result<u64, CatalogError>;
}
