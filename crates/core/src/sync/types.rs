//! Types for catalog synchronization.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::fetcher::FetchError;
use crate::listing::ListingError;
use crate::settings::SettingsError;

/// Where a synchronization run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    #[default]
    Idle,
    ReadingWatermark,
    Paginating,
    Persisting,
    AdvancingWatermark,
    Done,
    Failed,
}

impl SyncState {
    /// Terminal states end a run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SyncState::Done | SyncState::Failed)
    }
}

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Watermark the run started from.
    pub previous_watermark: NaiveDate,
    /// Watermark written at the end of the run.
    pub new_watermark: NaiveDate,
    /// Page count reported by the listing index.
    pub total_pages: u32,
    /// Pages whose records were collected.
    pub pages_processed: u32,
    /// Page at which the freshness cutoff stopped the walk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cutoff_page: Option<u32>,
    /// Listing entries skipped as malformed.
    pub skipped_entries: usize,
    /// Records written to the catalog.
    pub records_persisted: usize,
}

/// Broad classification of a run failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The remote listing could not be reached.
    Connectivity,
    /// Page count, page date or a stored value could not be parsed.
    Parse,
    /// The catalog could not be written.
    Storage,
    /// The settings file could not be accessed.
    Io,
    /// Another run was still in progress.
    Busy,
}

/// Errors that abort a synchronization run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Listing error: {0}")]
    Listing(#[from] ListingError),

    #[error("Catalog error: {0}")]
    Storage(#[from] CatalogError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("A synchronization run is already in progress")]
    AlreadyRunning,
}

impl SyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::Listing(ListingError::Fetch(FetchError::Json { .. })) => ErrorKind::Parse,
            SyncError::Listing(ListingError::Fetch(_)) => ErrorKind::Connectivity,
            SyncError::Listing(_) => ErrorKind::Parse,
            SyncError::Storage(_) => ErrorKind::Storage,
            SyncError::Settings(SettingsError::Malformed { .. }) => ErrorKind::Parse,
            SyncError::Settings(_) => ErrorKind::Io,
            SyncError::AlreadyRunning => ErrorKind::Busy,
        }
    }
}
