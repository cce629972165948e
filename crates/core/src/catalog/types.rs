//! Types for the beatmap set catalog.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One beatmap set as mirrored from the listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    /// Beatmap set id.
    pub id: i64,
    /// "<artist> - <title>".
    pub display_name: String,
}

impl CatalogRecord {
    pub fn new(id: i64, artist: &str, title: &str) -> Self {
        Self {
            id,
            display_name: format!("{} - {}", artist, title),
        }
    }
}

/// Query for searching the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSearchQuery {
    /// Search text (matched against the display name).
    pub query: String,
    /// Maximum results.
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    100
}

/// Errors for catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<rusqlite::Error> for CatalogError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Database(e.to_string())
    }
}
