//! Key/value settings persistence.
//!
//! The synchronizer keeps a single value here (the last update date), but the
//! store itself is a general string map that is loaded on first use and written
//! through on every `set`.

mod file;

pub use file::FileSettings;

use std::path::PathBuf;

use thiserror::Error;

/// Errors for settings operations.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Settings file {path:?} is not accessible: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Settings file {path:?} is malformed: {message}")]
    Malformed { path: PathBuf, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Trait for key/value settings storage.
pub trait SettingsStore: Send + Sync {
    /// Get the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, SettingsError>;

    /// Store `value` under `key`, persisting immediately.
    fn set(&self, key: &str, value: &str) -> Result<(), SettingsError>;
}
