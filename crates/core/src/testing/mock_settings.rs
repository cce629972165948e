//! Mock settings store for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::lock;
use crate::settings::{SettingsError, SettingsStore};

/// In-memory implementation of the SettingsStore trait.
#[derive(Debug, Default)]
pub struct MockSettingsStore {
    values: Mutex<HashMap<String, String>>,
    fail_next: AtomicBool,
}

impl MockSettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `get` or `set` fail with an I/O error.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), SettingsError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(SettingsError::Io {
                path: "mock-settings".into(),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            });
        }
        Ok(())
    }
}

impl SettingsStore for MockSettingsStore {
    fn get(&self, key: &str) -> Result<Option<String>, SettingsError> {
        self.check()?;
        Ok(lock(&self.values).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.check()?;
        lock(&self.values).insert(key.to_string(), value.to_string());
        Ok(())
    }
}
