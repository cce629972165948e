//! TOML-file backed settings store.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use super::{SettingsError, SettingsStore};

type Values = BTreeMap<String, String>;

/// Settings stored as a flat TOML table of strings.
///
/// The file is read on the first `get`/`set` (and created empty if missing).
/// Every `set` rewrites the whole file.
pub struct FileSettings {
    path: PathBuf,
    values: Mutex<Option<Values>>,
}

impl FileSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            values: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<Values>>, SettingsError> {
        self.values
            .lock()
            .map_err(|_| SettingsError::Internal("settings lock poisoned".to_string()))
    }

    fn io_error(&self, source: std::io::Error) -> SettingsError {
        SettingsError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn load(&self) -> Result<Values, SettingsError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Settings file {:?} not found, creating it", self.path);
                std::fs::write(&self.path, "").map_err(|e| self.io_error(e))?;
                String::new()
            }
            Err(e) => return Err(self.io_error(e)),
        };

        toml::from_str(&contents).map_err(|e| SettingsError::Malformed {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    fn save(&self, values: &Values) -> Result<(), SettingsError> {
        let contents = toml::to_string(values).map_err(|e| SettingsError::Malformed {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        // Write to a sibling temp file, then rename over the real one
        let tmp_path = self.path.with_extension("toml.tmp");
        std::fs::write(&tmp_path, contents).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| self.io_error(e))
    }

    /// Returns the loaded map, loading it on first use.
    fn loaded<'a>(&self, slot: &'a mut Option<Values>) -> Result<&'a mut Values, SettingsError> {
        if slot.is_none() {
            *slot = Some(self.load()?);
        }
        match slot {
            Some(values) => Ok(values),
            None => Err(SettingsError::Internal("settings not loaded".to_string())),
        }
    }
}

impl SettingsStore for FileSettings {
    fn get(&self, key: &str) -> Result<Option<String>, SettingsError> {
        let mut guard = self.lock()?;
        let values = self.loaded(&mut guard)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        let mut guard = self.lock()?;
        let values = self.loaded(&mut guard)?;

        // Only keep the new value in memory once it is on disk
        let mut updated = values.clone();
        updated.insert(key.to_string(), value.to_string());
        self.save(&updated)?;
        *values = updated;
        Ok(())
    }
}
