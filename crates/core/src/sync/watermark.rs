//! Watermark persistence on top of the settings store.

use chrono::NaiveDate;
use tracing::warn;

use crate::settings::{SettingsError, SettingsStore};

/// Settings key holding the date of the last successful run.
pub const WATERMARK_KEY: &str = "last_update";

/// `yyyy-MM-dd`.
pub const WATERMARK_FORMAT: &str = "%Y-%m-%d";

/// Read the watermark; a missing value means "never updated".
///
/// An unreadable stored value is logged and also treated as "never updated",
/// which makes the next run a full (idempotent) resync.
pub fn read_watermark(settings: &dyn SettingsStore) -> Result<NaiveDate, SettingsError> {
    let Some(value) = settings.get(WATERMARK_KEY)? else {
        return Ok(NaiveDate::MIN);
    };

    match NaiveDate::parse_from_str(value.trim(), WATERMARK_FORMAT) {
        Ok(date) => Ok(date),
        Err(e) => {
            warn!(
                "Ignoring unreadable {} value {:?} ({}), resyncing everything",
                WATERMARK_KEY, value, e
            );
            Ok(NaiveDate::MIN)
        }
    }
}

/// Persist `date` as the new watermark.
pub fn write_watermark(settings: &dyn SettingsStore, date: NaiveDate) -> Result<(), SettingsError> {
    settings.set(WATERMARK_KEY, &date.format(WATERMARK_FORMAT).to_string())
}
