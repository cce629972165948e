//! Synchronization controller.
//!
//! Drives one run through the state machine:
//! `Idle -> ReadingWatermark -> Paginating -> Persisting -> AdvancingWatermark -> Done`,
//! with any failure ending in `Failed`. Everything runs sequentially on the
//! caller's task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{Local, NaiveDate};
use tracing::{debug, error, info, warn};

use super::types::{SyncError, SyncReport, SyncState};
use super::watermark::{read_watermark, write_watermark};
use crate::catalog::CatalogStore;
use crate::listing::ListingPaginator;
use crate::settings::SettingsStore;

type Clock = Box<dyn Fn() -> NaiveDate + Send + Sync>;

/// Ends a run: a run dropped midway is marked failed, then the running flag
/// is cleared.
struct RunGuard<'a>(&'a SyncController);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        let state = self.0.state();
        if !state.is_terminal() {
            warn!("Catalog update dropped while {:?}, watermark unchanged", state);
            self.0.transition(SyncState::Failed);
        }
        self.0.running.store(false, Ordering::SeqCst);
    }
}

/// Orchestrates watermark, listing and catalog into an incremental update.
pub struct SyncController {
    paginator: ListingPaginator,
    catalog: Arc<dyn CatalogStore>,
    settings: Arc<dyn SettingsStore>,
    today: Clock,
    state: Mutex<SyncState>,
    running: AtomicBool,
}

impl SyncController {
    pub fn new(
        paginator: ListingPaginator,
        catalog: Arc<dyn CatalogStore>,
        settings: Arc<dyn SettingsStore>,
    ) -> Self {
        Self {
            paginator,
            catalog,
            settings,
            today: Box::new(|| Local::now().date_naive()),
            state: Mutex::new(SyncState::Idle),
            running: AtomicBool::new(false),
        }
    }

    /// Override the source of "today" used for the new watermark.
    pub fn with_clock(mut self, today: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.today = Box::new(today);
        self
    }

    /// Current (or last reached) state.
    pub fn state(&self) -> SyncState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn transition(&self, next: SyncState) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        debug!("Sync state {:?} -> {:?}", *state, next);
        *state = next;
    }

    /// Run one incremental update of the catalog.
    ///
    /// Failures are logged and returned; the watermark only moves when the
    /// whole run succeeded. Only one run per controller may be active.
    pub async fn update(&self) -> Result<SyncReport, SyncError> {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Catalog update already running, ignoring request");
            return Err(SyncError::AlreadyRunning);
        }
        let _guard = RunGuard(self);

        info!("Starting catalog update");
        let result = self.run().await;

        match &result {
            Ok(report) => info!(
                "Catalog update finished: {} records from {} pages, watermark {} -> {}",
                report.records_persisted,
                report.pages_processed,
                report.previous_watermark,
                report.new_watermark
            ),
            Err(e) => {
                let failed_in = self.state();
                self.transition(SyncState::Failed);
                error!(
                    "Catalog update failed while {:?} ({:?} error): {}",
                    failed_in,
                    e.kind(),
                    e
                );
            }
        }

        result
    }

    async fn run(&self) -> Result<SyncReport, SyncError> {
        self.transition(SyncState::ReadingWatermark);
        let previous_watermark = read_watermark(self.settings.as_ref())?;

        self.transition(SyncState::Paginating);
        let collected = self.paginator.collect(previous_watermark).await?;

        self.transition(SyncState::Persisting);
        let records_persisted = self.catalog.persist(&collected.records)?;

        self.transition(SyncState::AdvancingWatermark);
        // Never move the watermark backwards, even if the clock does
        let new_watermark = previous_watermark.max((self.today)());
        write_watermark(self.settings.as_ref(), new_watermark)?;

        self.transition(SyncState::Done);

        Ok(SyncReport {
            previous_watermark,
            new_watermark,
            total_pages: collected.total_pages,
            pages_processed: collected.pages_processed,
            cutoff_page: collected.cutoff_page,
            skipped_entries: collected.skipped_entries,
            records_persisted,
        })
    }
}
