//! Best-effort file downloader with per-destination deduplication.
//!
//! - At most one download per destination path is in flight at a time; a
//!   second request for a busy path is dropped, not queued
//! - Content is streamed to `<destination>.tmp` and renamed over the
//!   destination only once complete, so readers never see a partial file
//! - Failures are logged and never surface to the caller
//!
//! # Example
//!
//! ```ignore
//! use beatsync_core::downloader::SingleFlightDownloader;
//!
//! let downloader = Arc::new(SingleFlightDownloader::new(&config.downloader)?);
//! downloader.spawn("https://example.com/s/100", "/songs/100.osz");
//! ```

mod error;
mod single_flight;

pub use error::DownloadError;
pub use single_flight::{DownloadOutcome, SingleFlightDownloader};
