//! Incremental catalog synchronization.
//!
//! A run reads the watermark (the date of the last successful run), walks the
//! listing down to it, upserts what it found and only then moves the
//! watermark forward. A failed run leaves the watermark alone, so the next run
//! covers the same range again.

mod controller;
mod types;
mod watermark;

pub use controller::SyncController;
pub use types::*;
pub use watermark::{read_watermark, write_watermark, WATERMARK_FORMAT, WATERMARK_KEY};
