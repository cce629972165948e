//! Remote beatmap listing: pagination, freshness cutoff and record extraction.

mod extractor;
mod freshness;
mod paginator;

pub use extractor::{ExtractedRecords, RecordExtractor};
pub use freshness::{FreshnessParser, MonthDayYearParser};
pub use paginator::{CollectedListing, ListingPaginator};

use thiserror::Error;

use crate::fetcher::FetchError;

/// Errors that abort a listing walk.
#[derive(Debug, Error)]
pub enum ListingError {
    /// A page (or the index) could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The total page count could not be read from the index page.
    #[error("Could not read the number of listing pages from {0:?}")]
    PageCount(String),

    /// A listing page has no usable freshness date.
    #[error("Could not read the date of listing page {page} from {text:?}")]
    Freshness { page: u32, text: String },

    /// A configured CSS selector does not parse.
    #[error("Selector error: {0}")]
    Selector(String),
}
