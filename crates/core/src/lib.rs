pub mod catalog;
pub mod config;
pub mod downloader;
pub mod fetcher;
pub mod listing;
pub mod settings;
pub mod sync;
pub mod testing;

pub use catalog::{
    CatalogError, CatalogRecord, CatalogSearchQuery, CatalogStore, SqliteCatalog,
};
pub use config::{
    load_config, load_config_from_str, validate_config, CatalogConfig, Config, ConfigError,
    DatabaseConfig, DownloaderConfig, ListingConfig, ListingSelectors, SettingsConfig,
};
pub use downloader::{DownloadError, DownloadOutcome, SingleFlightDownloader};
pub use fetcher::{FetchError, HttpPageFetcher, PageFetcher};
pub use listing::{
    CollectedListing, ExtractedRecords, FreshnessParser, ListingError, ListingPaginator,
    MonthDayYearParser, RecordExtractor,
};
pub use settings::{FileSettings, SettingsError, SettingsStore};
pub use sync::{
    read_watermark, write_watermark, ErrorKind, SyncController, SyncError, SyncReport, SyncState,
    WATERMARK_FORMAT, WATERMARK_KEY,
};
