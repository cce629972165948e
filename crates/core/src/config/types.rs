use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub settings: SettingsConfig,
    #[serde(default)]
    pub listing: ListingConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub downloader: DownloaderConfig,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("beatsync.db")
}

/// Key/value settings file configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SettingsConfig {
    #[serde(default = "default_settings_path")]
    pub path: PathBuf,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            path: default_settings_path(),
        }
    }
}

fn default_settings_path() -> PathBuf {
    PathBuf::from("settings.toml")
}

/// Remote beatmap listing configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListingConfig {
    /// Index page carrying the pagination indicator
    #[serde(default = "default_index_url")]
    pub index_url: String,
    /// Listing page URL; `{page}` is replaced with the 1-based page number
    #[serde(default = "default_page_url")]
    pub page_url: String,
    /// Request timeout in seconds (default: 60)
    #[serde(default = "default_listing_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub selectors: ListingSelectors,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            index_url: default_index_url(),
            page_url: default_page_url(),
            timeout_secs: default_listing_timeout(),
            user_agent: default_user_agent(),
            selectors: ListingSelectors::default(),
        }
    }
}

impl ListingConfig {
    /// URL of the given 1-based listing page.
    pub fn page_url_for(&self, page: u32) -> String {
        self.page_url.replace("{page}", &page.to_string())
    }
}

fn default_index_url() -> String {
    "https://osu.ppy.sh/p/beatmaplist".to_string()
}

fn default_page_url() -> String {
    "https://osu.ppy.sh/p/beatmaplist?l=1&r=0&q=&g=0&la=0&s=4&o=1&m=-1&page={page}".to_string()
}

fn default_listing_timeout() -> u64 {
    60
}

fn default_user_agent() -> String {
    format!("beatsync/{}", env!("CARGO_PKG_VERSION"))
}

/// CSS selectors used to scrape listing pages
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ListingSelectors {
    /// Element whose text ends in "<last page> Next"
    #[serde(default = "default_pagination_selector")]
    pub pagination: String,
    /// One listing entry (beatmap set)
    #[serde(default = "default_entry_selector")]
    pub entry: String,
    /// Title link within an entry; its `href` ends in the set id
    #[serde(default = "default_title_selector")]
    pub title: String,
    /// Artist name within an entry
    #[serde(default = "default_artist_selector")]
    pub artist: String,
    /// Date text; the first match on a page is the page freshness
    #[serde(default = "default_date_selector")]
    pub date: String,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            pagination: default_pagination_selector(),
            entry: default_entry_selector(),
            title: default_title_selector(),
            artist: default_artist_selector(),
            date: default_date_selector(),
        }
    }
}

fn default_pagination_selector() -> String {
    ".pagination".to_string()
}

fn default_entry_selector() -> String {
    ".beatmap".to_string()
}

fn default_title_selector() -> String {
    "a.title".to_string()
}

fn default_artist_selector() -> String {
    ".artist".to_string()
}

fn default_date_selector() -> String {
    ".date".to_string()
}

/// Catalog persistence configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// Records committed per transaction (default: 500)
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
        }
    }
}

fn default_batch_size() -> usize {
    500
}

/// File downloader configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DownloaderConfig {
    /// Whole-request timeout in seconds; unbounded when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.database.path, PathBuf::from("beatsync.db"));
        assert_eq!(config.settings.path, PathBuf::from("settings.toml"));
        assert_eq!(config.catalog.batch_size, 500);
        assert_eq!(config.listing.timeout_secs, 60);
        assert!(config.downloader.timeout_secs.is_none());
        assert_eq!(config.listing.selectors, ListingSelectors::default());
    }

    #[test]
    fn test_deserialize_partial_selectors() {
        let toml = r#"
[listing.selectors]
entry = "div.set"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.listing.selectors.entry, "div.set");
        assert_eq!(config.listing.selectors.title, "a.title");
    }

    #[test]
    fn test_page_url_for() {
        let listing = ListingConfig {
            page_url: "http://example.com/list?page={page}".to_string(),
            ..ListingConfig::default()
        };
        assert_eq!(listing.page_url_for(3), "http://example.com/list?page=3");
    }

    #[test]
    fn test_default_page_url_has_placeholder() {
        let listing = ListingConfig::default();
        assert!(listing.page_url_for(7).ends_with("&page=7"));
    }

    #[test]
    fn test_downloader_timeout_not_serialized_when_unset() {
        let json = serde_json::to_string(&DownloaderConfig::default()).unwrap();
        assert!(!json.contains("timeout_secs"));
    }
}
