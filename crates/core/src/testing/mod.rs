//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the collaborator traits the
//! synchronizer depends on, so runs can be exercised without a network or a
//! real settings file.
//!
//! # Example
//!
//! ```rust,ignore
//! use beatsync_core::testing::{fixtures, MockPageFetcher, MockSettingsStore};
//!
//! let fetcher = Arc::new(MockPageFetcher::new());
//! fetcher.set_index(2);
//! fetcher.set_page(1, fixtures::listing_page("Dec 29, 2014", &[fixtures::entry(100, "A", "Song1")]));
//! ```

mod mock_catalog;
mod mock_fetcher;
mod mock_settings;

pub use mock_catalog::MockCatalogStore;
pub use mock_fetcher::MockPageFetcher;
pub use mock_settings::MockSettingsStore;

use std::sync::{Mutex, MutexGuard};

/// Locks a mock's state, ignoring poisoning from a panicked test thread.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::config::ListingConfig;

    /// Listing configuration pointing at a fake host.
    pub fn listing_config() -> ListingConfig {
        ListingConfig {
            index_url: "http://listing.test/index".to_string(),
            page_url: "http://listing.test/list?page={page}".to_string(),
            ..ListingConfig::default()
        }
    }

    /// URL of listing page `page` under [`listing_config`].
    pub fn page_url(page: u32) -> String {
        listing_config().page_url_for(page)
    }

    /// Index page whose pagination indicator ends in `<total_pages> Next`.
    pub fn index_page(total_pages: u32) -> String {
        let links: Vec<String> = (1..=total_pages.min(3))
            .map(|p| format!(r#"<a href="?page={p}">{p}</a>"#))
            .collect();
        format!(
            r#"<html><body>
<div class="pagination">{} ... <a href="?page={total_pages}">{total_pages}</a> <a href="?page=2">Next</a></div>
</body></html>"#,
            links.join(" ")
        )
    }

    /// One listing entry for beatmap set `id`.
    pub fn entry(id: i64, artist: &str, title: &str) -> String {
        format!(
            r#"<div class="beatmap"><a class="title" href="/s/{id}">{title}</a><span class="artist">{artist}</span></div>"#
        )
    }

    /// Listing page dated `date` containing `entries`.
    pub fn listing_page(date: &str, entries: &[String]) -> String {
        format!(
            r#"<html><body>
<div class="listing"><span class="date">{date}</span>
{}
</div>
</body></html>"#,
            entries.join("\n")
        )
    }
}
