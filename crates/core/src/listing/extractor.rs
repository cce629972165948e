//! Markup extraction for listing pages.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::{debug, warn};

use super::ListingError;
use crate::catalog::CatalogRecord;
use crate::config::ListingSelectors;

static TRAILING_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)$").expect("trailing id pattern is valid"));

static LAST_PAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*Next$").expect("last page pattern is valid"));

/// Records extracted from one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedRecords {
    /// Records in document order.
    pub records: Vec<CatalogRecord>,
    /// Entries skipped because they were malformed.
    pub skipped: usize,
}

/// Why a single listing entry was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
enum EntrySkip {
    #[error("no title element")]
    MissingTitle,
    #[error("title has no link")]
    MissingHref,
    #[error("no id at the end of {0:?}")]
    NoTrailingId(String),
    #[error("id {0} out of range")]
    IdOutOfRange(String),
    #[error("set {0} has no artist element")]
    MissingArtist(i64),
}

fn parse_selector(kind: &str, selector: &str) -> Result<Selector, ListingError> {
    Selector::parse(selector)
        .map_err(|e| ListingError::Selector(format!("invalid {} selector {:?}: {}", kind, selector, e)))
}

/// Whitespace-normalized text content of an element.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extracts catalog records from listing page markup.
///
/// Extraction is best effort: an entry without a numeric id, a title or an
/// artist is logged and skipped, the rest of the page is still returned.
#[derive(Debug, Clone)]
pub struct RecordExtractor {
    pagination: Selector,
    entry: Selector,
    title: Selector,
    artist: Selector,
    date: Selector,
}

impl RecordExtractor {
    /// Compile the configured selectors.
    pub fn new(selectors: &ListingSelectors) -> Result<Self, ListingError> {
        Ok(Self {
            pagination: parse_selector("pagination", &selectors.pagination)?,
            entry: parse_selector("entry", &selectors.entry)?,
            title: parse_selector("title", &selectors.title)?,
            artist: parse_selector("artist", &selectors.artist)?,
            date: parse_selector("date", &selectors.date)?,
        })
    }

    /// Extract all records from a page's markup.
    pub fn extract(&self, markup: &str) -> ExtractedRecords {
        let document = Html::parse_document(markup);
        self.extract_from(&document)
    }

    pub(crate) fn extract_from(&self, document: &Html) -> ExtractedRecords {
        let mut extracted = ExtractedRecords::default();

        for (index, entry) in document.select(&self.entry).enumerate() {
            match self.extract_entry(entry) {
                Ok(record) => extracted.records.push(record),
                Err(skip) => {
                    warn!("Skipping listing entry {}: {}", index, skip);
                    extracted.skipped += 1;
                }
            }
        }

        debug!(
            "Extracted {} records ({} skipped)",
            extracted.records.len(),
            extracted.skipped
        );
        extracted
    }

    fn extract_entry(&self, entry: ElementRef<'_>) -> Result<CatalogRecord, EntrySkip> {
        let title = entry
            .select(&self.title)
            .next()
            .ok_or(EntrySkip::MissingTitle)?;
        let href = title.value().attr("href").ok_or(EntrySkip::MissingHref)?;

        let digits = TRAILING_ID
            .captures(href.trim())
            .and_then(|caps| caps.get(1))
            .ok_or_else(|| EntrySkip::NoTrailingId(href.to_string()))?
            .as_str();
        let id: i64 = digits
            .parse()
            .map_err(|_| EntrySkip::IdOutOfRange(digits.to_string()))?;

        let artist = entry
            .select(&self.artist)
            .next()
            .map(element_text)
            .ok_or(EntrySkip::MissingArtist(id))?;

        Ok(CatalogRecord::new(id, &artist, &element_text(title)))
    }

    /// Text of the first date element on the page, if any.
    pub(crate) fn freshness_text(&self, document: &Html) -> Option<String> {
        document.select(&self.date).next().map(element_text)
    }

    /// Total page count from the index page's pagination indicator.
    ///
    /// The indicator reads like `1 2 3 ... 1523 Next`; the number right before
    /// the trailing `Next` is the last page.
    pub fn page_count(&self, markup: &str) -> Result<u32, ListingError> {
        let document = Html::parse_document(markup);
        let text = document
            .select(&self.pagination)
            .next()
            .map(element_text)
            .ok_or_else(|| ListingError::PageCount("no pagination element".to_string()))?;

        let count: Option<u32> = LAST_PAGE
            .captures(&text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok());
        count.ok_or(ListingError::PageCount(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    fn extractor() -> RecordExtractor {
        RecordExtractor::new(&ListingSelectors::default()).unwrap()
    }

    #[test]
    fn test_extract_entries_in_document_order() {
        let markup = fixtures::listing_page(
            "Dec 29, 2014",
            &[
                fixtures::entry(100, "Artist A", "Song One"),
                fixtures::entry(7, "Artist B", "Song Two"),
            ],
        );

        let extracted = extractor().extract(&markup);
        assert_eq!(extracted.skipped, 0);
        assert_eq!(
            extracted.records,
            vec![
                CatalogRecord::new(100, "Artist A", "Song One"),
                CatalogRecord::new(7, "Artist B", "Song Two"),
            ]
        );
        assert_eq!(extracted.records[0].display_name, "Artist A - Song One");
    }

    #[test]
    fn test_extract_skips_entry_without_trailing_id() {
        let markup = fixtures::listing_page(
            "Dec 29, 2014",
            &[
                r#"<div class="beatmap"><a class="title" href="/s/abc">Broken</a><span class="artist">X</span></div>"#
                    .to_string(),
                fixtures::entry(5, "Artist", "Fine"),
            ],
        );

        let extracted = extractor().extract(&markup);
        assert_eq!(extracted.skipped, 1);
        assert_eq!(extracted.records.len(), 1);
        assert_eq!(extracted.records[0].id, 5);
    }

    #[test]
    fn test_extract_skips_entry_without_title_or_artist() {
        let markup = fixtures::listing_page(
            "Dec 29, 2014",
            &[
                r#"<div class="beatmap"><span class="artist">No Title</span></div>"#.to_string(),
                r#"<div class="beatmap"><a class="title" href="/s/9">No Artist</a></div>"#
                    .to_string(),
                r#"<div class="beatmap"><a class="title">No Href</a><span class="artist">A</span></div>"#
                    .to_string(),
            ],
        );

        let extracted = extractor().extract(&markup);
        assert_eq!(extracted.skipped, 3);
        assert!(extracted.records.is_empty());
    }

    #[test]
    fn test_extract_skips_id_overflow() {
        let markup = fixtures::listing_page(
            "Dec 29, 2014",
            &[r#"<div class="beatmap"><a class="title" href="/s/99999999999999999999999">Big</a><span class="artist">A</span></div>"#.to_string()],
        );

        let extracted = extractor().extract(&markup);
        assert_eq!(extracted.skipped, 1);
    }

    #[test]
    fn test_extract_keeps_duplicate_ids() {
        let markup = fixtures::listing_page(
            "Dec 29, 2014",
            &[
                fixtures::entry(1, "A", "First"),
                fixtures::entry(1, "A", "Second"),
            ],
        );

        let extracted = extractor().extract(&markup);
        assert_eq!(extracted.records.len(), 2);
    }

    #[test]
    fn test_extract_normalizes_whitespace() {
        let markup = fixtures::listing_page(
            "Dec 29, 2014",
            &[r#"<div class="beatmap"><a class="title" href="/s/3">  Long
                 Title </a><span class="artist"> The <b>Band</b> </span></div>"#
                .to_string()],
        );

        let extracted = extractor().extract(&markup);
        assert_eq!(extracted.records[0].display_name, "The Band - Long Title");
    }

    #[test]
    fn test_page_count() {
        let markup = fixtures::index_page(1523);
        assert_eq!(extractor().page_count(&markup).unwrap(), 1523);
    }

    #[test]
    fn test_page_count_without_next_marker() {
        let markup = r#"<html><body><div class="pagination">1 2 3</div></body></html>"#;
        assert!(matches!(
            extractor().page_count(markup),
            Err(ListingError::PageCount(_))
        ));
    }

    #[test]
    fn test_page_count_without_pagination() {
        let markup = "<html><body><p>maintenance</p></body></html>";
        assert!(matches!(
            extractor().page_count(markup),
            Err(ListingError::PageCount(_))
        ));
    }

    #[test]
    fn test_invalid_selector() {
        let selectors = ListingSelectors {
            entry: "div[".to_string(),
            ..ListingSelectors::default()
        };
        assert!(matches!(
            RecordExtractor::new(&selectors),
            Err(ListingError::Selector(_))
        ));
    }
}
