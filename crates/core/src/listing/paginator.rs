//! Listing pagination with a freshness cutoff.

use std::sync::Arc;

use chrono::NaiveDate;
use scraper::Html;
use tracing::{debug, info};

use super::extractor::{ExtractedRecords, RecordExtractor};
use super::freshness::{FreshnessParser, MonthDayYearParser};
use super::ListingError;
use crate::catalog::CatalogRecord;
use crate::config::ListingConfig;
use crate::fetcher::PageFetcher;

/// Result of walking the listing down to the watermark.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectedListing {
    /// Records from every processed page, in page then document order.
    pub records: Vec<CatalogRecord>,
    /// Page count reported by the index page.
    pub total_pages: u32,
    /// Pages whose records were extracted.
    pub pages_processed: u32,
    /// First page older than the watermark, if the walk stopped there.
    pub cutoff_page: Option<u32>,
    /// Malformed entries skipped across all processed pages.
    pub skipped_entries: usize,
}

/// Outcome of looking at a single fetched page.
enum PageScan {
    Fresh {
        freshness: NaiveDate,
        extracted: ExtractedRecords,
    },
    Stale(NaiveDate),
}

/// Walks listing pages `1..=N` newest first, stopping at the first page whose
/// freshness predates the watermark.
pub struct ListingPaginator {
    fetcher: Arc<dyn PageFetcher>,
    config: ListingConfig,
    extractor: RecordExtractor,
    freshness: Box<dyn FreshnessParser>,
}

impl ListingPaginator {
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: ListingConfig) -> Result<Self, ListingError> {
        let extractor = RecordExtractor::new(&config.selectors)?;
        Ok(Self {
            fetcher,
            config,
            extractor,
            freshness: Box::new(MonthDayYearParser),
        })
    }

    /// Replace the freshness parsing strategy.
    pub fn with_freshness_parser(mut self, parser: impl FreshnessParser + 'static) -> Self {
        self.freshness = Box::new(parser);
        self
    }

    /// Fetch the index page and read the total number of listing pages.
    pub async fn page_count(&self) -> Result<u32, ListingError> {
        let markup = self.fetcher.fetch_document(&self.config.index_url).await?;
        self.extractor.page_count(&markup)
    }

    /// Collect records from every page at least as fresh as `watermark`.
    ///
    /// Each call starts over from page 1. A page is taken whole or not at all.
    pub async fn collect(&self, watermark: NaiveDate) -> Result<CollectedListing, ListingError> {
        let total_pages = self.page_count().await?;
        info!(
            "Listing has {} pages, collecting entries since {}",
            total_pages, watermark
        );

        let mut collected = CollectedListing {
            total_pages,
            ..CollectedListing::default()
        };

        for page in 1..=total_pages {
            let url = self.config.page_url_for(page);
            let markup = self.fetcher.fetch_document(&url).await?;

            match self.scan_page(page, &markup, watermark)? {
                PageScan::Fresh {
                    freshness,
                    extracted,
                } => {
                    debug!(
                        "Page {}/{} dated {}: {} records",
                        page,
                        total_pages,
                        freshness,
                        extracted.records.len()
                    );
                    collected.pages_processed += 1;
                    collected.skipped_entries += extracted.skipped;
                    collected.records.extend(extracted.records);
                }
                PageScan::Stale(freshness) => {
                    info!(
                        "Page {} dated {} is older than {}, stopping",
                        page, freshness, watermark
                    );
                    collected.cutoff_page = Some(page);
                    break;
                }
            }
        }

        info!(
            "Collected {} records from {} pages",
            collected.records.len(),
            collected.pages_processed
        );
        Ok(collected)
    }

    fn scan_page(
        &self,
        page: u32,
        markup: &str,
        watermark: NaiveDate,
    ) -> Result<PageScan, ListingError> {
        let document = Html::parse_document(markup);

        // The index promised this page, so a page without a date is unreadable
        let text = self
            .extractor
            .freshness_text(&document)
            .ok_or(ListingError::Freshness {
                page,
                text: String::new(),
            })?;

        let freshness = self
            .freshness
            .parse(&text)
            .ok_or(ListingError::Freshness { page, text })?;

        if freshness < watermark {
            return Ok(PageScan::Stale(freshness));
        }

        Ok(PageScan::Fresh {
            freshness,
            extracted: self.extractor.extract_from(&document),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::FetchError;
    use crate::testing::{fixtures, MockPageFetcher};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn paginator(fetcher: &Arc<MockPageFetcher>) -> ListingPaginator {
        ListingPaginator::new(fetcher.clone(), fixtures::listing_config()).unwrap()
    }

    #[tokio::test]
    async fn test_collect_stops_at_first_stale_page() {
        let fetcher = Arc::new(MockPageFetcher::new());
        fetcher.set_index(3);
        fetcher.set_page(
            1,
            fixtures::listing_page("Dec 29, 2014", &[fixtures::entry(100, "A", "Song1")]),
        );
        fetcher.set_page(
            2,
            fixtures::listing_page("Jun 1, 2013", &[fixtures::entry(50, "B", "Old")]),
        );
        fetcher.set_page(
            3,
            fixtures::listing_page("Dec 30, 2014", &[fixtures::entry(1, "C", "Never")]),
        );

        let collected = paginator(&fetcher)
            .collect(date(2014, 1, 1))
            .await
            .unwrap();

        assert_eq!(collected.records, vec![CatalogRecord::new(100, "A", "Song1")]);
        assert_eq!(collected.total_pages, 3);
        assert_eq!(collected.pages_processed, 1);
        assert_eq!(collected.cutoff_page, Some(2));
        // Page 3 is never fetched after the stop
        assert!(!fetcher
            .requested_urls()
            .contains(&fixtures::page_url(3)));
    }

    #[tokio::test]
    async fn test_collect_includes_page_dated_on_watermark() {
        let fetcher = Arc::new(MockPageFetcher::new());
        fetcher.set_index(1);
        fetcher.set_page(
            1,
            fixtures::listing_page("Jan 1, 2014", &[fixtures::entry(9, "A", "Edge")]),
        );

        let collected = paginator(&fetcher)
            .collect(date(2014, 1, 1))
            .await
            .unwrap();

        assert_eq!(collected.records.len(), 1);
        assert_eq!(collected.cutoff_page, None);
    }

    #[tokio::test]
    async fn test_collect_all_pages_when_never_updated() {
        let fetcher = Arc::new(MockPageFetcher::new());
        fetcher.set_index(2);
        fetcher.set_page(
            1,
            fixtures::listing_page(
                "Dec 29, 2014",
                &[fixtures::entry(2, "A", "Two"), fixtures::entry(1, "A", "One")],
            ),
        );
        fetcher.set_page(
            2,
            fixtures::listing_page("Mar 3, 2008", &[fixtures::entry(3, "B", "Three")]),
        );

        let collected = paginator(&fetcher).collect(NaiveDate::MIN).await.unwrap();

        let ids: Vec<i64> = collected.records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
        assert_eq!(collected.pages_processed, 2);
    }

    #[tokio::test]
    async fn test_collect_is_restartable() {
        let fetcher = Arc::new(MockPageFetcher::new());
        fetcher.set_index(1);
        fetcher.set_page(
            1,
            fixtures::listing_page("Dec 29, 2014", &[fixtures::entry(1, "A", "One")]),
        );
        let paginator = paginator(&fetcher);

        let first = paginator.collect(NaiveDate::MIN).await.unwrap();
        let second = paginator.collect(NaiveDate::MIN).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(fetcher.request_count(&fixtures::page_url(1)), 2);
    }

    #[tokio::test]
    async fn test_collect_counts_skipped_entries() {
        let fetcher = Arc::new(MockPageFetcher::new());
        fetcher.set_index(1);
        fetcher.set_page(
            1,
            fixtures::listing_page(
                "Dec 29, 2014",
                &[
                    fixtures::entry(1, "A", "One"),
                    r#"<div class="beatmap"><a class="title" href="/s/">x</a><span class="artist">y</span></div>"#.to_string(),
                ],
            ),
        );

        let collected = paginator(&fetcher).collect(NaiveDate::MIN).await.unwrap();
        assert_eq!(collected.records.len(), 1);
        assert_eq!(collected.skipped_entries, 1);
    }

    #[tokio::test]
    async fn test_collect_compound_freshness() {
        let fetcher = Arc::new(MockPageFetcher::new());
        fetcher.set_index(1);
        fetcher.set_page(
            1,
            fixtures::listing_page(
                "Beatmap Pack #3 | Nov 2, 2014",
                &[fixtures::entry(1, "A", "One")],
            ),
        );

        let collected = paginator(&fetcher)
            .collect(date(2014, 11, 1))
            .await
            .unwrap();
        assert_eq!(collected.records.len(), 1);
    }

    #[tokio::test]
    async fn test_collect_unparseable_freshness_aborts() {
        let fetcher = Arc::new(MockPageFetcher::new());
        fetcher.set_index(1);
        fetcher.set_page(
            1,
            fixtures::listing_page("sometime", &[fixtures::entry(1, "A", "One")]),
        );

        let result = paginator(&fetcher).collect(NaiveDate::MIN).await;
        assert!(matches!(
            result,
            Err(ListingError::Freshness { page: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_collect_missing_freshness_with_entries_aborts() {
        let fetcher = Arc::new(MockPageFetcher::new());
        fetcher.set_index(1);
        fetcher.set_page(
            1,
            format!(
                "<html><body>{}</body></html>",
                fixtures::entry(1, "A", "One")
            ),
        );

        let result = paginator(&fetcher).collect(NaiveDate::MIN).await;
        assert!(matches!(result, Err(ListingError::Freshness { .. })));
    }

    #[tokio::test]
    async fn test_collect_unrecognized_page_aborts() {
        let fetcher = Arc::new(MockPageFetcher::new());
        fetcher.set_index(3);
        fetcher.set_page(
            1,
            r#"<html><body><div class="set"><span class="date2">Jan 5, 2015</span></div></body></html>"#
                .to_string(),
        );

        let result = paginator(&fetcher).collect(NaiveDate::MIN).await;
        assert!(matches!(
            result,
            Err(ListingError::Freshness { page: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_collect_blank_later_page_aborts() {
        let fetcher = Arc::new(MockPageFetcher::new());
        fetcher.set_index(2);
        fetcher.set_page(
            1,
            fixtures::listing_page("Dec 29, 2014", &[fixtures::entry(1, "A", "One")]),
        );
        fetcher.set_page(2, "<html><body></body></html>".to_string());

        let result = paginator(&fetcher).collect(NaiveDate::MIN).await;
        assert!(matches!(
            result,
            Err(ListingError::Freshness { page: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_collect_bad_page_count_aborts() {
        let fetcher = Arc::new(MockPageFetcher::new());
        fetcher.set_document(
            &fixtures::listing_config().index_url,
            "<html><div class=\"pagination\">loading</div></html>".to_string(),
        );

        let result = paginator(&fetcher).collect(NaiveDate::MIN).await;
        assert!(matches!(result, Err(ListingError::PageCount(_))));
    }

    #[tokio::test]
    async fn test_collect_fetch_failure_aborts() {
        let fetcher = Arc::new(MockPageFetcher::new());
        fetcher.set_index(2);
        fetcher.set_page(
            1,
            fixtures::listing_page("Dec 29, 2014", &[fixtures::entry(1, "A", "One")]),
        );
        // Page 2 is not configured: the mock answers 404

        let result = paginator(&fetcher).collect(NaiveDate::MIN).await;
        assert!(matches!(
            result,
            Err(ListingError::Fetch(FetchError::Status { status: 404, .. }))
        ));
    }

    #[tokio::test]
    async fn test_custom_freshness_parser() {
        struct IsoDates;

        impl FreshnessParser for IsoDates {
            fn parse(&self, text: &str) -> Option<NaiveDate> {
                NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
            }
        }

        let fetcher = Arc::new(MockPageFetcher::new());
        fetcher.set_index(1);
        fetcher.set_page(
            1,
            fixtures::listing_page("2014-12-29", &[fixtures::entry(1, "A", "One")]),
        );

        let collected = paginator(&fetcher)
            .with_freshness_parser(IsoDates)
            .collect(date(2014, 12, 1))
            .await
            .unwrap();
        assert_eq!(collected.records.len(), 1);
    }
}
