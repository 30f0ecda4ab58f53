// src/crawler.rs

//! Paginated crawl controller.
//!
//! Drives one category at a time: fetch a listing page, validate its
//! entries into typed records, upsert them, then follow the next-page
//! link. Pages form a lazy stream, finite and not restartable; duplicates
//! across runs are collapsed by the storage layer's URL uniqueness, not by
//! controller-side memory.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{Stream, StreamExt};
use tokio::time::Instant;
use url::Url;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::fetch::PageFetcher;
use crate::models::CrawlCursor;
use crate::parse::{ListingPage, PageParser};
use crate::storage::{SqliteStore, UpsertSummary};

/// Result of crawling one category.
#[derive(Debug, Default)]
pub struct CategoryOutcome {
    /// Category label this outcome belongs to
    pub category: String,
    /// Pages fully processed
    pub pages_visited: usize,
    /// Storage counts for the ingested records
    pub upserts: UpsertSummary,
    /// Entries dropped at validation
    pub skipped_entries: usize,
    /// Why the crawl stopped early, when it did
    pub aborted: Option<String>,
}

/// Crawls paginated listings and feeds records to storage.
pub struct CrawlController {
    config: Arc<Config>,
    fetcher: Arc<dyn PageFetcher>,
    parser: Arc<dyn PageParser>,
    store: Arc<SqliteStore>,
}

impl CrawlController {
    /// Wire a controller to its collaborators.
    pub fn new(
        config: Arc<Config>,
        fetcher: Arc<dyn PageFetcher>,
        parser: Arc<dyn PageParser>,
        store: Arc<SqliteStore>,
    ) -> Self {
        Self {
            config,
            fetcher,
            parser,
            store,
        }
    }

    /// Crawl every page of one category.
    ///
    /// Never fails outright: a fetch that exhausts its retries, or a
    /// storage loss, ends this category and is reported in the outcome
    /// while other categories keep running. Records from completed pages
    /// are always stored before the controller advances, so an abort or
    /// deadline expiry keeps everything already processed.
    pub async fn crawl_category(&self, category: &str) -> CategoryOutcome {
        let mut outcome = CategoryOutcome {
            category: category.to_string(),
            ..CategoryOutcome::default()
        };

        let start_url = match self.start_url(category) {
            Ok(url) => url,
            Err(e) => {
                outcome.aborted = Some(e.to_string());
                return outcome;
            }
        };

        let crawler = &self.config.crawler;
        let deadline = Instant::now() + Duration::from_secs(crawler.category_deadline_secs);
        let delay = Duration::from_millis(crawler.request_delay_ms);

        let pages = self.pages(CrawlCursor::start(category, start_url));
        futures::pin_mut!(pages);

        loop {
            if Instant::now() >= deadline {
                log::warn!(
                    "Deadline reached for category '{}' after {} pages",
                    category,
                    outcome.pages_visited
                );
                break;
            }

            let page = match pages.next().await {
                None => break,
                Some(Ok(page)) => page,
                Some(Err(e)) => {
                    let aborted = AppError::aborted(category, e);
                    log::error!("{}", aborted);
                    outcome.aborted = Some(aborted.to_string());
                    break;
                }
            };

            if let Err(e) = self.ingest_page(category, page, &mut outcome) {
                let aborted = AppError::aborted(category, e);
                log::error!("{}", aborted);
                outcome.aborted = Some(aborted.to_string());
                break;
            }
            outcome.pages_visited += 1;

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        outcome
    }

    /// Lazy stream of listing pages, ending when no next-page link is
    /// discoverable.
    fn pages(
        &self,
        cursor: CrawlCursor,
    ) -> impl Stream<Item = Result<ListingPage>> + '_ {
        futures::stream::try_unfold(Some(cursor), move |state| async move {
            let Some(mut cursor) = state else {
                return Ok(None);
            };
            let body = self.fetch_with_retry(&cursor.page_url).await?;
            let page_url = Url::parse(&cursor.page_url)?;
            let page = self.parser.parse(&body, &page_url)?;

            let next_state = page.next_page.clone().map(|next| {
                cursor.advance(next);
                cursor
            });
            Ok(Some((page, next_state)))
        })
    }

    /// Fetch with bounded retries and exponential backoff on transient
    /// failures; permanent errors surface immediately.
    async fn fetch_with_retry(&self, url: &str) -> Result<String> {
        let crawler = &self.config.crawler;
        let base = Duration::from_millis(crawler.retry_base_delay_ms);
        let mut attempt = 0;

        loop {
            match self.fetcher.fetch(url).await {
                Ok(body) => return Ok(body),
                Err(AppError::Transient(msg)) if attempt < crawler.max_retries => {
                    let delay = backoff_delay(base, attempt);
                    attempt += 1;
                    log::warn!(
                        "Transient failure for {} (attempt {}/{}), retrying in {:.1}s: {}",
                        url,
                        attempt,
                        crawler.max_retries,
                        delay.as_secs_f64(),
                        msg
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Validate a page's entries and upsert the survivors.
    fn ingest_page(
        &self,
        category: &str,
        page: ListingPage,
        outcome: &mut CategoryOutcome,
    ) -> Result<()> {
        let crawler = &self.config.crawler;
        let mut records = Vec::with_capacity(page.entries.len());

        for entry in page.entries {
            match entry.validate(
                &crawler.source,
                category,
                &crawler.date_format,
                crawler.utc_offset_secs,
            ) {
                Ok(record) => records.push(record),
                Err(e) => {
                    outcome.skipped_entries += 1;
                    log::warn!("Skipping entry in category '{}': {}", category, e);
                }
            }
        }

        let summary = self.store.upsert_vacancies(&records)?;
        outcome.upserts.merge(&summary);
        Ok(())
    }

    /// First page URL for a category: the start URL with the category
    /// keyword appended as a query parameter.
    fn start_url(&self, category: &str) -> Result<String> {
        let crawler = &self.config.crawler;
        let mut url = Url::parse(&crawler.start_url)?;
        url.query_pairs_mut()
            .append_pair(&crawler.category_param, category);
        Ok(url.into())
    }
}

/// Exponential backoff: `base * 2^attempt`.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}
