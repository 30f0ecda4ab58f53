// src/pipeline.rs

//! Orchestration of the ingestion and analysis paths.
//!
//! Ingestion: crawl controller -> storage, one task per category, bounded
//! concurrency. Analysis: storage -> normalizer -> frequency extractor ->
//! storage. Both paths finish with a summary instead of failing on the
//! first per-category problem; only classifier unavailability (or losing
//! the storage connection) aborts a run.

use std::sync::Arc;

use chrono::{Duration, Utc};
use futures::stream::{self, StreamExt};

use crate::analysis::{FrequencyExtractor, TextNormalizer, TokenClassifier, load_stopwords};
use crate::config::Config;
use crate::crawler::CrawlController;
use crate::error::Result;
use crate::fetch::PageFetcher;
use crate::models::StatisticsRecord;
use crate::parse::PageParser;
use crate::storage::{SqliteStore, UpsertSummary};

/// Aggregated result of one ingestion run.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Storage counts across all categories
    pub upserts: UpsertSummary,
    /// Pages fully processed
    pub pages_visited: usize,
    /// Entries dropped at validation
    pub skipped_entries: usize,
    /// Categories that stopped early, with reasons
    pub aborted_categories: Vec<(String, String)>,
}

/// Crawl every configured category concurrently and ingest the records.
pub async fn run_ingestion(
    config: Arc<Config>,
    store: Arc<SqliteStore>,
    fetcher: Arc<dyn PageFetcher>,
    parser: Arc<dyn PageParser>,
) -> RunSummary {
    let categories = config.crawler.category_list();
    let concurrency = config.crawler.max_concurrent.max(1);
    log::info!(
        "Starting ingestion of {} categories (concurrency {})",
        categories.len(),
        concurrency
    );

    let controller = CrawlController::new(Arc::clone(&config), fetcher, parser, store);

    let outcomes: Vec<_> = stream::iter(categories)
        .map(|category| {
            let controller = &controller;
            async move { controller.crawl_category(&category).await }
        })
        .buffer_unordered(concurrency)
        .collect()
        .await;

    let mut summary = RunSummary::default();
    for outcome in outcomes {
        summary.upserts.merge(&outcome.upserts);
        summary.pages_visited += outcome.pages_visited;
        summary.skipped_entries += outcome.skipped_entries;
        if let Some(reason) = outcome.aborted {
            summary.aborted_categories.push((outcome.category, reason));
        }
    }

    log::info!(
        "Ingestion complete: {} inserted, {} replaced, {} failed, {} skipped, {} pages, {} categories aborted",
        summary.upserts.inserted,
        summary.upserts.replaced,
        summary.upserts.failed,
        summary.skipped_entries,
        summary.pages_visited,
        summary.aborted_categories.len()
    );
    for (category, reason) in &summary.aborted_categories {
        log::warn!("Category '{}' aborted: {}", category, reason);
    }

    summary
}

/// Compute and store frequency statistics for every configured category.
///
/// The window is the configured number of days ending now, shared by all
/// categories of the run. All distributions are computed before anything
/// is written, so a classifier failure leaves no partial statistics.
pub fn run_analysis(
    config: &Config,
    store: &SqliteStore,
    classifier: &dyn TokenClassifier,
) -> Result<UpsertSummary> {
    let stopwords = load_stopwords(&config.analysis.stopword_files)?;
    let normalizer = TextNormalizer::new(&config.analysis)?;
    let extractor = FrequencyExtractor::new(stopwords);

    let window_end = Utc::now();
    let window_start = window_end - Duration::days(config.analysis.window_days);
    let limit = config.analysis.limit_results;

    let mut records = Vec::new();
    for category in config.crawler.category_list() {
        let vacancies = store.fetch_range(&category, &window_start, &window_end)?;
        log::info!(
            "Analyzing {} vacancies for category '{}'",
            vacancies.len(),
            category
        );

        let text = vacancies
            .iter()
            .map(|v| v.description.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let cleaned = normalizer.normalize(&text);
        let frequencies = extractor.extract(classifier, &cleaned, limit)?;

        records.push(StatisticsRecord {
            category,
            window_start,
            window_end,
            frequencies,
            computed_at: Utc::now(),
        });
    }

    let summary = store.upsert_statistics(&records)?;
    log::info!(
        "Analysis complete: {} windows inserted, {} replaced, {} failed",
        summary.inserted,
        summary.replaced,
        summary.failed
    );
    Ok(summary)
}

/// Full pipeline: ingestion followed by analysis.
pub async fn run_pipeline(
    config: Arc<Config>,
    store: Arc<SqliteStore>,
    fetcher: Arc<dyn PageFetcher>,
    parser: Arc<dyn PageParser>,
    classifier: &dyn TokenClassifier,
) -> Result<RunSummary> {
    let summary = run_ingestion(
        Arc::clone(&config),
        Arc::clone(&store),
        fetcher,
        parser,
    )
    .await;
    run_analysis(&config, &store, classifier)?;
    Ok(summary)
}
