// src/config.rs

//! Application configuration structures.
//!
//! Built once at startup and passed explicitly to each component; there is
//! no global configuration lookup.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Listing page selectors for record extraction
    #[serde(default)]
    pub selectors: ListingSelectors,

    /// Text normalization and frequency extraction settings
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Persistent storage settings
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.start_url.trim().is_empty() {
            return Err(AppError::validation("crawler.start_url is empty"));
        }
        if self.crawler.user_agents.is_empty() {
            return Err(AppError::validation("crawler.user_agents is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(AppError::validation("crawler.max_concurrent must be > 0"));
        }
        if self.selectors.entry.trim().is_empty() {
            return Err(AppError::validation("selectors.entry is empty"));
        }
        if self.analysis.limit_results == 0 {
            return Err(AppError::validation("analysis.limit_results must be > 0"));
        }
        if self.analysis.window_days == 0 {
            return Err(AppError::validation("analysis.window_days must be > 0"));
        }
        if self.storage.db_path.trim().is_empty() {
            return Err(AppError::validation("storage.db_path is empty"));
        }
        Ok(())
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// Source identifier recorded on every harvested vacancy
    #[serde(default = "defaults::source")]
    pub source: String,

    /// Listing endpoint the crawl starts from
    #[serde(default = "defaults::start_url")]
    pub start_url: String,

    /// Query parameter carrying the category keyword
    #[serde(default = "defaults::category_param")]
    pub category_param: String,

    /// Categories to crawl, separated by " | "
    #[serde(default = "defaults::categories")]
    pub categories: String,

    /// User-Agent pool; one is picked at random per request
    #[serde(default = "defaults::user_agents")]
    pub user_agents: Vec<String>,

    /// Optional proxy pool; one is picked at random per request
    #[serde(default)]
    pub proxies: Vec<String>,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between page fetches in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Maximum categories crawled concurrently
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Retry attempts for a transient fetch failure
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Base backoff delay in milliseconds, doubled per attempt
    #[serde(default = "defaults::retry_base_delay")]
    pub retry_base_delay_ms: u64,

    /// Wall-clock budget for one category's crawl in seconds
    #[serde(default = "defaults::category_deadline")]
    pub category_deadline_secs: u64,

    /// strftime format of the publication timestamp on the page
    #[serde(default = "defaults::date_format")]
    pub date_format: String,

    /// UTC offset of publication timestamps, in seconds
    #[serde(default = "defaults::utc_offset")]
    pub utc_offset_secs: i32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            source: defaults::source(),
            start_url: defaults::start_url(),
            category_param: defaults::category_param(),
            categories: defaults::categories(),
            user_agents: defaults::user_agents(),
            proxies: Vec::new(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
            max_concurrent: defaults::max_concurrent(),
            max_retries: defaults::max_retries(),
            retry_base_delay_ms: defaults::retry_base_delay(),
            category_deadline_secs: defaults::category_deadline(),
            date_format: defaults::date_format(),
            utc_offset_secs: defaults::utc_offset(),
        }
    }
}

impl CrawlerConfig {
    /// Split the configured category string into individual labels.
    pub fn category_list(&self) -> Vec<String> {
        self.categories
            .split(" | ")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// CSS selectors describing the listing page structure.
///
/// All page-structure knowledge lives here so the crawl controller stays
/// source-agnostic. Attribute fields select an element attribute instead of
/// its text content when set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingSelectors {
    /// Selector for one listing entry
    #[serde(default = "defaults::sel_entry")]
    pub entry: String,

    /// Selector for the entry title
    #[serde(default = "defaults::sel_title")]
    pub title: String,

    /// Selector for the link element; `href` is resolved against the page URL
    #[serde(default = "defaults::sel_link")]
    pub link: String,

    /// Selector for the description element
    #[serde(default = "defaults::sel_description")]
    pub description: String,

    /// Attribute holding the full description text, if any
    #[serde(default = "defaults::sel_description_attr")]
    pub description_attr: Option<String>,

    /// Selector for the company name
    #[serde(default = "defaults::sel_company")]
    pub company: String,

    /// Selector for the location string
    #[serde(default = "defaults::sel_location")]
    pub location: String,

    /// Selector for job-info spans scanned for years of experience
    #[serde(default = "defaults::sel_job_info")]
    pub job_info: String,

    /// Selector for the publication timestamp element
    #[serde(default = "defaults::sel_published")]
    pub published: String,

    /// Attribute holding the publication timestamp, if any
    #[serde(default = "defaults::sel_published_attr")]
    pub published_attr: Option<String>,

    /// Selector for view/application counters (first two matches, in order)
    #[serde(default = "defaults::sel_stats")]
    pub stats: String,

    /// Attribute holding the counter text, if any
    #[serde(default = "defaults::sel_stats_attr")]
    pub stats_attr: Option<String>,

    /// Selector for pagination controls; the last match's link is followed
    #[serde(default = "defaults::sel_next_page")]
    pub next_page: String,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            entry: defaults::sel_entry(),
            title: defaults::sel_title(),
            link: defaults::sel_link(),
            description: defaults::sel_description(),
            description_attr: defaults::sel_description_attr(),
            company: defaults::sel_company(),
            location: defaults::sel_location(),
            job_info: defaults::sel_job_info(),
            published: defaults::sel_published(),
            published_attr: defaults::sel_published_attr(),
            stats: defaults::sel_stats(),
            stats_attr: defaults::sel_stats_attr(),
            next_page: defaults::sel_next_page(),
        }
    }
}

/// Text normalization and frequency extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// JSON files holding stopword arrays, merged at load time
    #[serde(default)]
    pub stopword_files: Vec<String>,

    /// Markup/noise substrings removed case-insensitively
    #[serde(default = "defaults::noise_patterns")]
    pub noise_patterns: Vec<String>,

    /// Additional noise substrings supplied per run
    #[serde(default)]
    pub extra_filters: Vec<String>,

    /// Unicode ranges (inclusive) stripped before tokenization
    #[serde(default = "defaults::strip_ranges")]
    pub strip_ranges: Vec<(u32, u32)>,

    /// Maximum entries in a frequency distribution
    #[serde(default = "defaults::limit_results")]
    pub limit_results: usize,

    /// Analysis window length in days, ending now
    #[serde(default = "defaults::window_days")]
    pub window_days: i64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            stopword_files: Vec::new(),
            noise_patterns: defaults::noise_patterns(),
            extra_filters: Vec::new(),
            strip_ranges: defaults::strip_ranges(),
            limit_results: defaults::limit_results(),
            window_days: defaults::window_days(),
        }
    }
}

/// Persistent storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(default = "defaults::db_path")]
    pub db_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: defaults::db_path(),
        }
    }
}

mod defaults {
    // Crawler defaults
    pub fn source() -> String {
        "djinni".into()
    }
    pub fn start_url() -> String {
        "https://djinni.co/jobs/".into()
    }
    pub fn category_param() -> String {
        "primary_keyword".into()
    }
    pub fn categories() -> String {
        "Python".into()
    }
    pub fn user_agents() -> Vec<String> {
        vec![
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".into(),
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36".into(),
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36".into(),
        ]
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        100
    }
    pub fn max_concurrent() -> usize {
        4
    }
    pub fn max_retries() -> u32 {
        3
    }
    pub fn retry_base_delay() -> u64 {
        500
    }
    pub fn category_deadline() -> u64 {
        900
    }
    pub fn date_format() -> String {
        "%H:%M %d.%m.%Y".into()
    }
    pub fn utc_offset() -> i32 {
        // Europe/Kyiv standard offset
        2 * 3600
    }

    // Listing selector defaults
    pub fn sel_entry() -> String {
        "ul .list-jobs__item".into()
    }
    pub fn sel_title() -> String {
        "a.job-list-item__link".into()
    }
    pub fn sel_link() -> String {
        "a.job-list-item__link".into()
    }
    pub fn sel_description() -> String {
        ".job-list-item__description span".into()
    }
    pub fn sel_description_attr() -> Option<String> {
        Some("data-original-text".into())
    }
    pub fn sel_company() -> String {
        "header a.mr-2".into()
    }
    pub fn sel_location() -> String {
        ".location-text".into()
    }
    pub fn sel_job_info() -> String {
        ".job-list-item__job-info span".into()
    }
    pub fn sel_published() -> String {
        "span.text-muted span.mr-2.nobr".into()
    }
    pub fn sel_published_attr() -> Option<String> {
        Some("title".into())
    }
    pub fn sel_stats() -> String {
        "span.text-muted span.nobr .mr-2".into()
    }
    pub fn sel_stats_attr() -> Option<String> {
        Some("title".into())
    }
    pub fn sel_next_page() -> String {
        ".pagination li a".into()
    }

    // Analysis defaults
    pub fn noise_patterns() -> Vec<String> {
        vec![
            "<br>".into(),
            "<b>".into(),
            "</b>".into(),
            "\u{2022} ".into(),
            "- ".into(),
        ]
    }
    pub fn strip_ranges() -> Vec<(u32, u32)> {
        // Cyrillic and Cyrillic Supplement blocks
        vec![(0x0400, 0x04FF), (0x0500, 0x052F)]
    }
    pub fn limit_results() -> usize {
        20
    }
    pub fn window_days() -> i64 {
        30
    }

    // Storage defaults
    pub fn db_path() -> String {
        "data/techtrend.sqlite".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_start_url() {
        let mut config = Config::default();
        config.crawler.start_url = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.crawler.max_concurrent = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_window() {
        let mut config = Config::default();
        config.analysis.window_days = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn category_list_splits_on_pipe() {
        let mut config = CrawlerConfig::default();
        config.categories = "C# / .NET | Python".to_string();
        assert_eq!(config.category_list(), vec!["C# / .NET", "Python"]);
    }

    #[test]
    fn category_list_skips_empty_segments() {
        let mut config = CrawlerConfig::default();
        config.categories = "Python |  | Rust".to_string();
        assert_eq!(config.category_list(), vec!["Python", "Rust"]);
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = Config::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.crawler.start_url, config.crawler.start_url);
        assert_eq!(parsed.analysis.limit_results, config.analysis.limit_results);
    }
}
