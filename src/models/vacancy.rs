// src/models/vacancy.rs

//! Vacancy record and its untyped page-side counterpart.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// A job vacancy harvested from a listing page.
///
/// `url` is the uniqueness key: re-ingesting the same URL replaces the
/// stored record in full, never duplicates it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VacancyRecord {
    /// Identifier of the source the record was harvested from
    pub source: String,

    /// Category label the crawl ran under
    pub category: String,

    /// Company name, when the listing exposes one
    pub company_name: Option<String>,

    /// Free-form location string
    pub location: Option<String>,

    /// Vacancy title
    pub title: String,

    /// Free-text description
    pub description: String,

    /// Required years of experience; fractional values allowed
    pub years_of_experience: f64,

    /// Publication timestamp, normalized to UTC
    pub published_at: DateTime<Utc>,

    /// Canonical vacancy URL
    pub url: String,

    /// View counter, when the listing exposes one
    pub views: Option<u64>,

    /// Application counter, when the listing exposes one
    pub applications: Option<u64>,
}

/// Untyped field values scraped from one listing entry.
///
/// Produced by the page parser and converted into a [`VacancyRecord`] at the
/// crawl controller boundary. A missing or malformed required field makes
/// the whole entry invalid; the caller skips it and keeps going.
#[derive(Debug, Clone, Default)]
pub struct RawEntry {
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub company_name: Option<String>,
    pub location: Option<String>,
    pub job_info: Vec<String>,
    pub published: Option<String>,
    pub views: Option<String>,
    pub applications: Option<String>,
}

impl RawEntry {
    /// Validate the raw fields into a typed record.
    ///
    /// `date_format` is the strftime pattern of the page's timestamps and
    /// `utc_offset_secs` the zone they are written in.
    pub fn validate(
        self,
        source: &str,
        category: &str,
        date_format: &str,
        utc_offset_secs: i32,
    ) -> Result<VacancyRecord> {
        let title = non_empty(self.title).ok_or_else(|| AppError::malformed("title"))?;
        let url = non_empty(self.url).ok_or_else(|| AppError::malformed("url"))?;
        url::Url::parse(&url).map_err(|_| AppError::malformed("url"))?;
        let description =
            non_empty(self.description).ok_or_else(|| AppError::malformed("description"))?;

        let published_raw =
            non_empty(self.published).ok_or_else(|| AppError::malformed("published_at"))?;
        let published_at = parse_published(&published_raw, date_format, utc_offset_secs)?;

        Ok(VacancyRecord {
            source: source.to_string(),
            category: category.to_string(),
            company_name: non_empty(self.company_name),
            location: non_empty(self.location),
            title,
            description,
            years_of_experience: extract_years(&self.job_info),
            published_at,
            url,
            views: leading_count(self.views.as_deref()),
            applications: leading_count(self.applications.as_deref()),
        })
    }
}

/// Parse a page timestamp into UTC.
fn parse_published(raw: &str, format: &str, utc_offset_secs: i32) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), format)
        .map_err(|_| AppError::malformed("published_at"))?;
    let offset =
        FixedOffset::east_opt(utc_offset_secs).ok_or_else(|| AppError::malformed("published_at"))?;
    let local = naive
        .and_local_timezone(offset)
        .single()
        .ok_or_else(|| AppError::malformed("published_at"))?;
    Ok(local.with_timezone(&Utc))
}

/// First standalone integer found across the job-info spans, as years.
fn extract_years(job_info: &[String]) -> f64 {
    for info in job_info {
        let mut digits = String::new();
        for ch in info.chars() {
            if ch.is_ascii_digit() {
                digits.push(ch);
            } else if !digits.is_empty() {
                break;
            }
        }
        if let Ok(years) = digits.parse::<f64>() {
            return years;
        }
    }
    0.0
}

/// Leading integer of a counter string like `"128 views"`.
fn leading_count(raw: Option<&str>) -> Option<u64> {
    raw?.split_whitespace().next()?.parse().ok()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
