// src/lib.rs

//! techtrend: job vacancy harvesting and technology trend mining.
//!
//! Crawls a paginated job board per category, deduplicates vacancies into
//! SQLite keyed on the canonical URL, and mines proper-noun technology
//! term frequencies over a rolling time window.

pub mod analysis;
pub mod config;
pub mod crawler;
pub mod error;
pub mod export;
pub mod fetch;
pub mod models;
pub mod parse;
pub mod pipeline;
pub mod storage;

pub use config::Config;
pub use error::{AppError, Result};
