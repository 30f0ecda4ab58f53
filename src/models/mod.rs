// src/models/mod.rs

//! Domain data structures.

pub mod cursor;
pub mod statistics;
pub mod vacancy;

pub use cursor::CrawlCursor;
pub use statistics::StatisticsRecord;
pub use vacancy::{RawEntry, VacancyRecord};
