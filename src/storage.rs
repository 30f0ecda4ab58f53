// src/storage.rs

//! SQLite-backed persistence for vacancies and statistics.
//!
//! Two collections, each with a server-side uniqueness constraint:
//!
//! - `vacancies`, unique on the canonical URL
//! - `statistics`, unique on `(category, window_start, window_end)`
//!
//! Upserts replace the full row on key conflict, so repeated ingestion of
//! the same input is idempotent. Batch operations report per-record
//! failures in a summary instead of failing on the first error.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Connection;

use crate::error::Result;
use crate::models::{StatisticsRecord, VacancyRecord};

/// Outcome of a bulk upsert.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UpsertSummary {
    /// Records inserted for the first time
    pub inserted: usize,
    /// Records that replaced an existing row with the same key
    pub replaced: usize,
    /// Records rejected by the storage engine
    pub failed: usize,
}

impl UpsertSummary {
    /// Merge another summary into this one.
    pub fn merge(&mut self, other: &UpsertSummary) {
        self.inserted += other.inserted;
        self.replaced += other.replaced;
        self.failed += other.failed;
    }
}

/// SQLite store shared across crawl tasks.
///
/// The connection is serialized behind a mutex; the unique indexes are the
/// only cross-task synchronization the ingestion path relies on.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and ensure the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS vacancies (
                id                  INTEGER PRIMARY KEY,
                source              TEXT NOT NULL,
                category            TEXT NOT NULL,
                company_name        TEXT,
                location            TEXT,
                title               TEXT NOT NULL,
                description         TEXT NOT NULL,
                years_of_experience REAL NOT NULL DEFAULT 0,
                published_at        TEXT NOT NULL,
                url                 TEXT UNIQUE NOT NULL,
                views               INTEGER,
                applications        INTEGER,
                ingested_at         TEXT NOT NULL DEFAULT (datetime('now'))
            );
            CREATE INDEX IF NOT EXISTS idx_vacancies_category
                ON vacancies(category, published_at);

            CREATE TABLE IF NOT EXISTS statistics (
                id           INTEGER PRIMARY KEY,
                category     TEXT NOT NULL,
                window_start TEXT NOT NULL,
                window_end   TEXT NOT NULL,
                frequencies  TEXT NOT NULL,
                computed_at  TEXT NOT NULL,
                UNIQUE(category, window_start, window_end)
            );
            ",
        )?;
        Ok(())
    }

    /// Upsert vacancy records, keyed on the canonical URL.
    pub fn upsert_vacancies(&self, records: &[VacancyRecord]) -> Result<UpsertSummary> {
        let mut conn = self.conn.lock().expect("storage mutex poisoned");
        let tx = conn.transaction()?;
        let mut summary = UpsertSummary::default();
        {
            let mut exists = tx.prepare("SELECT 1 FROM vacancies WHERE url = ?1")?;
            let mut upsert = tx.prepare(
                "INSERT INTO vacancies (source, category, company_name, location, title,
                                        description, years_of_experience, published_at,
                                        url, views, applications)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                 ON CONFLICT(url) DO UPDATE SET
                     source = excluded.source,
                     category = excluded.category,
                     company_name = excluded.company_name,
                     location = excluded.location,
                     title = excluded.title,
                     description = excluded.description,
                     years_of_experience = excluded.years_of_experience,
                     published_at = excluded.published_at,
                     views = excluded.views,
                     applications = excluded.applications,
                     ingested_at = datetime('now')",
            )?;

            for record in records {
                let existed = exists.exists([&record.url])?;
                let result = upsert.execute(rusqlite::params![
                    record.source,
                    record.category,
                    record.company_name,
                    record.location,
                    record.title,
                    record.description,
                    record.years_of_experience,
                    encode_ts(&record.published_at),
                    record.url,
                    record.views,
                    record.applications,
                ]);
                match result {
                    Ok(_) if existed => summary.replaced += 1,
                    Ok(_) => summary.inserted += 1,
                    Err(e) => {
                        summary.failed += 1;
                        log::warn!("Upsert failed for {}: {}", record.url, e);
                    }
                }
            }
        }
        tx.commit()?;
        Ok(summary)
    }

    /// Fetch all vacancies of a category published in `[start, end]`,
    /// both bounds inclusive, newest first.
    pub fn fetch_range(
        &self,
        category: &str,
        start: &DateTime<Utc>,
        end: &DateTime<Utc>,
    ) -> Result<Vec<VacancyRecord>> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT source, category, company_name, location, title, description,
                    years_of_experience, published_at, url, views, applications
             FROM vacancies
             WHERE category = ?1
               AND datetime(published_at) >= datetime(?2)
               AND datetime(published_at) <= datetime(?3)
             ORDER BY datetime(published_at) DESC",
        )?;
        let rows = stmt
            .query_map(
                rusqlite::params![category, encode_ts(start), encode_ts(end)],
                row_to_vacancy,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Count all stored vacancies.
    pub fn vacancy_count(&self) -> Result<usize> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM vacancies", [], |r| r.get(0))?;
        Ok(count as usize)
    }

    /// Fetch every stored vacancy, newest first. Used by the export path.
    pub fn all_vacancies(&self) -> Result<Vec<VacancyRecord>> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT source, category, company_name, location, title, description,
                    years_of_experience, published_at, url, views, applications
             FROM vacancies
             ORDER BY datetime(published_at) DESC",
        )?;
        let rows = stmt
            .query_map([], row_to_vacancy)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Upsert statistics records, keyed on category plus window bounds.
    pub fn upsert_statistics(&self, records: &[StatisticsRecord]) -> Result<UpsertSummary> {
        let mut conn = self.conn.lock().expect("storage mutex poisoned");
        let tx = conn.transaction()?;
        let mut summary = UpsertSummary::default();
        {
            let mut exists = tx.prepare(
                "SELECT 1 FROM statistics
                 WHERE category = ?1 AND window_start = ?2 AND window_end = ?3",
            )?;
            let mut upsert = tx.prepare(
                "INSERT INTO statistics (category, window_start, window_end,
                                         frequencies, computed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(category, window_start, window_end) DO UPDATE SET
                     frequencies = excluded.frequencies,
                     computed_at = excluded.computed_at",
            )?;

            for record in records {
                let start = encode_ts(&record.window_start);
                let end = encode_ts(&record.window_end);
                let frequencies = match serde_json::to_string(&record.frequencies) {
                    Ok(json) => json,
                    Err(e) => {
                        summary.failed += 1;
                        log::warn!("Statistics encode failed for {}: {}", record.category, e);
                        continue;
                    }
                };
                let existed = exists.exists(rusqlite::params![record.category, start, end])?;
                let result = upsert.execute(rusqlite::params![
                    record.category,
                    start,
                    end,
                    frequencies,
                    encode_ts(&record.computed_at),
                ]);
                match result {
                    Ok(_) if existed => summary.replaced += 1,
                    Ok(_) => summary.inserted += 1,
                    Err(e) => {
                        summary.failed += 1;
                        log::warn!("Statistics upsert failed for {}: {}", record.category, e);
                    }
                }
            }
        }
        tx.commit()?;
        Ok(summary)
    }

    /// Fetch all statistics for a category, newest window first.
    pub fn fetch_statistics(&self, category: &str) -> Result<Vec<StatisticsRecord>> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT category, window_start, window_end, frequencies, computed_at
             FROM statistics
             WHERE category = ?1
             ORDER BY datetime(window_end) DESC",
        )?;
        let rows = stmt
            .query_map([category], row_to_statistics)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Fetch every stored statistics record. Used by the export path.
    pub fn all_statistics(&self) -> Result<Vec<StatisticsRecord>> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT category, window_start, window_end, frequencies, computed_at
             FROM statistics
             ORDER BY datetime(window_end) DESC",
        )?;
        let rows = stmt
            .query_map([], row_to_statistics)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

/// RFC 3339 with whole seconds, so the same instant always encodes to the
/// same key text.
fn encode_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn decode_ts(idx: usize, raw: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

fn row_to_vacancy(row: &rusqlite::Row<'_>) -> rusqlite::Result<VacancyRecord> {
    Ok(VacancyRecord {
        source: row.get(0)?,
        category: row.get(1)?,
        company_name: row.get(2)?,
        location: row.get(3)?,
        title: row.get(4)?,
        description: row.get(5)?,
        years_of_experience: row.get(6)?,
        published_at: decode_ts(7, row.get(7)?)?,
        url: row.get(8)?,
        views: row.get(9)?,
        applications: row.get(10)?,
    })
}

fn row_to_statistics(row: &rusqlite::Row<'_>) -> rusqlite::Result<StatisticsRecord> {
    let frequencies: String = row.get(3)?;
    let frequencies = serde_json::from_str(&frequencies).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(StatisticsRecord {
        category: row.get(0)?,
        window_start: decode_ts(1, row.get(1)?)?,
        window_end: decode_ts(2, row.get(2)?)?,
        frequencies,
        computed_at: decode_ts(4, row.get(4)?)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn vacancy(url: &str, title: &str, published: DateTime<Utc>) -> VacancyRecord {
        VacancyRecord {
            source: "djinni".to_string(),
            category: "Python".to_string(),
            company_name: Some("Acme".to_string()),
            location: Some("Kyiv".to_string()),
            title: title.to_string(),
            description: "Python developer".to_string(),
            years_of_experience: 2.0,
            published_at: published,
            url: url.to_string(),
            views: Some(10),
            applications: None,
        }
    }

    fn ts(y: i32, mo: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn upsert_inserts_then_replaces() {
        let store = SqliteStore::open_in_memory().unwrap();
        let records = vec![
            vacancy("https://example.com/a", "Junior", ts(2026, 1, 1)),
            vacancy("https://example.com/b", "Middle", ts(2026, 1, 2)),
            vacancy("https://example.com/a", "Senior", ts(2026, 1, 1)),
        ];
        let summary = store.upsert_vacancies(&records).unwrap();
        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.replaced, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(store.vacancy_count().unwrap(), 2);

        // A reflects the latest title
        let stored = store
            .fetch_range("Python", &ts(2025, 1, 1), &ts(2027, 1, 1))
            .unwrap();
        let a = stored
            .iter()
            .find(|v| v.url == "https://example.com/a")
            .unwrap();
        assert_eq!(a.title, "Senior");
    }

    #[test]
    fn upsert_is_idempotent() {
        let store = SqliteStore::open_in_memory().unwrap();
        let records = vec![
            vacancy("https://example.com/a", "Dev", ts(2026, 1, 1)),
            vacancy("https://example.com/b", "Dev", ts(2026, 1, 2)),
        ];
        store.upsert_vacancies(&records).unwrap();
        let first = store.all_vacancies().unwrap();

        let summary = store.upsert_vacancies(&records).unwrap();
        assert_eq!(summary.inserted, 0);
        assert_eq!(summary.replaced, 2);
        assert_eq!(store.all_vacancies().unwrap(), first);
    }

    #[test]
    fn upsert_counts_rejected_records_without_failing_the_batch() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut bad = vacancy("https://example.com/bad", "Dev", ts(2026, 1, 1));
        // u64::MAX does not fit SQLite's signed integers
        bad.views = Some(u64::MAX);

        let summary = store
            .upsert_vacancies(&[
                vacancy("https://example.com/good", "Dev", ts(2026, 1, 2)),
                bad,
            ])
            .unwrap();
        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(store.vacancy_count().unwrap(), 1);
        assert_eq!(store.all_vacancies().unwrap()[0].url, "https://example.com/good");
    }

    #[test]
    fn fetch_range_bounds_are_inclusive() {
        let store = SqliteStore::open_in_memory().unwrap();
        let records = vec![
            vacancy("https://example.com/1", "Before", ts(2026, 1, 1)),
            vacancy("https://example.com/2", "Start", ts(2026, 1, 10)),
            vacancy("https://example.com/3", "Mid", ts(2026, 1, 15)),
            vacancy("https://example.com/4", "End", ts(2026, 1, 20)),
            vacancy("https://example.com/5", "After", ts(2026, 2, 1)),
        ];
        store.upsert_vacancies(&records).unwrap();

        let hits = store
            .fetch_range("Python", &ts(2026, 1, 10), &ts(2026, 1, 20))
            .unwrap();
        let titles: Vec<&str> = hits.iter().map(|v| v.title.as_str()).collect();
        assert_eq!(titles, vec!["End", "Mid", "Start"]);
    }

    #[test]
    fn fetch_range_filters_by_category() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut other = vacancy("https://example.com/r", "Rustacean", ts(2026, 1, 5));
        other.category = "Rust".to_string();
        store
            .upsert_vacancies(&[
                vacancy("https://example.com/p", "Pythonista", ts(2026, 1, 5)),
                other,
            ])
            .unwrap();

        let hits = store
            .fetch_range("Rust", &ts(2026, 1, 1), &ts(2026, 2, 1))
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Rustacean");
    }

    #[test]
    fn fetch_range_empty_when_no_match() {
        let store = SqliteStore::open_in_memory().unwrap();
        let hits = store
            .fetch_range("Python", &ts(2026, 1, 1), &ts(2026, 2, 1))
            .unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn statistics_window_key_replaces() {
        let store = SqliteStore::open_in_memory().unwrap();
        let record = StatisticsRecord {
            category: "Python".to_string(),
            window_start: ts(2026, 1, 1),
            window_end: ts(2026, 1, 31),
            frequencies: vec![("Django".to_string(), 5)],
            computed_at: ts(2026, 2, 1),
        };
        let summary = store.upsert_statistics(&[record.clone()]).unwrap();
        assert_eq!(summary.inserted, 1);

        let mut updated = record.clone();
        updated.frequencies = vec![("FastAPI".to_string(), 8)];
        let summary = store.upsert_statistics(&[updated]).unwrap();
        assert_eq!(summary.replaced, 1);

        let stored = store.fetch_statistics("Python").unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].frequencies, vec![("FastAPI".to_string(), 8)]);
    }

    #[test]
    fn statistics_different_windows_coexist() {
        let store = SqliteStore::open_in_memory().unwrap();
        let january = StatisticsRecord {
            category: "Python".to_string(),
            window_start: ts(2026, 1, 1),
            window_end: ts(2026, 1, 31),
            frequencies: vec![("Django".to_string(), 5)],
            computed_at: ts(2026, 2, 1),
        };
        let mut february = january.clone();
        february.window_start = ts(2026, 2, 1);
        february.window_end = ts(2026, 2, 28);

        store.upsert_statistics(&[january, february]).unwrap();
        assert_eq!(store.fetch_statistics("Python").unwrap().len(), 2);
    }

    #[test]
    fn frequencies_keep_their_order() {
        let store = SqliteStore::open_in_memory().unwrap();
        let record = StatisticsRecord {
            category: "Python".to_string(),
            window_start: ts(2026, 1, 1),
            window_end: ts(2026, 1, 31),
            frequencies: vec![
                ("Django".to_string(), 9),
                ("FastAPI".to_string(), 9),
                ("Flask".to_string(), 2),
            ],
            computed_at: ts(2026, 2, 1),
        };
        store.upsert_statistics(&[record.clone()]).unwrap();
        let stored = store.fetch_statistics("Python").unwrap();
        assert_eq!(stored[0].frequencies, record.frequencies);
    }

    #[test]
    fn open_creates_parent_directories() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("nested/dir/trend.sqlite");
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.vacancy_count().unwrap(), 0);
        assert!(path.exists());
    }
}
