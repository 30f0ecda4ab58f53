// src/export.rs

//! CSV export of stored vacancies and statistics.
//!
//! Plain RFC 4180 output: fields containing the separator, quotes or line
//! breaks are quoted, embedded quotes are doubled.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::Result;
use crate::models::{StatisticsRecord, VacancyRecord};
use crate::storage::SqliteStore;

const VACANCY_HEADER: &[&str] = &[
    "source",
    "category",
    "company_name",
    "location",
    "title",
    "description",
    "years_of_experience",
    "published_at",
    "url",
    "views",
    "applications",
];

const STATISTICS_HEADER: &[&str] = &[
    "category",
    "window_start",
    "window_end",
    "term",
    "count",
    "computed_at",
];

/// Export every stored vacancy to a CSV file, newest first.
pub fn export_vacancies(store: &SqliteStore, path: impl AsRef<Path>) -> Result<usize> {
    let vacancies = store.all_vacancies()?;
    let mut w = open_writer(path.as_ref())?;
    write_row(&mut w, VACANCY_HEADER)?;
    for v in &vacancies {
        write_row(&mut w, &vacancy_row(v))?;
    }
    w.flush()?;
    log::info!("Exported {} vacancies to {:?}", vacancies.len(), path.as_ref());
    Ok(vacancies.len())
}

/// Export every stored statistics record to a CSV file, one line per
/// ranked term so the distribution order survives in the output.
pub fn export_statistics(store: &SqliteStore, path: impl AsRef<Path>) -> Result<usize> {
    let records = store.all_statistics()?;
    let mut w = open_writer(path.as_ref())?;
    write_row(&mut w, STATISTICS_HEADER)?;
    let mut lines = 0;
    for record in &records {
        for (term, count) in &record.frequencies {
            write_row(&mut w, &statistics_row(record, term, *count))?;
            lines += 1;
        }
    }
    w.flush()?;
    log::info!(
        "Exported {} statistics rows to {:?}",
        lines,
        path.as_ref()
    );
    Ok(lines)
}

fn open_writer(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(BufWriter::new(File::create(path)?))
}

fn vacancy_row(v: &VacancyRecord) -> Vec<String> {
    vec![
        v.source.clone(),
        v.category.clone(),
        v.company_name.clone().unwrap_or_default(),
        v.location.clone().unwrap_or_default(),
        v.title.clone(),
        v.description.clone(),
        v.years_of_experience.to_string(),
        format_ts(&v.published_at),
        v.url.clone(),
        v.views.map(|n| n.to_string()).unwrap_or_default(),
        v.applications.map(|n| n.to_string()).unwrap_or_default(),
    ]
}

fn statistics_row(record: &StatisticsRecord, term: &str, count: u32) -> Vec<String> {
    vec![
        record.category.clone(),
        format_ts(&record.window_start),
        format_ts(&record.window_end),
        term.to_string(),
        count.to_string(),
        format_ts(&record.computed_at),
    ]
}

fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

fn write_row<W: Write, S: AsRef<str>>(w: &mut W, row: &[S]) -> std::io::Result<()> {
    let mut first = true;
    for cell in row {
        if !first {
            write!(w, ",")?;
        }
        first = false;
        let cell = cell.as_ref();
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            write!(w, "{cell}")?;
        }
    }
    writeln!(w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn vacancy(url: &str, title: &str) -> VacancyRecord {
        VacancyRecord {
            source: "djinni".to_string(),
            category: "Python".to_string(),
            company_name: Some("Acme, Inc".to_string()),
            location: None,
            title: title.to_string(),
            description: "Line one\nline \"two\"".to_string(),
            years_of_experience: 2.5,
            published_at: Utc.with_ymd_and_hms(2026, 1, 2, 12, 30, 0).unwrap(),
            url: url.to_string(),
            views: Some(128),
            applications: None,
        }
    }

    #[test]
    fn vacancy_export_quotes_and_escapes() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .upsert_vacancies(&[vacancy("https://example.com/1", "Senior Dev")])
            .unwrap();

        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("vacancies.csv");
        let count = export_vacancies(&store, &path).unwrap();
        assert_eq!(count, 1);

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next().unwrap(), VACANCY_HEADER.join(","));

        let row = &content[content.find('\n').unwrap() + 1..];
        assert!(row.contains("\"Acme, Inc\""));
        assert!(row.contains("\"Line one\nline \"\"two\"\"\""));
        assert!(row.contains("2026-01-02T12:30:00Z"));
        // Absent optionals export as empty fields
        assert!(row.ends_with(",\n") || row.ends_with(','));
    }

    #[test]
    fn statistics_export_is_one_line_per_term_in_rank_order() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .upsert_statistics(&[StatisticsRecord {
                category: "Python".to_string(),
                window_start: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
                window_end: Utc.with_ymd_and_hms(2026, 1, 31, 0, 0, 0).unwrap(),
                frequencies: vec![
                    ("Django".to_string(), 9),
                    ("FastAPI".to_string(), 4),
                ],
                computed_at: Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap(),
            }])
            .unwrap();

        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("statistics.csv");
        let count = export_statistics(&store, &path).unwrap();
        assert_eq!(count, 2);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], STATISTICS_HEADER.join(","));
        assert!(lines[1].starts_with("Python,2026-01-01T00:00:00Z,2026-01-31T00:00:00Z,Django,9"));
        assert!(lines[2].contains("FastAPI,4"));
    }

    #[test]
    fn empty_store_exports_header_only() {
        let store = SqliteStore::open_in_memory().unwrap();
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("out/vacancies.csv");

        let count = export_vacancies(&store, &path).unwrap();
        assert_eq!(count, 0);
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }
}
