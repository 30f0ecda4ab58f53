// src/analysis/stopwords.rs

//! Stopword set loading.
//!
//! Stopword files are JSON arrays of strings, one file per source set
//! (e.g. language stopwords, common vacancy boilerplate). All sets are
//! merged and lowercased.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::{AppError, Result};

/// Load and merge stopword files.
///
/// A missing or malformed file is a configuration error; analysis should
/// refuse to start rather than silently run with a partial set.
pub fn load_stopwords(files: &[impl AsRef<Path>]) -> Result<HashSet<String>> {
    let mut stopwords = HashSet::new();
    for file in files {
        let path = file.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("stopword file {}: {e}", path.display())))?;
        let words: Vec<String> = serde_json::from_str(&content)
            .map_err(|e| AppError::config(format!("stopword file {}: {e}", path.display())))?;
        stopwords.extend(words.into_iter().map(|w| w.to_lowercase()));
    }
    Ok(stopwords)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use tempfile::NamedTempFile;

    fn stopword_file(words: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{words}").unwrap();
        file
    }

    #[test]
    fn merges_and_lowercases_sets() {
        let a = stopword_file(r#"["Years", "team"]"#);
        let b = stopword_file(r#"["API"]"#);
        let words = load_stopwords(&[a.path(), b.path()]).unwrap();
        assert!(words.contains("years"));
        assert!(words.contains("team"));
        assert!(words.contains("api"));
        assert_eq!(words.len(), 3);
    }

    #[test]
    fn missing_file_is_config_error() {
        let result = load_stopwords(&["/nonexistent/stopwords.json"]);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn malformed_json_is_config_error() {
        let bad = stopword_file("not json");
        let result = load_stopwords(&[bad.path()]);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn no_files_yields_empty_set() {
        let files: Vec<&Path> = Vec::new();
        assert!(load_stopwords(&files).unwrap().is_empty());
    }
}
