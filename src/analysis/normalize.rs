// src/analysis/normalize.rs

//! Free-text cleanup ahead of tokenization.

use regex::RegexBuilder;

use crate::config::AnalysisConfig;
use crate::error::{AppError, Result};

/// Punctuation stripped during normalization.
///
/// Deliberately excludes `.`, `#`, `+`, `/` and `-` so technology names
/// like ".NET", "C#", "C++" and "CI/CD" survive.
const PUNCTUATION: &[char] = &[
    ',', ';', ':', '!', '?', '(', ')', '[', ']', '{', '}', '"', '\u{00ab}', '\u{00bb}',
    '\u{2018}', '\u{2019}', '\u{201c}', '\u{201d}', '\u{2026}',
];

/// Deterministic text cleaner.
///
/// Strips configured non-Latin script ranges, removes markup/noise
/// substrings case-insensitively, drops punctuation and collapses
/// whitespace. Pure and idempotent: `normalize(normalize(x)) ==
/// normalize(x)`.
pub struct TextNormalizer {
    strip_ranges: Vec<(u32, u32)>,
    noise: Option<regex::Regex>,
}

impl TextNormalizer {
    /// Build a normalizer from the analysis configuration plus any
    /// per-run extra filters.
    pub fn new(config: &AnalysisConfig) -> Result<Self> {
        let mut patterns: Vec<String> = config
            .noise_patterns
            .iter()
            .chain(config.extra_filters.iter())
            .filter(|p| !p.is_empty())
            .map(|p| regex::escape(p))
            .collect();
        patterns.sort();
        patterns.dedup();

        let noise = if patterns.is_empty() {
            None
        } else {
            Some(
                RegexBuilder::new(&patterns.join("|"))
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| AppError::config(format!("bad noise pattern: {e}")))?,
            )
        };

        Ok(Self {
            strip_ranges: config.strip_ranges.clone(),
            noise,
        })
    }

    /// Normalize raw description text.
    pub fn normalize(&self, raw: &str) -> String {
        // Removing punctuation can expose a fresh noise pattern (a bullet
        // whose trailing comma just vanished), so iterate to a fixed point.
        // Each pass only ever shrinks the text, so this terminates.
        let mut current = raw.to_string();
        loop {
            let next = self.clean_once(&current);
            if next == current {
                return current;
            }
            current = next;
        }
    }

    fn clean_once(&self, text: &str) -> String {
        let collapsed = collapse_whitespace(text);

        let stripped: String = collapsed
            .chars()
            .filter(|&c| !self.in_strip_range(c))
            .collect();

        let without_noise = match &self.noise {
            Some(re) => re.replace_all(&stripped, " ").into_owned(),
            None => stripped,
        };

        let without_punct: String = without_noise
            .chars()
            .filter(|c| !PUNCTUATION.contains(c))
            .collect();

        collapse_whitespace(&without_punct)
    }

    fn in_strip_range(&self, c: char) -> bool {
        let code = c as u32;
        self.strip_ranges
            .iter()
            .any(|&(lo, hi)| code >= lo && code <= hi)
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
