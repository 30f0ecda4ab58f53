// src/analysis/extract.rs

//! Technology frequency extraction.

use std::collections::{HashMap, HashSet};

use crate::analysis::classify::TokenClassifier;
use crate::error::Result;

/// Counts proper-noun technology terms in normalized text.
///
/// Aggregation is case-insensitive; the first-encountered casing of each
/// term is kept as the display form.
pub struct FrequencyExtractor {
    stopwords: HashSet<String>,
}

/// One counted term, tracked in first-seen order.
struct TermCount {
    display: String,
    count: u32,
}

impl FrequencyExtractor {
    /// Create an extractor over a stopword set (lowercase entries).
    pub fn new(stopwords: HashSet<String>) -> Self {
        Self { stopwords }
    }

    /// Rank technology terms in `text`, keeping at most `limit` entries.
    ///
    /// A token is counted only when the classifier flags it as a proper
    /// noun, its lowercase form is not a stopword, and its first character
    /// is an ASCII letter. Entries are ordered by descending count, ties
    /// broken by first occurrence in the text.
    pub fn extract(
        &self,
        classifier: &dyn TokenClassifier,
        text: &str,
        limit: usize,
    ) -> Result<Vec<(String, u32)>> {
        let mut order: Vec<TermCount> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for token in classifier.classify(text)? {
            if !token.proper_noun {
                continue;
            }
            if !token
                .surface
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic())
            {
                continue;
            }
            let key = token.surface.to_lowercase();
            if self.stopwords.contains(&key) {
                continue;
            }
            match index.get(&key) {
                Some(&i) => order[i].count += 1,
                None => {
                    index.insert(key, order.len());
                    order.push(TermCount {
                        display: token.surface,
                        count: 1,
                    });
                }
            }
        }

        // Stable sort keeps first-seen order among equal counts.
        order.sort_by(|a, b| b.count.cmp(&a.count));
        order.truncate(limit);
        Ok(order.into_iter().map(|t| (t.display, t.count)).collect())
    }
}
