// src/models/statistics.rs

//! Time-windowed technology frequency statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ranked technology frequencies for one category and time window.
///
/// `(category, window_start, window_end)` is the uniqueness key;
/// recomputing the same window replaces the stored record. The frequency
/// vector keeps its ranking order: descending count, first-seen on ties.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatisticsRecord {
    /// Category the statistics were computed for
    pub category: String,

    /// Inclusive window start
    pub window_start: DateTime<Utc>,

    /// Inclusive window end
    pub window_end: DateTime<Utc>,

    /// Ranked (term, occurrence count) pairs
    pub frequencies: Vec<(String, u32)>,

    /// When the computation ran
    pub computed_at: DateTime<Utc>,
}

impl StatisticsRecord {
    /// Top term of the distribution, if any.
    pub fn top_term(&self) -> Option<&str> {
        self.frequencies.first().map(|(term, _)| term.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_term_follows_ranking() {
        let record = StatisticsRecord {
            category: "Python".to_string(),
            window_start: Utc::now(),
            window_end: Utc::now(),
            frequencies: vec![("Django".to_string(), 9), ("Flask".to_string(), 4)],
            computed_at: Utc::now(),
        };
        assert_eq!(record.top_term(), Some("Django"));
    }

    #[test]
    fn top_term_empty_distribution() {
        let record = StatisticsRecord {
            category: "Python".to_string(),
            window_start: Utc::now(),
            window_end: Utc::now(),
            frequencies: Vec::new(),
            computed_at: Utc::now(),
        };
        assert_eq!(record.top_term(), None);
    }
}
