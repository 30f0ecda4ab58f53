// src/analysis/mod.rs

//! Text normalization and technology frequency extraction.

pub mod classify;
pub mod extract;
pub mod normalize;
pub mod stopwords;

pub use classify::{HeuristicClassifier, Token, TokenClassifier};
pub use extract::FrequencyExtractor;
pub use normalize::TextNormalizer;
pub use stopwords::load_stopwords;
