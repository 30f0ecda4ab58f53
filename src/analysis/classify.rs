// src/analysis/classify.rs

//! Token classifier boundary.
//!
//! The part-of-speech tagger is an external collaborator: the extractor
//! only consumes the surface token plus a proper-noun flag.

use crate::error::Result;

/// A token with its proper-noun classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Surface form exactly as it appeared in the text
    pub surface: String,

    /// Whether the classifier tagged the token as a proper noun
    pub proper_noun: bool,
}

impl Token {
    pub fn new(surface: impl Into<String>, proper_noun: bool) -> Self {
        Self {
            surface: surface.into(),
            proper_noun,
        }
    }
}

/// Labels each token of a text as proper-noun-like or not.
///
/// Implementations must preserve document order.
pub trait TokenClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Result<Vec<Token>>;
}

/// Capitalization-based classifier.
///
/// Stand-in adapter for a real POS tagger: technology names are mostly
/// written capitalized or in vendor casing, so a token counts as
/// proper-noun-like when it starts with an ASCII uppercase letter.
#[derive(Debug, Default, Clone)]
pub struct HeuristicClassifier;

impl TokenClassifier for HeuristicClassifier {
    fn classify(&self, text: &str) -> Result<Vec<Token>> {
        Ok(text
            .split_whitespace()
            .map(|word| {
                let proper = word.chars().next().is_some_and(|c| c.is_ascii_uppercase());
                Token::new(word, proper)
            })
            .collect())
    }
}
