//! # Word Tokenizer
//!
//! Splits news text into word tokens: lowercase, replace filter characters
//! with spaces, split on whitespace. Apostrophes are kept, so `don't` stays
//! one token.

use regex::Regex;

use crate::error::{Result, VeritasError};

/// Punctuation and control characters stripped before splitting.
pub const DEFAULT_FILTERS: &str = "!\"#$%&()*+,-./:;<=>?@[\\]^_`{|}~\t\n";

/// Word tokenizer with a configurable filter set.
#[derive(Debug, Clone)]
pub struct TextTokenizer {
    filter: Option<Regex>,
    lowercase: bool,
}

impl TextTokenizer {
    /// Build a tokenizer that replaces every character of `filters` by a space.
    pub fn new(filters: &str, lowercase: bool) -> Result<Self> {
        let filter = if filters.is_empty() {
            None
        } else {
            let pattern = format!("[{}]", regex::escape(filters));
            let re = Regex::new(&pattern).map_err(|e| {
                VeritasError::Configuration(format!("invalid tokenizer filters: {}", e))
            })?;
            Some(re)
        };

        Ok(Self { filter, lowercase })
    }

    /// Tokenize a text into words.
    ///
    /// # Examples
    /// ```
    /// use veritas_core::text::tokenizer::{TextTokenizer, DEFAULT_FILTERS};
    ///
    /// let tokenizer = TextTokenizer::new(DEFAULT_FILTERS, true).unwrap();
    /// let tokens = tokenizer.tokenize("This is outrageous, Trump is dead!");
    /// assert_eq!(tokens, vec!["this", "is", "outrageous", "trump", "is", "dead"]);
    /// ```
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered;
        let text = if self.lowercase {
            lowered = text.to_lowercase();
            lowered.as_str()
        } else {
            text
        };

        match &self.filter {
            Some(re) => re
                .replace_all(text, " ")
                .split_whitespace()
                .map(str::to_string)
                .collect(),
            None => text.split_whitespace().map(str::to_string).collect(),
        }
    }
}
