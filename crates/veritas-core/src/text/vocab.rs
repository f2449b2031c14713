//! # Vocabulary
//!
//! Frequency-ranked token ids fitted once on training text.
//!
//! Id layout:
//! - `0` padding
//! - `1` out-of-vocabulary
//! - `2..=max_features` words, most frequent first

use std::collections::HashMap;

use crate::error::{Result, VeritasError};

pub const PAD_ID: u32 = 0;
pub const OOV_ID: u32 = 1;
pub const FIRST_WORD_ID: u32 = 2;

pub const PAD_TOKEN: &str = "<pad>";
pub const OOV_TOKEN: &str = "<oov>";

/// Immutable token-to-id mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    max_features: usize,
    words: Vec<String>,
    index: HashMap<String, u32>,
    unique_tokens: usize,
}

impl Vocabulary {
    /// Count token frequencies and keep the `max_features - 1` most frequent.
    ///
    /// Ties are broken by first occurrence so fitting is deterministic.
    pub fn fit<I, D>(documents: I, max_features: usize) -> Result<Self>
    where
        I: IntoIterator<Item = D>,
        D: IntoIterator<Item = String>,
    {
        if max_features < 2 {
            return Err(VeritasError::Configuration(format!(
                "max_features must be at least 2, got {}",
                max_features
            )));
        }

        // token -> (count, first seen)
        let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
        let mut seen = 0usize;
        for tokens in documents {
            for token in tokens {
                let entry = counts.entry(token).or_insert((0, seen));
                if entry.0 == 0 {
                    seen += 1;
                }
                entry.0 += 1;
            }
        }

        let unique_tokens = counts.len();
        let mut ranked: Vec<(String, usize, usize)> = counts
            .into_iter()
            .map(|(token, (count, first))| (token, count, first))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
        ranked.truncate(max_features - 1);

        let words = ranked.into_iter().map(|(token, _, _)| token).collect();
        Self::from_words(words, max_features, unique_tokens)
    }

    /// Rebuild a vocabulary from its ranked word list.
    pub fn from_words(words: Vec<String>, max_features: usize, unique_tokens: usize) -> Result<Self> {
        if max_features < 2 || words.len() > max_features - 1 {
            return Err(VeritasError::Serialization(format!(
                "vocabulary holds {} words but max_features is {}",
                words.len(),
                max_features
            )));
        }

        let mut index = HashMap::with_capacity(words.len());
        for (i, word) in words.iter().enumerate() {
            let id = FIRST_WORD_ID + i as u32;
            if index.insert(word.clone(), id).is_some() {
                return Err(VeritasError::Serialization(format!(
                    "duplicate vocabulary entry {:?}",
                    word
                )));
            }
        }

        Ok(Self {
            max_features,
            words,
            index,
            unique_tokens,
        })
    }

    /// Id of a token, [`OOV_ID`] when it was not retained.
    pub fn id(&self, token: &str) -> u32 {
        self.index.get(token).copied().unwrap_or(OOV_ID)
    }

    /// Token for an id; reserved ids map to their marker tokens.
    pub fn token(&self, id: u32) -> Option<&str> {
        match id {
            PAD_ID => Some(PAD_TOKEN),
            OOV_ID => Some(OOV_TOKEN),
            _ => self
                .words
                .get((id - FIRST_WORD_ID) as usize)
                .map(String::as_str),
        }
    }

    /// Retained words in rank order.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Retained words plus the out-of-vocabulary entry.
    pub fn len(&self) -> usize {
        self.words.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Rows needed by an embedding table indexed with this vocabulary.
    pub fn num_ids(&self) -> usize {
        self.max_features + 1
    }

    /// Distinct tokens seen while fitting, retained or not.
    pub fn unique_tokens(&self) -> usize {
        self.unique_tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(texts: &[&str]) -> Vec<Vec<String>> {
        texts
            .iter()
            .map(|t| t.split_whitespace().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn ranks_by_frequency_then_first_occurrence() {
        let vocab = Vocabulary::fit(docs(&["b a c", "a c", "a"]), 10).unwrap();
        assert_eq!(vocab.words(), &["a", "c", "b"]);
        assert_eq!(vocab.id("a"), 2);
        assert_eq!(vocab.id("c"), 3);
        assert_eq!(vocab.id("b"), 4);
        assert_eq!(vocab.id("zzz"), OOV_ID);
    }

    #[test]
    fn size_never_exceeds_cap() {
        let texts: Vec<String> = (0..100).map(|i| format!("w{} w{}", i, i % 7)).collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        for cap in [2, 5, 17, 200] {
            let vocab = Vocabulary::fit(docs(&refs), cap).unwrap();
            assert!(vocab.len() <= cap + 1);
            assert!(vocab.words().len() < cap);
            let max_id = FIRST_WORD_ID as usize + vocab.words().len() - 1;
            assert!(vocab.words().is_empty() || max_id <= cap);
        }
    }

    #[test]
    fn counts_unique_tokens_beyond_the_cap() {
        let vocab = Vocabulary::fit(docs(&["a b c d e"]), 3).unwrap();
        assert_eq!(vocab.unique_tokens(), 5);
        assert_eq!(vocab.words().len(), 2);
    }

    #[test]
    fn reserved_tokens_decode() {
        let vocab = Vocabulary::fit(docs(&["hello"]), 4).unwrap();
        assert_eq!(vocab.token(PAD_ID), Some(PAD_TOKEN));
        assert_eq!(vocab.token(OOV_ID), Some(OOV_TOKEN));
        assert_eq!(vocab.token(2), Some("hello"));
        assert_eq!(vocab.token(3), None);
    }

    #[test]
    fn from_words_rejects_duplicates_and_overflow() {
        assert!(Vocabulary::from_words(vec!["a".into(), "a".into()], 10, 1).is_err());
        assert!(Vocabulary::from_words(vec!["a".into(), "b".into()], 2, 2).is_err());
    }
}
