//! Query tokenization and relevance scoring.
//!
//! A score is the number of query tokens present in the candidate. It depends
//! only on which query tokens matched, never on their position, so a candidate
//! whose tokens cover another's matches never ranks below it. A candidate
//! matching nothing is [`EXCLUDED`].

use crate::app::{Result, TributaryError};
use crate::domain::FeedEntry;

/// Sentinel score for candidates that must not be shown.
pub const EXCLUDED: i32 = -1;

/// Lower-cases `text` and splits it on non-alphanumeric boundaries.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    tokenize_into(text, &mut tokens);
    tokens
}

/// Like [`tokenize`], appending to an existing token sequence.
pub fn tokenize_into(text: &str, tokens: &mut Vec<String>) {
    tokens.extend(
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .map(str::to_lowercase),
    );
}

/// Candidate tokens for an entry: its title followed by its categories.
pub fn entry_tokens(entry: &FeedEntry) -> Vec<String> {
    let mut tokens = tokenize(&entry.title);
    for category in &entry.categories {
        tokenize_into(category, &mut tokens);
    }
    tokens
}

/// Scores `candidate` against `query`. Pure and deterministic.
pub fn score(query: &[String], candidate: &[String]) -> i32 {
    if query.is_empty() {
        return EXCLUDED;
    }

    let matched = query
        .iter()
        .filter(|token| candidate.contains(token))
        .count();
    if matched == 0 {
        return EXCLUDED;
    }

    i32::try_from(matched).unwrap_or(i32::MAX)
}

/// A tokenized, non-empty search query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    tokens: Vec<String>,
}

impl Query {
    pub fn parse(text: &str) -> Result<Self> {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return Err(TributaryError::Usage("query is empty".into()));
        }
        Ok(Self { tokens })
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn score_entry(&self, entry: &FeedEntry) -> i32 {
        score(&self.tokens, &entry_tokens(entry))
    }
}
