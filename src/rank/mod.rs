//! Relevance scoring and result ordering.

pub mod colors;
pub mod score;

pub use colors::ColorTable;
pub use score::{entry_tokens, score, tokenize, Query, EXCLUDED};

use crate::domain::RankedItem;

/// Newest first. Items without a publish time sink to the end.
pub fn sort_chronological(items: &mut [RankedItem]) {
    items.sort_by(|a, b| b.entry.published.cmp(&a.entry.published));
}

/// Highest score first. Ties keep their relative order.
pub fn sort_by_relevance(items: &mut [RankedItem]) {
    items.sort_by(|a, b| b.score.cmp(&a.score));
}
