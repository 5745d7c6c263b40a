use std::time::Duration;

use chrono::{DateTime, Utc};

/// Counters collected over one pass. Purely observational.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub feeds_count: usize,
    pub feeds_cached: usize,
    pub feeds_fetched: usize,
    pub items_count: usize,
    pub items_shown: usize,
}

impl RunSummary {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            feeds_count: 0,
            feeds_cached: 0,
            feeds_fetched: 0,
            items_count: 0,
            items_shown: 0,
        }
    }

    /// One-line human readable summary.
    pub fn describe(&self, elapsed: Duration) -> String {
        format!(
            "Displayed {} from {} ({} cached, {} fetched) with {} in {:.2}s",
            pluralize(self.items_shown, "item"),
            pluralize(self.feeds_count, "feed"),
            self.feeds_cached,
            self.feeds_fetched,
            pluralize(self.items_count, "item"),
            elapsed.as_secs_f64(),
        )
    }
}

pub fn pluralize(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}
