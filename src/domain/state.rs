use chrono::{DateTime, Utc};

/// Per-feed freshness metadata, keyed by feed URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreshnessEntry {
    pub url: String,
    /// Opaque `ETag` from the last 200 response. Empty when none was sent.
    pub validation_token: String,
    pub last_fetch: DateTime<Utc>,
    /// Earliest time the feed may be polled again.
    pub fetch_after: DateTime<Utc>,
}

impl FreshnessEntry {
    /// A never-fetched entry. Both timestamps sit at the Unix epoch so the
    /// first poll is always eligible.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            validation_token: String::new(),
            last_fetch: DateTime::<Utc>::UNIX_EPOCH,
            fetch_after: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    pub fn has_been_fetched(&self) -> bool {
        self.last_fetch != DateTime::<Utc>::UNIX_EPOCH
    }

    pub fn is_backing_off(&self, now: DateTime<Utc>) -> bool {
        now < self.fetch_after
    }

    /// Folds a poll result into the entry.
    ///
    /// A changed body moves `last_fetch` to `now` and replaces the token.
    /// `fetch_after` only ever moves forward.
    pub fn apply(&mut self, outcome: &FetchOutcome, now: DateTime<Utc>) {
        if outcome.changed {
            self.validation_token = outcome.validation_token.clone();
            self.last_fetch = now;
        }
        if let Some(next) = outcome.next_fetch_after {
            if next > self.fetch_after {
                self.fetch_after = next;
            }
        }
    }
}

/// Result of a single conditional poll.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOutcome {
    /// A fresh body was received and written to the body cache.
    pub changed: bool,
    pub validation_token: String,
    /// `None` when the poll was skipped and carries no network information.
    pub next_fetch_after: Option<DateTime<Utc>>,
}

impl FetchOutcome {
    pub fn skipped() -> Self {
        Self::default()
    }

    pub fn unchanged(next_fetch_after: DateTime<Utc>) -> Self {
        Self {
            changed: false,
            validation_token: String::new(),
            next_fetch_after: Some(next_fetch_after),
        }
    }
}
