pub mod headers;
pub mod http_fetcher;
pub mod parallel;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::app::Result;
use crate::domain::{FetchOutcome, FreshnessEntry};

pub use parallel::{FailureStage, FeedFailure, ParallelFetcher, PassOptions, PassReport};

#[async_trait]
pub trait Fetcher {
    /// Polls one feed at `now`.
    ///
    /// Skips all network I/O while the entry is backing off. A `changed`
    /// outcome means the new body has already been written to the body
    /// cache.
    async fn poll(&self, entry: &FreshnessEntry, now: DateTime<Utc>) -> Result<FetchOutcome>;
}
