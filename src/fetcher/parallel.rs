use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::sync::Semaphore;

use crate::app::{Result, TributaryError};
use crate::domain::{FeedEntry, FreshnessEntry, ParsedFeed, RankedItem, RunSummary};
use crate::fetcher::Fetcher;
use crate::normalizer::Normalizer;
use crate::rank::{ColorTable, Query, EXCLUDED};
use crate::store::{BodyCache, FreshnessStore};

pub const DEFAULT_WORKERS: usize = 10;

/// Per-pass filtering and colouring knobs.
#[derive(Debug, Clone, Default)]
pub struct PassOptions {
    /// When set, entries are scored and those scoring [`EXCLUDED`] dropped.
    pub query: Option<Query>,
    /// Drop entries published strictly before this instant.
    pub since: Option<DateTime<Utc>>,
    pub color_remap: HashMap<u8, u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Fetch,
    Parse,
}

/// A feed that contributed nothing to the pass.
#[derive(Debug)]
pub struct FeedFailure {
    pub url: String,
    pub stage: FailureStage,
    pub error: TributaryError,
}

impl fmt::Display for FeedFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self.stage {
            FailureStage::Fetch => "fetch",
            FailureStage::Parse => "parse",
        };
        write!(f, "failed to {} feed: {}: {}", stage, self.url, self.error)
    }
}

/// Everything one pass produced. Items are in merge order; sorting is up to
/// the caller.
#[derive(Debug)]
pub struct PassReport {
    pub items: Vec<RankedItem>,
    pub summary: RunSummary,
    pub failures: Vec<FeedFailure>,
    /// Set when the freshness snapshot could not be saved. The items are
    /// still valid.
    pub persist_error: Option<TributaryError>,
}

/// State shared by all feed tasks of a pass. Only touched after a task's
/// network and parse work is done.
struct Accumulator {
    items: Vec<RankedItem>,
    colors: ColorTable,
    summary: RunSummary,
}

struct FeedTask {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    cache: Arc<BodyCache>,
    normalizer: Normalizer,
    options: Arc<PassOptions>,
    accumulator: Arc<Mutex<Accumulator>>,
}

pub struct ParallelFetcher {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    cache: Arc<BodyCache>,
    normalizer: Normalizer,
    semaphore: Arc<Semaphore>,
}

impl ParallelFetcher {
    pub fn new(fetcher: Arc<dyn Fetcher + Send + Sync>, cache: Arc<BodyCache>) -> Self {
        Self::with_workers(fetcher, cache, DEFAULT_WORKERS)
    }

    pub fn with_workers(
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        cache: Arc<BodyCache>,
        workers: usize,
    ) -> Self {
        Self {
            fetcher,
            cache,
            normalizer: Normalizer::new(),
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// Polls, parses, and filters every feed in `urls`, then saves the
    /// updated freshness snapshot once.
    ///
    /// Individual feed failures never fail the pass; they are returned in
    /// [`PassReport::failures`]. Only a failure to load the freshness
    /// snapshot is fatal.
    pub async fn run_pass<S: FreshnessStore + ?Sized>(
        &self,
        urls: &BTreeSet<String>,
        store: &S,
        options: &PassOptions,
        now: DateTime<Utc>,
    ) -> Result<PassReport> {
        let mut entries = store.load()?;

        let mut summary = RunSummary::new(now);
        summary.feeds_count = urls.len();
        let accumulator = Arc::new(Mutex::new(Accumulator {
            items: Vec::new(),
            colors: ColorTable::new(options.color_remap.clone()),
            summary,
        }));
        let options = Arc::new(options.clone());

        let mut handles = Vec::with_capacity(urls.len());
        for url in urls {
            let entry = entries
                .entry(url.clone())
                .or_insert_with(|| FreshnessEntry::new(url.clone()))
                .clone();
            let task = FeedTask {
                fetcher: self.fetcher.clone(),
                cache: self.cache.clone(),
                normalizer: self.normalizer.clone(),
                options: options.clone(),
                accumulator: accumulator.clone(),
            };
            let semaphore = self.semaphore.clone();

            let handle = tokio::spawn(async move {
                // The semaphore is never closed, so a failed acquire only
                // means running without a permit.
                let _permit = semaphore.acquire().await.ok();
                task.run(entry, now).await
            });
            handles.push((url.clone(), handle));
        }

        let mut failures = Vec::new();
        for (url, handle) in handles {
            match handle.await {
                Ok((entry, failure)) => {
                    if let Some(failure) = failure {
                        tracing::warn!(url = %failure.url, error = %failure.error, "{}", failure);
                        failures.push(failure);
                    }
                    entries.insert(entry.url.clone(), entry);
                }
                Err(e) => {
                    tracing::error!(url = %url, "Task join error: {}", e);
                    failures.push(FeedFailure {
                        url,
                        stage: FailureStage::Fetch,
                        error: TributaryError::Task(e.to_string()),
                    });
                }
            }
        }

        let persist_error = store.save(&entries).err();
        if let Some(e) = &persist_error {
            tracing::error!(error = %e, "Failed to save freshness snapshot");
        }

        let mut accumulator = accumulator.lock().unwrap_or_else(|e| e.into_inner());
        let items = std::mem::take(&mut accumulator.items);
        let summary = accumulator.summary.clone();

        tracing::info!(
            feeds = summary.feeds_count,
            fetched = summary.feeds_fetched,
            cached = summary.feeds_cached,
            failed = failures.len(),
            items = items.len(),
            "Pass complete"
        );

        Ok(PassReport {
            items,
            summary,
            failures,
            persist_error,
        })
    }
}

impl FeedTask {
    /// Returns the entry as updated by this poll, plus the failure if the feed
    /// contributed nothing.
    async fn run(self, mut entry: FreshnessEntry, now: DateTime<Utc>) -> (FreshnessEntry, Option<FeedFailure>) {
        let previous_fetch = entry.last_fetch;

        let outcome = match self.fetcher.poll(&entry, now).await {
            Ok(outcome) => outcome,
            Err(error) => {
                let failure = failure(&entry, FailureStage::Fetch, error);
                return (entry, Some(failure));
            }
        };
        entry.apply(&outcome, now);

        let feed = match self.parse(&entry.url).await {
            Ok(feed) => feed,
            Err(error) => {
                let failure = failure(&entry, FailureStage::Parse, error);
                return (entry, Some(failure));
            }
        };

        let total = feed.entries.len();
        let kept = self.filter(feed.entries, previous_fetch);
        let feed_title: Arc<str> = Arc::from(feed.title.as_str());
        let feed_url: Arc<str> = Arc::from(entry.url.as_str());

        let mut acc = self.accumulator.lock().unwrap_or_else(|e| e.into_inner());
        acc.summary.items_count += total;
        let color = acc.colors.color_for(&feed.title);
        acc.items.extend(kept.into_iter().map(|(item, score, is_new)| RankedItem {
            feed_url: feed_url.clone(),
            feed_title: feed_title.clone(),
            entry: item,
            color,
            is_new,
            score,
        }));
        if outcome.changed {
            acc.summary.feeds_fetched += 1;
        } else {
            acc.summary.feeds_cached += 1;
        }
        drop(acc);

        (entry, None)
    }

    async fn parse(&self, url: &str) -> Result<ParsedFeed> {
        let body = self.cache.open(url).await?;
        self.normalizer.parse(&body)
    }

    /// Applies the `since` and relevance filters, returning surviving entries
    /// with their score and newness.
    fn filter(&self, entries: Vec<FeedEntry>, previous_fetch: DateTime<Utc>) -> Vec<(FeedEntry, i32, bool)> {
        entries
            .into_iter()
            .filter_map(|item| {
                let published = item.published_or_epoch();
                if self.options.since.is_some_and(|since| published < since) {
                    return None;
                }
                let score = match &self.options.query {
                    Some(query) => query.score_entry(&item),
                    None => 0,
                };
                if score == EXCLUDED {
                    return None;
                }
                let is_new = published > previous_fetch;
                Some((item, score, is_new))
            })
            .collect()
    }
}

fn failure(entry: &FreshnessEntry, stage: FailureStage, error: TributaryError) -> FeedFailure {
    FeedFailure {
        url: entry.url.clone(),
        stage,
        error,
    }
}
