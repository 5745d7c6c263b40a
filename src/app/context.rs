use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::app::error::{Result, TributaryError};
use crate::config::Config;
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::parallel::{ParallelFetcher, PassOptions, PassReport};
use crate::fetcher::Fetcher;
use crate::rank::{sort_by_relevance, sort_chronological, Query};
use crate::store::sqlite::SqliteStore;
use crate::store::{BodyCache, SubscriptionSource};

/// What a single feed or search invocation asks for.
#[derive(Debug, Clone, Default)]
pub struct PassRequest {
    /// Restrict to one list; `None` means every list.
    pub list: Option<String>,
    /// Search mode when set, chronological feed mode otherwise.
    pub query: Option<Query>,
    pub since: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

/// Everything one invocation needs, built once and passed down.
pub struct AppContext {
    pub config: Config,
    pub store: Arc<SqliteStore>,
    pub parallel_fetcher: ParallelFetcher,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let data_dir = match &config.data_dir {
            Some(dir) => dir.clone(),
            None => Self::default_data_dir()?,
        };
        std::fs::create_dir_all(&data_dir)?;
        let store = SqliteStore::new(data_dir.join("tributary.db"))?;
        Self::with_store(config, store, &data_dir.join("cache"))
    }

    /// Context backed by an in-memory database and a body cache in
    /// `cache_dir`.
    pub fn in_memory(config: Config, cache_dir: &Path) -> Result<Self> {
        Self::with_store(config, SqliteStore::in_memory()?, cache_dir)
    }

    fn with_store(config: Config, store: SqliteStore, cache_dir: &Path) -> Result<Self> {
        let cache = Arc::new(BodyCache::new(cache_dir)?);
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::with_options(
            cache.clone(),
            &config.user_agent,
            Duration::from_secs(config.timeout_secs),
        )?);
        let parallel_fetcher =
            ParallelFetcher::with_workers(fetcher, cache, config.workers);

        Ok(Self {
            config,
            store: Arc::new(store),
            parallel_fetcher,
        })
    }

    fn default_data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| TributaryError::Config("Could not find data directory".into()))?;
        Ok(data_dir.join("tributary"))
    }

    /// URLs of one list, or the union of all lists.
    pub fn resolve_urls(&self, list: Option<&str>) -> Result<BTreeSet<String>> {
        let lists = match list {
            Some(list) => vec![list.to_string()],
            None => self.store.all_lists()?,
        };
        if lists.is_empty() {
            return Err(TributaryError::Usage("no feeds to display".into()));
        }

        let mut urls = BTreeSet::new();
        for list in &lists {
            urls.extend(self.store.list_urls(list)?);
        }
        Ok(urls)
    }

    /// Runs one pass and orders the result for display.
    ///
    /// Searches are ordered by score, plain feeds newest first. `limit`
    /// truncates after ordering.
    pub async fn run(&self, request: &PassRequest, now: DateTime<Utc>) -> Result<PassReport> {
        let urls = self.resolve_urls(request.list.as_deref())?;
        let options = PassOptions {
            query: request.query.clone(),
            since: request.since,
            color_remap: self.config.colors.remap.clone(),
        };

        let mut report = self
            .parallel_fetcher
            .run_pass(&urls, self.store.as_ref(), &options, now)
            .await?;

        if request.query.is_some() {
            sort_by_relevance(&mut report.items);
        } else {
            sort_chronological(&mut report.items);
        }
        if let Some(limit) = request.limit.filter(|limit| *limit > 0) {
            report.items.truncate(limit);
        }
        report.summary.items_shown = report.items.len();

        Ok(report)
    }
}
