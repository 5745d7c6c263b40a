//! # Tributary
//!
//! Polls many RSS/Atom feeds and merges them into one ranked item list,
//! fetching as little as possible.
//!
//! ## Architecture
//!
//! ```text
//! Subscriptions → ParallelFetcher → HttpFetcher → BodyCache → Normalizer → rank
//!                        ↕
//!                 FreshnessStore
//! ```
//!
//! Each pass loads the freshness snapshot once, polls every feed
//! concurrently with conditional requests, honours `Cache-Control` and
//! `Retry-After` backoff windows, parses the cached body of every feed that
//! answered, filters and scores the entries, and saves the snapshot once.
//!
//! ## Quick Start
//!
//! ```bash
//! # Subscribe
//! tributary follow https://blog.rust-lang.org/feed.xml
//!
//! # Latest items across all lists
//! tributary feed --limit 20
//!
//! # Search titles and categories
//! tributary search "async closures"
//! ```

/// Application context and error types.
///
/// [`AppContext`](app::AppContext) wires the store, body cache, fetcher and
/// orchestrator together for one invocation.
pub mod app;

/// Command-line interface using clap.
pub mod cli;

/// Configuration loaded from `~/.config/tributary/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`FreshnessEntry`](domain::FreshnessEntry): per-feed validation token and backoff deadline
/// - [`FetchOutcome`](domain::FetchOutcome): result of one conditional poll
/// - [`RankedItem`](domain::RankedItem): an entry ready for display
/// - [`RunSummary`](domain::RunSummary): per-pass counters
pub mod domain;

/// Conditional fetching and the concurrent polling pass.
///
/// - [`Fetcher`](fetcher::Fetcher): async trait for one conditional poll
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based implementation
/// - [`ParallelFetcher`](fetcher::parallel::ParallelFetcher): runs a pass over many feeds
pub mod fetcher;

/// Feed parsing via feed-rs.
pub mod normalizer;

/// Tokenization, relevance scoring, colour assignment and ordering.
pub mod rank;

/// Persistence: freshness snapshot, subscriptions and the body cache.
pub mod store;
