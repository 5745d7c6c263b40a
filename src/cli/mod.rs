pub mod commands;

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};

use crate::store::DEFAULT_LIST;

#[derive(Parser)]
#[command(name = "tributary")]
#[command(about = "Aggregate many RSS/Atom feeds into one ranked list", long_about = None)]
pub struct Cli {
    /// Number of feeds fetched in parallel (overrides the config file)
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Args, Debug, Clone)]
pub struct DisplayArgs {
    /// Only show feeds from this list
    #[arg(short, long)]
    pub list: Option<String>,

    /// Maximum number of items to show
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Hide items published before this date (RFC 3339 or YYYY-MM-DD)
    #[arg(short, long, value_parser = parse_since)]
    pub since: Option<DateTime<Utc>>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the latest items from all subscribed feeds
    Feed {
        #[command(flatten)]
        display: DisplayArgs,
    },
    /// Search item titles and categories
    Search {
        /// Search terms
        query: String,
        #[command(flatten)]
        display: DisplayArgs,
    },
    /// Subscribe to one or more feeds
    Follow {
        /// Feed URLs
        #[arg(required = true)]
        urls: Vec<String>,
        /// List to add the feeds to
        #[arg(short, long, default_value = DEFAULT_LIST)]
        list: String,
    },
    /// Show per-feed fetch times and backoff deadlines
    CacheInfo,
}

/// Accepts a full RFC 3339 timestamp or a bare date (midnight UTC).
pub fn parse_since(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("invalid date: {s}"))
}
