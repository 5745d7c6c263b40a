pub mod body_cache;
pub mod sqlite;

use std::collections::{BTreeSet, HashMap};

use crate::app::Result;
use crate::domain::FreshnessEntry;

pub use body_cache::BodyCache;
pub use sqlite::SqliteStore;

/// Name of the list used when none is given.
pub const DEFAULT_LIST: &str = "default";

/// Persisted per-feed freshness metadata. Loaded once and saved once per pass.
pub trait FreshnessStore {
    fn load(&self) -> Result<HashMap<String, FreshnessEntry>>;
    /// Replaces the whole persisted snapshot with `entries`.
    fn save(&self, entries: &HashMap<String, FreshnessEntry>) -> Result<()>;
}

/// Read-only view of the subscriber's feed lists.
pub trait SubscriptionSource {
    fn list_urls(&self, list: &str) -> Result<BTreeSet<String>>;
    fn all_lists(&self) -> Result<Vec<String>>;
}
