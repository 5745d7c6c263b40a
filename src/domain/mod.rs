pub mod feed;
pub mod item;
pub mod state;
pub mod summary;

pub use feed::{FeedEntry, ParsedFeed};
pub use item::RankedItem;
pub use state::{FetchOutcome, FreshnessEntry};
pub use summary::{pluralize, RunSummary};
