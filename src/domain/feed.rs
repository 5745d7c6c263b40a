use chrono::{DateTime, Utc};

/// A parsed feed body reduced to what ranking needs.
#[derive(Debug, Clone, Default)]
pub struct ParsedFeed {
    pub title: String,
    pub entries: Vec<FeedEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub link: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub categories: Vec<String>,
}

impl FeedEntry {
    /// Publish time, with entries lacking one treated as the oldest possible.
    pub fn published_or_epoch(&self) -> DateTime<Utc> {
        self.published.unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}
