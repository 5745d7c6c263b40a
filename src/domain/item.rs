use std::sync::Arc;

use crate::domain::FeedEntry;

/// An entry that survived filtering, ready for display.
#[derive(Debug, Clone)]
pub struct RankedItem {
    pub feed_url: Arc<str>,
    pub feed_title: Arc<str>,
    pub entry: FeedEntry,
    /// 256-colour palette index assigned to the source feed for this pass.
    pub color: u8,
    /// Published after the feed's last successful fetch before this pass.
    pub is_new: bool,
    /// Relevance score; only meaningful for searches.
    pub score: i32,
}

impl RankedItem {
    pub fn display_title(&self) -> &str {
        if self.entry.title.is_empty() {
            "(Untitled)"
        } else {
            &self.entry.title
        }
    }
}
