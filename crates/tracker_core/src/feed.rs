use crate::{Highlight, TickerMessage};

/// Most entries the merged feed ever shows.
pub const FEED_CAPACITY: usize = 8;

/// One entry of the display feed.
///
/// Real highlights and synthetic ticker messages are kept apart by variant
/// rather than by the sign of a shared integer id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedItem {
    /// `rank` is 1 for the newest highlight, 2 for the one before, and so on.
    Highlight { rank: usize, text: String },
    Ticker { id: u64, text: String },
}

impl FeedItem {
    pub fn text(&self) -> &str {
        match self {
            FeedItem::Highlight { text, .. } | FeedItem::Ticker { text, .. } => text,
        }
    }

    /// Signed key for renderers that want a single integer: negative for
    /// highlights, positive for ticker messages.
    pub fn display_id(&self) -> i64 {
        match self {
            FeedItem::Highlight { rank, .. } => -i64::try_from(*rank).unwrap_or(i64::MAX),
            FeedItem::Ticker { id, .. } => i64::try_from(*id).unwrap_or(i64::MAX),
        }
    }

    pub fn is_highlight(&self) -> bool {
        matches!(self, FeedItem::Highlight { .. })
    }
}

/// Merges stored highlights (oldest first) with ticker messages (newest
/// first) into the capped display feed: newest highlight first, then ticker
/// messages.
pub fn merge_feed<'a, I>(highlights: &[Highlight], ticker: I) -> Vec<FeedItem>
where
    I: IntoIterator<Item = &'a TickerMessage>,
{
    highlights
        .iter()
        .rev()
        .enumerate()
        .map(|(index, highlight)| FeedItem::Highlight {
            rank: index + 1,
            text: highlight.text.clone(),
        })
        .chain(ticker.into_iter().map(|message| FeedItem::Ticker {
            id: message.id,
            text: message.text.clone(),
        }))
        .take(FEED_CAPACITY)
        .collect()
}
