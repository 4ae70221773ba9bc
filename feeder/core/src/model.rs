//! Feed Model
//!
//! Plain value types shared by every layer of the engine: feed items, the
//! loaded feed contents, user filters, playback state and the derived
//! [`ViewState`] snapshot that surfaces render.
//!
//! All types here are immutable values. Anything that "changes" produces a new
//! value; nothing is mutated behind a surface's back.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Feed item identifier
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedItemId(pub String);

impl FeedItemId {
    /// Create an identifier from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeedItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What kind of content a feed item links to
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedItemKind {
    /// Written article
    #[default]
    Blog,
    /// Video
    Video,
    /// Audio episode with a playable source
    Podcast,
}

/// A single entry in the feed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    /// Stable identifier
    pub id: FeedItemId,
    /// Display title
    pub title: String,
    /// Short summary
    #[serde(default)]
    pub summary: String,
    /// Link to the full content
    #[serde(default)]
    pub link: String,
    /// Optional thumbnail
    #[serde(default)]
    pub image_url: Option<String>,
    /// Publication time
    pub published_at: DateTime<Utc>,
    /// Content kind
    #[serde(default)]
    pub kind: FeedItemKind,
    /// Audio source for podcast items
    #[serde(default)]
    pub podcast_url: Option<String>,
}

impl FeedItem {
    /// Audio source to load when this item is played
    ///
    /// Only podcast items are playable.
    #[must_use]
    pub fn podcast_link(&self) -> Option<&str> {
        match self.kind {
            FeedItemKind::Podcast => self.podcast_url.as_deref(),
            FeedItemKind::Blog | FeedItemKind::Video => None,
        }
    }
}

/// Loaded feed: ordered items plus the ids the user marked as favorite
///
/// An empty value is a real, loaded feed with nothing in it. "Not loaded yet"
/// is expressed by `LoadState::Loading`, never by an empty `FeedContents`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedContents {
    /// Items in display order
    #[serde(default)]
    pub items: Vec<FeedItem>,
    /// Favorite item ids
    #[serde(default)]
    pub favorites: BTreeSet<FeedItemId>,
}

impl FeedContents {
    /// Create contents from items and favorites
    #[must_use]
    pub fn new(items: Vec<FeedItem>, favorites: BTreeSet<FeedItemId>) -> Self {
        Self { items, favorites }
    }

    /// Whether there are no items
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of items
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the given item is a favorite
    #[must_use]
    pub fn is_favorite(&self, id: &FeedItemId) -> bool {
        self.favorites.contains(id)
    }

    /// Look up an item by id
    #[must_use]
    pub fn item(&self, id: &FeedItemId) -> Option<&FeedItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Apply filters, keeping item order and the favorites set intact
    #[must_use]
    pub fn filtered(&self, filters: &Filters) -> Self {
        let items = if filters.favorites_only {
            self.items
                .iter()
                .filter(|item| self.favorites.contains(&item.id))
                .cloned()
                .collect()
        } else {
            self.items.clone()
        };

        Self {
            items,
            favorites: self.favorites.clone(),
        }
    }
}

/// User-selected filters
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Filters {
    /// Show only favorite items
    #[serde(default)]
    pub favorites_only: bool,
}

impl Filters {
    /// Filters that only keep favorites
    #[must_use]
    pub fn favorites_only() -> Self {
        Self {
            favorites_only: true,
        }
    }
}

/// What the audio player currently holds
///
/// `Option<PlaybackState>::None` means nothing has been loaded yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackState {
    /// Item loaded into the player
    pub item_id: FeedItemId,
    /// Audio source of that item
    pub source_url: String,
    /// Whether audio is currently playing
    pub is_playing: bool,
}

impl PlaybackState {
    /// Whether this state is the given item, actively playing
    #[must_use]
    pub fn is_playing_item(&self, id: &FeedItemId) -> bool {
        self.is_playing && &self.item_id == id
    }
}

/// Immutable snapshot rendered by UI surfaces
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    /// Whether a progress indicator should be visible
    pub show_progress: bool,
    /// Active filters
    pub filters: Filters,
    /// Current playback target, if any
    pub playback: Option<PlaybackState>,
    /// Contents after filters were applied
    pub filtered_contents: FeedContents,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn item(id: &str, kind: FeedItemKind, podcast_url: Option<&str>) -> FeedItem {
        FeedItem {
            id: FeedItemId::new(id),
            title: format!("Title {id}"),
            summary: String::new(),
            link: format!("https://example.com/{id}"),
            image_url: None,
            published_at: Utc.with_ymd_and_hms(2021, 10, 19, 10, 0, 0).unwrap(),
            kind,
            podcast_url: podcast_url.map(str::to_string),
        }
    }

    #[test]
    fn test_filtered_keeps_order_and_favorites() {
        let contents = FeedContents::new(
            vec![
                item("a", FeedItemKind::Blog, None),
                item("b", FeedItemKind::Video, None),
                item("c", FeedItemKind::Blog, None),
            ],
            [FeedItemId::new("c"), FeedItemId::new("a")]
                .into_iter()
                .collect(),
        );

        let filtered = contents.filtered(&Filters::favorites_only());
        let ids: Vec<_> = filtered.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(filtered.favorites, contents.favorites);
    }

    #[test]
    fn test_default_filters_keep_everything() {
        let contents = FeedContents::new(
            vec![
                item("a", FeedItemKind::Blog, None),
                item("b", FeedItemKind::Blog, None),
            ],
            BTreeSet::new(),
        );
        assert_eq!(contents.filtered(&Filters::default()), contents);
    }

    #[test]
    fn test_empty_contents_filtered_stays_empty() {
        let contents = FeedContents::default();
        assert!(contents.filtered(&Filters::favorites_only()).is_empty());
    }

    #[test]
    fn test_podcast_link_only_for_podcasts() {
        let podcast = item("p", FeedItemKind::Podcast, Some("https://cdn/p.mp3"));
        assert_eq!(podcast.podcast_link(), Some("https://cdn/p.mp3"));

        let blog = item("b", FeedItemKind::Blog, Some("https://cdn/b.mp3"));
        assert_eq!(blog.podcast_link(), None);
    }

    #[test]
    fn test_is_playing_item_requires_flag_and_id() {
        let state = PlaybackState {
            item_id: FeedItemId::new("p"),
            source_url: "u".to_string(),
            is_playing: true,
        };
        assert!(state.is_playing_item(&FeedItemId::new("p")));
        assert!(!state.is_playing_item(&FeedItemId::new("q")));

        let paused = PlaybackState {
            is_playing: false,
            ..state
        };
        assert!(!paused.is_playing_item(&FeedItemId::new("p")));
    }

    #[test]
    fn test_item_deserializes_with_defaults() {
        let json = r#"{
            "id": "x",
            "title": "Hello",
            "published_at": "2021-10-19T10:00:00Z",
            "unknown_field": 42
        }"#;
        let parsed: FeedItem = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.id, FeedItemId::new("x"));
        assert_eq!(parsed.kind, FeedItemKind::Blog);
        assert_eq!(parsed.podcast_url, None);
    }

    #[test]
    fn test_initial_view_state() {
        let state = ViewState::default();
        assert!(!state.show_progress);
        assert_eq!(state.filters, Filters::default());
        assert_eq!(state.playback, None);
        assert!(state.filtered_contents.is_empty());
    }
}
