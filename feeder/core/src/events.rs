//! Feed Events
//!
//! Intents sent from UI surfaces to the feed view model. Surfaces report what
//! the user did; the dispatcher decides what that means for filters, playback
//! and the repository.

use serde::{Deserialize, Serialize};

use crate::model::{FeedItem, Filters};

/// User intents handled by the dispatcher
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedEvent {
    /// Replace the active filters
    ChangeFilter(Filters),

    /// Add the item to favorites, or remove it if it already is one
    ToggleFavorite(FeedItem),

    /// Play, pause or resume the item's audio
    TogglePlayback(FeedItem),

    /// Reload the feed from the repository
    Reload,
}

impl FeedEvent {
    /// Short name used in log fields
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ChangeFilter(_) => "change_filter",
            Self::ToggleFavorite(_) => "toggle_favorite",
            Self::TogglePlayback(_) => "toggle_playback",
            Self::Reload => "reload",
        }
    }
}
