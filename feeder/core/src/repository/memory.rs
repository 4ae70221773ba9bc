//! In-memory content repository
//!
//! Serves a fixed set of items. Favorites live in memory. An optional
//! simulated latency makes the loading phase observable.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{ContentPublisher, ContentRepository, ContentStream, RepositoryResult};
use crate::error::FeedError;
use crate::load_state::LoadState;
use crate::model::{FeedContents, FeedItem, FeedItemId};

/// Repository backed by a fixed item list
pub struct InMemoryRepository {
    items: Vec<FeedItem>,
    favorites: Mutex<BTreeSet<FeedItemId>>,
    latency: Duration,
    publisher: ContentPublisher,
}

impl InMemoryRepository {
    /// Create a repository serving the given contents
    ///
    /// Nothing is published until the first [`refresh`](ContentRepository::refresh);
    /// subscribers see `Loading` until then.
    #[must_use]
    pub fn new(contents: FeedContents) -> Self {
        Self {
            items: contents.items,
            favorites: Mutex::new(contents.favorites),
            latency: Duration::ZERO,
            publisher: ContentPublisher::default(),
        }
    }

    /// Parse contents from JSON (`{"items": [...], "favorites": [...]}`)
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Decode`] if the payload is not valid contents.
    pub fn from_json_str(json: &str) -> Result<Self, FeedError> {
        let contents: FeedContents = serde_json::from_str(json)?;
        Ok(Self::new(contents))
    }

    /// Delay every refresh by the given duration
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Current favorites
    pub fn favorites(&self) -> BTreeSet<FeedItemId> {
        self.favorites.lock().clone()
    }

    /// The set and the published copy change under one guard, so concurrent
    /// toggles publish in the same order they edit the set.
    fn set_favorite(&self, id: &FeedItemId, favorite: bool) {
        let mut favorites = self.favorites.lock();
        if favorite {
            favorites.insert(id.clone());
        } else {
            favorites.remove(id);
        }
        self.publisher.update_contents(|contents| {
            if favorite {
                contents.favorites.insert(id.clone());
            } else {
                contents.favorites.remove(id);
            }
        });
    }
}

#[async_trait]
impl ContentRepository for InMemoryRepository {
    fn name(&self) -> &str {
        "in-memory"
    }

    fn observe_content(&self) -> ContentStream {
        self.publisher.subscribe()
    }

    async fn refresh(&self) -> RepositoryResult {
        self.publisher.publish(LoadState::Loading);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let favorites = self.favorites.lock();
        let contents = FeedContents::new(self.items.clone(), favorites.clone());
        tracing::debug!(items = contents.len(), "In-memory feed loaded");
        self.publisher.publish(LoadState::Success(contents));
        Ok(())
    }

    async fn add_favorite(&self, item: &FeedItem) -> RepositoryResult {
        self.set_favorite(&item.id, true);
        Ok(())
    }

    async fn remove_favorite(&self, item: &FeedItem) -> RepositoryResult {
        self.set_favorite(&item.id, false);
        Ok(())
    }
}
