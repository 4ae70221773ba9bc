//! HTTP content repository
//!
//! Fetches the feed with a single JSON `GET`. When an id token is set, every
//! request carries `Authorization: Bearer <token>`. Unknown keys in the
//! payload are ignored so the backend can grow without breaking clients.
//!
//! Favorites are kept client-side in memory and merged into every published
//! snapshot.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde::Deserialize;

use super::{ContentPublisher, ContentRepository, ContentStream, RepositoryResult};
use crate::error::FeedError;
use crate::load_state::LoadState;
use crate::model::{FeedContents, FeedItem, FeedItemId};

/// Accepted payload shapes: a bare array or an object wrapping the items
#[derive(Deserialize)]
#[serde(untagged)]
enum FeedPayload {
    Wrapped {
        #[serde(alias = "contents")]
        items: Vec<FeedItem>,
    },
    Bare(Vec<FeedItem>),
}

impl FeedPayload {
    fn into_items(self) -> Vec<FeedItem> {
        match self {
            Self::Wrapped { items } | Self::Bare(items) => items,
        }
    }
}

/// Repository fetching the feed from an HTTP endpoint
pub struct HttpFeedRepository {
    client: reqwest::Client,
    feed_url: String,
    id_token: RwLock<Option<String>>,
    favorites: Mutex<BTreeSet<FeedItemId>>,
    /// Only the latest refresh may publish its outcome
    refresh_seq: AtomicU64,
    publisher: ContentPublisher,
}

impl HttpFeedRepository {
    /// Create a repository for the given feed URL
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Transport`] if the HTTP client cannot be built.
    pub fn new(feed_url: impl Into<String>, timeout: Duration) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            feed_url: feed_url.into(),
            id_token: RwLock::new(None),
            favorites: Mutex::new(BTreeSet::new()),
            refresh_seq: AtomicU64::new(0),
            publisher: ContentPublisher::default(),
        })
    }

    /// Set the id token sent as a bearer credential
    #[must_use]
    pub fn with_id_token(self, token: Option<String>) -> Self {
        self.set_id_token(token);
        self
    }

    /// Replace the id token; later requests use the new value
    pub fn set_id_token(&self, token: Option<String>) {
        *self.id_token.write() = token;
    }

    /// Feed endpoint
    #[must_use]
    pub fn feed_url(&self) -> &str {
        &self.feed_url
    }

    async fn fetch(&self) -> Result<Vec<FeedItem>, FeedError> {
        let mut request = self.client.get(&self.feed_url);
        if let Some(token) = self.id_token.read().clone() {
            request = request.bearer_auth(token);
        }

        tracing::debug!(url = %self.feed_url, "GET feed");
        let response = request.send().await?;
        let status = response.status();
        tracing::debug!(url = %self.feed_url, status = status.as_u16(), "Feed response");

        if !status.is_success() {
            return Err(FeedError::Status {
                status: status.as_u16(),
                url: self.feed_url.clone(),
            });
        }

        let body = response.bytes().await?;
        let payload: FeedPayload = serde_json::from_slice(&body)?;
        Ok(payload.into_items())
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
impl ContentRepository for HttpFeedRepository {
    fn name(&self) -> &str {
        "http"
    }

    fn observe_content(&self) -> ContentStream {
        self.publisher.subscribe()
    }

    async fn refresh(&self) -> RepositoryResult {
        let seq = self.refresh_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.publisher.publish(LoadState::Loading);

        let outcome = self.fetch().await;
        if self.refresh_seq.load(Ordering::SeqCst) != seq {
            tracing::debug!(seq, "Discarding superseded feed refresh");
            return Ok(());
        }

        match outcome {
            Ok(items) => {
                tracing::info!(items = items.len(), "Feed loaded");
                let favorites = self.favorites.lock();
                self.publisher.publish(LoadState::Success(FeedContents::new(
                    items,
                    favorites.clone(),
                )));
                Ok(())
            }
            Err(e) => {
                tracing::warn!(url = %self.feed_url, error = %e, "Feed refresh failed");
                let cause = Arc::new(e);
                self.publisher.publish(LoadState::Error(Arc::clone(&cause)));
                Err(cause)
            }
        }
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
