//! Content Repositories
//!
//! The view model never talks to the network directly. It consumes a
//! [`ContentRepository`], which owns the authoritative feed data and exposes
//! it as a push stream of load states.
//!
//! # Available Repositories
//!
//! - [`InMemoryRepository`]: static contents, used offline and in tests
//! - [`HttpFeedRepository`]: fetches the feed as JSON over HTTP
//!
//! # Stream semantics
//!
//! [`ContentRepository::observe_content`] is replay-latest: a new subscriber
//! immediately receives the current load state, then every later emission in
//! order. Emissions are never coalesced, so two consecutive failures reach the
//! subscriber as two `Error` items.

mod http;
mod memory;
mod publisher;

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::FeedError;
use crate::load_state::LoadState;
use crate::model::{FeedContents, FeedItem};

pub use http::HttpFeedRepository;
pub use memory::InMemoryRepository;
pub use publisher::ContentPublisher;

/// Stream of feed load states
pub type ContentStream = BoxStream<'static, LoadState<FeedContents>>;

/// Completion of a repository operation
///
/// The error is shared with the `LoadState::Error` the repository published
/// for the same failure.
pub type RepositoryResult = Result<(), Arc<FeedError>>;

/// Source of feed contents
///
/// Implement this trait to plug a different backend into the view model.
/// Every operation's outcome must eventually be reflected in
/// [`observe_content`](Self::observe_content); callers treat the returned
/// result as a diagnostic only.
#[async_trait]
pub trait ContentRepository: Send + Sync + 'static {
    /// Repository name for logs
    fn name(&self) -> &str;

    /// Subscribe to feed load states (replay-latest, lossless)
    fn observe_content(&self) -> ContentStream;

    /// Reload the feed
    async fn refresh(&self) -> RepositoryResult;

    /// Mark an item as favorite
    async fn add_favorite(&self, item: &FeedItem) -> RepositoryResult;

    /// Remove an item from favorites
    async fn remove_favorite(&self, item: &FeedItem) -> RepositoryResult;
}
