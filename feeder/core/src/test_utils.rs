//! Test Utilities
//!
//! Mock infrastructure for exercising the view model without a network or an
//! audio device: a recording audio player, a repository whose emissions are
//! driven by the test, and item fixtures.
//!
//! # Usage
//!
//! ```ignore
//! use feeder_core::test_utils::{podcast_item, RecordingPlayer, ScriptedRepository};
//!
//! let repository = Arc::new(ScriptedRepository::new());
//! let player = RecordingPlayer::new();
//!
//! let vm = FeedViewModel::new(Arc::clone(&repository), player.clone(), config);
//! repository.push(LoadState::Success(contents));
//!
//! // After the test, verify what reached the collaborators
//! assert_eq!(repository.calls(), vec![RepositoryCall::Refresh]);
//! assert_eq!(player.calls(), vec![DeviceCall::Reset, ...]);
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;

use crate::error::PlaybackError;
use crate::load_state::LoadState;
use crate::model::{FeedContents, FeedItem, FeedItemId, FeedItemKind};
use crate::playback::AudioPlayer;
use crate::repository::{ContentPublisher, ContentRepository, ContentStream, RepositoryResult};

// ============================================================================
// Fixtures
// ============================================================================

/// Blog item with the given id
#[must_use]
pub fn blog_item(id: &str) -> FeedItem {
    FeedItem {
        id: FeedItemId::new(id),
        title: format!("Post {id}"),
        summary: String::new(),
        link: format!("https://example.com/{id}"),
        image_url: None,
        published_at: Utc
            .with_ymd_and_hms(2021, 10, 19, 10, 0, 0)
            .single()
            .unwrap_or_default(),
        kind: FeedItemKind::Blog,
        podcast_url: None,
    }
}

/// Podcast item with the given id and audio source
#[must_use]
pub fn podcast_item(id: &str, url: &str) -> FeedItem {
    FeedItem {
        title: format!("Episode {id}"),
        kind: FeedItemKind::Podcast,
        podcast_url: Some(url.to_string()),
        ..blog_item(id)
    }
}

/// Loaded contents from items, with the given ids marked as favorite
#[must_use]
pub fn contents(items: Vec<FeedItem>, favorites: &[&str]) -> FeedContents {
    let favorites: BTreeSet<FeedItemId> = favorites.iter().map(|id| FeedItemId::new(*id)).collect();
    FeedContents::new(items, favorites)
}

// ============================================================================
// Recording Audio Player
// ============================================================================

/// A call made to the audio device
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeviceCall {
    /// `reset()`
    Reset,
    /// `set_source(url)`
    SetSource(String),
    /// `prepare()`
    Prepare,
    /// `start()`
    Start,
    /// `pause()`
    Pause,
}

impl DeviceCall {
    fn same_kind(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

#[derive(Default)]
struct PlayerInner {
    calls: Vec<DeviceCall>,
    fail_on: Option<DeviceCall>,
    playing: bool,
}

/// Audio player that records every call
///
/// Clones share the same record, so a test can keep one handle while the
/// controller owns another.
#[derive(Clone, Default)]
pub struct RecordingPlayer {
    inner: Arc<Mutex<PlayerInner>>,
}

impl RecordingPlayer {
    /// Create a player that accepts every call
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls made so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.inner.lock().calls.clone()
    }

    /// Forget recorded calls
    pub fn clear_calls(&self) {
        self.inner.lock().calls.clear();
    }

    /// Fail every call of the same kind as `call` (the argument is ignored)
    pub fn fail_on(&self, call: DeviceCall) {
        self.inner.lock().fail_on = Some(call);
    }

    /// Accept every call again
    pub fn heal(&self) {
        self.inner.lock().fail_on = None;
    }

    fn record(&self, call: DeviceCall) -> Result<(), PlaybackError> {
        let mut inner = self.inner.lock();
        let fails = inner
            .fail_on
            .as_ref()
            .is_some_and(|failing| failing.same_kind(&call));
        let error = fails.then(|| PlaybackError::Device(format!("{call:?} rejected")));
        inner.calls.push(call);
        error.map_or(Ok(()), Err)
    }
}

impl AudioPlayer for RecordingPlayer {
    fn reset(&mut self) -> Result<(), PlaybackError> {
        self.record(DeviceCall::Reset)?;
        self.inner.lock().playing = false;
        Ok(())
    }

    fn set_source(&mut self, url: &str) -> Result<(), PlaybackError> {
        self.record(DeviceCall::SetSource(url.to_string()))
    }

    fn prepare(&mut self) -> Result<(), PlaybackError> {
        self.record(DeviceCall::Prepare)
    }

    fn start(&mut self) -> Result<(), PlaybackError> {
        self.record(DeviceCall::Start)?;
        self.inner.lock().playing = true;
        Ok(())
    }

    fn pause(&mut self) -> Result<(), PlaybackError> {
        self.record(DeviceCall::Pause)?;
        self.inner.lock().playing = false;
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.inner.lock().playing
    }
}

// ============================================================================
// Scripted Repository
// ============================================================================

/// A call made to the repository
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RepositoryCall {
    /// `refresh()`
    Refresh,
    /// `add_favorite(item)`
    AddFavorite(FeedItemId),
    /// `remove_favorite(item)`
    RemoveFavorite(FeedItemId),
}

/// Repository whose emissions are pushed by the test
///
/// Operations are recorded and succeed without publishing anything; the test
/// decides what the content stream shows via [`push`](Self::push).
#[derive(Default)]
pub struct ScriptedRepository {
    publisher: ContentPublisher,
    calls: Mutex<Vec<RepositoryCall>>,
}

impl ScriptedRepository {
    /// Create a repository whose stream starts at `Loading`
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit a load state to every subscriber
    pub fn push(&self, state: LoadState<FeedContents>) {
        self.publisher.publish(state);
    }

    /// Calls made so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<RepositoryCall> {
        self.calls.lock().clone()
    }

    /// Number of live content subscribers
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.publisher.subscriber_count()
    }

    fn record(&self, call: RepositoryCall) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl ContentRepository for ScriptedRepository {
    fn name(&self) -> &str {
        "scripted"
    }

    fn observe_content(&self) -> ContentStream {
        self.publisher.subscribe()
    }

    async fn refresh(&self) -> RepositoryResult {
        self.record(RepositoryCall::Refresh);
        Ok(())
    }

    async fn add_favorite(&self, item: &FeedItem) -> RepositoryResult {
        self.record(RepositoryCall::AddFavorite(item.id.clone()));
        Ok(())
    }

    async fn remove_favorite(&self, item: &FeedItem) -> RepositoryResult {
        self.record(RepositoryCall::RemoveFavorite(item.id.clone()));
        Ok(())
    }
}
