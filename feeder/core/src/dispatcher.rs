//! Event Dispatcher
//!
//! Single owner of the mutable view inputs. User intents arrive on an
//! unbounded queue and are handled strictly one at a time, in arrival order:
//!
//! | Intent            | Effect                                              |
//! |-------------------|-----------------------------------------------------|
//! | `ChangeFilter`    | replace the filters cell                            |
//! | `ToggleFavorite`  | add or remove the favorite (fire-and-forget)        |
//! | `TogglePlayback`  | drive the playback controller, update playback cell |
//! | `Reload`          | refresh the repository (fire-and-forget)            |
//!
//! Playback toggles suspend the queue until the device work finishes.
//! Repository calls do not: they run in a task set owned by the dispatcher and
//! are aborted with it.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;

use crate::effects::EffectSender;
use crate::error::FeedError;
use crate::events::FeedEvent;
use crate::load_state::LoadState;
use crate::model::{FeedContents, FeedItem, Filters, PlaybackState};
use crate::playback::{AudioPlayer, PlaybackController};
use crate::repository::ContentRepository;

/// Dispatcher task state
pub(crate) struct EventDispatcher<R: ContentRepository + ?Sized, P: AudioPlayer> {
    repository: Arc<R>,
    controller: PlaybackController<P>,
    filters: watch::Sender<Filters>,
    playback: watch::Sender<Option<PlaybackState>>,
    content: watch::Receiver<LoadState<FeedContents>>,
    effects: EffectSender,
    background: JoinSet<()>,
}

impl<R: ContentRepository + ?Sized, P: AudioPlayer> EventDispatcher<R, P> {
    pub(crate) fn new(
        repository: Arc<R>,
        controller: PlaybackController<P>,
        filters: watch::Sender<Filters>,
        playback: watch::Sender<Option<PlaybackState>>,
        content: watch::Receiver<LoadState<FeedContents>>,
        effects: EffectSender,
    ) -> Self {
        Self {
            repository,
            controller,
            filters,
            playback,
            content,
            effects,
            background: JoinSet::new(),
        }
    }

    /// Process intents until every sender is gone
    pub(crate) async fn run(mut self, mut intents: mpsc::UnboundedReceiver<FeedEvent>) {
        loop {
            tokio::select! {
                event = intents.recv() => match event {
                    Some(event) => self.handle(event).await,
                    None => break,
                },
                Some(done) = self.background.join_next(), if !self.background.is_empty() => {
                    if let Err(e) = done {
                        if e.is_panic() {
                            tracing::warn!(error = %e, "Repository task panicked");
                        }
                    }
                }
            }
        }

        tracing::debug!(
            pending = self.background.len(),
            "Event dispatcher stopped, aborting repository calls"
        );
    }

    async fn handle(&mut self, event: FeedEvent) {
        tracing::debug!(event = event.name(), "Handling intent");

        match event {
            FeedEvent::ChangeFilter(filters) => {
                self.filters.send_replace(filters);
            }
            FeedEvent::ToggleFavorite(item) => self.toggle_favorite(item),
            FeedEvent::TogglePlayback(item) => self.toggle_playback(&item).await,
            FeedEvent::Reload => self.reload(),
        }
    }

    fn toggle_favorite(&mut self, item: FeedItem) {
        // Nothing loaded yet counts as no favorites.
        let is_favorite = self
            .content
            .borrow()
            .value()
            .is_some_and(|contents| contents.is_favorite(&item.id));

        let repository = Arc::clone(&self.repository);
        self.background.spawn(async move {
            let result = if is_favorite {
                repository.remove_favorite(&item).await
            } else {
                repository.add_favorite(&item).await
            };
            if let Err(e) = result {
                tracing::warn!(
                    item_id = %item.id,
                    remove = is_favorite,
                    error = %e,
                    "Favorite update failed"
                );
            }
        });
    }

    /// The controller's own phase decides between pause, resume, and load.
    async fn toggle_playback(&mut self, item: &FeedItem) {
        tracing::debug!(
            item_id = %item.id,
            phase = ?self.controller.phase(),
            "Toggling playback"
        );

        match self.controller.toggle(item).await {
            Ok(state) => {
                self.playback.send_replace(state);
            }
            Err(e) => {
                tracing::warn!(item_id = %item.id, error = %e, "Playback toggle failed");
                self.playback.send_replace(self.controller.snapshot());
                self.effects.send_error(Arc::new(FeedError::from(e)));
            }
        }
    }

    fn reload(&mut self) {
        let repository = Arc::clone(&self.repository);
        self.background.spawn(async move {
            tracing::info!(repository = repository.name(), "Reloading feed");
            if let Err(e) = repository.refresh().await {
                tracing::warn!(error = %e, "Feed reload failed");
            }
        });
    }
}
