//! State Aggregator
//!
//! Combines the four inputs of the view into one immutable [`ViewState`]:
//!
//! ```text
//!   content stream ──┐
//!   filters cell  ───┤
//!   playback cell ───┼──▶ derive_view_state ──▶ state cell (replay-latest)
//!   latch toggle  ───┘
//!         │
//!         └── Error emissions ──▶ effect channel
//! ```
//!
//! The aggregator is a single task. It caches the latest value of each input
//! and re-derives the snapshot whenever any of them changes. Equal snapshots
//! are not republished.

use futures::StreamExt;
use tokio::sync::watch;

use crate::effects::EffectSender;
use crate::load_state::LoadState;
use crate::model::{FeedContents, Filters, PlaybackState, ViewState};
use crate::progress_latch::ProgressLatch;
use crate::repository::ContentStream;

/// Derive the view snapshot from its inputs
///
/// `Loading` and `Error` contribute an empty feed.
#[must_use]
pub fn derive_view_state(
    content: &LoadState<FeedContents>,
    filters: &Filters,
    playback: Option<&PlaybackState>,
    show_progress: bool,
) -> ViewState {
    let filtered_contents = content
        .value()
        .map(|contents| contents.filtered(filters))
        .unwrap_or_default();

    ViewState {
        show_progress,
        filters: filters.clone(),
        playback: playback.cloned(),
        filtered_contents,
    }
}

/// Aggregator task state
pub(crate) struct StateAggregator {
    content_stream: ContentStream,
    filters: watch::Receiver<Filters>,
    playback: watch::Receiver<Option<PlaybackState>>,
    latch: ProgressLatch,
    effects: EffectSender,
    /// Latest content, re-exposed for the dispatcher
    content: watch::Sender<LoadState<FeedContents>>,
    state: watch::Sender<ViewState>,
}

impl StateAggregator {
    pub(crate) fn new(
        content_stream: ContentStream,
        filters: watch::Receiver<Filters>,
        playback: watch::Receiver<Option<PlaybackState>>,
        latch: ProgressLatch,
        effects: EffectSender,
        content: watch::Sender<LoadState<FeedContents>>,
        state: watch::Sender<ViewState>,
    ) -> Self {
        Self {
            content_stream,
            filters,
            playback,
            latch,
            effects,
            content,
            state,
        }
    }

    /// Run until the dispatcher side of the cells goes away
    pub(crate) async fn run(mut self) {
        let mut shown = self.latch.toggle_state();
        let mut stream_open = true;

        self.publish(*shown.borrow_and_update());

        loop {
            tokio::select! {
                next = self.content_stream.next(), if stream_open => match next {
                    Some(state) => self.on_content(state),
                    None => {
                        tracing::info!("Content stream ended");
                        stream_open = false;
                    }
                },
                changed = self.filters.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                changed = self.playback.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                changed = shown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }

            self.publish(*shown.borrow_and_update());
        }

        tracing::debug!("State aggregator stopped");
    }

    fn on_content(&mut self, state: LoadState<FeedContents>) {
        match &state {
            LoadState::Loading => tracing::debug!("Feed loading"),
            LoadState::Success(contents) => {
                tracing::debug!(items = contents.len(), "Feed contents received");
            }
            LoadState::Error(cause) => {
                tracing::warn!(error = %cause, "Feed failed to load");
                self.effects.send_error(std::sync::Arc::clone(cause));
            }
        }

        self.latch.refresh(state.is_loading());
        self.content.send_replace(state);
    }

    fn publish(&self, show_progress: bool) {
        let next = {
            let content = self.content.borrow();
            let filters = self.filters.borrow();
            let playback = self.playback.borrow();
            derive_view_state(&content, &filters, (*playback).as_ref(), show_progress)
        };

        self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::effects::{effect_channel, Effect, EffectStream};
    use crate::error::FeedError;
    use crate::model::FeedItemId;
    use crate::progress_latch::LatchConfig;
    use crate::repository::ContentPublisher;
    use crate::test_utils::{blog_item, contents};
    use pretty_assertions::assert_eq;

    struct Harness {
        publisher: Arc<ContentPublisher>,
        filters: watch::Sender<Filters>,
        playback: watch::Sender<Option<PlaybackState>>,
        state: watch::Receiver<ViewState>,
        effects: EffectStream,
        _task: tokio::task::JoinHandle<()>,
    }

    fn spawn() -> Harness {
        let publisher = Arc::new(ContentPublisher::default());
        let (filters_tx, filters_rx) = watch::channel(Filters::default());
        let (playback_tx, playback_rx) = watch::channel(None);
        let (content_tx, _) = watch::channel(LoadState::Loading);
        let (state_tx, state_rx) = watch::channel(ViewState::default());
        let (effects_tx, effects) = effect_channel();

        let aggregator = StateAggregator::new(
            publisher.subscribe(),
            filters_rx,
            playback_rx,
            ProgressLatch::new(LatchConfig::default()),
            effects_tx,
            content_tx,
            state_tx,
        );

        Harness {
            publisher,
            filters: filters_tx,
            playback: playback_tx,
            state: state_rx,
            effects,
            _task: tokio::spawn(aggregator.run()),
        }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn test_loading_and_error_derive_empty_contents() {
        let filters = Filters::default();

        let loading = derive_view_state(&LoadState::Loading, &filters, None, true);
        assert!(loading.filtered_contents.is_empty());
        assert!(loading.show_progress);

        let error = derive_view_state(&LoadState::error(FeedError::Closed), &filters, None, false);
        assert_eq!(error, ViewState::default());
    }

    #[test]
    fn test_success_applies_filters() {
        let loaded = LoadState::Success(contents(vec![blog_item("a"), blog_item("b")], &["b"]));

        let all = derive_view_state(&loaded, &Filters::default(), None, false);
        assert_eq!(all.filtered_contents.len(), 2);

        let favorites = derive_view_state(&loaded, &Filters::favorites_only(), None, false);
        assert_eq!(favorites.filtered_contents.items, vec![blog_item("b")]);
        assert!(favorites.filters.favorites_only);
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_error_emission_enqueues_an_effect() {
        let mut h = spawn();

        h.publisher.publish(LoadState::error(FeedError::Closed));
        h.publisher.publish(LoadState::error(FeedError::Status {
            status: 500,
            url: "https://feed".to_string(),
        }));
        settle().await;

        let first = h.effects.try_recv().unwrap();
        let second = h.effects.try_recv().unwrap();
        assert!(matches!(first, Effect::ErrorMessage(ref e) if matches!(**e, FeedError::Closed)));
        assert!(
            matches!(second, Effect::ErrorMessage(ref e) if matches!(**e, FeedError::Status { .. }))
        );
        assert!(h.effects.try_recv().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_recomputes_on_filter_and_playback_change() {
        let mut h = spawn();
        h.publisher.publish(LoadState::Success(contents(
            vec![blog_item("a"), blog_item("b")],
            &["a"],
        )));
        settle().await;
        assert_eq!(h.state.borrow_and_update().filtered_contents.len(), 2);

        h.filters.send_replace(Filters::favorites_only());
        settle().await;
        assert_eq!(
            h.state.borrow_and_update().filtered_contents.items,
            vec![blog_item("a")]
        );

        let playing = PlaybackState {
            item_id: FeedItemId::new("a"),
            source_url: "https://cdn/a.mp3".to_string(),
            is_playing: true,
        };
        h.playback.send_replace(Some(playing.clone()));
        settle().await;
        assert_eq!(h.state.borrow_and_update().playback, Some(playing));
    }

    #[tokio::test(start_paused = true)]
    async fn test_equal_snapshots_are_not_republished() {
        let mut h = spawn();
        settle().await;
        let _ = h.state.borrow_and_update();

        h.filters.send_replace(Filters::default());
        settle().await;

        assert!(!h.state.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_load_raises_progress() {
        let h = spawn();
        settle().await;
        assert!(!h.state.borrow().show_progress);

        tokio::time::sleep(Duration::from_millis(800)).await;
        settle().await;
        assert!(h.state.borrow().show_progress);

        h.publisher
            .publish(LoadState::Success(contents(vec![blog_item("a")], &[])));
        tokio::time::sleep(Duration::from_millis(600)).await;
        settle().await;
        assert!(!h.state.borrow().show_progress);
        assert_eq!(h.state.borrow().filtered_contents.len(), 1);
    }
}
