//! Feed View Model
//!
//! Composition root of the engine. [`FeedViewModel::new`] wires one instance of
//! every component together and spawns two tasks:
//!
//! ```text
//!   dispatch(event) ──▶ intent queue ──▶ EventDispatcher ──┬──▶ filters cell ──┐
//!                                            │             └──▶ playback cell ─┤
//!                                            ▼                                 ▼
//!                                     ContentRepository ── content ──▶ StateAggregator
//!                                                                        │        │
//!                                                          state() ◀─────┘        │
//!                                                          take_effects() ◀───────┘
//! ```
//!
//! Dropping the view model aborts both tasks. Any in-flight repository call,
//! pending progress timer, or playback update is abandoned with them.
//!
//! # Usage
//!
//! ```ignore
//! let vm = FeedViewModel::new(repository, player, ViewModelConfig::default());
//! let mut effects = vm.take_effects().unwrap();
//! let mut state = vm.state();
//!
//! vm.dispatch(FeedEvent::ChangeFilter(Filters::favorites_only()))?;
//! state.changed().await?;
//! render(&state.borrow());
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::aggregator::StateAggregator;
use crate::config::FeederConfig;
use crate::dispatcher::EventDispatcher;
use crate::effects::{effect_channel, EffectStream};
use crate::error::FeedError;
use crate::events::FeedEvent;
use crate::load_state::LoadState;
use crate::model::{Filters, ViewState};
use crate::playback::{AudioPlayer, PlaybackController};
use crate::progress_latch::{LatchConfig, ProgressLatch};
use crate::repository::ContentRepository;

/// View model settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewModelConfig {
    /// Progress indicator timing
    pub latch: LatchConfig,
    /// Filters the view starts with
    pub initial_filters: Filters,
    /// Whether to refresh the repository right after start
    pub refresh_on_start: bool,
}

impl Default for ViewModelConfig {
    fn default() -> Self {
        Self {
            latch: LatchConfig::default(),
            initial_filters: Filters::default(),
            refresh_on_start: true,
        }
    }
}

impl ViewModelConfig {
    /// Set progress indicator timing
    #[must_use]
    pub fn with_latch(mut self, latch: LatchConfig) -> Self {
        self.latch = latch;
        self
    }

    /// Set the initial filters
    #[must_use]
    pub fn with_initial_filters(mut self, filters: Filters) -> Self {
        self.initial_filters = filters;
        self
    }

    /// Enable or disable the refresh on start
    #[must_use]
    pub fn with_refresh_on_start(mut self, enabled: bool) -> Self {
        self.refresh_on_start = enabled;
        self
    }
}

impl From<&FeederConfig> for ViewModelConfig {
    fn from(config: &FeederConfig) -> Self {
        Self {
            latch: config.latch_config(),
            initial_filters: config.initial_filters(),
            refresh_on_start: config.refresh_on_start,
        }
    }
}

/// Presentation state of the content feed
///
/// Publishes a replay-latest [`ViewState`], a once-only effect stream, and
/// accepts user intents through [`dispatch`](Self::dispatch).
pub struct FeedViewModel {
    intents: mpsc::UnboundedSender<FeedEvent>,
    state: watch::Receiver<ViewState>,
    effects: Mutex<Option<EffectStream>>,
    aggregator: JoinHandle<()>,
    dispatcher: JoinHandle<()>,
}

impl FeedViewModel {
    /// Start a view model over the given repository and audio device
    ///
    /// Must be called from within a tokio runtime.
    pub fn new<R, P>(repository: Arc<R>, player: P, config: ViewModelConfig) -> Self
    where
        R: ContentRepository + ?Sized,
        P: AudioPlayer,
    {
        let (filters_tx, filters_rx) = watch::channel(config.initial_filters.clone());
        let (playback_tx, playback_rx) = watch::channel(None);
        let (content_tx, content_rx) = watch::channel(LoadState::Loading);
        let (state_tx, state_rx) = watch::channel(ViewState {
            filters: config.initial_filters,
            ..ViewState::default()
        });
        let (effects_tx, effects) = effect_channel();
        let (intents_tx, intents_rx) = mpsc::unbounded_channel();

        let aggregator = StateAggregator::new(
            repository.observe_content(),
            filters_rx,
            playback_rx,
            ProgressLatch::new(config.latch),
            effects_tx.clone(),
            content_tx,
            state_tx,
        );
        let dispatcher = EventDispatcher::new(
            Arc::clone(&repository),
            PlaybackController::new(player),
            filters_tx,
            playback_tx,
            content_rx,
            effects_tx,
        );

        let aggregator = tokio::spawn(aggregator.run());
        let dispatcher = tokio::spawn(dispatcher.run(intents_rx));

        tracing::info!(
            repository = repository.name(),
            refresh_on_start = config.refresh_on_start,
            "Feed view model started"
        );

        if config.refresh_on_start {
            // The receiver was created above and the task cannot have exited yet.
            let _ = intents_tx.send(FeedEvent::Reload);
        }

        Self {
            intents: intents_tx,
            state: state_rx,
            effects: Mutex::new(Some(effects)),
            aggregator,
            dispatcher,
        }
    }

    /// Subscribe to view snapshots
    ///
    /// The receiver starts at the current snapshot.
    #[must_use]
    pub fn state(&self) -> watch::Receiver<ViewState> {
        self.state.clone()
    }

    /// Latest view snapshot
    #[must_use]
    pub fn current_state(&self) -> ViewState {
        self.state.borrow().clone()
    }

    /// Take the effect stream
    ///
    /// There is exactly one consumer. Later calls return `None`.
    pub fn take_effects(&self) -> Option<EffectStream> {
        let effects = self.effects.lock().take();
        if effects.is_none() {
            tracing::warn!("Effect stream already taken; only one consumer is supported");
        }
        effects
    }

    /// Queue a user intent
    ///
    /// Never blocks. Intents are handled one at a time in the order they were
    /// queued.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Closed`] if the dispatcher has stopped.
    pub fn dispatch(&self, event: FeedEvent) -> Result<(), FeedError> {
        tracing::debug!(event = event.name(), "Intent queued");
        self.intents.send(event).map_err(|_| FeedError::Closed)
    }

    /// Stop both tasks and wait until they are gone
    ///
    /// Afterwards [`dispatch`](Self::dispatch) fails with
    /// [`FeedError::Closed`] and the state no longer changes.
    pub async fn shutdown(&mut self) {
        self.dispatcher.abort();
        self.aggregator.abort();
        let _ = (&mut self.dispatcher).await;
        let _ = (&mut self.aggregator).await;
        tracing::info!("Feed view model shut down");
    }
}

impl Drop for FeedViewModel {
    fn drop(&mut self) {
        self.dispatcher.abort();
        self.aggregator.abort();
        tracing::debug!("Feed view model torn down");
    }
}

impl std::fmt::Debug for FeedViewModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedViewModel")
            .field("state", &*self.state.borrow())
            .field("effects_taken", &self.effects.lock().is_none())
            .finish_non_exhaustive()
    }
}
