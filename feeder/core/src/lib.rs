//! Feeder Core - Headless Presentation State for a Content Feed
//!
//! This crate turns an asynchronously loaded, error-prone content feed, the
//! user's filters, and podcast playback into one immutable [`ViewState`] that
//! any surface can render. It has no UI dependencies and drives no widgets.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           Surfaces                                │
//! │        (CLI driver, TUI, GUI, tests: anything that renders)       │
//! └──────────┬─────────────────────────────▲───────────────▲─────────┘
//!            │ FeedEvent                   │ ViewState     │ Effect
//! ┌──────────┼─────────────────────────────┼───────────────┼─────────┐
//! │          ▼            FEEDER CORE      │               │         │
//! │  ┌────────────────┐            ┌───────┴──────────┐    │         │
//! │  │ EventDispatcher│──filters──▶│  StateAggregator │────┘         │
//! │  │                │──playback─▶│                  │◀── latch     │
//! │  └──┬──────────┬──┘            └───────▲──────────┘              │
//! │     │          │                       │ LoadState<FeedContents> │
//! │     ▼          ▼                       │                         │
//! │ ┌────────────┐ ┌───────────────────────┴─┐                       │
//! │ │ Playback   │ │   ContentRepository     │                       │
//! │ │ Controller │ │  (in-memory / HTTP)     │                       │
//! │ └─────┬──────┘ └─────────────────────────┘                       │
//! └───────┼──────────────────────────────────────────────────────────┘
//!         ▼
//!    AudioPlayer
//! ```
//!
//! # Key Types
//!
//! - [`FeedViewModel`]: composition root; owns the tasks and the channels
//! - [`ViewState`]: the derived snapshot surfaces render
//! - [`FeedEvent`]: user intents
//! - [`Effect`]: one-shot notifications, delivered once
//! - [`ContentRepository`]: pluggable content source
//! - [`AudioPlayer`]: pluggable audio device
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use feeder_core::{FeedEvent, FeedViewModel, InMemoryRepository, ViewModelConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let repository = Arc::new(InMemoryRepository::from_json_str(SEED)?);
//!     let vm = FeedViewModel::new(repository, MyPlayer::new(), ViewModelConfig::default());
//!
//!     let mut effects = vm.take_effects().unwrap();
//!     let mut state = vm.state();
//!
//!     vm.dispatch(FeedEvent::Reload)?;
//!     while state.changed().await.is_ok() {
//!         println!("{:?}", *state.borrow());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`model`]: feed items, filters, playback state, view snapshot
//! - [`load_state`]: `Loading | Success | Error` wrapper
//! - [`events`]: user intents
//! - [`effects`]: single-consumer effect queue
//! - [`progress_latch`]: flicker-free progress indicator timing
//! - [`playback`]: audio device trait and playback state machine
//! - [`repository`]: content sources
//! - [`aggregator`]: view snapshot derivation
//! - [`view_model`]: the composition root
//! - [`config`]: TOML, environment, and CLI configuration
//! - [`error`]: error types
//! - [`test_utils`]: fakes for tests

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod aggregator;
pub mod config;
mod dispatcher;
pub mod effects;
pub mod error;
pub mod events;
pub mod load_state;
pub mod model;
pub mod playback;
pub mod progress_latch;
pub mod repository;
pub mod test_utils;
pub mod view_model;

// Re-exports for convenience
pub use aggregator::derive_view_state;
pub use effects::{Effect, EffectSender, EffectStream};
pub use error::{FeedError, PlaybackError};
pub use events::FeedEvent;
pub use load_state::LoadState;
pub use model::{FeedContents, FeedItem, FeedItemId, FeedItemKind, Filters, PlaybackState, ViewState};
pub use playback::{AudioPlayer, PlaybackController, PlaybackPhase};
pub use progress_latch::{LatchConfig, ProgressLatch};
pub use repository::{
    ContentPublisher, ContentRepository, ContentStream, HttpFeedRepository, InMemoryRepository,
    RepositoryResult,
};
pub use view_model::{FeedViewModel, ViewModelConfig};

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, ConfigError, ConfigOverrides,
    ConfigSource, FeederConfig, FeederToml,
};
