//! Podcast Playback
//!
//! [`PlaybackController`] is the only component allowed to touch the audio
//! device. It wraps start/pause/restart semantics for a single stream in a
//! small state machine:
//!
//! ```text
//!            toggle(other)                 toggle(same)
//!   ┌──────┐ ───────────────▶ ┌─────────┐ ─────────────▶ ┌────────┐
//!   │ Idle │   fresh load     │ Playing │     pause      │ Paused │
//!   └──────┘                  └─────────┘ ◀───────────── └────────┘
//!                                  ▲        toggle(same)      │
//!                                  │        fast resume       │
//!                                  └──── toggle(other) ───────┘
//!                                           fresh load
//! ```
//!
//! Device calls may block (decoder setup, network buffering), so every one of
//! them runs on tokio's blocking pool. The device sits behind a mutex, which
//! serializes reset/prepare/start/pause even if two controllers were ever
//! handed the same player.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::PlaybackError;
use crate::model::{FeedItem, FeedItemId, PlaybackState};

/// Audio output device
///
/// Implementations may block in any method. Only [`PlaybackController`] calls
/// them, always from a blocking worker thread.
pub trait AudioPlayer: Send + 'static {
    /// Drop the current source and return to the initial device state
    fn reset(&mut self) -> Result<(), PlaybackError>;

    /// Bind a new audio source
    fn set_source(&mut self, url: &str) -> Result<(), PlaybackError>;

    /// Prepare the bound source for playback
    fn prepare(&mut self) -> Result<(), PlaybackError>;

    /// Start or resume output
    fn start(&mut self) -> Result<(), PlaybackError>;

    /// Pause output, keeping the position
    fn pause(&mut self) -> Result<(), PlaybackError>;

    /// Whether the device is producing output
    fn is_playing(&self) -> bool;
}

/// Controller state
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum PlaybackPhase {
    /// Nothing loaded
    #[default]
    Idle,
    /// Source loaded and playing
    Playing {
        /// Loaded item
        item_id: FeedItemId,
        /// Loaded source
        source_url: String,
    },
    /// Source loaded, output paused
    Paused {
        /// Loaded item
        item_id: FeedItemId,
        /// Loaded source
        source_url: String,
    },
}

impl PlaybackPhase {
    /// Published form of this phase
    #[must_use]
    pub fn to_state(&self) -> Option<PlaybackState> {
        match self {
            Self::Idle => None,
            Self::Playing {
                item_id,
                source_url,
            } => Some(PlaybackState {
                item_id: item_id.clone(),
                source_url: source_url.clone(),
                is_playing: true,
            }),
            Self::Paused {
                item_id,
                source_url,
            } => Some(PlaybackState {
                item_id: item_id.clone(),
                source_url: source_url.clone(),
                is_playing: false,
            }),
        }
    }
}

/// State machine driving a single audio stream
pub struct PlaybackController<P: AudioPlayer> {
    device: Arc<Mutex<P>>,
    phase: PlaybackPhase,
}

impl<P: AudioPlayer> PlaybackController<P> {
    /// Create an idle controller owning the given device
    pub fn new(player: P) -> Self {
        Self {
            device: Arc::new(Mutex::new(player)),
            phase: PlaybackPhase::Idle,
        }
    }

    /// Current phase
    pub fn phase(&self) -> &PlaybackPhase {
        &self.phase
    }

    /// Current phase as a published playback state
    pub fn snapshot(&self) -> Option<PlaybackState> {
        self.phase.to_state()
    }

    /// Whether the controller is in the playing phase
    pub fn is_playing(&self) -> bool {
        matches!(self.phase, PlaybackPhase::Playing { .. })
    }

    /// Toggle playback of an item
    ///
    /// - the playing item is paused;
    /// - the paused item resumes without reloading its source;
    /// - any other item is loaded fresh and started.
    ///
    /// Returns the resulting playback state. On error the controller is left
    /// in a consistent phase: a failed fresh load ends `Idle`, a failed pause
    /// or resume keeps the previous phase.
    pub async fn toggle(
        &mut self,
        item: &FeedItem,
    ) -> Result<Option<PlaybackState>, PlaybackError> {
        match &self.phase {
            PlaybackPhase::Playing { item_id, .. } if *item_id == item.id => {
                self.pause().await?;
            }
            PlaybackPhase::Paused {
                item_id,
                source_url,
            } if *item_id == item.id => {
                let (item_id, source_url) = (item_id.clone(), source_url.clone());
                tracing::debug!(item_id = %item_id, "Resuming playback");
                self.with_device(|device: &mut P| device.start()).await?;
                self.phase = PlaybackPhase::Playing {
                    item_id,
                    source_url,
                };
            }
            _ => {
                let source_url = item
                    .podcast_link()
                    .ok_or_else(|| PlaybackError::NoAudioSource(item.id.clone()))?
                    .to_string();
                self.load(item.id.clone(), source_url).await?;
            }
        }

        Ok(self.snapshot())
    }

    /// Pause output if currently playing; otherwise a no-op
    pub async fn pause(&mut self) -> Result<(), PlaybackError> {
        let PlaybackPhase::Playing {
            item_id,
            source_url,
        } = &self.phase
        else {
            return Ok(());
        };
        let (item_id, source_url) = (item_id.clone(), source_url.clone());

        self.with_device(|device| {
            if device.is_playing() {
                device.pause()?;
            }
            Ok(())
        })
        .await?;

        tracing::debug!(item_id = %item_id, "Playback paused");
        self.phase = PlaybackPhase::Paused {
            item_id,
            source_url,
        };
        Ok(())
    }

    async fn load(&mut self, item_id: FeedItemId, source_url: String) -> Result<(), PlaybackError> {
        tracing::debug!(item_id = %item_id, url = %source_url, "Loading podcast source");

        let url = source_url.clone();
        let result = self
            .with_device(move |device| {
                device.reset()?;
                device.set_source(&url)?;
                device.prepare()?;
                device.start()
            })
            .await;

        match result {
            Ok(()) => {
                tracing::info!(item_id = %item_id, "Playback started");
                self.phase = PlaybackPhase::Playing {
                    item_id,
                    source_url,
                };
                Ok(())
            }
            Err(e) => {
                // The device was reset; whatever was loaded before is gone.
                tracing::warn!(item_id = %item_id, error = %e, "Failed to load podcast source");
                self.phase = PlaybackPhase::Idle;
                Err(e)
            }
        }
    }

    async fn with_device<F, R>(&self, f: F) -> Result<R, PlaybackError>
    where
        F: FnOnce(&mut P) -> Result<R, PlaybackError> + Send + 'static,
        R: Send + 'static,
    {
        let device = Arc::clone(&self.device);
        tokio::task::spawn_blocking(move || {
            let mut device = device.lock();
            f(&mut *device)
        })
        .await?
    }
}

impl<P: AudioPlayer> std::fmt::Debug for PlaybackController<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}
