//! Error Types
//!
//! Two families of failure reach the presentation layer:
//!
//! - [`FeedError`]: anything the content repository reports. These travel inside
//!   `LoadState::Error` and are turned into one-shot error effects.
//! - [`PlaybackError`]: device or source failures while the playback controller
//!   moves between states. They are caught at the controller boundary and
//!   converted into error effects; they never take the engine down.

use thiserror::Error;

use crate::model::FeedItemId;

/// Errors surfaced by the feed engine and its repositories
#[derive(Debug, Error)]
pub enum FeedError {
    /// Network-level failure talking to the feed backend
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-success status code
    #[error("Feed request to {url} failed with HTTP {status}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// The feed payload could not be decoded
    #[error("Failed to decode feed payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// Audio playback failed
    #[error("Playback failed: {0}")]
    Playback(#[from] PlaybackError),

    /// The view model has been torn down
    #[error("Feed view model has shut down")]
    Closed,
}

impl FeedError {
    /// Whether this error came from the content transport (network or payload)
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Status { .. } | Self::Decode(_)
        )
    }
}

/// Errors raised while driving the audio device
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PlaybackError {
    /// The audio device rejected an operation
    #[error("Audio device error: {0}")]
    Device(String),

    /// The toggled item has no audio source
    #[error("Item {0} has no audio source")]
    NoAudioSource(FeedItemId),

    /// The blocking worker running the device call did not finish
    #[error("Playback worker failed: {0}")]
    Worker(String),
}

impl From<tokio::task::JoinError> for PlaybackError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Worker(err.to_string())
    }
}
