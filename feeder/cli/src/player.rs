//! Audio player without an output device
//!
//! Tracks what a real device would be doing and logs every call, so the
//! playback state machine can be driven headless.

use feeder_core::{AudioPlayer, PlaybackError};
use tracing::debug;

/// Audio player that produces no sound
#[derive(Debug, Default)]
pub struct SilentPlayer {
    source: Option<String>,
    prepared: bool,
    playing: bool,
}

impl AudioPlayer for SilentPlayer {
    fn reset(&mut self) -> Result<(), PlaybackError> {
        debug!("reset");
        *self = Self::default();
        Ok(())
    }

    fn set_source(&mut self, url: &str) -> Result<(), PlaybackError> {
        debug!(url, "set_source");
        self.source = Some(url.to_string());
        self.prepared = false;
        Ok(())
    }

    fn prepare(&mut self) -> Result<(), PlaybackError> {
        if self.source.is_none() {
            return Err(PlaybackError::Device("prepare without a source".to_string()));
        }
        debug!("prepare");
        self.prepared = true;
        Ok(())
    }

    fn start(&mut self) -> Result<(), PlaybackError> {
        if !self.prepared {
            return Err(PlaybackError::Device("start before prepare".to_string()));
        }
        debug!(url = self.source.as_deref().unwrap_or_default(), "start");
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) -> Result<(), PlaybackError> {
        debug!("pause");
        self.playing = false;
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle() {
        let mut player = SilentPlayer::default();
        player.reset().unwrap();
        player.set_source("https://cdn/ep.mp3").unwrap();
        player.prepare().unwrap();
        player.start().unwrap();
        assert!(player.is_playing());

        player.pause().unwrap();
        assert!(!player.is_playing());

        player.start().unwrap();
        assert!(player.is_playing());
    }

    #[test]
    fn test_start_requires_prepared_source() {
        let mut player = SilentPlayer::default();
        assert!(player.start().is_err());
        assert!(player.prepare().is_err());
    }
}
