//! Voice message playback.
//!
//! One audio output exists system-wide; [`PlaybackManager`] enforces that at
//! most one voice message uses it at a time. The shell implements
//! [`AudioOutput`] over its media SDK and reports natural end-of-stream via
//! [`PlaybackManager::on_finished`].

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("Playback backend error: {0}")]
    Backend(String),
}

/// The platform seam for the single audio output resource.
#[async_trait]
pub trait AudioOutput: Send {
    /// Loads and starts playing the audio at `url`.
    async fn play(&mut self, url: &str) -> Result<(), PlaybackError>;

    /// Stops playback and releases the loaded audio.
    async fn stop(&mut self) -> Result<(), PlaybackError>;
}

/// Tracks which voice message currently owns the audio output.
pub struct PlaybackManager {
    output: Box<dyn AudioOutput>,
    playing_message_id: Option<String>,
}

impl PlaybackManager {
    pub fn new(output: Box<dyn AudioOutput>) -> Self {
        Self {
            output,
            playing_message_id: None,
        }
    }

    /// The message whose playing indicator should be shown, if any.
    pub fn playing_message_id(&self) -> Option<&str> {
        self.playing_message_id.as_deref()
    }

    /// Toggles playback of a voice message. Tapping the playing message stops
    /// it; tapping another message stops and releases the current one before
    /// starting the new one, so two indicators are never set at once.
    pub async fn toggle(&mut self, message_id: &str, url: &str) -> Result<(), PlaybackError> {
        if self.playing_message_id.as_deref() == Some(message_id) {
            return self.stop().await;
        }

        if self.playing_message_id.is_some() {
            self.output.stop().await?;
            self.playing_message_id = None;
        }

        self.output.play(url).await?;
        self.playing_message_id = Some(message_id.to_string());
        Ok(())
    }

    /// Manual stop: releases the output and clears the indicator.
    pub async fn stop(&mut self) -> Result<(), PlaybackError> {
        if self.playing_message_id.take().is_some() {
            self.output.stop().await?;
        }
        Ok(())
    }

    /// Natural end-of-stream callback from the backend. The backend has
    /// already released the audio; only the indicator needs clearing. A stale
    /// completion (for a message that was already replaced) is ignored.
    pub fn on_finished(&mut self, message_id: &str) {
        if self.playing_message_id.as_deref() == Some(message_id) {
            self.playing_message_id = None;
        }
    }
}
