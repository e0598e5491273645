//! Voice recording lifecycle.
//!
//! The platform owns the microphone; this module owns the state machine
//! around it. The shell implements [`CaptureBackend`] over its audio SDK and
//! drives [`VoiceRecorder::tick`] once per second while recording (the
//! pulsing indicator is presentation-only and stays in the shell).
//!
//! At most one capture handle is ever open: starting a new recording first
//! discards an active one, and every exit path (cancel, stop, send,
//! teardown) releases the handle deterministically.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Microphone permission denied")]
    PermissionDenied,

    #[error("No active recording")]
    NotRecording,

    #[error("Capture backend error: {0}")]
    Backend(String),
}

/// The finalized output of a capture: where the audio can be retrieved from,
/// plus its declared MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedAudio {
    pub location: String,
    pub mime_type: Option<String>,
}

/// An in-progress recording as handed out by the platform.
#[async_trait]
pub trait CaptureHandle: Send {
    /// Finalizes the recording and returns the captured output reference.
    async fn finish(self: Box<Self>) -> Result<CapturedAudio, CaptureError>;

    /// Releases the recording, dropping any captured audio.
    async fn discard(self: Box<Self>);
}

/// The platform seam for acquiring the microphone.
#[async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Acquires the microphone and starts capturing. Fails with
    /// [`CaptureError::PermissionDenied`] when access is not granted.
    async fn begin(&self) -> Result<Box<dyn CaptureHandle>, CaptureError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
}

/// Recording state machine: `Idle → Recording → Idle` via cancel, stop
/// (finalize for preview), or send.
pub struct VoiceRecorder {
    backend: Box<dyn CaptureBackend>,
    active: Option<Box<dyn CaptureHandle>>,
    elapsed_secs: u32,
    pending: Option<(CapturedAudio, u32)>,
}

impl VoiceRecorder {
    pub fn new(backend: Box<dyn CaptureBackend>) -> Self {
        Self {
            backend,
            active: None,
            elapsed_secs: 0,
            pending: None,
        }
    }

    pub fn state(&self) -> RecorderState {
        if self.active.is_some() {
            RecorderState::Recording
        } else {
            RecorderState::Idle
        }
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    /// Starts a recording. An already-active capture is discarded first so
    /// two handles are never open at once. A permission failure leaves the
    /// recorder Idle with no side effects.
    pub async fn start(&mut self) -> Result<(), CaptureError> {
        if let Some(existing) = self.active.take() {
            tracing::warn!(
                target: "stride::chat::voice",
                "Recording started while one was active; discarding the previous capture"
            );
            existing.discard().await;
        }
        self.elapsed_secs = 0;
        self.pending = None;

        let handle = self.backend.begin().await?;
        self.active = Some(handle);
        Ok(())
    }

    /// Advances the elapsed-duration counter. Driven once per second by the
    /// shell while recording; ignored when idle.
    pub fn tick(&mut self) {
        if self.active.is_some() {
            self.elapsed_secs += 1;
        }
    }

    /// Discards the capture and any recorded audio. No message results.
    pub async fn cancel(&mut self) {
        if let Some(handle) = self.active.take() {
            handle.discard().await;
        }
        self.elapsed_secs = 0;
        self.pending = None;
    }

    /// Finalizes the capture and retains its output for preview, without
    /// sending yet.
    pub async fn stop(&mut self) -> Result<(), CaptureError> {
        let handle = self.active.take().ok_or(CaptureError::NotRecording)?;
        let duration = self.elapsed_secs;
        let captured = handle.finish().await?;
        self.pending = Some((captured, duration));
        self.elapsed_secs = 0;
        Ok(())
    }

    /// Finalizes (or takes the previewed) capture for dispatch, returning the
    /// output reference and the elapsed duration in seconds.
    pub async fn finish_for_send(&mut self) -> Result<(CapturedAudio, u32), CaptureError> {
        if let Some(pending) = self.pending.take() {
            return Ok(pending);
        }
        let handle = self.active.take().ok_or(CaptureError::NotRecording)?;
        let duration = self.elapsed_secs;
        self.elapsed_secs = 0;
        let captured = handle.finish().await?;
        Ok((captured, duration))
    }

    /// Teardown hook: releases any active capture and previewed output.
    pub async fn release(&mut self) {
        self.cancel().await;
    }
}

/// Formats a duration counter as `m:ss` for display.
pub fn format_duration(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeHandle {
        open: Arc<AtomicUsize>,
        discarded: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl CaptureHandle for FakeHandle {
        async fn finish(self: Box<Self>) -> Result<CapturedAudio, CaptureError> {
            self.open.fetch_sub(1, Ordering::SeqCst);
            Ok(CapturedAudio {
                location: "file:///tmp/rec.m4a".to_string(),
                mime_type: Some("audio/m4a".to_string()),
            })
        }

        async fn discard(self: Box<Self>) {
            self.open.fetch_sub(1, Ordering::SeqCst);
            self.discarded.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct FakeBackend {
        open: Arc<AtomicUsize>,
        discarded: Arc<AtomicUsize>,
        deny_permission: bool,
    }

    impl FakeBackend {
        fn new() -> (Self, Arc<AtomicUsize>, Arc<AtomicUsize>) {
            let open = Arc::new(AtomicUsize::new(0));
            let discarded = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    open: open.clone(),
                    discarded: discarded.clone(),
                    deny_permission: false,
                },
                open,
                discarded,
            )
        }
    }

    #[async_trait]
    impl CaptureBackend for FakeBackend {
        async fn begin(&self) -> Result<Box<dyn CaptureHandle>, CaptureError> {
            if self.deny_permission {
                return Err(CaptureError::PermissionDenied);
            }
            self.open.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeHandle {
                open: self.open.clone(),
                discarded: self.discarded.clone(),
            }))
        }
    }

    #[tokio::test]
    async fn test_start_tick_send() {
        let (backend, open, _) = FakeBackend::new();
        let mut recorder = VoiceRecorder::new(Box::new(backend));

        recorder.start().await.unwrap();
        assert_eq!(recorder.state(), RecorderState::Recording);
        recorder.tick();
        recorder.tick();
        recorder.tick();
        assert_eq!(recorder.elapsed_secs(), 3);

        let (captured, duration) = recorder.finish_for_send().await.unwrap();
        assert_eq!(captured.location, "file:///tmp/rec.m4a");
        assert_eq!(duration, 3);
        assert_eq!(recorder.state(), RecorderState::Idle);
        assert_eq!(open.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_restart_discards_previous_handle() {
        let (backend, open, discarded) = FakeBackend::new();
        let mut recorder = VoiceRecorder::new(Box::new(backend));

        recorder.start().await.unwrap();
        recorder.tick();
        recorder.start().await.unwrap();

        // Never two live handles; the first was discarded, not leaked
        assert_eq!(open.load(Ordering::SeqCst), 1);
        assert_eq!(discarded.load(Ordering::SeqCst), 1);
        // The counter restarted with the new capture
        assert_eq!(recorder.elapsed_secs(), 0);

        recorder.cancel().await;
        assert_eq!(open.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_permission_denied_returns_to_idle() {
        let (mut backend, open, _) = FakeBackend::new();
        backend.deny_permission = true;
        let mut recorder = VoiceRecorder::new(Box::new(backend));

        let err = recorder.start().await.unwrap_err();
        assert!(matches!(err, CaptureError::PermissionDenied));
        assert_eq!(recorder.state(), RecorderState::Idle);
        assert_eq!(open.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_discards_capture() {
        let (backend, open, discarded) = FakeBackend::new();
        let mut recorder = VoiceRecorder::new(Box::new(backend));

        recorder.start().await.unwrap();
        recorder.tick();
        recorder.cancel().await;

        assert_eq!(recorder.state(), RecorderState::Idle);
        assert_eq!(recorder.elapsed_secs(), 0);
        assert_eq!(open.load(Ordering::SeqCst), 0);
        assert_eq!(discarded.load(Ordering::SeqCst), 1);
        assert!(matches!(
            recorder.finish_for_send().await.unwrap_err(),
            CaptureError::NotRecording
        ));
    }

    #[tokio::test]
    async fn test_stop_retains_output_for_preview() {
        let (backend, open, _) = FakeBackend::new();
        let mut recorder = VoiceRecorder::new(Box::new(backend));

        recorder.start().await.unwrap();
        recorder.tick();
        recorder.tick();
        recorder.stop().await.unwrap();

        assert_eq!(recorder.state(), RecorderState::Idle);
        assert_eq!(open.load(Ordering::SeqCst), 0);

        // The previewed output is still available for a later send
        let (captured, duration) = recorder.finish_for_send().await.unwrap();
        assert_eq!(captured.mime_type.as_deref(), Some("audio/m4a"));
        assert_eq!(duration, 2);
    }

    #[test]
    fn test_tick_is_ignored_while_idle() {
        let (backend, _, _) = FakeBackend::new();
        let mut recorder = VoiceRecorder::new(Box::new(backend));
        recorder.tick();
        assert_eq!(recorder.elapsed_secs(), 0);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(9), "0:09");
        assert_eq!(format_duration(75), "1:15");
        assert_eq!(format_duration(600), "10:00");
    }
}
