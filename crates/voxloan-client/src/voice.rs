//! Voice recording state machine.
//!
//! Orchestrates microphone capture, hands the finished clip to the
//! gateway, and merges the transcript into the message field. The
//! microphone and transcription backends are trait seams so the flow is
//! testable without devices or a network.
//!
//! States: `Idle -> Recording -> Transcribing -> Idle`. Denied microphone
//! access never leaves `Idle`. The device is released the moment the user
//! stops, before the transcription call, and stays released whatever that
//! call does.

use std::future::Future;

use thiserror::Error;
use voxloan_core::content::AudioMime;

use crate::client::{ApiError, GatewayClient};

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MicrophoneError {
  #[error("microphone access was denied")]
  PermissionDenied,

  #[error("no microphone device is available")]
  NoDevice,

  #[error("microphone failure: {0}")]
  Device(String),
}

// ─── Seams ───────────────────────────────────────────────────────────────────

/// A finished recording: one encoded blob and its MIME type.
#[derive(Debug, Clone)]
pub struct AudioClip {
  pub mime: AudioMime,
  pub data: Vec<u8>,
}

/// An open capture track. Dropping without [`AudioTrack::stop`] is a bug
/// in the caller; the flow below always stops before finalising.
pub trait AudioTrack: Send {
  /// Release the underlying device.
  fn stop(&mut self);

  /// Finalise the captured buffers into a single clip.
  fn into_clip(self) -> AudioClip;
}

/// Access to the user's microphone. Opening may fail with a permission
/// denial, which the flow surfaces without ever entering `Recording`.
pub trait Microphone {
  type Track: AudioTrack;

  fn open(&self) -> impl Future<Output = Result<Self::Track, MicrophoneError>> + Send;
}

/// The transcription backend seam.
pub trait Transcriber: Send + Sync {
  fn transcribe(&self, clip: &AudioClip) -> impl Future<Output = Result<String, ApiError>> + Send;
}

impl Transcriber for GatewayClient {
  async fn transcribe(&self, clip: &AudioClip) -> Result<String, ApiError> {
    GatewayClient::transcribe(self, clip.mime, &clip.data).await
  }
}

// ─── State machine ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
  Idle,
  Recording,
  Transcribing,
}

/// Drives one microphone-to-message round trip.
pub struct VoiceRecorder<M: Microphone, T: Transcriber> {
  mic:         M,
  transcriber: T,
  state:       VoiceState,
  track:       Option<M::Track>,
  /// One-line error shown next to the mic button, if the last action
  /// failed.
  error:       Option<String>,
}

impl<M: Microphone, T: Transcriber> VoiceRecorder<M, T> {
  pub fn new(mic: M, transcriber: T) -> Self {
    Self {
      mic,
      transcriber,
      state: VoiceState::Idle,
      track: None,
      error: None,
    }
  }

  pub fn state(&self) -> VoiceState {
    self.state
  }

  pub fn error(&self) -> Option<&str> {
    self.error.as_deref()
  }

  /// `Idle -> Recording`. On denial the machine stays in `Idle` and the
  /// error is surfaced.
  pub async fn start(&mut self) -> anyhow::Result<()> {
    if self.state != VoiceState::Idle {
      return Ok(());
    }
    match self.mic.open().await {
      Ok(track) => {
        self.track = Some(track);
        self.error = None;
        self.state = VoiceState::Recording;
        Ok(())
      }
      Err(e) => {
        self.error = Some(format!("Microphone unavailable: {e}"));
        Err(e.into())
      }
    }
  }

  /// `Recording -> Transcribing -> Idle`. On success the transcript is
  /// appended to `message`, separated by a single space when the field
  /// was non-empty; on failure `message` is left untouched.
  pub async fn stop_and_transcribe(&mut self, message: &mut String) -> anyhow::Result<()> {
    if self.state != VoiceState::Recording {
      return Ok(());
    }
    let Some(mut track) = self.track.take() else {
      self.state = VoiceState::Idle;
      return Ok(());
    };

    // Release the device before anything else can fail. Holding the
    // microphone open past the user's stop action is a privacy defect.
    track.stop();
    let clip = track.into_clip();

    self.state = VoiceState::Transcribing;
    let result = self.transcriber.transcribe(&clip).await;
    self.state = VoiceState::Idle;
    // `clip` drops here; the audio is not retained past the call.

    match result {
      Ok(text) => {
        if !message.is_empty() {
          message.push(' ');
        }
        message.push_str(&text);
        self.error = None;
        Ok(())
      }
      Err(e) => {
        self.error = Some(format!("Transcription failed: {e}"));
        Err(e.into())
      }
    }
  }
}
