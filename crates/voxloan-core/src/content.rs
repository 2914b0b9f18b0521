//! The normalized generation-request model.
//!
//! The gateway validator produces these types from loose inbound JSON; the
//! upstream client serialises them in the provider's wire shape. Nothing in
//! between re-checks them: once constructed, a [`GenerateRequest`] is valid
//! by construction.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─── Audio MIME types ────────────────────────────────────────────────────────

/// The closed set of audio MIME types the transcription pipeline accepts.
///
/// Anything outside this set is rejected at the validation boundary; code
/// past that boundary never sees a free-form MIME string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioMime {
  #[serde(rename = "audio/webm")]
  Webm,
  #[serde(rename = "audio/ogg")]
  Ogg,
  #[serde(rename = "audio/wav")]
  Wav,
  #[serde(rename = "audio/mpeg")]
  Mpeg,
  #[serde(rename = "audio/mp4")]
  Mp4,
  #[serde(rename = "audio/flac")]
  Flac,
  #[serde(rename = "audio/aac")]
  Aac,
}

impl AudioMime {
  /// Every accepted MIME type, in a stable order. Used for error messages.
  pub const ALL: [AudioMime; 7] = [
    AudioMime::Webm,
    AudioMime::Ogg,
    AudioMime::Wav,
    AudioMime::Mpeg,
    AudioMime::Mp4,
    AudioMime::Flac,
    AudioMime::Aac,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      AudioMime::Webm => "audio/webm",
      AudioMime::Ogg => "audio/ogg",
      AudioMime::Wav => "audio/wav",
      AudioMime::Mpeg => "audio/mpeg",
      AudioMime::Mp4 => "audio/mp4",
      AudioMime::Flac => "audio/flac",
      AudioMime::Aac => "audio/aac",
    }
  }
}

impl fmt::Display for AudioMime {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Returned when a MIME string is outside the accepted set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported audio MIME type: {0}")]
pub struct UnknownAudioMime(pub String);

impl FromStr for AudioMime {
  type Err = UnknownAudioMime;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    // Browsers commonly append a codec parameter (`audio/webm;codecs=opus`);
    // the base type decides acceptance.
    let base = s.split(';').next().unwrap_or(s).trim();
    AudioMime::ALL
      .iter()
      .copied()
      .find(|m| m.as_str().eq_ignore_ascii_case(base))
      .ok_or_else(|| UnknownAudioMime(s.to_string()))
  }
}

// ─── Request parts ───────────────────────────────────────────────────────────

/// An inline binary payload, base64 in transit. The gateway never decodes
/// the data; it is sized and forwarded as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
  pub mime_type: AudioMime,
  pub data:      String,
}

/// One part of a content block: either text or inline data, never both.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
  Text {
    text: String,
  },
  InlineData {
    #[serde(rename = "inlineData")]
    inline_data: InlineData,
  },
}

impl Part {
  pub fn text(text: impl Into<String>) -> Self {
    Part::Text { text: text.into() }
  }

  pub fn inline_data(mime_type: AudioMime, data: impl Into<String>) -> Self {
    Part::InlineData {
      inline_data: InlineData {
        mime_type,
        data: data.into(),
      },
    }
  }
}

/// A block of parts. The provider accepts a list of these per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
  pub parts: Vec<Part>,
}

// ─── Generation parameters ───────────────────────────────────────────────────

/// Optional sampling parameters, already range-checked by the validator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub temperature:       Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub top_p:             Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub top_k:             Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub max_output_tokens: Option<u32>,
}

// ─── GenerateRequest ─────────────────────────────────────────────────────────

/// A validated, normalized generation request.
///
/// `contents` is always a list here even when the caller sent a single
/// object; the validator folds both accepted shapes into this one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
  pub model:    String,
  pub contents: Vec<Content>,
  #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
  pub config:   Option<GenerationConfig>,
}
