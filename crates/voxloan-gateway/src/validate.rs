//! Request validation for the AI endpoints.
//!
//! Inbound bodies are deserialised into loose mirror types (every field
//! optional, unknown fields ignored) and then checked explicitly. The
//! result is a discriminated success/failure: a normalized request object,
//! or a list of field-level [`Violation`]s. Validation failures never
//! enter the general error-propagation path; they are a distinct, expected
//! error class resolved entirely at the gateway boundary.

use serde::Deserialize;
use voxloan_core::content::{
  AudioMime, Content, GenerateRequest, GenerationConfig, InlineData, Part,
};

use crate::error::Violation;

// ─── Limits ──────────────────────────────────────────────────────────────────

/// Upper bound on a single text part, in characters.
pub const MAX_TEXT_LEN: usize = 100_000;

/// Bounds on a base64 audio payload, in encoded characters. The maximum
/// sits below [`crate::AI_BODY_LIMIT`] so a payload that validates always
/// fits transport, and a payload that fits transport is never rejected for
/// size by anything but the validator.
pub const MIN_AUDIO_B64_LEN: usize = 64;
pub const MAX_AUDIO_B64_LEN: usize = 7 * 1024 * 1024;

/// Numeric ranges for generation parameters.
pub const TEMPERATURE_RANGE: (f64, f64) = (0.0, 2.0);
pub const TOP_P_RANGE: (f64, f64) = (0.0, 1.0);
pub const TOP_K_RANGE: (i64, i64) = (1, 100);
pub const MAX_OUTPUT_TOKENS_RANGE: (i64, i64) = (1, 8192);

// ─── Loose body mirrors ──────────────────────────────────────────────────────

/// Either a single object or a list of them. The upstream API accepts both
/// shapes for `contents`; we do the same and normalize to a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
  One(T),
  Many(Vec<T>),
}

impl<T> OneOrMany<T> {
  fn into_vec(self) -> Vec<T> {
    match self {
      OneOrMany::One(item) => vec![item],
      OneOrMany::Many(items) => items,
    }
  }
}

/// Raw `POST /api/generate-content` body.
#[derive(Debug, Deserialize)]
pub struct GenerateBody {
  pub model:    Option<String>,
  pub contents: Option<OneOrMany<ContentBody>>,
  #[serde(rename = "generationConfig")]
  pub config:   Option<ConfigBody>,
}

#[derive(Debug, Deserialize)]
pub struct ContentBody {
  pub parts: Option<Vec<PartBody>>,
}

#[derive(Debug, Deserialize)]
pub struct PartBody {
  pub text:        Option<String>,
  #[serde(rename = "inlineData")]
  pub inline_data: Option<InlineDataBody>,
}

#[derive(Debug, Deserialize)]
pub struct InlineDataBody {
  #[serde(rename = "mimeType")]
  pub mime_type: Option<String>,
  pub data:      Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConfigBody {
  pub temperature:       Option<f64>,
  #[serde(rename = "topP")]
  pub top_p:             Option<f64>,
  #[serde(rename = "topK")]
  pub top_k:             Option<i64>,
  #[serde(rename = "maxOutputTokens")]
  pub max_output_tokens: Option<i64>,
}

/// Raw `POST /api/transcribe` body.
#[derive(Debug, Deserialize)]
pub struct TranscribeBody {
  pub audio: Option<InlineDataBody>,
}

/// Normalized transcription request.
#[derive(Debug, Clone)]
pub struct TranscribeRequest {
  pub audio: InlineData,
}

// ─── Validation ──────────────────────────────────────────────────────────────

impl GenerateBody {
  pub fn validate(self) -> Result<GenerateRequest, Vec<Violation>> {
    let mut violations = Vec::new();

    let model = match self.model {
      Some(m) if is_valid_model(&m) => Some(m),
      Some(m) => {
        violations.push(Violation::new(
          "model",
          format!("\"{m}\" does not match the accepted model naming pattern"),
        ));
        None
      }
      None => {
        violations.push(Violation::new("model", "model is required"));
        None
      }
    };

    let contents = match self.contents {
      Some(raw) => {
        let raw = raw.into_vec();
        if raw.is_empty() {
          violations.push(Violation::new("contents", "at least one content block is required"));
        }
        raw
          .into_iter()
          .enumerate()
          .map(|(i, c)| validate_content(i, c, &mut violations))
          .collect()
      }
      None => {
        violations.push(Violation::new("contents", "contents is required"));
        Vec::new()
      }
    };

    let config = self
      .config
      .map(|c| validate_config(c, &mut violations));

    match (model, violations.is_empty()) {
      (Some(model), true) => Ok(GenerateRequest {
        model,
        contents,
        config,
      }),
      _ => Err(violations),
    }
  }
}

impl TranscribeBody {
  pub fn validate(self) -> Result<TranscribeRequest, Vec<Violation>> {
    let mut violations = Vec::new();

    let audio = match self.audio {
      Some(raw) => validate_inline_data("audio", raw, &mut violations),
      None => {
        violations.push(Violation::new("audio", "audio is required"));
        None
      }
    };

    match audio {
      Some(audio) if violations.is_empty() => Ok(TranscribeRequest { audio }),
      _ => Err(violations),
    }
  }
}

/// The restricted model naming pattern: `gemini-` followed by lowercase
/// alphanumerics, dots, and dashes.
fn is_valid_model(model: &str) -> bool {
  let Some(rest) = model.strip_prefix("gemini-") else {
    return false;
  };
  !rest.is_empty()
    && rest
      .chars()
      .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-')
}

fn validate_content(
  index: usize,
  content: ContentBody,
  violations: &mut Vec<Violation>,
) -> Content {
  let path = format!("contents[{index}]");

  let parts = match content.parts {
    Some(parts) if !parts.is_empty() => parts,
    _ => {
      violations.push(Violation::new(
        format!("{path}.parts"),
        "at least one part is required",
      ));
      return Content { parts: Vec::new() };
    }
  };

  let parts = parts
    .into_iter()
    .enumerate()
    .filter_map(|(j, part)| validate_part(&format!("{path}.parts[{j}]"), part, violations))
    .collect();

  Content { parts }
}

fn validate_part(
  path: &str,
  part: PartBody,
  violations: &mut Vec<Violation>,
) -> Option<Part> {
  match (part.text, part.inline_data) {
    (Some(_), Some(_)) => {
      violations.push(Violation::new(
        path,
        "a part must have one of text or inlineData, not both",
      ));
      None
    }
    (None, None) => {
      violations.push(Violation::new(
        path,
        "a part must have one of text or inlineData",
      ));
      None
    }
    (Some(text), None) => {
      if text.is_empty() {
        violations.push(Violation::new(format!("{path}.text"), "text must not be empty"));
        return None;
      }
      if text.chars().count() > MAX_TEXT_LEN {
        violations.push(Violation::new(
          format!("{path}.text"),
          format!("text exceeds the {MAX_TEXT_LEN}-character limit"),
        ));
        return None;
      }
      Some(Part::Text { text })
    }
    (None, Some(raw)) => validate_inline_data(&format!("{path}.inlineData"), raw, violations)
      .map(|inline_data| Part::InlineData { inline_data }),
  }
}

fn validate_inline_data(
  path: &str,
  raw: InlineDataBody,
  violations: &mut Vec<Violation>,
) -> Option<InlineData> {
  let mime_type = match raw.mime_type {
    Some(s) => match s.parse::<AudioMime>() {
      Ok(mime) => Some(mime),
      Err(_) => {
        violations.push(Violation::new(
          format!("{path}.mimeType"),
          format!(
            "\"{s}\" is not an accepted audio type; expected one of: {}",
            AudioMime::ALL.map(|m| m.as_str()).join(", ")
          ),
        ));
        None
      }
    },
    None => {
      violations.push(Violation::new(
        format!("{path}.mimeType"),
        "mimeType is required",
      ));
      None
    }
  };

  let data = match raw.data {
    Some(data) => {
      if data.len() < MIN_AUDIO_B64_LEN {
        violations.push(Violation::new(
          format!("{path}.data"),
          format!("encoded payload is below the {MIN_AUDIO_B64_LEN}-byte minimum"),
        ));
        None
      } else if data.len() > MAX_AUDIO_B64_LEN {
        violations.push(Violation::new(
          format!("{path}.data"),
          format!("encoded payload exceeds the {MAX_AUDIO_B64_LEN}-byte ceiling"),
        ));
        None
      } else {
        Some(data)
      }
    }
    None => {
      violations.push(Violation::new(format!("{path}.data"), "data is required"));
      None
    }
  };

  match (mime_type, data) {
    (Some(mime_type), Some(data)) => Some(InlineData { mime_type, data }),
    _ => None,
  }
}

fn validate_config(
  config: ConfigBody,
  violations: &mut Vec<Violation>,
) -> GenerationConfig {
  let mut out = GenerationConfig::default();

  if let Some(t) = config.temperature {
    if (TEMPERATURE_RANGE.0..=TEMPERATURE_RANGE.1).contains(&t) {
      out.temperature = Some(t);
    } else {
      violations.push(Violation::new(
        "generationConfig.temperature",
        format!("temperature must be between {} and {}", TEMPERATURE_RANGE.0, TEMPERATURE_RANGE.1),
      ));
    }
  }

  if let Some(p) = config.top_p {
    if (TOP_P_RANGE.0..=TOP_P_RANGE.1).contains(&p) {
      out.top_p = Some(p);
    } else {
      violations.push(Violation::new(
        "generationConfig.topP",
        format!("topP must be between {} and {}", TOP_P_RANGE.0, TOP_P_RANGE.1),
      ));
    }
  }

  if let Some(k) = config.top_k {
    if (TOP_K_RANGE.0..=TOP_K_RANGE.1).contains(&k) {
      out.top_k = Some(k as u32);
    } else {
      violations.push(Violation::new(
        "generationConfig.topK",
        format!("topK must be between {} and {}", TOP_K_RANGE.0, TOP_K_RANGE.1),
      ));
    }
  }

  if let Some(n) = config.max_output_tokens {
    if (MAX_OUTPUT_TOKENS_RANGE.0..=MAX_OUTPUT_TOKENS_RANGE.1).contains(&n) {
      out.max_output_tokens = Some(n as u32);
    } else {
      violations.push(Violation::new(
        "generationConfig.maxOutputTokens",
        format!(
          "maxOutputTokens must be between {} and {}",
          MAX_OUTPUT_TOKENS_RANGE.0, MAX_OUTPUT_TOKENS_RANGE.1
        ),
      ));
    }
  }

  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn generate_body(value: serde_json::Value) -> GenerateBody {
    serde_json::from_value(value).unwrap()
  }

  fn transcribe_body(value: serde_json::Value) -> TranscribeBody {
    serde_json::from_value(value).unwrap()
  }

  fn audio_b64(len: usize) -> String {
    "A".repeat(len)
  }

  // ── Generation path ────────────────────────────────────────────────────────

  #[test]
  fn valid_generate_body_normalises() {
    let body = generate_body(json!({
      "model": "gemini-2.0-flash",
      "contents": [{ "parts": [{ "text": "hello" }] }],
      "generationConfig": { "temperature": 0.7, "maxOutputTokens": 256 }
    }));
    let request = body.validate().unwrap();
    assert_eq!(request.model, "gemini-2.0-flash");
    assert_eq!(request.contents.len(), 1);
    let config = request.config.unwrap();
    assert_eq!(config.temperature, Some(0.7));
    assert_eq!(config.max_output_tokens, Some(256));
  }

  #[test]
  fn single_object_contents_is_accepted_and_normalised() {
    let body = generate_body(json!({
      "model": "gemini-2.0-flash",
      "contents": { "parts": [{ "text": "hello" }] }
    }));
    let request = body.validate().unwrap();
    assert_eq!(request.contents.len(), 1);
  }

  #[test]
  fn model_pattern_is_enforced() {
    for bad in ["gpt-4", "gemini-", "gemini-FLASH", "gemini-2.0 flash", ""] {
      let body = generate_body(json!({
        "model": bad,
        "contents": [{ "parts": [{ "text": "hi" }] }]
      }));
      let violations = body.validate().unwrap_err();
      assert!(
        violations.iter().any(|v| v.path == "model"),
        "expected model violation for {bad:?}: {violations:?}"
      );
    }
  }

  #[test]
  fn missing_model_is_a_violation_not_a_panic() {
    let body = generate_body(json!({
      "contents": [{ "parts": [{ "text": "hi" }] }]
    }));
    let violations = body.validate().unwrap_err();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].path, "model");
  }

  #[test]
  fn part_with_neither_text_nor_inline_data_is_rejected() {
    let body = generate_body(json!({
      "model": "gemini-2.0-flash",
      "contents": [{ "parts": [{}] }]
    }));
    let violations = body.validate().unwrap_err();
    assert_eq!(violations[0].path, "contents[0].parts[0]");
    assert!(violations[0].message.contains("must have one of"));
  }

  #[test]
  fn part_with_both_text_and_inline_data_is_rejected() {
    let body = generate_body(json!({
      "model": "gemini-2.0-flash",
      "contents": [{ "parts": [{
        "text": "hi",
        "inlineData": { "mimeType": "audio/webm", "data": audio_b64(128) }
      }] }]
    }));
    assert!(body.validate().is_err());
  }

  #[test]
  fn oversized_text_part_is_rejected() {
    let body = generate_body(json!({
      "model": "gemini-2.0-flash",
      "contents": [{ "parts": [{ "text": "x".repeat(MAX_TEXT_LEN + 1) }] }]
    }));
    let violations = body.validate().unwrap_err();
    assert_eq!(violations[0].path, "contents[0].parts[0].text");
  }

  #[test]
  fn generation_config_ranges_are_enforced() {
    let body = generate_body(json!({
      "model": "gemini-2.0-flash",
      "contents": [{ "parts": [{ "text": "hi" }] }],
      "generationConfig": { "temperature": 3.5, "topP": -0.1, "topK": 0, "maxOutputTokens": 100000 }
    }));
    let violations = body.validate().unwrap_err();
    let paths: Vec<_> = violations.iter().map(|v| v.path.as_str()).collect();
    assert!(paths.contains(&"generationConfig.temperature"));
    assert!(paths.contains(&"generationConfig.topP"));
    assert!(paths.contains(&"generationConfig.topK"));
    assert!(paths.contains(&"generationConfig.maxOutputTokens"));
  }

  // ── Transcription path ─────────────────────────────────────────────────────

  #[test]
  fn valid_transcribe_body_normalises() {
    let body = transcribe_body(json!({
      "audio": { "mimeType": "audio/webm", "data": audio_b64(1024) }
    }));
    let request = body.validate().unwrap();
    assert_eq!(request.audio.mime_type, AudioMime::Webm);
  }

  #[test]
  fn unknown_mime_type_is_a_violation() {
    let body = transcribe_body(json!({
      "audio": { "mimeType": "video/mp4", "data": audio_b64(1024) }
    }));
    let violations = body.validate().unwrap_err();
    assert_eq!(violations[0].path, "audio.mimeType");
  }

  #[test]
  fn missing_audio_is_a_violation() {
    let violations = transcribe_body(json!({})).validate().unwrap_err();
    assert_eq!(violations[0].path, "audio");
  }

  #[test]
  fn audio_size_boundary_is_exact() {
    let at_limit = transcribe_body(json!({
      "audio": { "mimeType": "audio/webm", "data": audio_b64(MAX_AUDIO_B64_LEN) }
    }));
    assert!(at_limit.validate().is_ok());

    let over_limit = transcribe_body(json!({
      "audio": { "mimeType": "audio/webm", "data": audio_b64(MAX_AUDIO_B64_LEN + 1) }
    }));
    let violations = over_limit.validate().unwrap_err();
    assert_eq!(violations[0].path, "audio.data");
  }

  #[test]
  fn undersized_audio_is_rejected() {
    let body = transcribe_body(json!({
      "audio": { "mimeType": "audio/webm", "data": audio_b64(MIN_AUDIO_B64_LEN - 1) }
    }));
    assert!(body.validate().is_err());
  }
}
