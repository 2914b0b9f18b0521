//! Gemini backend client.
//!
//! Implements [`voxloan_core::upstream::UpstreamClient`] over the
//! `generateContent` HTTP API. Constructed once at process start; a missing
//! or placeholder key fails construction, and the gateway then serves 503
//! for the AI endpoints instead of attempting per-request credential
//! checks.

pub mod error;

pub use error::Error;

use std::time::Duration;

use serde::Serialize;
use voxloan_core::{
  content::{Content, GenerateRequest, GenerationConfig},
  upstream::{UpstreamClient, UpstreamError},
};

/// Production API origin. Overridable for tests via [`GeminiClient::with_base_url`].
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// The scaffold value shipped in example env files. Treated the same as no
/// key at all, but called out separately in the startup log.
pub const PLACEHOLDER_KEY: &str = "your-api-key-here";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ─── Client ──────────────────────────────────────────────────────────────────

/// Async client for the Gemini `generateContent` endpoint.
///
/// Cheap to clone, the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct GeminiClient {
  client:   reqwest::Client,
  api_key:  String,
  base_url: String,
}

impl GeminiClient {
  /// Build a client for `api_key`. Fails on a missing or placeholder key
  /// so misconfiguration is caught at startup, not on the first request.
  pub fn new(api_key: impl Into<String>) -> Result<Self, Error> {
    let api_key = api_key.into();
    if api_key.trim().is_empty() {
      return Err(Error::MissingKey);
    }
    if api_key == PLACEHOLDER_KEY {
      return Err(Error::PlaceholderKey);
    }

    let client = reqwest::Client::builder()
      .timeout(REQUEST_TIMEOUT)
      .build()?;

    Ok(Self {
      client,
      api_key,
      base_url: DEFAULT_BASE_URL.to_string(),
    })
  }

  /// Point the client at a different origin (test servers).
  pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
    self.base_url = base_url.into();
    self
  }

  fn generate_url(&self, model: &str) -> String {
    format!(
      "{}/v1beta/models/{}:generateContent",
      self.base_url.trim_end_matches('/'),
      model
    )
  }
}

/// The provider's request body. The model goes in the URL, not the body.
#[derive(Serialize)]
struct WireRequest<'a> {
  contents: &'a [Content],
  #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
  config:   Option<&'a GenerationConfig>,
}

impl UpstreamClient for GeminiClient {
  async fn generate(
    &self,
    request: &GenerateRequest,
  ) -> Result<serde_json::Value, UpstreamError> {
    let body = WireRequest {
      contents: &request.contents,
      config:   request.config.as_ref(),
    };

    tracing::debug!(model = %request.model, "forwarding generate request");

    let response = self
      .client
      .post(self.generate_url(&request.model))
      .header("x-goog-api-key", &self.api_key)
      .json(&body)
      .send()
      .await
      .map_err(|e| UpstreamError::Provider(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
      tracing::warn!(%status, model = %request.model, "provider returned an error status");
    }

    if status.is_client_error() {
      // Client-class rejections carry an actionable provider message.
      let message = response
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|v| provider_error_message(&v))
        .unwrap_or_else(|| {
          status
            .canonical_reason()
            .unwrap_or("request rejected")
            .to_string()
        });
      return Err(UpstreamError::Status {
        status: status.as_u16(),
        message,
      });
    }

    if !status.is_success() {
      return Err(UpstreamError::Provider(format!(
        "provider returned {status}"
      )));
    }

    response
      .json::<serde_json::Value>()
      .await
      .map_err(|e| UpstreamError::InvalidResponse(e.to_string()))
  }

  fn transcript_text(&self, response: &serde_json::Value) -> Option<String> {
    extract_text(response)
  }
}

// ─── Response plumbing ───────────────────────────────────────────────────────

/// Pull the message out of the provider's `{"error": {"message": …}}` shape.
fn provider_error_message(body: &serde_json::Value) -> Option<String> {
  body
    .get("error")?
    .get("message")?
    .as_str()
    .map(String::from)
}

/// Concatenate the text parts of the first candidate, if any.
pub fn extract_text(response: &serde_json::Value) -> Option<String> {
  let parts = response
    .get("candidates")?
    .get(0)?
    .get("content")?
    .get("parts")?
    .as_array()?;

  let text: String = parts
    .iter()
    .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
    .collect::<Vec<_>>()
    .join("");

  if text.is_empty() { None } else { Some(text) }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use voxloan_core::content::{AudioMime, Part};

  #[test]
  fn extract_text_reads_first_candidate() {
    let body = json!({
      "candidates": [{
        "content": { "parts": [{ "text": "need a " }, { "text": "rate quote" }] }
      }]
    });
    assert_eq!(extract_text(&body).as_deref(), Some("need a rate quote"));
  }

  #[test]
  fn extract_text_skips_non_text_parts() {
    let body = json!({
      "candidates": [{
        "content": { "parts": [{ "inlineData": { "data": "x" } }, { "text": "hello" }] }
      }]
    });
    assert_eq!(extract_text(&body).as_deref(), Some("hello"));
  }

  #[test]
  fn extract_text_returns_none_for_empty_response() {
    assert_eq!(extract_text(&json!({})), None);
    assert_eq!(extract_text(&json!({ "candidates": [] })), None);
    let no_text = json!({ "candidates": [{ "content": { "parts": [] } }] });
    assert_eq!(extract_text(&no_text), None);
  }

  #[test]
  fn provider_error_message_reads_nested_shape() {
    let body = json!({ "error": { "code": 400, "message": "API key not valid" } });
    assert_eq!(
      provider_error_message(&body).as_deref(),
      Some("API key not valid")
    );
    assert_eq!(provider_error_message(&json!({ "error": {} })), None);
  }

  #[test]
  fn construction_rejects_missing_and_placeholder_keys() {
    assert!(matches!(GeminiClient::new(""), Err(Error::MissingKey)));
    assert!(matches!(GeminiClient::new("  "), Err(Error::MissingKey)));
    assert!(matches!(
      GeminiClient::new(PLACEHOLDER_KEY),
      Err(Error::PlaceholderKey)
    ));
    assert!(GeminiClient::new("AIza-real-key").is_ok());
  }

  #[test]
  fn generate_url_includes_model_and_trims_slash() {
    let client = GeminiClient::new("k").unwrap().with_base_url("http://localhost:9999/");
    assert_eq!(
      client.generate_url("gemini-2.0-flash"),
      "http://localhost:9999/v1beta/models/gemini-2.0-flash:generateContent"
    );
  }

  #[test]
  fn wire_request_omits_model_and_absent_config() {
    let request = GenerateRequest {
      model:    "gemini-2.0-flash".to_string(),
      contents: vec![Content {
        parts: vec![Part::text("hi"), Part::inline_data(AudioMime::Webm, "QQ==")],
      }],
      config:   None,
    };
    let wire = WireRequest {
      contents: &request.contents,
      config:   request.config.as_ref(),
    };
    let value = serde_json::to_value(&wire).unwrap();
    assert!(value.get("model").is_none());
    assert!(value.get("generationConfig").is_none());
    assert_eq!(value["contents"][0]["parts"][0]["text"], "hi");
  }
}
