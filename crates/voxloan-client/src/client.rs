//! Async HTTP client wrapping the gateway API.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use serde::{Deserialize, de::DeserializeOwned};
use thiserror::Error;
use voxloan_core::content::{AudioMime, GenerateRequest};

/// Connection settings for the gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
  pub base_url: String,
}

/// A gateway call that did not succeed.
///
/// `Gateway` carries the stable error code from the gateway's error body,
/// so flows can branch on the class of failure rather than on message
/// text.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("failed to reach gateway: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("{message}")]
  Gateway { code: String, message: String },
}

/// The gateway's error body shape.
#[derive(Debug, Deserialize)]
struct ErrorBody {
  error: String,
  code:  String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthInfo {
  pub status:            String,
  pub gemini_configured: bool,
}

#[derive(Debug, Deserialize)]
struct TranscriptionBody {
  transcription: String,
}

/// Async HTTP client for the gateway API.
///
/// Cheap to clone, the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Debug, Clone)]
pub struct GatewayClient {
  client: reqwest::Client,
  config: GatewayConfig,
}

impl GatewayClient {
  pub fn new(config: GatewayConfig) -> Result<Self, ApiError> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(30))
      .build()?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/api{}",
      self.config.base_url.trim_end_matches('/'),
      path
    )
  }

  async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    if status.is_success() {
      return Ok(response.json().await?);
    }
    match response.json::<ErrorBody>().await {
      Ok(body) => Err(ApiError::Gateway {
        code:    body.code,
        message: body.error,
      }),
      Err(_) => Err(ApiError::Gateway {
        code:    "INTERNAL_ERROR".to_string(),
        message: format!("gateway returned {status}"),
      }),
    }
  }

  /// `GET /api/health`
  pub async fn health(&self) -> Result<HealthInfo, ApiError> {
    let response = self.client.get(self.url("/health")).send().await?;
    Self::decode(response).await
  }

  /// `POST /api/generate-content`
  pub async fn generate(
    &self,
    request: &GenerateRequest,
  ) -> Result<serde_json::Value, ApiError> {
    let response = self
      .client
      .post(self.url("/generate-content"))
      .json(request)
      .send()
      .await?;
    Self::decode(response).await
  }

  /// `POST /api/transcribe`. Encodes the audio for transit and returns
  /// the transcribed text.
  pub async fn transcribe(&self, mime: AudioMime, audio: &[u8]) -> Result<String, ApiError> {
    let body = serde_json::json!({
      "audio": { "mimeType": mime.as_str(), "data": B64.encode(audio) }
    });
    let response = self
      .client
      .post(self.url("/transcribe"))
      .json(&body)
      .send()
      .await?;
    let body: TranscriptionBody = Self::decode(response).await?;
    Ok(body.transcription)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn url_joins_base_and_path() {
    let client = GatewayClient::new(GatewayConfig {
      base_url: "http://localhost:8787/".to_string(),
    })
    .unwrap();
    assert_eq!(client.url("/transcribe"), "http://localhost:8787/api/transcribe");
  }
}
