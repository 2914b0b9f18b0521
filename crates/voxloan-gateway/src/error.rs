//! Gateway error taxonomy and axum `IntoResponse` implementation.
//!
//! Every error response carries the same body shape:
//! `{"error": <message>, "code": <code>, "details"?: [{"path", "message"}]}`.
//! Validation failures are the only variant with `details`; 5xx-class
//! variants are stripped of internal detail before they reach the client.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use voxloan_core::upstream::UpstreamError;

// ─── Violations ──────────────────────────────────────────────────────────────

/// One field-level validation failure: where, and what was wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
  pub path:    String,
  pub message: String,
}

impl Violation {
  pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      path:    path.into(),
      message: message.into(),
    }
  }
}

// ─── GatewayError ────────────────────────────────────────────────────────────

/// An error surfaced by a gateway endpoint.
///
/// Variants map one-to-one onto the client-visible error codes; callers
/// match on the variant, never on strings.
#[derive(Debug, Error)]
pub enum GatewayError {
  #[error("request validation failed")]
  Validation(Vec<Violation>),

  #[error("malformed JSON body: {0}")]
  Parse(String),

  #[error("request body too large")]
  PayloadTooLarge,

  #[error("origin not allowed: {0}")]
  Cors(String),

  #[error("rate limit exceeded, retry in {retry_after_secs}s")]
  RateLimited {
    limit:            u32,
    retry_after_secs: u64,
  },

  #[error("AI service is not available")]
  Unconfigured,

  /// Client-class upstream rejection, passed through with the provider's
  /// own status and message.
  #[error("{message}")]
  UpstreamStatus { status: u16, message: String },

  #[error("content generation failed")]
  Generation,

  #[error("transcription failed")]
  Transcription,

  #[error("internal error")]
  Internal,
}

impl GatewayError {
  /// The stable machine-readable code for this error class.
  pub fn code(&self) -> &'static str {
    match self {
      GatewayError::Validation(_) => "VALIDATION_ERROR",
      GatewayError::Parse(_) => "PARSE_ERROR",
      GatewayError::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
      GatewayError::Cors(_) => "CORS_ERROR",
      GatewayError::RateLimited { .. } => "RATE_LIMITED",
      GatewayError::Unconfigured => "SERVICE_UNAVAILABLE",
      GatewayError::UpstreamStatus { .. } | GatewayError::Generation => "GENERATION_ERROR",
      GatewayError::Transcription => "TRANSCRIPTION_ERROR",
      GatewayError::Internal => "INTERNAL_ERROR",
    }
  }

  fn status_code(&self) -> StatusCode {
    match self {
      GatewayError::Validation(_) | GatewayError::Parse(_) => StatusCode::BAD_REQUEST,
      GatewayError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
      GatewayError::Cors(_) => StatusCode::FORBIDDEN,
      GatewayError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
      GatewayError::Unconfigured => StatusCode::SERVICE_UNAVAILABLE,
      GatewayError::UpstreamStatus { status, .. } => {
        StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_REQUEST)
      }
      GatewayError::Generation
      | GatewayError::Transcription
      | GatewayError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  /// Classify an upstream failure for the generation endpoint. Server-class
  /// detail goes to the log, never to the client.
  pub fn from_generation(err: UpstreamError) -> Self {
    match err {
      UpstreamError::Status { status, message } => {
        GatewayError::UpstreamStatus { status, message }
      }
      other => {
        tracing::error!(detail = other.detail(), "upstream generation failure");
        GatewayError::Generation
      }
    }
  }

  /// Classify an upstream failure for the transcription endpoint.
  pub fn from_transcription(err: UpstreamError) -> Self {
    match err {
      UpstreamError::Status { status, message } => {
        GatewayError::UpstreamStatus { status, message }
      }
      other => {
        tracing::error!(detail = other.detail(), "upstream transcription failure");
        GatewayError::Transcription
      }
    }
  }
}

impl IntoResponse for GatewayError {
  fn into_response(self) -> Response {
    let status = self.status_code();
    let code = self.code();

    let body = match &self {
      GatewayError::Validation(violations) => json!({
        "error": self.to_string(),
        "code": code,
        "details": violations,
      }),
      _ => json!({ "error": self.to_string(), "code": code }),
    };

    let mut response = (status, Json(body)).into_response();

    // Standard rate-limit headers so well-behaved clients can back off.
    if let GatewayError::RateLimited {
      limit,
      retry_after_secs,
    } = &self
    {
      let headers = response.headers_mut();
      if let Ok(v) = HeaderValue::from_str(&limit.to_string()) {
        headers.insert("ratelimit-limit", v);
      }
      headers.insert("ratelimit-remaining", HeaderValue::from_static("0"));
      if let Ok(v) = HeaderValue::from_str(&retry_after_secs.to_string()) {
        headers.insert("ratelimit-reset", v.clone());
        headers.insert(header::RETRY_AFTER, v);
      }
    }

    response
  }
}
