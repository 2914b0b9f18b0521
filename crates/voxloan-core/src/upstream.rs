//! The `UpstreamClient` trait and its error taxonomy.
//!
//! The gateway depends on this abstraction, not on any concrete provider
//! crate. The error split encodes the exposure policy: client-class
//! provider rejections are safe to pass through, server-class and
//! transport failures are not.

use std::future::Future;

use thiserror::Error;

use crate::content::GenerateRequest;

/// Errors from the upstream generative-AI backend.
#[derive(Debug, Error)]
pub enum UpstreamError {
  /// A 4xx rejection from the provider. The message is the provider's own
  /// and is actionable by the caller, so `Display` passes it through.
  #[error("{message}")]
  Status { status: u16, message: String },

  /// A 5xx or transport-level failure. The inner detail may carry internal
  /// tokens or paths, so `Display` is a fixed generic message; the detail
  /// is for operator logs only.
  #[error("upstream provider error")]
  Provider(String),

  /// The provider answered 2xx but the payload was not the expected shape.
  #[error("unexpected provider response: {0}")]
  InvalidResponse(String),
}

impl UpstreamError {
  /// Operator-facing detail, regardless of what `Display` exposes.
  pub fn detail(&self) -> &str {
    match self {
      UpstreamError::Status { message, .. } => message,
      UpstreamError::Provider(detail) => detail,
      UpstreamError::InvalidResponse(detail) => detail,
    }
  }
}

/// Abstraction over the generative-AI backend.
///
/// One implementation talks to the real provider; tests substitute a mock
/// with programmable replies and call counters.
pub trait UpstreamClient: Send + Sync {
  /// Forward a validated request and return the provider's response body
  /// verbatim.
  fn generate(
    &self,
    request: &GenerateRequest,
  ) -> impl Future<Output = Result<serde_json::Value, UpstreamError>> + Send;

  /// Pull the transcription text out of a provider response body.
  /// Returns `None` when the response carries no text.
  fn transcript_text(&self, response: &serde_json::Value) -> Option<String>;
}
