//! Handler for `POST /api/transcribe`.
//!
//! Wraps the validated audio in a fixed transcription prompt, forwards it,
//! and returns only the extracted text. The audio payload lives for the
//! duration of the upstream call and is dropped with the request; it is
//! never logged or stored server-side.

use axum::{
  Json,
  extract::{Request, State},
  response::{IntoResponse, Response},
};
use serde::Serialize;
use voxloan_core::{
  content::{Content, GenerateRequest, GenerationConfig, Part},
  upstream::UpstreamClient,
};

use crate::{
  AI_BODY_LIMIT, AppState, collect_body, error::GatewayError, parse_json,
  validate::TranscribeBody,
};

/// Model used for every transcription call. Callers cannot pick one.
const TRANSCRIBE_MODEL: &str = "gemini-2.0-flash";

const TRANSCRIBE_PROMPT: &str = "Transcribe the following audio recording. \
   Return only the spoken text with normal punctuation, and nothing else.";

#[derive(Debug, Serialize)]
pub struct TranscriptionResponse {
  pub transcription: String,
  pub success:       bool,
}

pub async fn handler<U>(
  State(state): State<AppState<U>>,
  req: Request,
) -> Result<Response, GatewayError>
where
  U: UpstreamClient + Clone + Send + Sync + 'static,
{
  let bytes = collect_body(req, AI_BODY_LIMIT).await?;
  let body: TranscribeBody = parse_json(&bytes)?;
  let request = body.validate().map_err(GatewayError::Validation)?;

  let upstream = state.upstream.as_ref().ok_or(GatewayError::Unconfigured)?;

  let generate = GenerateRequest {
    model:    TRANSCRIBE_MODEL.to_string(),
    contents: vec![Content {
      parts: vec![
        Part::text(TRANSCRIBE_PROMPT),
        Part::InlineData {
          inline_data: request.audio,
        },
      ],
    }],
    config:   Some(GenerationConfig {
      temperature: Some(0.1),
      ..Default::default()
    }),
  };

  let response = upstream
    .generate(&generate)
    .await
    .map_err(GatewayError::from_transcription)?;

  let transcription = upstream.transcript_text(&response).ok_or_else(|| {
    tracing::error!("provider response carried no transcription text");
    GatewayError::Transcription
  })?;

  Ok(
    Json(TranscriptionResponse {
      transcription,
      success: true,
    })
    .into_response(),
  )
}
