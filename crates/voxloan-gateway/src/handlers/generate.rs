//! Handler for `POST /api/generate-content`.
//!
//! Validate, forward, pass the provider body through verbatim. Validation
//! failures are resolved here and never reach the upstream client.

use axum::{
  Json,
  extract::{Request, State},
  response::{IntoResponse, Response},
};
use voxloan_core::upstream::UpstreamClient;

use crate::{
  AI_BODY_LIMIT, AppState, collect_body, error::GatewayError, parse_json,
  validate::GenerateBody,
};

pub async fn handler<U>(
  State(state): State<AppState<U>>,
  req: Request,
) -> Result<Response, GatewayError>
where
  U: UpstreamClient + Clone + Send + Sync + 'static,
{
  let bytes = collect_body(req, AI_BODY_LIMIT).await?;
  let body: GenerateBody = parse_json(&bytes)?;
  let request = body.validate().map_err(GatewayError::Validation)?;

  let upstream = state.upstream.as_ref().ok_or(GatewayError::Unconfigured)?;

  let response = upstream
    .generate(&request)
    .await
    .map_err(GatewayError::from_generation)?;

  Ok(Json(response).into_response())
}
