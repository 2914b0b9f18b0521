//! Handlers for the meta endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/api/health` | liveness + integration status |
//! | `GET`  | `/api/config` | public runtime config for the frontend |

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;
use voxloan_core::upstream::UpstreamClient;

use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
  pub status:            &'static str,
  pub timestamp:         DateTime<Utc>,
  pub gemini_configured: bool,
}

/// `GET /api/health`
pub async fn handler<U>(State(state): State<AppState<U>>) -> Json<Health>
where
  U: UpstreamClient + Clone + Send + Sync + 'static,
{
  Json(Health {
    status:            "ok",
    timestamp:         Utc::now(),
    gemini_configured: state.upstream.is_some(),
  })
}

/// Runtime configuration safe to hand to any caller. Secrets never appear
/// here; the frontend only needs to know where to point and what exists.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontendConfig {
  pub api_base_url:        Option<String>,
  pub supabase_url:        Option<String>,
  pub supabase_configured: bool,
}

/// `GET /api/config`
pub async fn frontend_config<U>(State(state): State<AppState<U>>) -> Json<FrontendConfig>
where
  U: UpstreamClient + Clone + Send + Sync + 'static,
{
  let config = &state.config;
  Json(FrontendConfig {
    api_base_url:        config.api_base_url.clone(),
    supabase_url:        config.supabase_url.clone(),
    supabase_configured: config.supabase_url.is_some() && config.supabase_anon_key.is_some(),
  })
}
