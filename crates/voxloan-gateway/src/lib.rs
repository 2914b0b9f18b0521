//! API gateway between the marketing frontend and the generative-AI
//! backend.
//!
//! Exposes an axum [`Router`] backed by any
//! [`voxloan_core::upstream::UpstreamClient`]. The gateway owns CORS
//! policy, security headers, per-IP rate limiting, request validation, and
//! error normalization; the upstream crate owns the provider protocol.

pub mod error;
pub mod handlers;
pub mod ratelimit;
pub mod validate;

pub use error::{GatewayError, Violation};

use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use axum::{
  Router,
  extract::{ConnectInfo, DefaultBodyLimit, Request, State},
  http::{HeaderValue, Method, header},
  middleware::{self, Next},
  response::Response,
  routing::{get, post},
};
use bytes::Bytes;
use serde::{Deserialize, de::DeserializeOwned};
use tower_http::{
  cors::{AllowOrigin, CorsLayer},
  services::{ServeDir, ServeFile},
  set_header::SetResponseHeaderLayer,
  trace::TraceLayer,
};
use voxloan_core::upstream::UpstreamClient;

use ratelimit::{API_POLICY, Decision, RateLimiter, TRANSCRIBE_POLICY};

// ─── Body limits ─────────────────────────────────────────────────────────────

/// JSON cap on the AI endpoints, sized for base64 audio. The validator's
/// payload ceiling sits below this, so the two bounds can never disagree
/// about the same request.
pub const AI_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Everything else.
pub const GENERAL_BODY_LIMIT: usize = 1024 * 1024;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised once at startup from
/// `config.toml` plus a `VOXLOAN_`-prefixed environment overlay, and
/// injected into [`AppState`]. No component reads the environment after
/// this point.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host: String,
  #[serde(default = "default_port")]
  pub port: u16,

  /// Generative-AI backend credential. Absent or placeholder means the AI
  /// endpoints answer 503.
  #[serde(default)]
  pub gemini_api_key: Option<String>,

  /// Origins allowed to call the API from a browser.
  #[serde(default)]
  pub allowed_origins: Vec<String>,

  /// Managed-database project URL and public key. Absent means the client
  /// flows fall back to mock persistence.
  #[serde(default)]
  pub supabase_url: Option<String>,
  #[serde(default)]
  pub supabase_anon_key: Option<String>,

  /// Error-tracking DSN. Surfaced in startup logs only.
  #[serde(default)]
  pub sentry_dsn: Option<String>,

  /// Analytics property identifiers. The frontend consumes these; the
  /// gateway only reports whether any are configured.
  #[serde(default)]
  pub analytics_ids: Vec<String>,

  /// Built frontend bundle to serve in production. Absent in development,
  /// where a separate dev server owns the frontend.
  #[serde(default)]
  pub static_dir: Option<PathBuf>,

  /// Externally-reachable API base URL for the frontend to call instead of
  /// same-origin, echoed by `/api/config`.
  #[serde(default)]
  pub api_base_url: Option<String>,
}

fn default_host() -> String {
  "127.0.0.1".to_string()
}

fn default_port() -> u16 {
  8787
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:              default_host(),
      port:              default_port(),
      gemini_api_key:    None,
      allowed_origins:   Vec::new(),
      supabase_url:      None,
      supabase_anon_key: None,
      sentry_dsn:        None,
      analytics_ids:     Vec::new(),
      static_dir:        None,
      api_base_url:      None,
    }
  }
}

// ─── Application state ───────────────────────────────────────────────────────

/// Both rate-limit windows. The counters inside are the only shared
/// mutable state in the gateway.
pub struct RateLimits {
  pub api:        RateLimiter,
  pub transcribe: RateLimiter,
}

impl Default for RateLimits {
  fn default() -> Self {
    Self {
      api:        RateLimiter::new(API_POLICY),
      transcribe: RateLimiter::new(TRANSCRIBE_POLICY),
    }
  }
}

/// Shared state threaded through all axum handlers.
///
/// `upstream` is `None` when the AI credential was missing at startup; the
/// AI endpoints then short-circuit with 503 instead of checking the
/// credential per-request.
#[derive(Clone)]
pub struct AppState<U: UpstreamClient> {
  pub upstream: Option<Arc<U>>,
  pub config:   Arc<ServerConfig>,
  pub limits:   Arc<RateLimits>,
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the gateway [`Router`].
pub fn router<U>(state: AppState<U>) -> Router
where
  U: UpstreamClient + Clone + Send + Sync + 'static,
{
  // The transcription endpoint carries its own, stricter window on top of
  // the coarse one.
  let transcribe = Router::new()
    .route("/api/transcribe", post(handlers::transcribe::handler::<U>))
    .route_layer(middleware::from_fn_with_state(
      state.clone(),
      transcribe_rate_limit::<U>,
    ));

  let api = Router::new()
    .route("/api/health", get(handlers::health::handler::<U>))
    .route("/api/config", get(handlers::health::frontend_config::<U>))
    .route(
      "/api/generate-content",
      post(handlers::generate::handler::<U>),
    )
    .merge(transcribe)
    .layer(middleware::from_fn_with_state(
      state.clone(),
      api_rate_limit::<U>,
    ))
    .layer(middleware::from_fn_with_state(
      state.clone(),
      check_origin::<U>,
    ))
    .layer(cors_layer(&state.config))
    .layer(SetResponseHeaderLayer::overriding(
      header::CONTENT_SECURITY_POLICY,
      csp_value(&state.config),
    ))
    .layer(SetResponseHeaderLayer::overriding(
      header::X_CONTENT_TYPE_OPTIONS,
      HeaderValue::from_static("nosniff"),
    ))
    .layer(SetResponseHeaderLayer::overriding(
      header::X_FRAME_OPTIONS,
      HeaderValue::from_static("DENY"),
    ))
    .layer(TraceLayer::new_for_http())
    .layer(DefaultBodyLimit::max(GENERAL_BODY_LIMIT));

  // In production the gateway also serves the built frontend bundle, with
  // index fallback for client-side routes.
  let app = match &state.config.static_dir {
    Some(dir) => api.fallback_service(
      ServeDir::new(dir).not_found_service(ServeFile::new(dir.join("index.html"))),
    ),
    None => api,
  };

  app.with_state(state)
}

// ─── Layers and middleware ───────────────────────────────────────────────────

fn cors_layer(config: &ServerConfig) -> CorsLayer {
  let origins: Vec<HeaderValue> = config
    .allowed_origins
    .iter()
    .filter_map(|o| o.parse().ok())
    .collect();

  CorsLayer::new()
    .allow_origin(AllowOrigin::list(origins))
    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
    .allow_headers([header::CONTENT_TYPE])
    .max_age(Duration::from_secs(60 * 60))
}

/// Restrictive CSP: self, plus the two third-party origins the frontend
/// actually talks to.
fn csp_value(config: &ServerConfig) -> HeaderValue {
  let mut connect = String::from("'self' https://generativelanguage.googleapis.com");
  if let Some(url) = &config.supabase_url {
    connect.push(' ');
    connect.push_str(url.trim_end_matches('/'));
  }
  let policy = format!(
    "default-src 'self'; script-src 'self'; style-src 'self' 'unsafe-inline'; \
     img-src 'self' data: blob:; connect-src {connect}"
  );
  HeaderValue::from_str(&policy)
    .unwrap_or_else(|_| HeaderValue::from_static("default-src 'self'"))
}

/// Reject browser requests from non-listed origins with an explicit
/// `CORS_ERROR` instead of silently omitting CORS headers. Requests with
/// no `Origin` header (curl, server-to-server) pass.
async fn check_origin<U>(
  State(state): State<AppState<U>>,
  req: Request,
  next: Next,
) -> Result<Response, GatewayError>
where
  U: UpstreamClient + Clone + Send + Sync + 'static,
{
  let Some(origin) = req.headers().get(header::ORIGIN) else {
    return Ok(next.run(req).await);
  };

  let origin = origin.to_str().unwrap_or("");
  if state.config.allowed_origins.iter().any(|o| o == origin) {
    Ok(next.run(req).await)
  } else {
    Err(GatewayError::Cors(origin.to_string()))
  }
}

async fn api_rate_limit<U>(
  State(state): State<AppState<U>>,
  req: Request,
  next: Next,
) -> Result<Response, GatewayError>
where
  U: UpstreamClient + Clone + Send + Sync + 'static,
{
  enforce(&state.limits.api, req, next).await
}

async fn transcribe_rate_limit<U>(
  State(state): State<AppState<U>>,
  req: Request,
  next: Next,
) -> Result<Response, GatewayError>
where
  U: UpstreamClient + Clone + Send + Sync + 'static,
{
  enforce(&state.limits.transcribe, req, next).await
}

async fn enforce(
  limiter: &RateLimiter,
  req: Request,
  next: Next,
) -> Result<Response, GatewayError> {
  let identity = client_identity(&req);
  match limiter.check(&identity) {
    Decision::Allowed { .. } => Ok(next.run(req).await),
    Decision::Limited {
      limit,
      retry_after_secs,
    } => {
      tracing::warn!(%identity, limit, "rate limit exceeded");
      Err(GatewayError::RateLimited {
        limit,
        retry_after_secs,
      })
    }
  }
}

/// Client identity for rate limiting: first forwarded hop when behind a
/// proxy, else the socket peer address.
fn client_identity(req: &Request) -> String {
  if let Some(forwarded) = req
    .headers()
    .get("x-forwarded-for")
    .and_then(|v| v.to_str().ok())
  {
    if let Some(first) = forwarded.split(',').next() {
      let first = first.trim();
      if !first.is_empty() {
        return first.to_string();
      }
    }
  }

  req
    .extensions()
    .get::<ConnectInfo<SocketAddr>>()
    .map(|ci| ci.0.ip().to_string())
    .unwrap_or_else(|| "unknown".to_string())
}

// ─── Body plumbing ───────────────────────────────────────────────────────────

pub(crate) async fn collect_body(req: Request, limit: usize) -> Result<Bytes, GatewayError> {
  axum::body::to_bytes(req.into_body(), limit)
    .await
    .map_err(|_| GatewayError::PayloadTooLarge)
}

pub(crate) fn parse_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, GatewayError> {
  serde_json::from_slice(bytes).map_err(|e| GatewayError::Parse(e.to_string()))
}

// ─── Integration tests ───────────────────────────────────────────────────────
