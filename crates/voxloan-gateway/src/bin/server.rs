//! voxloan gateway server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) with a
//! `VOXLOAN_`-prefixed environment overlay, builds the upstream client
//! once, and serves the API. Missing integrations degrade loudly at
//! startup instead of failing per-request.

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use voxloan_gateway::{AppState, RateLimits, ServerConfig};
use voxloan_gemini::GeminiClient;

#[derive(Parser)]
#[command(author, version, about = "voxloan API gateway")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Load configuration, report integration status, and exit.
  #[arg(long)]
  check: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("VOXLOAN"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let upstream = build_upstream(&server_cfg);
  report_integrations(&server_cfg, upstream.is_some());

  if cli.check {
    return Ok(());
  }

  let state = AppState {
    upstream: upstream.map(Arc::new),
    config:   Arc::new(server_cfg.clone()),
    limits:   Arc::new(RateLimits::default()),
  };

  let app = voxloan_gateway::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(
    listener,
    app.into_make_service_with_connect_info::<SocketAddr>(),
  )
  .with_graceful_shutdown(shutdown_signal())
  .await
  .context("server error")?;

  Ok(())
}

/// Build the upstream client once. Failure is a configuration state, not a
/// fatal error: the gateway still serves, with the AI endpoints on 503.
fn build_upstream(config: &ServerConfig) -> Option<GeminiClient> {
  match GeminiClient::new(config.gemini_api_key.clone().unwrap_or_default()) {
    Ok(client) => Some(client),
    Err(e) => {
      tracing::warn!("Gemini is not configured ({e}); AI endpoints will return 503");
      None
    }
  }
}

fn report_integrations(config: &ServerConfig, gemini: bool) {
  tracing::info!(
    gemini_configured = gemini,
    supabase_configured = config.supabase_url.is_some() && config.supabase_anon_key.is_some(),
    sentry_configured = config.sentry_dsn.is_some(),
    analytics_ids = config.analytics_ids.len(),
    allowed_origins = config.allowed_origins.len(),
    static_dir = config.static_dir.is_some(),
    "integration status"
  );
}

async fn shutdown_signal() {
  let ctrl_c = async {
    tokio::signal::ctrl_c()
      .await
      .expect("failed to install Ctrl+C handler");
    tracing::info!("Received Ctrl+C, shutting down");
  };

  #[cfg(unix)]
  let terminate = async {
    tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
      .expect("failed to install signal handler")
      .recv()
      .await;
    tracing::info!("Received terminate signal, shutting down");
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => {},
    _ = terminate => {},
  }
}
