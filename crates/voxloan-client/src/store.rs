//! Lead persistence backends.
//!
//! The real path inserts into a managed Postgres over its REST surface;
//! the mock path exists so local development works with no credentials
//! and is clearly marked as such in the logs.

use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;
use voxloan_core::lead::{LeadRecord, LeadStore, NewLead};

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("failed to reach the database: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("database rejected the submission ({status})")]
  Status { status: u16, detail: String },

  #[error("unexpected database response: {0}")]
  Decode(String),
}

// ─── Supabase ────────────────────────────────────────────────────────────────

/// Managed-database project settings. The anon key is a public,
/// row-level-security-scoped credential: anonymous callers may insert
/// leads, nothing may read them back without an elevated key.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
  pub url:      String,
  pub anon_key: String,
}

/// Inserts leads through the PostgREST surface of a managed database.
#[derive(Debug, Clone)]
pub struct SupabaseStore {
  client: reqwest::Client,
  config: SupabaseConfig,
}

impl SupabaseStore {
  pub fn new(config: SupabaseConfig) -> Result<Self, StoreError> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(30))
      .build()?;
    Ok(Self { client, config })
  }

  fn leads_url(&self) -> String {
    format!("{}/rest/v1/leads", self.config.url.trim_end_matches('/'))
  }
}

impl LeadStore for SupabaseStore {
  type Error = StoreError;

  async fn insert(&self, lead: NewLead) -> Result<LeadRecord, StoreError> {
    let response = self
      .client
      .post(self.leads_url())
      .header("apikey", &self.config.anon_key)
      .bearer_auth(&self.config.anon_key)
      .header("Prefer", "return=representation")
      .json(&lead)
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      let detail = response.text().await.unwrap_or_default();
      return Err(StoreError::Status {
        status: status.as_u16(),
        detail,
      });
    }

    // PostgREST returns the inserted rows as an array.
    let mut rows: Vec<LeadRecord> = response
      .json()
      .await
      .map_err(|e| StoreError::Decode(e.to_string()))?;
    rows
      .pop()
      .ok_or_else(|| StoreError::Decode("empty insert result".to_string()))
  }
}

// ─── Mock ────────────────────────────────────────────────────────────────────

/// No-credential fallback: synthetic delay, fabricated identifier,
/// success. Every insert is logged as a mock submission so it can never
/// be mistaken for a real one.
#[derive(Debug, Clone)]
pub struct MockStore {
  delay: Duration,
}

impl MockStore {
  pub fn new(delay: Duration) -> Self {
    Self { delay }
  }
}

impl Default for MockStore {
  fn default() -> Self {
    // Roughly what a real round trip takes, so the submitting state is
    // visible during local development.
    Self::new(Duration::from_millis(600))
  }
}

impl LeadStore for MockStore {
  type Error = StoreError;

  async fn insert(&self, lead: NewLead) -> Result<LeadRecord, StoreError> {
    tokio::time::sleep(self.delay).await;
    let now = Utc::now();
    let record = LeadRecord {
      id:         Uuid::new_v4(),
      first_name: lead.first_name,
      last_name:  lead.last_name,
      email:      lead.email,
      company:    lead.company,
      nmls_id:    lead.nmls_id,
      message:    lead.message,
      created_at: now,
      updated_at: now,
    };
    tracing::info!(lead_id = %record.id, "mock submission, no database configured");
    Ok(record)
  }
}

// ─── Backend selection ───────────────────────────────────────────────────────

/// The configured persistence path, decided once at startup.
#[derive(Debug, Clone)]
pub enum LeadBackend {
  Supabase(SupabaseStore),
  Mock(MockStore),
}

impl LeadBackend {
  /// Pick the real store when a credential is configured, the mock path
  /// otherwise.
  pub fn from_config(config: Option<SupabaseConfig>) -> Result<Self, StoreError> {
    match config {
      Some(config) => {
        tracing::info!("lead persistence: managed database");
        Ok(LeadBackend::Supabase(SupabaseStore::new(config)?))
      }
      None => {
        tracing::warn!("no database credential configured; lead submissions use the mock path");
        Ok(LeadBackend::Mock(MockStore::default()))
      }
    }
  }
}

impl LeadStore for LeadBackend {
  type Error = StoreError;

  async fn insert(&self, lead: NewLead) -> Result<LeadRecord, StoreError> {
    match self {
      LeadBackend::Supabase(store) => store.insert(lead).await,
      LeadBackend::Mock(store) => store.insert(lead).await,
    }
  }
}
