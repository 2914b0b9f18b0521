//! Lead submission types and the `LeadStore` trait.
//!
//! A lead is a prospective customer's contact-form submission. The record
//! itself is owned by an external managed database; these types are the
//! contract the Rust side depends on.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── NewLead ─────────────────────────────────────────────────────────────────

/// Input to [`LeadStore::insert`]. Constructed per form submit; never
/// persisted locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLead {
  pub first_name: String,
  pub last_name:  String,
  pub email:      String,
  pub company:    String,
  /// Industry license number (NMLS ID). Optional on the form.
  pub nmls_id:    Option<String>,
  pub message:    Option<String>,
}

impl NewLead {
  /// Coerce empty or whitespace-only optional fields to `None`.
  ///
  /// The persistence layer must never observe an empty string where the
  /// row contract says null.
  pub fn normalized(mut self) -> Self {
    self.nmls_id = none_if_blank(self.nmls_id);
    self.message = none_if_blank(self.message);
    self
  }
}

fn none_if_blank(value: Option<String>) -> Option<String> {
  value.filter(|s| !s.trim().is_empty())
}

// ─── LeadRecord ──────────────────────────────────────────────────────────────

/// What persistence returns: the stored row, including the generated
/// identifier and server-side timestamps.
///
/// Field names match the database row layout (snake_case columns).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadRecord {
  pub id:         Uuid,
  pub first_name: String,
  pub last_name:  String,
  pub email:      String,
  pub company:    String,
  pub nmls_id:    Option<String>,
  pub message:    Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over lead persistence.
///
/// Implemented by the managed-database client and by the mock path used
/// when no database credential is configured. Two inserts of identical
/// data produce two independent records; no deduplication is performed at
/// any layer.
pub trait LeadStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a lead and return the stored record.
  fn insert(
    &self,
    lead: NewLead,
  ) -> impl Future<Output = Result<LeadRecord, Self::Error>> + Send + '_;
}

#[cfg(test)]
mod tests {
  use super::*;

  fn lead(nmls_id: Option<&str>) -> NewLead {
    NewLead {
      first_name: "Ada".to_string(),
      last_name:  "Byron".to_string(),
      email:      "ada@example.com".to_string(),
      company:    "Analytical Lending".to_string(),
      nmls_id:    nmls_id.map(String::from),
      message:    Some("call me".to_string()),
    }
  }

  #[test]
  fn empty_nmls_id_normalises_to_none() {
    assert_eq!(lead(Some("")).normalized().nmls_id, None);
    assert_eq!(lead(Some("   ")).normalized().nmls_id, None);
    assert_eq!(lead(None).normalized().nmls_id, None);
  }

  #[test]
  fn present_nmls_id_survives_normalisation() {
    assert_eq!(
      lead(Some("123456")).normalized().nmls_id.as_deref(),
      Some("123456")
    );
  }

  #[test]
  fn blank_message_normalises_to_none() {
    let mut l = lead(None);
    l.message = Some("  ".to_string());
    assert_eq!(l.normalized().message, None);
  }
}
