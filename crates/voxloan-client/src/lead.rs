//! Lead submission state machine.
//!
//! States: `Idle -> Submitting -> (Success | Error)`. From `Error`,
//! resubmission returns to `Submitting` with the entered values intact;
//! from `Success`, an explicit [`LeadForm::reset`] returns to `Idle` with
//! all fields cleared.

use anyhow::anyhow;
use voxloan_core::lead::{LeadStore, NewLead};

// ─── Fields ──────────────────────────────────────────────────────────────────

/// Raw form entry, exactly as typed. Normalization happens at submit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadFields {
  pub first_name: String,
  pub last_name:  String,
  pub email:      String,
  pub company:    String,
  /// Optional industry license number.
  pub nmls_id:    String,
  pub message:    String,
}

/// One client-side required-field failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
  pub field:   &'static str,
  pub message: &'static str,
}

// ─── State ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum SubmitState {
  Idle,
  Submitting,
  Success(voxloan_core::lead::LeadRecord),
  Error(String),
}

// ─── Form ────────────────────────────────────────────────────────────────────

/// Drives one lead submission against any [`LeadStore`].
pub struct LeadForm<S: LeadStore> {
  pub fields: LeadFields,
  state:      SubmitState,
  store:      S,
}

impl<S: LeadStore> LeadForm<S> {
  pub fn new(store: S) -> Self {
    Self {
      fields: LeadFields::default(),
      state: SubmitState::Idle,
      store,
    }
  }

  pub fn state(&self) -> &SubmitState {
    &self.state
  }

  /// Required-field checks, the equivalent of browser-level validation.
  /// Everything but the license number must be present.
  pub fn validate_required(&self) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();
    let required: [(&'static str, &str); 5] = [
      ("first_name", &self.fields.first_name),
      ("last_name", &self.fields.last_name),
      ("email", &self.fields.email),
      ("company", &self.fields.company),
      ("message", &self.fields.message),
    ];
    for (field, value) in required {
      if value.trim().is_empty() {
        errors.push(FieldError {
          field,
          message: "is required",
        });
      }
    }
    if !self.fields.email.trim().is_empty() && !self.fields.email.contains('@') {
      errors.push(FieldError {
        field:   "email",
        message: "is not a valid email address",
      });
    }
    if errors.is_empty() { Ok(()) } else { Err(errors) }
  }

  fn new_lead(&self) -> NewLead {
    NewLead {
      first_name: self.fields.first_name.trim().to_string(),
      last_name:  self.fields.last_name.trim().to_string(),
      email:      self.fields.email.trim().to_string(),
      company:    self.fields.company.trim().to_string(),
      nmls_id:    Some(self.fields.nmls_id.clone()),
      message:    Some(self.fields.message.clone()),
    }
    // normalized() turns blank optionals into explicit nulls.
    .normalized()
  }

  /// Submit the entered values. On failure the fields are preserved so
  /// the user does not retype everything; on success the fields stay
  /// until [`LeadForm::reset`] so the confirmation view can echo them.
  ///
  /// Calling while already `Submitting` is a no-op. That disabled-button
  /// guard is the only double-submission protection; there is no
  /// server-side idempotency key.
  pub async fn submit(&mut self) -> anyhow::Result<()> {
    if matches!(self.state, SubmitState::Submitting) {
      return Ok(());
    }

    if let Err(errors) = self.validate_required() {
      let message = errors
        .iter()
        .map(|e| format!("{} {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ");
      self.state = SubmitState::Error(message.clone());
      return Err(anyhow!("{message}"));
    }

    self.state = SubmitState::Submitting;
    let lead = self.new_lead();

    match self.store.insert(lead).await {
      Ok(record) => {
        self.state = SubmitState::Success(record);
        Ok(())
      }
      Err(e) => {
        self.state = SubmitState::Error(format!("Submission failed: {e}"));
        Err(e.into())
      }
    }
  }

  /// Back to a blank form. The "book another demo" action.
  pub fn reset(&mut self) {
    self.fields = LeadFields::default();
    self.state = SubmitState::Idle;
  }
}
