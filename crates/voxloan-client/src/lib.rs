//! Lead capture and voice input orchestration against the voxloan gateway.
//!
//! The state machines here are deliberately UI-free: a frontend drives
//! them and renders their states, this crate owns the transitions, the
//! normalization rules, and the persistence seams.

pub mod client;
pub mod lead;
pub mod store;
pub mod voice;

pub use client::{ApiError, GatewayClient, GatewayConfig};
pub use lead::{LeadForm, SubmitState};
pub use store::{LeadBackend, MockStore, StoreError, SupabaseConfig, SupabaseStore};
pub use voice::{Microphone, VoiceRecorder, VoiceState};
