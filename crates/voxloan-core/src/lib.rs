//! Core types and trait seams for the voxloan gateway and client flows.
//!
//! This crate is deliberately free of HTTP and provider dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod content;
pub mod lead;
pub mod upstream;

pub use content::{AudioMime, Content, GenerateRequest, GenerationConfig, InlineData, Part};
pub use lead::{LeadRecord, LeadStore, NewLead};
pub use upstream::{UpstreamClient, UpstreamError};
