//! Construction-time errors for `voxloan-gemini`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("no Gemini API key configured")]
  MissingKey,

  #[error("Gemini API key is still the placeholder value")]
  PlaceholderKey,

  #[error("failed to build HTTP client: {0}")]
  Http(#[from] reqwest::Error),
}
