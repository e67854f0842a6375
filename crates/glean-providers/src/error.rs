//! Error type for `glean-providers`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("{service} returned {status}: {body}")]
  Status {
    service: &'static str,
    status:  u16,
    body:    String,
  },

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("model returned no output text")]
  EmptyOutput,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
