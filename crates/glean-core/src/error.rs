//! Error types for `glean-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  /// Deliberately conflates "missing" and "owned by someone else".
  #[error("not found or access denied")]
  NotFoundOrDenied,

  #[error("log {0} has already reached a terminal state")]
  AlreadyTerminal(Uuid),

  #[error("expected between 1 and {max} urls, got {got}")]
  UrlCount { got: usize, max: usize },

  #[error("{0}")]
  QuotaExceeded(String),

  #[error("unknown {kind}: {value:?}")]
  UnknownVariant { kind: &'static str, value: String },

  #[error("invalid month key: {0:?}")]
  InvalidMonth(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
