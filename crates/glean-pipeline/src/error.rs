//! Error type for `glean-pipeline`.

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] glean_core::Error),

  #[error("store error: {0}")]
  Store(#[source] BoxError),

  #[error("crawler error: {0}")]
  Crawler(#[source] BoxError),

  #[error("language model error: {0}")]
  Llm(#[source] BoxError),

  #[error("billing error: {0}")]
  Billing(#[source] BoxError),

  #[error("no crawlable content in any of {0} url(s)")]
  NoContent(usize),

  #[error("model {0:?} is not offered")]
  UnknownModel(String),

  #[error("structured insights did not match the schema: {0}")]
  Insights(#[source] serde_json::Error),

  #[error("job queue is closed")]
  QueueClosed,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
