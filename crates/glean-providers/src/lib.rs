//! HTTP implementations of the Glean collaborator traits.
//!
//! [`FirecrawlClient`] implements [`glean_core::collab::Crawler`] and
//! [`OpenAiClient`] implements [`glean_core::collab::LanguageModel`]. Both
//! carry a request timeout so a hung call fails its job.

pub mod error;
pub mod firecrawl;
pub mod openai;

pub use error::{Error, Result};
pub use firecrawl::{FirecrawlClient, FirecrawlConfig};
pub use openai::{OpenAiClient, OpenAiConfig};
