//! External collaborators: the crawler, the language model and the billing
//! directory.
//!
//! Each trait carries its own error type so implementations can surface
//! transport detail; callers box the error at the boundary.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::account::{AccountPlan, Plan, UserId};

// ─── Crawler ─────────────────────────────────────────────────────────────────

/// A rendered page. `markdown` is `None` when the crawler could not produce
/// it (unsupported content, blocked page, and so on).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawledPage {
  pub markdown: Option<String>,
  pub html:     Option<String>,
}

pub trait Crawler: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch `url` and render it as markdown.
  fn scrape<'a>(
    &'a self,
    url: &'a str,
  ) -> impl Future<Output = Result<CrawledPage, Self::Error>> + Send + 'a;
}

// ─── Language model ──────────────────────────────────────────────────────────

/// Free-text generation request.
#[derive(Debug, Clone)]
pub struct TextRequest {
  pub model:      String,
  pub system:     String,
  pub prompt:     String,
  /// Allow the model to call a web-search tool while answering.
  pub web_search: bool,
}

/// Schema-constrained generation request.
#[derive(Debug, Clone)]
pub struct ObjectRequest {
  pub model:       String,
  pub system:      String,
  pub prompt:      String,
  pub schema_name: String,
  /// JSON Schema the returned value must conform to.
  pub schema:      serde_json::Value,
}

pub trait LanguageModel: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn generate_text(
    &self,
    request: TextRequest,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + '_;

  fn generate_object(
    &self,
    request: ObjectRequest,
  ) -> impl Future<Output = Result<serde_json::Value, Self::Error>> + Send + '_;
}

// ─── Billing ─────────────────────────────────────────────────────────────────

pub trait Billing: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The plan held by `user`. Unknown users are on the free plan.
  fn plan<'a>(
    &'a self,
    user: &'a UserId,
  ) -> impl Future<Output = Result<Plan, Self::Error>> + Send + 'a;

  /// Every known account with its plan.
  fn accounts(
    &self,
  ) -> impl Future<Output = Result<Vec<AccountPlan>, Self::Error>> + Send + '_;
}
