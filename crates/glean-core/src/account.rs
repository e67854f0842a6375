//! Identity and billing-plan types.
//!
//! Glean never derives "the current user" from ambient context. Every store
//! and pipeline operation receives a [`UserId`] resolved by the boundary
//! layer.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

/// Opaque identifier issued by the identity directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for UserId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for UserId {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

/// Billing plan held by an account.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
  AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Plan {
  #[default]
  Free,
  Pro,
}

impl Plan {
  pub fn is_premium(self) -> bool { matches!(self, Self::Pro) }
}

/// One entry of the billing directory's account listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountPlan {
  pub user_id: UserId,
  pub plan:    Plan,
}

/// Per-user preferences. At most one row exists per user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSettings {
  pub user_id:       UserId,
  /// Overrides the default persona for summaries and competitor scans.
  pub system_prompt: Option<String>,
  pub updated_at:    DateTime<Utc>,
}

impl UserSettings {
  /// The custom prompt, if one is set and not blank.
  pub fn custom_prompt(&self) -> Option<&str> {
    self
      .system_prompt
      .as_deref()
      .map(str::trim)
      .filter(|p| !p.is_empty())
  }
}
