//! Tracked competitors and their append-only scan results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use uuid::Uuid;

use crate::account::UserId;

/// How often a competitor is re-scanned.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr,
  EnumString,
)]
pub enum ScanFrequency {
  #[serde(rename = "w")]
  #[strum(serialize = "w")]
  Weekly,
  #[serde(rename = "m")]
  #[strum(serialize = "m")]
  Monthly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Competitor {
  pub competitor_id:   Uuid,
  pub created_at:      DateTime<Utc>,
  pub user_id:         UserId,
  pub name:            String,
  pub scan_frequency:  ScanFrequency,
  /// Set only by the scan scheduler.
  pub last_scanned_on: Option<DateTime<Utc>>,
}

/// Editable fields of a [`Competitor`].
#[derive(Debug, Clone, Deserialize)]
pub struct CompetitorFields {
  pub name:           String,
  pub scan_frequency: ScanFrequency,
}

/// One scan result. Rows are appended and never updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitorAnalysis {
  pub analysis_id:   Uuid,
  pub created_at:    DateTime<Utc>,
  pub competitor_id: Uuid,
  pub analysis:      String,
}
