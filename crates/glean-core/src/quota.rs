//! Free-tier limits. The store applies them in the same statement that
//! records the usage, so concurrent requests cannot overshoot.

use serde::Serialize;

use crate::{Error, account::Plan};

/// Summaries a free account may request per calendar month.
pub const FREE_SUMMARIES_PER_MONTH: u32 = 10;

/// Competitors a free account may track at once.
pub const FREE_TRACKED_COMPETITORS: usize = 5;

/// Limits that apply to a plan; `None` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Limits {
  pub summaries_per_month: Option<u32>,
  pub tracked_competitors: Option<usize>,
}

impl Limits {
  pub fn for_plan(plan: Plan) -> Self {
    match plan {
      Plan::Free => Self {
        summaries_per_month: Some(FREE_SUMMARIES_PER_MONTH),
        tracked_competitors: Some(FREE_TRACKED_COMPETITORS),
      },
      Plan::Pro => Self {
        summaries_per_month: None,
        tracked_competitors: None,
      },
    }
  }
}

/// The rejection for a request past the monthly summary cap.
pub fn summaries_exhausted(limit: u32) -> Error {
  Error::QuotaExceeded(format!("monthly limit of {limit} summaries reached"))
}

/// The rejection for tracking a competitor past the cap.
pub fn competitors_exhausted(limit: usize) -> Error {
  Error::QuotaExceeded(format!("limit of {limit} tracked competitors reached"))
}
