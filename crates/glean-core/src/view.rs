//! Read models handed to polling clients.

use serde::Serialize;

use crate::log::{LogStatus, ScrapeLog, StructuredInsights};

/// Insights as a client should render them. Legacy rows have none, which is
/// a normal state rather than an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum InsightsView {
  Available(StructuredInsights),
  NotAvailable,
}

impl From<Option<StructuredInsights>> for InsightsView {
  fn from(insights: Option<StructuredInsights>) -> Self {
    insights.map_or(Self::NotAvailable, Self::Available)
  }
}

/// A [`ScrapeLog`] shaped for a poller.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeLogView {
  #[serde(flatten)]
  pub log:      ScrapeLogSummary,
  /// `true` while the worker has not reached a terminal state.
  pub pending:  bool,
  pub insights: InsightsView,
}

/// The log fields, minus the raw optional insights.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeLogSummary {
  pub log_id:              uuid::Uuid,
  pub created_at:          chrono::DateTime<chrono::Utc>,
  pub title:               Option<String>,
  pub urls:                Vec<String>,
  pub status:              LogStatus,
  pub model:               Option<String>,
  pub summarized_markdown: Option<String>,
}

impl From<ScrapeLog> for ScrapeLogView {
  fn from(log: ScrapeLog) -> Self {
    Self {
      pending:  !log.status.is_terminal(),
      insights: log.structured_insights.into(),
      log:      ScrapeLogSummary {
        log_id:              log.log_id,
        created_at:          log.created_at,
        title:               log.title,
        urls:                log.urls,
        status:              log.status,
        model:               log.model,
        summarized_markdown: log.summarized_markdown,
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use uuid::Uuid;

  use super::*;
  use crate::account::UserId;

  fn legacy_completed_log() -> ScrapeLog {
    ScrapeLog {
      log_id:              Uuid::new_v4(),
      created_at:          Utc::now(),
      title:               Some("Old".into()),
      user_id:             UserId::from("u1"),
      urls:                vec!["https://a.example".into()],
      status:              LogStatus::Completed,
      model:               None,
      summarized_markdown: Some("# Summary".into()),
      structured_insights: None,
    }
  }

  #[test]
  fn missing_insights_render_as_placeholder() {
    let view = ScrapeLogView::from(legacy_completed_log());
    assert_eq!(view.insights, InsightsView::NotAvailable);
    assert!(!view.pending);

    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["insights"]["state"], "not_available");
    assert_eq!(json["status"], "completed");
  }

  #[test]
  fn processing_log_is_pending() {
    let mut log = legacy_completed_log();
    log.status = LogStatus::Processing;
    log.summarized_markdown = None;
    assert!(ScrapeLogView::from(log).pending);
  }
}
