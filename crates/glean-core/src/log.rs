//! Scrape logs: one record per summarization request.
//!
//! A log starts in [`LogStatus::Processing`] and moves at most once to a
//! terminal state. The summary and insights are written together with that
//! transition and never change afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use uuid::Uuid;

use crate::account::UserId;

/// Hard cap on the number of URLs in one request.
pub const MAX_URLS: usize = 10;

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LogStatus {
  Processing,
  Completed,
  Failed,
}

impl LogStatus {
  pub fn is_terminal(self) -> bool { !matches!(self, Self::Processing) }
}

// ─── Insights ────────────────────────────────────────────────────────────────

/// Overall tone of the summarized material. Exactly four values exist.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Sentiment {
  Positive,
  Negative,
  Neutral,
  Mixed,
}

impl Sentiment {
  pub const ALL: [Sentiment; 4] =
    [Self::Positive, Self::Negative, Self::Neutral, Self::Mixed];
}

/// Schema-constrained extraction derived from a summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredInsights {
  pub sentiment:           Sentiment,
  pub key_findings:        Vec<String>,
  pub action_items:        Vec<String>,
  pub companies_mentioned: Vec<String>,
  pub topics_identified:   Vec<String>,
}

// ─── ScrapeLog ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeLog {
  pub log_id:              Uuid,
  pub created_at:          DateTime<Utc>,
  pub title:               Option<String>,
  pub user_id:             UserId,
  pub urls:                Vec<String>,
  pub status:              LogStatus,
  /// Model that generated (or will generate) the summary.
  pub model:               Option<String>,
  pub summarized_markdown: Option<String>,
  /// Absent on rows written before insights extraction existed.
  pub structured_insights: Option<StructuredInsights>,
}

/// Input to [`crate::store::GleanStore::insert_log`]. The id, timestamp and
/// initial status are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewScrapeLog {
  pub user_id: UserId,
  pub title:   Option<String>,
  pub urls:    Vec<String>,
  pub model:   Option<String>,
}

/// Filters for [`crate::store::GleanStore::search_logs`].
#[derive(Debug, Clone, Default)]
pub struct LogQuery {
  /// Case-insensitive substring match over title and summary.
  pub text:      Option<String>,
  pub status:    Option<LogStatus>,
  pub sentiment: Option<Sentiment>,
  pub limit:     Option<usize>,
  pub offset:    Option<usize>,
}

/// Normalise a URL list: trim, drop empties, dedupe keeping first occurrence,
/// and enforce the `1..=MAX_URLS` bound.
pub fn normalize_urls<I, T>(urls: I) -> crate::Result<Vec<String>>
where
  I: IntoIterator<Item = T>,
  T: AsRef<str>,
{
  let mut out: Vec<String> = Vec::new();
  for url in urls {
    let url = url.as_ref().trim();
    if url.is_empty() || out.iter().any(|u| u == url) {
      continue;
    }
    out.push(url.to_owned());
  }

  if out.is_empty() || out.len() > MAX_URLS {
    return Err(crate::Error::UrlCount { got: out.len(), max: MAX_URLS });
  }
  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn sentiment_rejects_unknown_values() {
    let ok: Sentiment = serde_json::from_str("\"mixed\"").unwrap();
    assert_eq!(ok, Sentiment::Mixed);
    assert!(serde_json::from_str::<Sentiment>("\"ecstatic\"").is_err());
  }

  #[test]
  fn insights_deserialize_from_extraction_output() {
    let json = serde_json::json!({
      "sentiment": "positive",
      "key_findings": ["a", "b", "c"],
      "action_items": ["x", "y", "z"],
      "companies_mentioned": [],
      "topics_identified": ["pricing"],
    });
    let insights: StructuredInsights = serde_json::from_value(json).unwrap();
    assert_eq!(insights.key_findings.len(), 3);
    assert_eq!(insights.topics_identified, ["pricing"]);
  }

  #[test]
  fn normalize_urls_dedupes_and_trims() {
    let urls = normalize_urls([" https://a.example ", "", "https://b.example", "https://a.example"])
      .unwrap();
    assert_eq!(urls, ["https://a.example", "https://b.example"]);
  }

  #[test]
  fn normalize_urls_enforces_bounds() {
    assert!(matches!(
      normalize_urls(Vec::<String>::new()),
      Err(crate::Error::UrlCount { got: 0, .. })
    ));

    let many: Vec<String> = (0..11).map(|i| format!("https://{i}.example")).collect();
    assert!(matches!(
      normalize_urls(many),
      Err(crate::Error::UrlCount { got: 11, max: MAX_URLS })
    ));
  }

  #[test]
  fn only_processing_is_non_terminal() {
    assert!(!LogStatus::Processing.is_terminal());
    assert!(LogStatus::Completed.is_terminal());
    assert!(LogStatus::Failed.is_terminal());
  }
}
