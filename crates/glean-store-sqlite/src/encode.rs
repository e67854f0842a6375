//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microsecond
//! precision, `Z` suffix) so that text ordering matches time ordering. URL
//! lists and insights are stored as compact JSON. UUIDs are stored as
//! hyphenated lowercase strings.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use glean_core::{
  account::{UserId, UserSettings},
  competitor::{Competitor, CompetitorAnalysis, ScanFrequency},
  library::{Document, DocumentBody, SourceBundle},
  log::{LogStatus, ScrapeLog, StructuredInsights},
  usage::Usage,
};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// Parse a strum-backed enum column.
pub fn decode_enum<T: FromStr>(kind: &'static str, s: &str) -> Result<T> {
  s.parse().map_err(|_| {
    Error::Core(glean_core::Error::UnknownVariant {
      kind,
      value: s.to_owned(),
    })
  })
}

/// Build a `LIKE` pattern matching `term` anywhere, with wildcards in the
/// term escaped. Pair with `ESCAPE '\'`.
pub fn like_pattern(term: &str) -> String {
  let mut escaped = String::with_capacity(term.len() + 2);
  escaped.push('%');
  for c in term.chars() {
    if matches!(c, '%' | '_' | '\\') {
      escaped.push('\\');
    }
    escaped.push(c);
  }
  escaped.push('%');
  escaped
}

// ─── JSON columns ────────────────────────────────────────────────────────────

pub fn encode_urls(urls: &[String]) -> Result<String> {
  Ok(serde_json::to_string(urls)?)
}

pub fn decode_urls(s: &str) -> Result<Vec<String>> { Ok(serde_json::from_str(s)?) }

pub fn encode_insights(insights: &StructuredInsights) -> Result<String> {
  Ok(serde_json::to_string(insights)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const LOG_COLUMNS: &str = "log_id, created_at, title, user_id, urls, status, \
                               model, summarized_markdown, structured_insights";

/// Raw strings read directly from a `scrape_logs` row.
pub struct RawLog {
  pub log_id:              String,
  pub created_at:          String,
  pub title:               Option<String>,
  pub user_id:             String,
  pub urls:                String,
  pub status:              String,
  pub model:               Option<String>,
  pub summarized_markdown: Option<String>,
  pub structured_insights: Option<String>,
}

impl RawLog {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      log_id:              row.get(0)?,
      created_at:          row.get(1)?,
      title:               row.get(2)?,
      user_id:             row.get(3)?,
      urls:                row.get(4)?,
      status:              row.get(5)?,
      model:               row.get(6)?,
      summarized_markdown: row.get(7)?,
      structured_insights: row.get(8)?,
    })
  }

  pub fn into_log(self) -> Result<ScrapeLog> {
    let structured_insights = self
      .structured_insights
      .as_deref()
      .map(serde_json::from_str::<StructuredInsights>)
      .transpose()?;

    Ok(ScrapeLog {
      log_id: decode_uuid(&self.log_id)?,
      created_at: decode_dt(&self.created_at)?,
      title: self.title,
      user_id: UserId::new(self.user_id),
      urls: decode_urls(&self.urls)?,
      status: decode_enum::<LogStatus>("log status", &self.status)?,
      model: self.model,
      summarized_markdown: self.summarized_markdown,
      structured_insights,
    })
  }
}

pub const BUNDLE_COLUMNS: &str = "bundle_id, created_at, user_id, name, description, urls";

/// Raw strings read directly from a `source_bundles` row.
pub struct RawBundle {
  pub bundle_id:   String,
  pub created_at:  String,
  pub user_id:     String,
  pub name:        String,
  pub description: Option<String>,
  pub urls:        String,
}

impl RawBundle {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      bundle_id:   row.get(0)?,
      created_at:  row.get(1)?,
      user_id:     row.get(2)?,
      name:        row.get(3)?,
      description: row.get(4)?,
      urls:        row.get(5)?,
    })
  }

  pub fn into_bundle(self) -> Result<SourceBundle> {
    Ok(SourceBundle {
      bundle_id:   decode_uuid(&self.bundle_id)?,
      created_at:  decode_dt(&self.created_at)?,
      user_id:     UserId::new(self.user_id),
      name:        self.name,
      description: self.description,
      urls:        decode_urls(&self.urls)?,
    })
  }
}

pub const DOCUMENT_COLUMNS: &str =
  "document_id, created_at, user_id, kind, storage_id, file_name, file_size, content";

/// Raw values read directly from a `documents` row.
pub struct RawDocument {
  pub document_id: String,
  pub created_at:  String,
  pub user_id:     String,
  pub kind:        String,
  pub storage_id:  Option<String>,
  pub file_name:   Option<String>,
  pub file_size:   Option<i64>,
  pub content:     Option<String>,
}

impl RawDocument {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      document_id: row.get(0)?,
      created_at:  row.get(1)?,
      user_id:     row.get(2)?,
      kind:        row.get(3)?,
      storage_id:  row.get(4)?,
      file_name:   row.get(5)?,
      file_size:   row.get(6)?,
      content:     row.get(7)?,
    })
  }

  pub fn into_document(self) -> Result<Document> {
    let body = match self.kind.as_str() {
      "file" => DocumentBody::File {
        storage_id: self.storage_id.unwrap_or_default(),
        file_name:  self.file_name.unwrap_or_default(),
        file_size:  self.file_size.unwrap_or(0).max(0) as u64,
      },
      "text" => DocumentBody::Text {
        content: self.content.unwrap_or_default(),
      },
      other => {
        return Err(Error::Core(glean_core::Error::UnknownVariant {
          kind:  "document kind",
          value: other.to_owned(),
        }));
      }
    };

    Ok(Document {
      document_id: decode_uuid(&self.document_id)?,
      created_at: decode_dt(&self.created_at)?,
      user_id: UserId::new(self.user_id),
      body,
    })
  }
}

pub const COMPETITOR_COLUMNS: &str =
  "competitor_id, created_at, user_id, name, scan_frequency, last_scanned_on";

/// Raw strings read directly from a `competitors` row.
pub struct RawCompetitor {
  pub competitor_id:   String,
  pub created_at:      String,
  pub user_id:         String,
  pub name:            String,
  pub scan_frequency:  String,
  pub last_scanned_on: Option<String>,
}

impl RawCompetitor {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      competitor_id:   row.get(0)?,
      created_at:      row.get(1)?,
      user_id:         row.get(2)?,
      name:            row.get(3)?,
      scan_frequency:  row.get(4)?,
      last_scanned_on: row.get(5)?,
    })
  }

  pub fn into_competitor(self) -> Result<Competitor> {
    Ok(Competitor {
      competitor_id:   decode_uuid(&self.competitor_id)?,
      created_at:      decode_dt(&self.created_at)?,
      user_id:         UserId::new(self.user_id),
      name:            self.name,
      scan_frequency:  decode_enum::<ScanFrequency>("scan frequency", &self.scan_frequency)?,
      last_scanned_on: self.last_scanned_on.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// Raw strings read directly from a `competitor_analyses` row.
pub struct RawAnalysis {
  pub analysis_id:   String,
  pub created_at:    String,
  pub competitor_id: String,
  pub analysis:      String,
}

impl RawAnalysis {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      analysis_id:   row.get(0)?,
      created_at:    row.get(1)?,
      competitor_id: row.get(2)?,
      analysis:      row.get(3)?,
    })
  }

  pub fn into_analysis(self) -> Result<CompetitorAnalysis> {
    Ok(CompetitorAnalysis {
      analysis_id:   decode_uuid(&self.analysis_id)?,
      created_at:    decode_dt(&self.created_at)?,
      competitor_id: decode_uuid(&self.competitor_id)?,
      analysis:      self.analysis,
    })
  }
}

/// Raw values read directly from a `usage` row.
pub struct RawUsage {
  pub user_id:          String,
  pub month:            String,
  pub summary_count:    i64,
  pub competitor_count: i64,
}

impl RawUsage {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:          row.get(0)?,
      month:            row.get(1)?,
      summary_count:    row.get(2)?,
      competitor_count: row.get(3)?,
    })
  }

  pub fn into_usage(self) -> Result<Usage> {
    Ok(Usage {
      user_id:          UserId::new(self.user_id),
      month:            self.month.parse()?,
      summary_count:    u32::try_from(self.summary_count).unwrap_or(u32::MAX),
      competitor_count: u32::try_from(self.competitor_count).unwrap_or(u32::MAX),
    })
  }
}

/// Raw strings read directly from a `user_settings` row.
pub struct RawSettings {
  pub user_id:       String,
  pub system_prompt: Option<String>,
  pub updated_at:    String,
}

impl RawSettings {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      system_prompt: row.get(1)?,
      updated_at:    row.get(2)?,
    })
  }

  pub fn into_settings(self) -> Result<UserSettings> {
    Ok(UserSettings {
      user_id:       UserId::new(self.user_id),
      system_prompt: self.system_prompt,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn like_pattern_escapes_wildcards() {
    assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    assert_eq!(like_pattern("plain"), "%plain%");
  }

  #[test]
  fn timestamps_are_fixed_width() {
    let a = decode_dt("2026-10-19T08:00:00Z").unwrap();
    let b = decode_dt("2026-10-19T08:00:00.5Z").unwrap();
    let (ea, eb) = (encode_dt(a), encode_dt(b));
    assert_eq!(ea.len(), eb.len());
    assert!(ea < eb);
    assert_eq!(decode_dt(&eb).unwrap(), b);
  }
}
