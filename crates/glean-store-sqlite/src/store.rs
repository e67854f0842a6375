//! [`SqliteStore`] — the SQLite implementation of [`GleanStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use glean_core::{
  account::{UserId, UserSettings},
  competitor::{Competitor, CompetitorAnalysis, CompetitorFields, ScanFrequency},
  library::{BundleFields, Document, DocumentBody, SourceBundle},
  log::{LogQuery, LogStatus, NewScrapeLog, ScrapeLog, StructuredInsights},
  store::GleanStore,
  usage::{MonthKey, Usage},
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    BUNDLE_COLUMNS, COMPETITOR_COLUMNS, DOCUMENT_COLUMNS, LOG_COLUMNS, RawAnalysis, RawBundle,
    RawCompetitor, RawDocument, RawLog, RawSettings, RawUsage, encode_dt, encode_insights,
    encode_urls, encode_uuid, like_pattern,
  },
  schema::{SCHEMA, SCHEMA_VERSION},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Glean store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    let found: i64 = self
      .conn
      .call(|conn| {
        let version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
        if version <= SCHEMA_VERSION {
          conn.execute_batch(SCHEMA)?;
        }
        Ok(version)
      })
      .await?;

    if found > SCHEMA_VERSION {
      return Err(Error::SchemaTooNew { found, supported: SCHEMA_VERSION });
    }
    tracing::debug!(version = SCHEMA_VERSION, "sqlite schema ready");
    Ok(())
  }

  /// Apply a guarded status transition. Only rows still in `processing` are
  /// touched.
  async fn transition_log(
    &self,
    log_id: Uuid,
    status: LogStatus,
    markdown: Option<String>,
    insights: Option<String>,
  ) -> Result<bool> {
    let id_str     = encode_uuid(log_id);
    let status_str = status.as_ref().to_owned();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE scrape_logs
              SET status = ?2, summarized_markdown = ?3, structured_insights = ?4
            WHERE log_id = ?1 AND status = 'processing'",
          rusqlite::params![id_str, status_str, markdown, insights],
        )?)
      })
      .await?;

    Ok(changed == 1)
  }
}

// ─── GleanStore impl ─────────────────────────────────────────────────────────

impl GleanStore for SqliteStore {
  type Error = Error;

  // ── Scrape logs ───────────────────────────────────────────────────────────

  async fn insert_log(&self, input: NewScrapeLog) -> Result<ScrapeLog> {
    let log = ScrapeLog {
      log_id:              Uuid::new_v4(),
      created_at:          Utc::now(),
      title:               input.title,
      user_id:             input.user_id,
      urls:                input.urls,
      status:              LogStatus::Processing,
      model:               input.model,
      summarized_markdown: None,
      structured_insights: None,
    };

    let id_str   = encode_uuid(log.log_id);
    let at_str   = encode_dt(log.created_at);
    let title    = log.title.clone();
    let user_str = log.user_id.as_str().to_owned();
    let urls_str = encode_urls(&log.urls)?;
    let model    = log.model.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO scrape_logs (log_id, created_at, title, user_id, urls, status, model)
           VALUES (?1, ?2, ?3, ?4, ?5, 'processing', ?6)",
          rusqlite::params![id_str, at_str, title, user_str, urls_str, model],
        )?;
        Ok(())
      })
      .await?;

    Ok(log)
  }

  async fn get_log(&self, user: &UserId, log_id: Uuid) -> Result<Option<ScrapeLog>> {
    let id_str   = encode_uuid(log_id);
    let user_str = user.as_str().to_owned();

    let raw: Option<RawLog> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {LOG_COLUMNS} FROM scrape_logs WHERE log_id = ?1 AND user_id = ?2"),
            rusqlite::params![id_str, user_str],
            RawLog::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawLog::into_log).transpose()
  }

  async fn search_logs(&self, user: &UserId, query: &LogQuery) -> Result<Vec<ScrapeLog>> {
    let user_str      = user.as_str().to_owned();
    let text_pattern  = query
      .text
      .as_deref()
      .map(str::trim)
      .filter(|t| !t.is_empty())
      .map(like_pattern);
    let status_str    = query.status.map(|s| s.as_ref().to_owned());
    let sentiment_str = query.sentiment.map(|s| s.as_ref().to_owned());
    let limit_val     = query.limit.unwrap_or(100) as i64;
    let offset_val    = query.offset.unwrap_or(0) as i64;

    let raws: Vec<RawLog> = self
      .conn
      .call(move |conn| {
        // Build WHERE clause dynamically; unused placeholders are bound to NULL.
        let mut conds: Vec<&'static str> = vec!["user_id = ?1"];
        if text_pattern.is_some() {
          conds.push(
            "(title LIKE ?2 ESCAPE '\\' OR summarized_markdown LIKE ?2 ESCAPE '\\')",
          );
        }
        if status_str.is_some() {
          conds.push("status = ?3");
        }
        if sentiment_str.is_some() {
          conds.push("json_extract(structured_insights, '$.sentiment') = ?4");
        }

        let sql = format!(
          "SELECT {LOG_COLUMNS}
             FROM scrape_logs
            WHERE {}
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?5 OFFSET ?6",
          conds.join(" AND ")
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              user_str,
              text_pattern.as_deref(),
              status_str.as_deref(),
              sentiment_str.as_deref(),
              limit_val,
              offset_val,
            ],
            RawLog::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawLog::into_log).collect()
  }

  async fn complete_log(
    &self,
    log_id: Uuid,
    markdown: String,
    insights: StructuredInsights,
  ) -> Result<bool> {
    let insights_str = encode_insights(&insights)?;
    self
      .transition_log(log_id, LogStatus::Completed, Some(markdown), Some(insights_str))
      .await
  }

  async fn fail_log(&self, log_id: Uuid) -> Result<bool> {
    self.transition_log(log_id, LogStatus::Failed, None, None).await
  }

  async fn processing_logs(&self) -> Result<Vec<ScrapeLog>> {
    let raws: Vec<RawLog> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {LOG_COLUMNS} FROM scrape_logs
            WHERE status = 'processing'
            ORDER BY created_at, rowid"
        ))?;
        let rows = stmt
          .query_map([], RawLog::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawLog::into_log).collect()
  }

  // ── URL bundles ───────────────────────────────────────────────────────────

  async fn create_bundle(&self, user: &UserId, fields: BundleFields) -> Result<SourceBundle> {
    let bundle = SourceBundle {
      bundle_id:   Uuid::new_v4(),
      created_at:  Utc::now(),
      user_id:     user.clone(),
      name:        fields.name,
      description: fields.description,
      urls:        fields.urls,
    };

    let id_str      = encode_uuid(bundle.bundle_id);
    let at_str      = encode_dt(bundle.created_at);
    let user_str    = user.as_str().to_owned();
    let name        = bundle.name.clone();
    let description = bundle.description.clone();
    let urls_str    = encode_urls(&bundle.urls)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO source_bundles (bundle_id, created_at, user_id, name, description, urls)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, at_str, user_str, name, description, urls_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(bundle)
  }

  async fn get_bundle(&self, user: &UserId, bundle_id: Uuid) -> Result<Option<SourceBundle>> {
    let id_str   = encode_uuid(bundle_id);
    let user_str = user.as_str().to_owned();

    let raw: Option<RawBundle> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {BUNDLE_COLUMNS} FROM source_bundles WHERE bundle_id = ?1 AND user_id = ?2"
            ),
            rusqlite::params![id_str, user_str],
            RawBundle::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawBundle::into_bundle).transpose()
  }

  async fn list_bundles(&self, user: &UserId) -> Result<Vec<SourceBundle>> {
    let user_str = user.as_str().to_owned();

    let raws: Vec<RawBundle> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {BUNDLE_COLUMNS} FROM source_bundles
            WHERE user_id = ?1
            ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], RawBundle::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawBundle::into_bundle).collect()
  }

  async fn update_bundle(
    &self,
    user: &UserId,
    bundle_id: Uuid,
    fields: BundleFields,
  ) -> Result<Option<SourceBundle>> {
    let id_str   = encode_uuid(bundle_id);
    let user_str = user.as_str().to_owned();
    let urls_str = encode_urls(&fields.urls)?;

    let raw: Option<RawBundle> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "UPDATE source_bundles
                  SET name = ?3, description = ?4, urls = ?5
                WHERE bundle_id = ?1 AND user_id = ?2
                RETURNING {BUNDLE_COLUMNS}"
            ),
            rusqlite::params![id_str, user_str, fields.name, fields.description, urls_str],
            RawBundle::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawBundle::into_bundle).transpose()
  }

  async fn delete_bundle(&self, user: &UserId, bundle_id: Uuid) -> Result<bool> {
    let id_str   = encode_uuid(bundle_id);
    let user_str = user.as_str().to_owned();

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM source_bundles WHERE bundle_id = ?1 AND user_id = ?2",
          rusqlite::params![id_str, user_str],
        )?)
      })
      .await?;

    Ok(deleted == 1)
  }

  // ── Documents ─────────────────────────────────────────────────────────────

  async fn add_document(&self, user: &UserId, body: DocumentBody) -> Result<Document> {
    let document = Document {
      document_id: Uuid::new_v4(),
      created_at:  Utc::now(),
      user_id:     user.clone(),
      body,
    };

    let id_str   = encode_uuid(document.document_id);
    let at_str   = encode_dt(document.created_at);
    let user_str = user.as_str().to_owned();
    let (kind, storage_id, file_name, file_size, content) = match &document.body {
      DocumentBody::File { storage_id, file_name, file_size } => (
        "file",
        Some(storage_id.clone()),
        Some(file_name.clone()),
        Some(i64::try_from(*file_size).unwrap_or(i64::MAX)),
        None,
      ),
      DocumentBody::Text { content } => ("text", None, None, None, Some(content.clone())),
    };

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO documents (
             document_id, created_at, user_id, kind,
             storage_id, file_name, file_size, content
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str, at_str, user_str, kind, storage_id, file_name, file_size, content,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(document)
  }

  async fn search_documents(&self, user: &UserId, term: Option<&str>) -> Result<Vec<Document>> {
    let user_str = user.as_str().to_owned();
    let pattern  = term.map(str::trim).filter(|t| !t.is_empty()).map(like_pattern);

    let raws: Vec<RawDocument> = self
      .conn
      .call(move |conn| {
        let filter = if pattern.is_some() {
          "AND (content LIKE ?2 ESCAPE '\\' OR file_name LIKE ?2 ESCAPE '\\')"
        } else {
          ""
        };
        let mut stmt = conn.prepare(&format!(
          "SELECT {DOCUMENT_COLUMNS} FROM documents
            WHERE user_id = ?1 {filter}
            ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = if let Some(p) = pattern {
          stmt
            .query_map(rusqlite::params![user_str, p], RawDocument::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          stmt
            .query_map(rusqlite::params![user_str], RawDocument::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDocument::into_document).collect()
  }

  // ── Competitors ───────────────────────────────────────────────────────────

  async fn create_competitor(
    &self,
    user: &UserId,
    fields: CompetitorFields,
    limit: Option<usize>,
  ) -> Result<Option<Competitor>> {
    let competitor = Competitor {
      competitor_id:   Uuid::new_v4(),
      created_at:      Utc::now(),
      user_id:         user.clone(),
      name:            fields.name,
      scan_frequency:  fields.scan_frequency,
      last_scanned_on: None,
    };

    let id_str    = encode_uuid(competitor.competitor_id);
    let at_str    = encode_dt(competitor.created_at);
    let user_str  = user.as_str().to_owned();
    let name      = competitor.name.clone();
    let freq_str  = competitor.scan_frequency.as_ref().to_owned();
    let limit_val = limit.map(|l| i64::try_from(l).unwrap_or(i64::MAX));

    // The count and the insert are one statement.
    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT INTO competitors (competitor_id, created_at, user_id, name, scan_frequency)
           SELECT ?1, ?2, ?3, ?4, ?5
            WHERE ?6 IS NULL
               OR (SELECT COUNT(*) FROM competitors WHERE user_id = ?3) < ?6",
          rusqlite::params![id_str, at_str, user_str, name, freq_str, limit_val],
        )?)
      })
      .await?;

    Ok((inserted == 1).then_some(competitor))
  }

  async fn get_competitor(
    &self,
    user: &UserId,
    competitor_id: Uuid,
  ) -> Result<Option<Competitor>> {
    let id_str   = encode_uuid(competitor_id);
    let user_str = user.as_str().to_owned();

    let raw: Option<RawCompetitor> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {COMPETITOR_COLUMNS} FROM competitors
                WHERE competitor_id = ?1 AND user_id = ?2"
            ),
            rusqlite::params![id_str, user_str],
            RawCompetitor::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawCompetitor::into_competitor).transpose()
  }

  async fn list_competitors(&self, user: &UserId) -> Result<Vec<Competitor>> {
    let user_str = user.as_str().to_owned();

    let raws: Vec<RawCompetitor> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {COMPETITOR_COLUMNS} FROM competitors
            WHERE user_id = ?1
            ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], RawCompetitor::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCompetitor::into_competitor).collect()
  }

  async fn update_competitor(
    &self,
    user: &UserId,
    competitor_id: Uuid,
    fields: CompetitorFields,
  ) -> Result<Option<Competitor>> {
    let id_str   = encode_uuid(competitor_id);
    let user_str = user.as_str().to_owned();
    let freq_str = fields.scan_frequency.as_ref().to_owned();

    let raw: Option<RawCompetitor> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "UPDATE competitors
                  SET name = ?3, scan_frequency = ?4
                WHERE competitor_id = ?1 AND user_id = ?2
                RETURNING {COMPETITOR_COLUMNS}"
            ),
            rusqlite::params![id_str, user_str, fields.name, freq_str],
            RawCompetitor::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawCompetitor::into_competitor).transpose()
  }

  async fn delete_competitor(&self, user: &UserId, competitor_id: Uuid) -> Result<bool> {
    let id_str   = encode_uuid(competitor_id);
    let user_str = user.as_str().to_owned();

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM competitors WHERE competitor_id = ?1 AND user_id = ?2",
          rusqlite::params![id_str, user_str],
        )?)
      })
      .await?;

    Ok(deleted == 1)
  }

  async fn competitors_due(&self, frequency: ScanFrequency) -> Result<Vec<Competitor>> {
    let freq_str = frequency.as_ref().to_owned();

    let raws: Vec<RawCompetitor> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {COMPETITOR_COLUMNS} FROM competitors
            WHERE scan_frequency = ?1
            ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![freq_str], RawCompetitor::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCompetitor::into_competitor).collect()
  }

  async fn mark_scanned(&self, competitor_id: Uuid, at: DateTime<Utc>) -> Result<()> {
    let id_str = encode_uuid(competitor_id);
    let at_str = encode_dt(at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE competitors SET last_scanned_on = ?2 WHERE competitor_id = ?1",
          rusqlite::params![id_str, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn append_analysis(
    &self,
    competitor_id: Uuid,
    analysis: String,
  ) -> Result<CompetitorAnalysis> {
    let record = CompetitorAnalysis {
      analysis_id: Uuid::new_v4(),
      created_at: Utc::now(),
      competitor_id,
      analysis,
    };

    let id_str      = encode_uuid(record.analysis_id);
    let at_str      = encode_dt(record.created_at);
    let comp_id_str = encode_uuid(competitor_id);
    let text        = record.analysis.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO competitor_analyses (analysis_id, created_at, competitor_id, analysis)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, at_str, comp_id_str, text],
        )?;
        Ok(())
      })
      .await?;

    Ok(record)
  }

  async fn list_analyses(
    &self,
    user: &UserId,
    competitor_id: Uuid,
  ) -> Result<Option<Vec<CompetitorAnalysis>>> {
    let id_str   = encode_uuid(competitor_id);
    let user_str = user.as_str().to_owned();

    let raws: Option<Vec<RawAnalysis>> = self
      .conn
      .call(move |conn| {
        let owned = conn
          .query_row(
            "SELECT 1 FROM competitors WHERE competitor_id = ?1 AND user_id = ?2",
            rusqlite::params![id_str, user_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        if !owned {
          return Ok(None);
        }

        let mut stmt = conn.prepare(
          "SELECT analysis_id, created_at, competitor_id, analysis
             FROM competitor_analyses
            WHERE competitor_id = ?1
            ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawAnalysis::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Some(rows))
      })
      .await?;

    raws
      .map(|rs| rs.into_iter().map(RawAnalysis::into_analysis).collect())
      .transpose()
  }

  // ── Usage ledger ──────────────────────────────────────────────────────────

  async fn usage(&self, user: &UserId, month: MonthKey) -> Result<Option<Usage>> {
    let user_str  = user.as_str().to_owned();
    let month_str = month.to_string();

    let raw: Option<RawUsage> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT user_id, month, summary_count, competitor_count
               FROM usage WHERE user_id = ?1 AND month = ?2",
            rusqlite::params![user_str, month_str],
            RawUsage::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUsage::into_usage).transpose()
  }

  async fn record_summary(
    &self,
    user: &UserId,
    month: MonthKey,
    limit: Option<u32>,
  ) -> Result<Option<Usage>> {
    let user_str  = user.as_str().to_owned();
    let month_str = month.to_string();
    let limit_val = limit.map(i64::from);

    // Both branches are conditional on the cap, so the check and the
    // increment are one statement. A refused increment returns no row.
    let raw: Option<RawUsage> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "INSERT INTO usage (user_id, month, summary_count, competitor_count)
             SELECT ?1, ?2, 1, 0 WHERE ?3 IS NULL OR ?3 > 0
             ON CONFLICT (user_id, month) DO UPDATE
               SET summary_count = summary_count + 1
               WHERE ?3 IS NULL OR summary_count < ?3
             RETURNING user_id, month, summary_count, competitor_count",
            rusqlite::params![user_str, month_str, limit_val],
            RawUsage::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUsage::into_usage).transpose()
  }

  async fn record_analysis(&self, user: &UserId, month: MonthKey) -> Result<Usage> {
    let user_str  = user.as_str().to_owned();
    let month_str = month.to_string();

    let raw: RawUsage = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "INSERT INTO usage (user_id, month, summary_count, competitor_count)
           VALUES (?1, ?2, 0, 1)
           ON CONFLICT (user_id, month) DO UPDATE SET competitor_count = competitor_count + 1
           RETURNING user_id, month, summary_count, competitor_count",
          rusqlite::params![user_str, month_str],
          RawUsage::from_row,
        )?)
      })
      .await?;

    raw.into_usage()
  }

  // ── Settings ──────────────────────────────────────────────────────────────

  async fn settings(&self, user: &UserId) -> Result<Option<UserSettings>> {
    let user_str = user.as_str().to_owned();

    let raw: Option<RawSettings> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT user_id, system_prompt, updated_at FROM user_settings WHERE user_id = ?1",
            rusqlite::params![user_str],
            RawSettings::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSettings::into_settings).transpose()
  }

  async fn upsert_settings(
    &self,
    user: &UserId,
    system_prompt: Option<String>,
  ) -> Result<UserSettings> {
    let user_str = user.as_str().to_owned();
    let at_str   = encode_dt(Utc::now());

    let raw: RawSettings = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "INSERT INTO user_settings (user_id, system_prompt, updated_at)
           VALUES (?1, ?2, ?3)
           ON CONFLICT (user_id) DO UPDATE
             SET system_prompt = excluded.system_prompt,
                 updated_at    = excluded.updated_at
           RETURNING user_id, system_prompt, updated_at",
          rusqlite::params![user_str, system_prompt, at_str],
          RawSettings::from_row,
        )?)
      })
      .await?;

    raw.into_settings()
  }
}
