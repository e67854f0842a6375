//! The `GleanStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `glean-store-sqlite`).
//! The pipeline and the API depend on this abstraction, not on any concrete
//! backend.
//!
//! Every per-user read and write takes the owning [`UserId`] explicitly and
//! is filtered by it. A row owned by another user is reported exactly like a
//! missing row (`None` / `false`), so callers cannot learn whether another
//! user's row exists.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  account::{UserId, UserSettings},
  competitor::{Competitor, CompetitorAnalysis, CompetitorFields, ScanFrequency},
  library::{BundleFields, Document, DocumentBody, SourceBundle},
  log::{LogQuery, NewScrapeLog, ScrapeLog, StructuredInsights},
  usage::{MonthKey, Usage},
};

/// Abstraction over a Glean storage backend.
///
/// Every mutation is atomic on its own; no operation spans more than one
/// logical row except the upserts, which are single statements. Capped
/// writes check the cap and write in that same statement.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait GleanStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Scrape logs ───────────────────────────────────────────────────────

  /// Persist a new log in the `processing` state.
  fn insert_log(
    &self,
    input: NewScrapeLog,
  ) -> impl Future<Output = Result<ScrapeLog, Self::Error>> + Send + '_;

  fn get_log<'a>(
    &'a self,
    user: &'a UserId,
    log_id: Uuid,
  ) -> impl Future<Output = Result<Option<ScrapeLog>, Self::Error>> + Send + 'a;

  /// The user's logs matching `query`, newest first.
  fn search_logs<'a>(
    &'a self,
    user: &'a UserId,
    query: &'a LogQuery,
  ) -> impl Future<Output = Result<Vec<ScrapeLog>, Self::Error>> + Send + 'a;

  /// Move a `processing` log to `completed` with its content.
  ///
  /// Returns `false` (and changes nothing) if the log is missing or already
  /// terminal.
  fn complete_log(
    &self,
    log_id: Uuid,
    markdown: String,
    insights: StructuredInsights,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Move a `processing` log to `failed`. Same return contract as
  /// [`GleanStore::complete_log`].
  fn fail_log(
    &self,
    log_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Every log, across all users, still in `processing`.
  fn processing_logs(
    &self,
  ) -> impl Future<Output = Result<Vec<ScrapeLog>, Self::Error>> + Send + '_;

  // ── URL bundles ───────────────────────────────────────────────────────

  fn create_bundle<'a>(
    &'a self,
    user: &'a UserId,
    fields: BundleFields,
  ) -> impl Future<Output = Result<SourceBundle, Self::Error>> + Send + 'a;

  fn get_bundle<'a>(
    &'a self,
    user: &'a UserId,
    bundle_id: Uuid,
  ) -> impl Future<Output = Result<Option<SourceBundle>, Self::Error>> + Send + 'a;

  /// The user's bundles, newest first.
  fn list_bundles<'a>(
    &'a self,
    user: &'a UserId,
  ) -> impl Future<Output = Result<Vec<SourceBundle>, Self::Error>> + Send + 'a;

  /// Replace the editable fields. `None` if not found or not owned.
  fn update_bundle<'a>(
    &'a self,
    user: &'a UserId,
    bundle_id: Uuid,
    fields: BundleFields,
  ) -> impl Future<Output = Result<Option<SourceBundle>, Self::Error>> + Send + 'a;

  /// `false` if not found or not owned.
  fn delete_bundle<'a>(
    &'a self,
    user: &'a UserId,
    bundle_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── Documents ─────────────────────────────────────────────────────────

  fn add_document<'a>(
    &'a self,
    user: &'a UserId,
    body: DocumentBody,
  ) -> impl Future<Output = Result<Document, Self::Error>> + Send + 'a;

  /// All of the user's documents, or those whose text or file name contains
  /// `term` (case-insensitive) when a non-empty term is given.
  fn search_documents<'a>(
    &'a self,
    user: &'a UserId,
    term: Option<&'a str>,
  ) -> impl Future<Output = Result<Vec<Document>, Self::Error>> + Send + 'a;

  // ── Competitors ───────────────────────────────────────────────────────

  /// Insert a competitor unless the user already tracks `limit` of them.
  /// Returns `None` when the cap is reached; `limit: None` means no cap.
  fn create_competitor<'a>(
    &'a self,
    user: &'a UserId,
    fields: CompetitorFields,
    limit: Option<usize>,
  ) -> impl Future<Output = Result<Option<Competitor>, Self::Error>> + Send + 'a;

  fn get_competitor<'a>(
    &'a self,
    user: &'a UserId,
    competitor_id: Uuid,
  ) -> impl Future<Output = Result<Option<Competitor>, Self::Error>> + Send + 'a;

  /// The user's competitors, newest first.
  fn list_competitors<'a>(
    &'a self,
    user: &'a UserId,
  ) -> impl Future<Output = Result<Vec<Competitor>, Self::Error>> + Send + 'a;

  fn update_competitor<'a>(
    &'a self,
    user: &'a UserId,
    competitor_id: Uuid,
    fields: CompetitorFields,
  ) -> impl Future<Output = Result<Option<Competitor>, Self::Error>> + Send + 'a;

  /// Analyses already recorded for the competitor are kept.
  fn delete_competitor<'a>(
    &'a self,
    user: &'a UserId,
    competitor_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Every competitor, across all users, scanned at `frequency`.
  fn competitors_due(
    &self,
    frequency: ScanFrequency,
  ) -> impl Future<Output = Result<Vec<Competitor>, Self::Error>> + Send + '_;

  fn mark_scanned(
    &self,
    competitor_id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn append_analysis(
    &self,
    competitor_id: Uuid,
    analysis: String,
  ) -> impl Future<Output = Result<CompetitorAnalysis, Self::Error>> + Send + '_;

  /// Analyses for one of the user's competitors, newest first. `None` if the
  /// competitor is not found or not owned.
  fn list_analyses<'a>(
    &'a self,
    user: &'a UserId,
    competitor_id: Uuid,
  ) -> impl Future<Output = Result<Option<Vec<CompetitorAnalysis>>, Self::Error>>
  + Send
  + 'a;

  // ── Usage ledger ──────────────────────────────────────────────────────

  fn usage<'a>(
    &'a self,
    user: &'a UserId,
    month: MonthKey,
  ) -> impl Future<Output = Result<Option<Usage>, Self::Error>> + Send + 'a;

  /// Increment the month's summary counter, creating the row if needed.
  /// Returns `None`, changing nothing, if the counter is already at
  /// `limit`; `limit: None` means no cap.
  fn record_summary<'a>(
    &'a self,
    user: &'a UserId,
    month: MonthKey,
    limit: Option<u32>,
  ) -> impl Future<Output = Result<Option<Usage>, Self::Error>> + Send + 'a;

  /// Increment the month's competitor-analysis counter, creating the row if
  /// needed.
  fn record_analysis<'a>(
    &'a self,
    user: &'a UserId,
    month: MonthKey,
  ) -> impl Future<Output = Result<Usage, Self::Error>> + Send + 'a;

  // ── Settings ──────────────────────────────────────────────────────────

  fn settings<'a>(
    &'a self,
    user: &'a UserId,
  ) -> impl Future<Output = Result<Option<UserSettings>, Self::Error>> + Send + 'a;

  fn upsert_settings<'a>(
    &'a self,
    user: &'a UserId,
    system_prompt: Option<String>,
  ) -> impl Future<Output = Result<UserSettings, Self::Error>> + Send + 'a;
}
