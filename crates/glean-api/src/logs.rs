//! Handlers for `/logs` endpoints: submission, search and polling.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/logs` | `?text=&status=&sentiment=&limit=&offset=`, newest first |
//! | `POST` | `/logs` | Body: `{"urls":[…],"bundle_id":…,"title":…,"instructions":…,"model":…}` |
//! | `GET`  | `/logs/{id}` | 404 if not found or not owned |
//! | `GET`  | `/logs/{id}/wait` | Long poll: `?timeout_secs=` (default 25, max 60) |

use std::time::Duration;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use glean_core::{
  log::{LogQuery, LogStatus, Sentiment},
  store::GleanStore,
  view::ScrapeLogView,
};
use glean_pipeline::{SubmitRequest, submit_summary};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, auth::CurrentUser, error::ApiError};

/// Largest page a single search returns.
pub const MAX_PAGE: usize = 100;

pub const DEFAULT_WAIT_SECS: u64 = 25;
pub const MAX_WAIT_SECS: u64 = 60;

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  pub text:      Option<String>,
  pub status:    Option<LogStatus>,
  pub sentiment: Option<Sentiment>,
  pub limit:     Option<usize>,
  pub offset:    Option<usize>,
}

/// `GET /logs`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<ScrapeLogView>>, ApiError>
where
  S: GleanStore + 'static,
{
  let query = LogQuery {
    text:      params.text,
    status:    params.status,
    sentiment: params.sentiment,
    limit:     Some(params.limit.unwrap_or(MAX_PAGE).min(MAX_PAGE)),
    offset:    params.offset,
  };
  let logs = state
    .store
    .search_logs(&user, &query)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(logs.into_iter().map(ScrapeLogView::from).collect()))
}

// ─── Submit ──────────────────────────────────────────────────────────────────

/// `POST /logs` — returns the new log immediately, still `processing`.
pub async fn submit<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Json(body): Json<SubmitRequest>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GleanStore + 'static,
{
  let log = submit_summary(
    &*state.store,
    &*state.directory,
    &state.queue,
    &state.catalog,
    &user,
    body,
  )
  .await?;
  Ok((StatusCode::CREATED, Json(ScrapeLogView::from(log))))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /logs/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<ScrapeLogView>, ApiError>
where
  S: GleanStore + 'static,
{
  Ok(Json(load_view(&state, &user, id).await?))
}

// ─── Long poll ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct WaitParams {
  pub timeout_secs: Option<u64>,
}

/// `GET /logs/{id}/wait` — answers as soon as the log is terminal, or with
/// its current state once the timeout passes.
pub async fn wait<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
  Query(params): Query<WaitParams>,
) -> Result<Json<ScrapeLogView>, ApiError>
where
  S: GleanStore + 'static,
{
  let timeout = Duration::from_secs(
    params.timeout_secs.unwrap_or(DEFAULT_WAIT_SECS).min(MAX_WAIT_SECS),
  );

  let mut subscription = state.events.subscribe();
  let view = load_view(&state, &user, id).await?;
  if !view.pending {
    return Ok(Json(view));
  }

  if !subscription.changed(id, timeout).await {
    return Ok(Json(view));
  }
  Ok(Json(load_view(&state, &user, id).await?))
}

async fn load_view<S>(
  state: &AppState<S>,
  user: &glean_core::account::UserId,
  id: Uuid,
) -> Result<ScrapeLogView, ApiError>
where
  S: GleanStore + 'static,
{
  let log = state
    .store
    .get_log(user, id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or(ApiError::NotFound)?;
  Ok(log.into())
}
