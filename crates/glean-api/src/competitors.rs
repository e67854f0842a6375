//! Handlers for `/competitors` endpoints.
//!
//! Creating a competitor is where the tracked-competitor cap for free
//! accounts is enforced.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use glean_core::{
  competitor::{Competitor, CompetitorAnalysis, CompetitorFields},
  quota::{self, Limits},
  store::GleanStore,
};
use uuid::Uuid;

use crate::{AppState, auth::CurrentUser, error::ApiError};

fn clean(fields: CompetitorFields) -> Result<CompetitorFields, ApiError> {
  let name = fields.name.trim().to_owned();
  if name.is_empty() {
    return Err(ApiError::BadRequest("name must not be empty".into()));
  }
  Ok(CompetitorFields { name, scan_frequency: fields.scan_frequency })
}

/// `GET /competitors`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Competitor>>, ApiError>
where
  S: GleanStore + 'static,
{
  let competitors = state
    .store
    .list_competitors(&user)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(competitors))
}

/// `POST /competitors` — body: `{"name":…,"scan_frequency":"w"|"m"}`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Json(body): Json<CompetitorFields>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GleanStore + 'static,
{
  let fields = clean(body)?;

  let limit = Limits::for_plan(state.directory.plan_of(&user)).tracked_competitors;
  let competitor = state
    .store
    .create_competitor(&user, fields, limit)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| quota::competitors_exhausted(limit.unwrap_or_default()))?;
  tracing::info!(competitor_id = %competitor.competitor_id, user = %user, "competitor added");
  Ok((StatusCode::CREATED, Json(competitor)))
}

/// `GET /competitors/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Competitor>, ApiError>
where
  S: GleanStore + 'static,
{
  let competitor = state
    .store
    .get_competitor(&user, id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or(ApiError::NotFound)?;
  Ok(Json(competitor))
}

/// `PUT /competitors/{id}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
  Json(body): Json<CompetitorFields>,
) -> Result<Json<Competitor>, ApiError>
where
  S: GleanStore + 'static,
{
  let competitor = state
    .store
    .update_competitor(&user, id, clean(body)?)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or(ApiError::NotFound)?;
  Ok(Json(competitor))
}

/// `DELETE /competitors/{id}` — past analyses are kept.
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: GleanStore + 'static,
{
  let deleted = state
    .store
    .delete_competitor(&user, id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if !deleted {
    return Err(ApiError::NotFound);
  }
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /competitors/{id}/analyses` — newest first.
pub async fn analyses<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<CompetitorAnalysis>>, ApiError>
where
  S: GleanStore + 'static,
{
  let analyses = state
    .store
    .list_analyses(&user, id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or(ApiError::NotFound)?;
  Ok(Json(analyses))
}
