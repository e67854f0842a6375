//! Handlers for `/sources` endpoints: saved URL bundles.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/sources` | Newest first |
//! | `POST`   | `/sources` | Body: `{"name":…,"description":…,"urls":[…]}` |
//! | `GET`    | `/sources/{id}` | |
//! | `PUT`    | `/sources/{id}` | Replaces all fields |
//! | `DELETE` | `/sources/{id}` | 204 |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use glean_core::{
  library::{BundleFields, SourceBundle},
  log::MAX_URLS,
  store::GleanStore,
};
use uuid::Uuid;

use crate::{AppState, auth::CurrentUser, error::ApiError};

/// Trim the name and URLs, drop blank and repeated URLs.
fn clean(fields: BundleFields) -> Result<BundleFields, ApiError> {
  let name = fields.name.trim().to_owned();
  if name.is_empty() {
    return Err(ApiError::BadRequest("name must not be empty".into()));
  }

  let mut urls: Vec<String> = Vec::new();
  for url in fields.urls.iter().map(|u| u.trim()).filter(|u| !u.is_empty()) {
    if !urls.iter().any(|u| u == url) {
      urls.push(url.to_owned());
    }
  }
  if urls.len() > MAX_URLS {
    return Err(ApiError::BadRequest(format!(
      "a bundle holds at most {MAX_URLS} urls, got {}",
      urls.len()
    )));
  }

  Ok(BundleFields {
    name,
    description: fields.description.filter(|d| !d.trim().is_empty()),
    urls,
  })
}

/// `GET /sources`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<SourceBundle>>, ApiError>
where
  S: GleanStore + 'static,
{
  let bundles = state
    .store
    .list_bundles(&user)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(bundles))
}

/// `POST /sources`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Json(body): Json<BundleFields>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GleanStore + 'static,
{
  let bundle = state
    .store
    .create_bundle(&user, clean(body)?)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(bundle)))
}

/// `GET /sources/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<SourceBundle>, ApiError>
where
  S: GleanStore + 'static,
{
  let bundle = state
    .store
    .get_bundle(&user, id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or(ApiError::NotFound)?;
  Ok(Json(bundle))
}

/// `PUT /sources/{id}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
  Json(body): Json<BundleFields>,
) -> Result<Json<SourceBundle>, ApiError>
where
  S: GleanStore + 'static,
{
  let bundle = state
    .store
    .update_bundle(&user, id, clean(body)?)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or(ApiError::NotFound)?;
  Ok(Json(bundle))
}

/// `DELETE /sources/{id}`
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
    .delete_bundle(&user, id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if !deleted {
    return Err(ApiError::NotFound);
  }
  Ok(StatusCode::NO_CONTENT)
}
