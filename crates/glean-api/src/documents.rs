//! Handlers for `/documents` endpoints: the document library.
//!
//! File bytes live in external blob storage; this API only records the
//! reference the upload produced.

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use glean_core::{
  library::{Document, DocumentBody},
  store::GleanStore,
};
use serde::Deserialize;

use crate::{AppState, auth::CurrentUser, error::ApiError};

#[derive(Debug, Deserialize, Default)]
pub struct SearchParams {
  /// Matched against text content and file names.
  pub q: Option<String>,
}

/// `GET /documents[?q=<term>]`
pub async fn search<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Document>>, ApiError>
where
  S: GleanStore + 'static,
{
  let docs = state
    .store
    .search_documents(&user, params.q.as_deref())
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(docs))
}

#[derive(Debug, Deserialize)]
pub struct TextBody {
  pub content: String,
}

/// `POST /documents` — body: `{"content":"…"}`
pub async fn create_text<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Json(body): Json<TextBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GleanStore + 'static,
{
  if body.content.trim().is_empty() {
    return Err(ApiError::BadRequest("content must not be empty".into()));
  }
  let doc = state
    .store
    .add_document(&user, DocumentBody::Text { content: body.content })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(doc)))
}

#[derive(Debug, Deserialize)]
pub struct FileBody {
  pub storage_id: String,
  pub file_name:  String,
  pub file_size:  u64,
}

/// `POST /documents/files` — body: `{"storage_id":…,"file_name":…,"file_size":…}`
pub async fn register_file<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Json(body): Json<FileBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GleanStore + 'static,
{
  if body.storage_id.trim().is_empty() || body.file_name.trim().is_empty() {
    return Err(ApiError::BadRequest("storage_id and file_name are required".into()));
  }
  let doc = state
    .store
    .add_document(
      &user,
      DocumentBody::File {
        storage_id: body.storage_id,
        file_name:  body.file_name,
        file_size:  body.file_size,
      },
    )
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(doc)))
}
