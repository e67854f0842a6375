//! JSON HTTP API for Glean.
//!
//! Exposes an axum [`Router`] backed by any [`GleanStore`]. Every route
//! except `/health` resolves the caller through [`auth::CurrentUser`] and
//! passes the resulting user id explicitly to the store and pipeline.
//!
//! # Mounting
//!
//! ```rust,ignore
//! axum::serve(listener, glean_api::app(state)).await?;
//! ```

pub mod account;
pub mod auth;
pub mod competitors;
pub mod documents;
pub mod error;
pub mod logs;
pub mod sources;

use std::sync::Arc;

use axum::{
  Json, Router,
  routing::{get, post},
};
use glean_core::store::GleanStore;
use glean_pipeline::{JobQueue, LogEvents, ModelCatalog};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

pub use auth::{Account, CurrentUser, Directory};
pub use error::ApiError;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:     Arc<S>,
  pub directory: Arc<Directory>,
  pub queue:     JobQueue,
  pub events:    LogEvents,
  pub catalog:   Arc<ModelCatalog>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:     Arc::clone(&self.store),
      directory: Arc::clone(&self.directory),
      queue:     self.queue.clone(),
      events:    self.events.clone(),
      catalog:   Arc::clone(&self.catalog),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the API routes, relative to the `/api` prefix.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: GleanStore + 'static,
{
  Router::new()
    .route("/health", get(health))
    .route("/models", get(account::models::<S>))
    // Logs
    .route("/logs", get(logs::list::<S>).post(logs::submit::<S>))
    .route("/logs/{id}", get(logs::get_one::<S>))
    .route("/logs/{id}/wait", get(logs::wait::<S>))
    // URL bundles
    .route("/sources", get(sources::list::<S>).post(sources::create::<S>))
    .route(
      "/sources/{id}",
      get(sources::get_one::<S>)
        .put(sources::update::<S>)
        .delete(sources::remove::<S>),
    )
    // Document library
    .route("/documents", get(documents::search::<S>).post(documents::create_text::<S>))
    .route("/documents/files", post(documents::register_file::<S>))
    // Competitors
    .route("/competitors", get(competitors::list::<S>).post(competitors::create::<S>))
    .route(
      "/competitors/{id}",
      get(competitors::get_one::<S>)
        .put(competitors::update::<S>)
        .delete(competitors::remove::<S>),
    )
    .route("/competitors/{id}/analyses", get(competitors::analyses::<S>))
    // Account
    .route("/usage", get(account::usage::<S>))
    .route("/settings", get(account::get_settings::<S>).put(account::put_settings::<S>))
    .with_state(state)
}

/// The full application: the API under `/api`, with request tracing.
pub fn app<S>(state: AppState<S>) -> Router<()>
where
  S: GleanStore + 'static,
{
  Router::new()
    .nest("/api", api_router(state))
    .layer(TraceLayer::new_for_http())
}

/// `GET /health`
async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }
