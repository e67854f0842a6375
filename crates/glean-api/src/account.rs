//! Per-account endpoints: usage, settings and the model catalog.

use axum::{Json, extract::State};
use glean_core::{
  account::{Plan, UserSettings},
  quota::Limits,
  store::GleanStore,
  usage::MonthKey,
};
use glean_pipeline::ModelCatalog;
use serde::{Deserialize, Serialize};

use crate::{AppState, auth::CurrentUser, error::ApiError};

// ─── Usage ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct UsageReport {
  pub plan:             Plan,
  pub month:            MonthKey,
  pub summary_count:    u32,
  pub competitor_count: u32,
  pub limits:           Limits,
}

/// `GET /usage` — current-month counters; a month with no activity reads as
/// zero.
pub async fn usage<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
) -> Result<Json<UsageReport>, ApiError>
where
  S: GleanStore + 'static,
{
  let month = MonthKey::current();
  let plan = state.directory.plan_of(&user);
  let usage = state
    .store
    .usage(&user, month)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  Ok(Json(UsageReport {
    plan,
    month,
    summary_count: usage.as_ref().map_or(0, |u| u.summary_count),
    competitor_count: usage.as_ref().map_or(0, |u| u.competitor_count),
    limits: Limits::for_plan(plan),
  }))
}

// ─── Settings ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SettingsView {
  pub system_prompt: Option<String>,
}

/// `GET /settings`
pub async fn get_settings<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
) -> Result<Json<SettingsView>, ApiError>
where
  S: GleanStore + 'static,
{
  let settings = state
    .store
    .settings(&user)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(SettingsView {
    system_prompt: settings.and_then(|s| s.system_prompt),
  }))
}

#[derive(Debug, Deserialize)]
pub struct SettingsBody {
  pub system_prompt: Option<String>,
}

/// `PUT /settings` — body: `{"system_prompt":"…"}`; blank or null clears it.
pub async fn put_settings<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Json(body): Json<SettingsBody>,
) -> Result<Json<UserSettings>, ApiError>
where
  S: GleanStore + 'static,
{
  let prompt = body.system_prompt.filter(|p| !p.trim().is_empty());
  let settings = state
    .store
    .upsert_settings(&user, prompt)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(settings))
}

// ─── Models ──────────────────────────────────────────────────────────────────

/// `GET /models`
pub async fn models<S>(
  State(state): State<AppState<S>>,
  CurrentUser(_user): CurrentUser,
) -> Json<ModelCatalog>
where
  S: GleanStore + 'static,
{
  Json(ModelCatalog::clone(&state.catalog))
}
