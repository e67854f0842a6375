//! The submission entry point: validate, account, persist, enqueue.

use glean_core::{
  Error as CoreError,
  account::UserId,
  collab::Billing,
  log::{NewScrapeLog, ScrapeLog, normalize_urls},
  quota::{self, Limits},
  store::GleanStore,
  usage::MonthKey,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  Error, Result,
  catalog::ModelCatalog,
  queue::{JobQueue, SummarizeJob},
};

/// A summary request as submitted by a client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitRequest {
  #[serde(default)]
  pub urls:         Vec<String>,
  /// Saved bundle whose URLs are placed before `urls`.
  pub bundle_id:    Option<Uuid>,
  pub title:        Option<String>,
  pub instructions: Option<String>,
  pub model:        Option<String>,
}

/// Accept a summary request for `user` and hand it to the worker.
///
/// Input is validated before any usage is recorded, so a rejected request
/// never consumes quota. Free accounts are counted here, at request time,
/// not when the job completes; the store checks the cap in the same
/// statement that counts the request. Returns the new log in `processing` state
/// without waiting for the job.
pub async fn submit_summary<S, B>(
  store: &S,
  billing: &B,
  queue: &JobQueue,
  catalog: &ModelCatalog,
  user: &UserId,
  request: SubmitRequest,
) -> Result<ScrapeLog>
where
  S: GleanStore,
  B: Billing,
{
  let plan = billing
    .plan(user)
    .await
    .map_err(|e| Error::Billing(Box::new(e)))?;

  let mut urls = Vec::new();
  if let Some(bundle_id) = request.bundle_id {
    let bundle = store
      .get_bundle(user, bundle_id)
      .await
      .map_err(|e| Error::Store(Box::new(e)))?
      .ok_or(CoreError::NotFoundOrDenied)?;
    urls.extend(bundle.urls);
  }
  urls.extend(request.urls);
  let urls = normalize_urls(urls)?;

  let model = catalog.resolve(plan, request.model.as_deref())?;

  if let Some(limit) = Limits::for_plan(plan).summaries_per_month {
    store
      .record_summary(user, MonthKey::current(), Some(limit))
      .await
      .map_err(|e| Error::Store(Box::new(e)))?
      .ok_or_else(|| quota::summaries_exhausted(limit))?;
  }

  let title = request
    .title
    .map(|t| t.trim().to_owned())
    .filter(|t| !t.is_empty());

  let log = store
    .insert_log(NewScrapeLog {
      user_id: user.clone(),
      title,
      urls: urls.clone(),
      model: Some(model.clone()),
    })
    .await
    .map_err(|e| Error::Store(Box::new(e)))?;

  let queued = queue.enqueue(SummarizeJob {
    log_id: log.log_id,
    user_id: user.clone(),
    urls,
    instructions: request.instructions,
    model,
  });
  if let Err(e) = queued {
    // No worker will ever pick this log up.
    store
      .fail_log(log.log_id)
      .await
      .map_err(|e| Error::Store(Box::new(e)))?;
    tracing::error!(log_id = %log.log_id, error = %e, "summary could not be queued");
    return Err(e);
  }

  tracing::info!(
    log_id = %log.log_id,
    user = %user,
    urls = log.urls.len(),
    plan = plan.as_ref(),
    "summary submitted"
  );
  Ok(log)
}
