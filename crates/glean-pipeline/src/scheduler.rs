//! Scheduled competitor scans.
//!
//! A scan loads every competitor at the requested cadence, splits them into
//! a premium cohort and a free cohort by the owner's plan, and runs the
//! premium cohort to completion before the free cohort starts. Within a
//! cohort, scans run concurrently up to a fixed limit.

use std::{collections::HashMap, ops::AddAssign, sync::Arc};

use chrono::{DateTime, Utc};
use glean_core::{
  account::{Plan, UserId},
  collab::{Billing, LanguageModel, TextRequest},
  competitor::{Competitor, ScanFrequency},
  store::GleanStore,
  usage::MonthKey,
};
use serde::Serialize;
use tokio::{sync::Semaphore, task::JoinSet};
use tracing::{debug, error, info, warn};

use crate::{Error, Result, prompt};

/// Scans running at once within one cohort unless configured otherwise.
pub const DEFAULT_SCAN_CONCURRENCY: usize = 4;

/// Outcome counts for one scan run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
  pub scanned: usize,
  pub failed:  usize,
}

impl AddAssign for ScanReport {
  fn add_assign(&mut self, rhs: Self) {
    self.scanned += rhs.scanned;
    self.failed += rhs.failed;
  }
}

pub struct Scheduler<S, B, L> {
  store:       Arc<S>,
  billing:     Arc<B>,
  llm:         Arc<L>,
  model:       String,
  concurrency: usize,
}

impl<S, B, L> Clone for Scheduler<S, B, L> {
  fn clone(&self) -> Self {
    Self {
      store:       Arc::clone(&self.store),
      billing:     Arc::clone(&self.billing),
      llm:         Arc::clone(&self.llm),
      model:       self.model.clone(),
      concurrency: self.concurrency,
    }
  }
}

impl<S, B, L> Scheduler<S, B, L>
where
  S: GleanStore + 'static,
  B: Billing + 'static,
  L: LanguageModel + 'static,
{
  pub fn new(store: Arc<S>, billing: Arc<B>, llm: Arc<L>, model: impl Into<String>) -> Self {
    Self {
      store,
      billing,
      llm,
      model: model.into(),
      concurrency: DEFAULT_SCAN_CONCURRENCY,
    }
  }

  pub fn with_concurrency(mut self, concurrency: usize) -> Self {
    self.concurrency = concurrency.max(1);
    self
  }

  /// Scan every competitor at `frequency`. `triggered_at` becomes each
  /// scanned competitor's `last_scanned_on`.
  ///
  /// Only loading the competitors or the account list can fail the run;
  /// individual scan failures are counted in the report.
  pub async fn scan(
    &self,
    frequency: ScanFrequency,
    triggered_at: DateTime<Utc>,
  ) -> Result<ScanReport> {
    let due = self
      .store
      .competitors_due(frequency)
      .await
      .map_err(|e| Error::Store(Box::new(e)))?;
    if due.is_empty() {
      info!(frequency = frequency.as_ref(), "no competitors due for scan");
      return Ok(ScanReport::default());
    }

    let plans: HashMap<UserId, Plan> = self
      .billing
      .accounts()
      .await
      .map_err(|e| Error::Billing(Box::new(e)))?
      .into_iter()
      .map(|a| (a.user_id, a.plan))
      .collect();

    let (premium, free): (Vec<_>, Vec<_>) = due.into_iter().partition(|c| {
      plans.get(&c.user_id).copied().unwrap_or_default().is_premium()
    });
    info!(
      frequency = frequency.as_ref(),
      premium = premium.len(),
      free = free.len(),
      "competitor scan started"
    );

    let mut report = self.run_cohort(premium, triggered_at).await;
    report += self.run_cohort(free, triggered_at).await;

    info!(
      frequency = frequency.as_ref(),
      scanned = report.scanned,
      failed = report.failed,
      "competitor scan finished"
    );
    Ok(report)
  }

  async fn run_cohort(
    &self,
    cohort: Vec<Competitor>,
    triggered_at: DateTime<Utc>,
  ) -> ScanReport {
    let semaphore = Arc::new(Semaphore::new(self.concurrency));
    let mut tasks = JoinSet::new();

    for competitor in cohort {
      let this = self.clone();
      let semaphore = Arc::clone(&semaphore);
      tasks.spawn(async move {
        let _permit = semaphore.acquire_owned().await.ok();
        let competitor_id = competitor.competitor_id;
        (competitor_id, this.scan_one(competitor, triggered_at).await)
      });
    }

    let mut report = ScanReport::default();
    while let Some(joined) = tasks.join_next().await {
      match joined {
        Ok((_, Ok(()))) => report.scanned += 1,
        Ok((competitor_id, Err(e))) => {
          warn!(%competitor_id, error = %e, "competitor scan failed");
          report.failed += 1;
        }
        Err(e) => {
          error!(error = %e, "competitor scan task panicked");
          report.failed += 1;
        }
      }
    }
    report
  }

  async fn scan_one(&self, competitor: Competitor, triggered_at: DateTime<Utc>) -> Result<()> {
    let settings = self
      .store
      .settings(&competitor.user_id)
      .await
      .map_err(|e| Error::Store(Box::new(e)))?;

    let analysis = self
      .llm
      .generate_text(TextRequest {
        model:      self.model.clone(),
        system:     prompt::system_prompt(settings.as_ref()),
        prompt:     prompt::competitor_prompt(&competitor.name, competitor.last_scanned_on),
        web_search: true,
      })
      .await
      .map_err(|e| Error::Llm(Box::new(e)))?;

    let record = self
      .store
      .append_analysis(competitor.competitor_id, analysis)
      .await
      .map_err(|e| Error::Store(Box::new(e)))?;
    self
      .store
      .mark_scanned(competitor.competitor_id, triggered_at)
      .await
      .map_err(|e| Error::Store(Box::new(e)))?;
    self
      .store
      .record_analysis(&competitor.user_id, MonthKey::of(triggered_at))
      .await
      .map_err(|e| Error::Store(Box::new(e)))?;

    debug!(
      competitor_id = %competitor.competitor_id,
      analysis_id = %record.analysis_id,
      "competitor scanned"
    );
    Ok(())
  }
}
