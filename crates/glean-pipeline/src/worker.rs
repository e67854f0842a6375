//! The scrape-and-summarize worker.

use std::sync::Arc;

use glean_core::{
  Error as CoreError,
  collab::{Crawler, LanguageModel, ObjectRequest, TextRequest},
  log::StructuredInsights,
  store::GleanStore,
};
use tracing::{debug, error, info, warn};

use crate::{
  Error, Result,
  events::LogEvents,
  prompt,
  queue::{JobReceiver, SummarizeJob},
};

/// Runs summarize jobs against a store, a crawler and a language model.
pub struct Worker<S, C, L> {
  store:   Arc<S>,
  crawler: Arc<C>,
  llm:     Arc<L>,
  events:  LogEvents,
}

impl<S, C, L> Clone for Worker<S, C, L> {
  fn clone(&self) -> Self {
    Self {
      store:   Arc::clone(&self.store),
      crawler: Arc::clone(&self.crawler),
      llm:     Arc::clone(&self.llm),
      events:  self.events.clone(),
    }
  }
}

impl<S, C, L> Worker<S, C, L>
where
  S: GleanStore + 'static,
  C: Crawler + 'static,
  L: LanguageModel + 'static,
{
  pub fn new(store: Arc<S>, crawler: Arc<C>, llm: Arc<L>, events: LogEvents) -> Self {
    Self { store, crawler, llm, events }
  }

  /// Drain the queue, one task per job, until every sender is dropped.
  pub async fn run(self, mut jobs: JobReceiver) {
    info!("summarize worker started");
    while let Some(job) = jobs.recv().await {
      let worker = self.clone();
      tokio::spawn(async move { worker.process(job).await });
    }
    info!("summarize worker stopped: queue closed");
  }

  /// Fail every log left in `processing` by an earlier run. The queue lives
  /// in memory, so those jobs are gone. Call before accepting submissions.
  pub async fn recover(&self) -> Result<usize> {
    let stale = self
      .store
      .processing_logs()
      .await
      .map_err(|e| Error::Store(Box::new(e)))?;

    let mut failed = 0;
    for log in stale {
      if self
        .store
        .fail_log(log.log_id)
        .await
        .map_err(|e| Error::Store(Box::new(e)))?
      {
        warn!(log_id = %log.log_id, user = %log.user_id, "interrupted summary marked failed");
        self.events.publish(log.log_id);
        failed += 1;
      }
    }
    if failed > 0 {
      info!(failed, "recovered interrupted summaries");
    }
    Ok(failed)
  }

  /// Run one job to a terminal state and notify pollers.
  ///
  /// Never returns an error: any failure moves the log to `failed`.
  pub async fn process(&self, job: SummarizeJob) {
    let log_id = job.log_id;
    info!(%log_id, urls = job.urls.len(), model = %job.model, "summarize job started");

    match self.summarize(&job).await {
      Ok(()) => info!(%log_id, "summarize job completed"),
      Err(e) => {
        warn!(%log_id, error = %e, "summarize job failed");
        match self.store.fail_log(log_id).await {
          Ok(true) => {}
          Ok(false) => debug!(%log_id, "log already terminal; leaving it as is"),
          Err(e) => error!(%log_id, error = %e, "could not mark log failed"),
        }
      }
    }

    self.events.publish(log_id);
  }

  async fn summarize(&self, job: &SummarizeJob) -> Result<()> {
    let content = self.crawl(&job.urls).await?;

    let settings = self
      .store
      .settings(&job.user_id)
      .await
      .map_err(|e| Error::Store(Box::new(e)))?;
    let system = prompt::system_prompt(settings.as_ref());

    let markdown = self
      .llm
      .generate_text(TextRequest {
        model:      job.model.clone(),
        system:     system.clone(),
        prompt:     prompt::summary_prompt(&content, job.instructions.as_deref()),
        web_search: true,
      })
      .await
      .map_err(|e| Error::Llm(Box::new(e)))?;

    let value = self
      .llm
      .generate_object(ObjectRequest {
        model:       job.model.clone(),
        system,
        prompt:      prompt::insights_prompt(&markdown, &content),
        schema_name: prompt::INSIGHTS_SCHEMA_NAME.to_owned(),
        schema:      prompt::insights_schema(),
      })
      .await
      .map_err(|e| Error::Llm(Box::new(e)))?;
    let insights: StructuredInsights =
      serde_json::from_value(value).map_err(Error::Insights)?;

    let completed = self
      .store
      .complete_log(job.log_id, markdown, insights)
      .await
      .map_err(|e| Error::Store(Box::new(e)))?;
    if !completed {
      return Err(CoreError::AlreadyTerminal(job.log_id).into());
    }
    Ok(())
  }

  /// Crawl every URL in order and join the usable markdown.
  async fn crawl(&self, urls: &[String]) -> Result<String> {
    let mut bodies = Vec::with_capacity(urls.len());
    for url in urls {
      let page = self
        .crawler
        .scrape(url)
        .await
        .map_err(|e| Error::Crawler(Box::new(e)))?;
      match page.markdown.filter(|m| !m.trim().is_empty()) {
        Some(markdown) => bodies.push(markdown),
        None => debug!(%url, "no markdown for page"),
      }
    }

    if bodies.is_empty() {
      return Err(Error::NoContent(urls.len()));
    }
    Ok(bodies.join(prompt::PAGE_SEPARATOR))
  }
}
