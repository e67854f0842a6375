//! The in-process task queue between submission and the worker.

use glean_core::account::UserId;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{Error, Result};

/// Everything the worker needs to summarize one log.
#[derive(Debug, Clone)]
pub struct SummarizeJob {
  pub log_id:       Uuid,
  pub user_id:      UserId,
  pub urls:         Vec<String>,
  pub instructions: Option<String>,
  pub model:        String,
}

/// Sending half of the queue. Enqueueing never waits for the job.
#[derive(Clone)]
pub struct JobQueue {
  tx: mpsc::UnboundedSender<SummarizeJob>,
}

/// Receiving half, drained by [`crate::Worker::run`].
pub type JobReceiver = mpsc::UnboundedReceiver<SummarizeJob>;

impl JobQueue {
  pub fn new() -> (Self, JobReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Self { tx }, rx)
  }

  pub fn enqueue(&self, job: SummarizeJob) -> Result<()> {
    self.tx.send(job).map_err(|_| Error::QueueClosed)
  }
}
