//! Log change notifications for long-polling clients.

use std::time::Duration;

use tokio::{
  sync::broadcast::{self, error::RecvError},
  time::Instant,
};
use uuid::Uuid;

const CAPACITY: usize = 256;

/// Broadcasts the id of every log that reached a terminal state.
#[derive(Clone)]
pub struct LogEvents {
  tx: broadcast::Sender<Uuid>,
}

impl Default for LogEvents {
  fn default() -> Self { Self::new() }
}

impl LogEvents {
  pub fn new() -> Self {
    let (tx, _) = broadcast::channel(CAPACITY);
    Self { tx }
  }

  pub fn publish(&self, log_id: Uuid) {
    // No receivers simply means nobody is polling.
    let _ = self.tx.send(log_id);
  }

  /// Subscribe before reading the log so a change between the read and the
  /// wait is not missed.
  pub fn subscribe(&self) -> LogSubscription {
    LogSubscription { rx: self.tx.subscribe() }
  }
}

pub struct LogSubscription {
  rx: broadcast::Receiver<Uuid>,
}

impl LogSubscription {
  /// Wait until `log_id` is published or `timeout` elapses. Returns `true`
  /// when the caller should re-read the log.
  ///
  /// A lagged receiver may have dropped the event, so lag also reports
  /// `true`.
  pub async fn changed(&mut self, log_id: Uuid, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
      match tokio::time::timeout_at(deadline, self.rx.recv()).await {
        Ok(Ok(id)) if id == log_id => return true,
        Ok(Ok(_)) => continue,
        Ok(Err(RecvError::Lagged(_))) => return true,
        Ok(Err(RecvError::Closed)) | Err(_) => return false,
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn changed_ignores_other_logs() {
    let events = LogEvents::new();
    let mut sub = events.subscribe();
    let wanted = Uuid::new_v4();

    events.publish(Uuid::new_v4());
    events.publish(wanted);
    assert!(sub.changed(wanted, Duration::from_millis(100)).await);
  }

  #[tokio::test]
  async fn changed_times_out() {
    let events = LogEvents::new();
    let mut sub = events.subscribe();
    events.publish(Uuid::new_v4());
    assert!(!sub.changed(Uuid::new_v4(), Duration::from_millis(20)).await);
  }
}
