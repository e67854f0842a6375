//! The asynchronous side of Glean.
//!
//! [`submit_summary`] accepts a request and enqueues a [`SummarizeJob`];
//! the [`Worker`] drains the queue and drives each job to a terminal state;
//! the [`Scheduler`] runs competitor scans when a cron trigger fires.
//! Every collaborator is one of the `glean-core` traits, so this crate has
//! no HTTP or database dependency of its own.

pub mod catalog;
pub mod error;
pub mod events;
pub mod prompt;
pub mod queue;
pub mod scheduler;
pub mod submit;
pub mod worker;

pub use catalog::ModelCatalog;
pub use error::{Error, Result};
pub use events::{LogEvents, LogSubscription};
pub use queue::{JobQueue, JobReceiver, SummarizeJob};
pub use scheduler::{ScanReport, Scheduler};
pub use submit::{SubmitRequest, submit_summary};
pub use worker::Worker;
