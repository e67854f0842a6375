//! Core types and trait definitions for Glean.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! store, the crawler, the language model and the billing directory are all
//! expressed as traits here and implemented elsewhere.

pub mod account;
pub mod collab;
pub mod competitor;
pub mod error;
pub mod library;
pub mod log;
pub mod quota;
pub mod store;
pub mod usage;
pub mod view;

pub use error::{Error, Result};
