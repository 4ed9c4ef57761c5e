//! Core domain + application logic for the weather notifier.
//!
//! This crate is framework-agnostic. The HTTP surface lives in `wnotify-http`;
//! the weather API and notification channels sit behind ports (traits) so the
//! poller and the handler can be driven by fakes in tests.

pub mod config;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod lookup;
pub mod notify;
pub mod poller;
pub mod ports;
pub mod weather;

pub use errors::{Error, Result};
