//! Core types and trait definitions for the Siren alerting subsystem.
//!
//! Siren accepts structured events describing notable state changes in a
//! project-control application — risk alerts, assignment changes, AI-suggested
//! data mappings — persists them durably, suppresses duplicate alerts within a
//! rolling window, and exposes role-scoped summaries for dashboards.
//!
//! Everything here is plain data and pure logic: no HTTP surface, no
//! database driver. The storage backends and the API crate both build on
//! these definitions, so this crate sits at the bottom of the workspace.

// Backends satisfy the storage traits with plain `async fn` methods;
// silence the advisory lint about `Send` bounds on their futures.
#![allow(async_fn_in_trait)]

pub mod alert;
pub mod assignment;
pub mod audit;
pub mod dedupe;
pub mod error;
pub mod perms;
pub mod ranking;
pub mod store;
pub mod suggestion;
pub mod summary;
pub mod types;

pub use error::{Error, Result};
