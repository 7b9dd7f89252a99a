//! Error types for `siren-core`.
//!
//! `StorageUnavailable` lives in the storage backend crate (it is a transport
//! concern); `PermissionDenied` is surfaced by the API layer from the
//! permission collaborator. Neither is generated inside this crate.

use thiserror::Error;

use crate::types::EventId;

#[derive(Debug, Error)]
pub enum Error {
  /// A producer supplied an event that fails validation — a missing required
  /// field or an out-of-range value. Never retried automatically.
  #[error("invalid event: {0}")]
  InvalidEvent(String),

  /// A status-transition call targeted an id that does not exist.
  #[error("{entity} not found: {id}")]
  NotFound { entity: &'static str, id: EventId },

  /// A status-transition call violated the state machine (e.g. acknowledging
  /// a resolved alert, or dismissing an already-applied suggestion).
  #[error("invalid transition: {entity} {id} is already {state}")]
  InvalidTransition {
    entity: &'static str,
    id:     EventId,
    state:  &'static str,
  },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
