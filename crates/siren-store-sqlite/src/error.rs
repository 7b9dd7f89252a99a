//! Error type for `siren-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] siren_core::Error),

  /// The underlying store is unreachable or failed mid-operation.
  /// Transient — safe to retry with backoff. Schema bootstrap happens at
  /// construction time, so a retry re-runs bootstrap too.
  #[error("storage unavailable: {0}")]
  StorageUnavailable(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored column held a value the current build cannot decode.
  #[error("corrupt row: {0}")]
  Decode(String),
}

impl Error {
  /// Whether a caller may retry the failed operation with backoff.
  pub fn is_retryable(&self) -> bool {
    matches!(self, Self::StorageUnavailable(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
