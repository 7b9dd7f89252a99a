//! Alert events — the primary event family of the store.
//!
//! An alert is created once by a producer and afterwards mutated only through
//! explicit status transitions (`open → acknowledged → resolved`, or
//! `open → resolved` directly). Alerts are never physically deleted.

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  types::{EventId, Metadata, Timestamp},
};

// ─── Severity ────────────────────────────────────────────────────────────────

/// How urgent an alert is. Orders `critical` first for display; see
/// [`crate::ranking`].
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  #[default]
  Info,
  Warning,
  Critical,
  /// Catch-all for severities this build does not recognise. Sorts after
  /// `info` so a producer/consumer version skew never promotes an alert.
  #[serde(other)]
  Unknown,
}

impl Severity {
  /// Ordinal used for display ordering: `critical(0) < warning(1) <
  /// info(2) < unknown(3)`.
  pub fn rank(self) -> u8 {
    match self {
      Self::Critical => 0,
      Self::Warning => 1,
      Self::Info => 2,
      Self::Unknown => 3,
    }
  }
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// Lifecycle status of an alert.
///
/// Valid transitions: `open → acknowledged`, `acknowledged → resolved`,
/// `open → resolved`. There is no transition out of `resolved`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
  #[default]
  Open,
  Acknowledged,
  Resolved,
}

impl AlertStatus {
  /// Whether an alert in this status still suppresses duplicates with the
  /// same dedupe key. Resolution ends suppression regardless of the window.
  pub fn suppresses(self) -> bool {
    matches!(self, Self::Open | Self::Acknowledged)
  }
}

// ─── AlertEvent ──────────────────────────────────────────────────────────────

/// A persisted alert. `id` and `created_at` are server-assigned; `created_at`
/// never changes after insertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEvent {
  pub id:                 EventId,
  /// Categorises the alert's producer/semantics, e.g. `"overdue_task"`.
  pub event_type:         String,
  pub severity:           Severity,
  pub title:              Option<String>,
  pub message:            String,
  pub source:             Option<String>,
  pub entity_type:        Option<String>,
  pub entity_id:          Option<String>,
  pub related_project_id: Option<String>,
  pub related_task_id:    Option<String>,
  /// When present, collapses repeated detections of the same underlying
  /// condition; see [`crate::dedupe`].
  pub dedupe_key:         Option<String>,
  pub status:             AlertStatus,
  pub metadata:           Metadata,
  /// Set together with `acknowledged_at`, exactly once, when status moves
  /// to `acknowledged`.
  pub acknowledged_by:    Option<String>,
  pub acknowledged_at:    Option<Timestamp>,
  pub created_at:         Timestamp,
}

// ─── NewAlert ────────────────────────────────────────────────────────────────

/// Input to [`crate::store::EventStore::emit_alert`]. `id`, `status` and
/// `created_at` are always assigned by the store and not accepted from
/// callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAlert {
  pub event_type:         String,
  #[serde(default)]
  pub severity:           Severity,
  pub title:              Option<String>,
  pub message:            String,
  pub source:             Option<String>,
  pub entity_type:        Option<String>,
  pub entity_id:          Option<String>,
  pub related_project_id: Option<String>,
  pub related_task_id:    Option<String>,
  pub dedupe_key:         Option<String>,
  #[serde(default)]
  pub metadata:           Metadata,
}

impl NewAlert {
  /// Convenience constructor with all optional fields unset.
  pub fn new(event_type: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      event_type:         event_type.into(),
      severity:           Severity::default(),
      title:              None,
      message:            message.into(),
      source:             None,
      entity_type:        None,
      entity_id:          None,
      related_project_id: None,
      related_task_id:    None,
      dedupe_key:         None,
      metadata:           Metadata::new(),
    }
  }

  /// Check the required fields. Producers sending an empty `event_type` or
  /// `message` get [`Error::InvalidEvent`] before anything touches storage.
  pub fn validate(&self) -> Result<()> {
    if self.event_type.trim().is_empty() {
      return Err(Error::InvalidEvent("event_type must not be empty".into()));
    }
    if self.message.trim().is_empty() {
      return Err(Error::InvalidEvent("message must not be empty".into()));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unknown_severity_deserialises_to_catch_all() {
    let s: Severity = serde_json::from_str("\"catastrophic\"").unwrap();
    assert_eq!(s, Severity::Unknown);
  }

  #[test]
  fn severity_defaults_to_info() {
    assert_eq!(Severity::default(), Severity::Info);
  }

  #[test]
  fn blank_message_is_invalid() {
    let alert = NewAlert::new("overdue_task", "   ");
    assert!(matches!(alert.validate(), Err(Error::InvalidEvent(_))));
  }

  #[test]
  fn blank_event_type_is_invalid() {
    let alert = NewAlert::new("", "task X overdue");
    assert!(matches!(alert.validate(), Err(Error::InvalidEvent(_))));
  }

  #[test]
  fn resolved_does_not_suppress() {
    assert!(AlertStatus::Open.suppresses());
    assert!(AlertStatus::Acknowledged.suppresses());
    assert!(!AlertStatus::Resolved.suppresses());
  }
}
