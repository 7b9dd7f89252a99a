//! Mapping-suggestion events.
//!
//! A suggestion is a proposed correspondence between two data sources for a
//! project (e.g. a Workday phase and an hour-entry bucket), produced by an AI
//! matcher with a confidence score. It is `pending` until a reviewer applies
//! or dismisses it; both outcomes are terminal and mutually exclusive.

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  types::{EventId, Timestamp},
};

// ─── Confidence ──────────────────────────────────────────────────────────────

/// A fixed-point fraction in `[0, 1]` with exactly four decimal places,
/// stored as ten-thousandths. Values outside the range, or values that are
/// not representable to four decimals, are a producer error — never clamped.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "f64", into = "f64")]
pub struct Confidence(i32);

impl Confidence {
  /// One unit of the fixed-point representation is 1/10000.
  pub const SCALE: i32 = 10_000;

  /// Build from a float, rejecting out-of-range and non-representable
  /// values with [`Error::InvalidEvent`].
  pub fn from_f64(value: f64) -> Result<Self> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
      return Err(Error::InvalidEvent(format!(
        "confidence must be within [0, 1], got {value}"
      )));
    }
    let scaled = value * Self::SCALE as f64;
    if (scaled - scaled.round()).abs() > 1e-6 {
      return Err(Error::InvalidEvent(format!(
        "confidence must be representable to 4 decimal places, got {value}"
      )));
    }
    Ok(Self(scaled.round() as i32))
  }

  /// The raw ten-thousandths value, `0..=10000`.
  pub fn ten_thousandths(self) -> i32 { self.0 }

  /// Rebuild from a stored ten-thousandths value.
  pub fn from_ten_thousandths(raw: i32) -> Result<Self> {
    if !(0..=Self::SCALE).contains(&raw) {
      return Err(Error::InvalidEvent(format!(
        "stored confidence out of range: {raw}"
      )));
    }
    Ok(Self(raw))
  }

  pub fn as_f64(self) -> f64 { self.0 as f64 / Self::SCALE as f64 }
}

impl TryFrom<f64> for Confidence {
  type Error = Error;

  fn try_from(value: f64) -> Result<Self> { Self::from_f64(value) }
}

impl From<Confidence> for f64 {
  fn from(c: Confidence) -> f64 { c.as_f64() }
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// Lifecycle status of a suggestion. `applied` and `dismissed` are both
/// terminal.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionStatus {
  #[default]
  Pending,
  Applied,
  Dismissed,
}

// ─── MappingSuggestionEvent ──────────────────────────────────────────────────

/// A persisted suggestion. `applied_at`/`dismissed_at` are set by their
/// respective terminal transitions and are mutually exclusive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingSuggestionEvent {
  pub id:               EventId,
  pub project_id:       String,
  pub workday_phase_id: Option<String>,
  pub hour_entry_id:    Option<String>,
  pub task_id:          Option<String>,
  pub suggestion_type:  String,
  pub confidence:       Confidence,
  pub reason:           Option<String>,
  pub source_value:     Option<String>,
  pub target_value:     Option<String>,
  pub status:           SuggestionStatus,
  pub applied_at:       Option<Timestamp>,
  pub dismissed_at:     Option<Timestamp>,
  pub created_at:       Timestamp,
}

/// Input to [`crate::store::EventStore::record_suggestion`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMappingSuggestion {
  pub project_id:       String,
  pub workday_phase_id: Option<String>,
  pub hour_entry_id:    Option<String>,
  pub task_id:          Option<String>,
  pub suggestion_type:  String,
  pub confidence:       Confidence,
  pub reason:           Option<String>,
  pub source_value:     Option<String>,
  pub target_value:     Option<String>,
}

impl NewMappingSuggestion {
  pub fn validate(&self) -> Result<()> {
    if self.project_id.trim().is_empty() {
      return Err(Error::InvalidEvent("project_id must not be empty".into()));
    }
    if self.suggestion_type.trim().is_empty() {
      return Err(Error::InvalidEvent(
        "suggestion_type must not be empty".into(),
      ));
    }
    Ok(())
  }
}
