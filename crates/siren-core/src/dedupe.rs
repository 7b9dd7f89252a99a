//! The deduplication gate: at most one alert per dedupe key per window.
//!
//! Alerts are inherently noisy — the same underlying condition (say, an
//! overdue task) is re-detected by every scan. A caller-supplied dedupe key
//! collapses scan-driven repeats into a single visible alert, while still
//! letting a new occurrence surface once the old one ages out of the lookback
//! window or is resolved.

use chrono::{Duration, Utc};

use crate::{
  alert::{AlertEvent, AlertStatus, NewAlert},
  store::{AlertQuery, EventStore},
  types::Timestamp,
};

/// The tri-state result of [`emit_if_absent`]: a caller must never conflate
/// `Suppressed` with an error — suppression is a deliberate, successful
/// no-op.
#[derive(Debug, Clone)]
pub enum EmitOutcome {
  /// No matching recent alert existed; a new row was inserted.
  Created(AlertEvent),
  /// An equivalent alert already exists within the window; nothing was
  /// inserted.
  Suppressed,
}

impl EmitOutcome {
  pub fn is_suppressed(&self) -> bool { matches!(self, Self::Suppressed) }

  pub fn created(&self) -> Option<&AlertEvent> {
    match self {
      Self::Created(alert) => Some(alert),
      Self::Suppressed => None,
    }
  }
}

/// Emit `input` unless an alert with the same dedupe key, in `open` or
/// `acknowledged` status, was created within the trailing `lookback_hours`.
///
/// Alerts without a dedupe key skip deduplication entirely and are always
/// emitted. `lookback_hours` is clamped to at least 1 so a zero-width window
/// cannot defeat deduplication.
///
/// A failed existence check propagates the storage error — it is never
/// reported as `Suppressed`. Note the check-then-insert is not atomic: two
/// producers racing on the same key inside one window can both insert. The
/// design favours availability over a uniqueness constraint.
pub async fn emit_if_absent<S: EventStore>(
  store: &S,
  input: NewAlert,
  lookback_hours: u32,
) -> Result<EmitOutcome, S::Error> {
  emit_if_absent_at(store, input, lookback_hours, Utc::now()).await
}

/// [`emit_if_absent`] with an explicit `now`, so tests can simulate the
/// lookback window elapsing without a real clock advance.
pub async fn emit_if_absent_at<S: EventStore>(
  store: &S,
  input: NewAlert,
  lookback_hours: u32,
  now: Timestamp,
) -> Result<EmitOutcome, S::Error> {
  let Some(key) = input.dedupe_key.clone().filter(|k| !k.is_empty()) else {
    return Ok(EmitOutcome::Created(store.emit_alert(input).await?));
  };

  let window_start = now - Duration::hours(i64::from(lookback_hours.max(1)));
  let query = AlertQuery {
    statuses: vec![AlertStatus::Open, AlertStatus::Acknowledged],
    dedupe_key: Some(key),
    created_after: Some(window_start),
    limit: Some(1),
    ..AlertQuery::default()
  };

  if store.query_alerts(&query).await?.is_empty() {
    Ok(EmitOutcome::Created(store.emit_alert(input).await?))
  } else {
    Ok(EmitOutcome::Suppressed)
  }
}
