//! Severity/age ranking — pure, deterministic display ordering for alerts.
//!
//! Primary key: severity rank (`critical` first). Secondary key: age — for
//! equal severity, older alerts sort first so long-unaddressed issues surface
//! ahead of fresh ones. The sort is stable: equal-rank, equal-age inputs keep
//! their original relative order.

use chrono::Duration;

use crate::{alert::AlertEvent, types::Timestamp};

/// Sort `alerts` in display order: severity rank ascending, then
/// `created_at` ascending (older first).
pub fn rank_alerts(alerts: &mut [AlertEvent]) {
  alerts.sort_by_key(|a| (a.severity.rank(), a.created_at));
}

/// Render `now - created_at` as a coarse human label.
///
/// The exact bucket boundaries are a display concern, but the labels are
/// monotonic: an older timestamp never produces a fresher label than a newer
/// one. Timestamps in the future (clock skew) render as `"just now"`.
pub fn age_label(now: Timestamp, created_at: Timestamp) -> String {
  let age = now - created_at;

  if age < Duration::minutes(1) {
    "just now".into()
  } else if age < Duration::hours(1) {
    "in the last hour".into()
  } else if age < Duration::hours(24) {
    let hours = age.num_hours();
    if hours == 1 {
      "1 hour ago".into()
    } else {
      format!("{hours} hours ago")
    }
  } else if age < Duration::hours(48) {
    "yesterday".into()
  } else {
    format!("{} days ago", age.num_days())
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, Utc};

  use super::*;
  use crate::alert::{AlertStatus, NewAlert, Severity};

  fn alert(id: i64, severity: Severity, age_hours: i64) -> AlertEvent {
    let input = NewAlert::new("test", "message");
    AlertEvent {
      id,
      event_type: input.event_type,
      severity,
      title: None,
      message: input.message,
      source: None,
      entity_type: None,
      entity_id: None,
      related_project_id: None,
      related_task_id: None,
      dedupe_key: None,
      status: AlertStatus::Open,
      metadata: Default::default(),
      acknowledged_by: None,
      acknowledged_at: None,
      created_at: Utc::now() - Duration::hours(age_hours),
    }
  }

  #[test]
  fn critical_sorts_before_warning_before_info() {
    let mut alerts = vec![
      alert(1, Severity::Info, 0),
      alert(2, Severity::Critical, 0),
      alert(3, Severity::Warning, 0),
    ];
    rank_alerts(&mut alerts);
    let ids: Vec<_> = alerts.iter().map(|a| a.id).collect();
    assert_eq!(ids, [2, 3, 1]);
  }

  #[test]
  fn unknown_severity_sorts_after_info() {
    let mut alerts =
      vec![alert(1, Severity::Unknown, 10), alert(2, Severity::Info, 0)];
    rank_alerts(&mut alerts);
    assert_eq!(alerts[0].id, 2);
  }

  #[test]
  fn older_sorts_first_within_equal_severity() {
    let mut alerts = vec![
      alert(1, Severity::Warning, 1),
      alert(2, Severity::Warning, 72),
      alert(3, Severity::Warning, 24),
    ];
    rank_alerts(&mut alerts);
    let ids: Vec<_> = alerts.iter().map(|a| a.id).collect();
    assert_eq!(ids, [2, 3, 1]);
  }

  #[test]
  fn sorting_twice_is_idempotent() {
    let mut alerts = vec![
      alert(1, Severity::Info, 5),
      alert(2, Severity::Critical, 1),
      alert(3, Severity::Warning, 50),
      alert(4, Severity::Critical, 9),
    ];
    rank_alerts(&mut alerts);
    let once: Vec<_> = alerts.iter().map(|a| a.id).collect();
    rank_alerts(&mut alerts);
    let twice: Vec<_> = alerts.iter().map(|a| a.id).collect();
    assert_eq!(once, twice);
  }

  #[test]
  fn equal_rank_equal_age_preserves_input_order() {
    let now = Utc::now();
    let mut a = alert(1, Severity::Warning, 0);
    let mut b = alert(2, Severity::Warning, 0);
    a.created_at = now;
    b.created_at = now;
    let mut alerts = vec![a, b];
    rank_alerts(&mut alerts);
    assert_eq!(alerts[0].id, 1);
    assert_eq!(alerts[1].id, 2);
  }

  #[test]
  fn age_labels_are_monotonic() {
    let now = Utc::now();
    let ages = [
      Duration::seconds(5),
      Duration::minutes(30),
      Duration::hours(1),
      Duration::hours(5),
      Duration::hours(25),
      Duration::days(3),
      Duration::days(40),
    ];

    // Bucket indices must never decrease as age increases.
    let bucket = |label: &str| -> usize {
      if label == "just now" {
        0
      } else if label == "in the last hour" {
        1
      } else if label.ends_with("hour ago") || label.ends_with("hours ago") {
        2
      } else if label == "yesterday" {
        3
      } else {
        4
      }
    };

    let mut last = 0;
    for age in ages {
      let b = bucket(&age_label(now, now - age));
      assert!(b >= last, "age {age} produced a fresher label");
      last = b;
    }
  }

  #[test]
  fn future_timestamps_render_as_just_now() {
    let now = Utc::now();
    assert_eq!(age_label(now, now + Duration::minutes(5)), "just now");
  }
}
