use std::convert::Infallible;

use chrono::{Duration, Utc};

use siren_core::{
  alert::{AlertStatus, NewAlert, Severity},
  assignment::NewAssignmentChange,
  audit::{AuditQuery, NewAuditEntry},
  dedupe::{emit_if_absent, emit_if_absent_at},
  store::{AlertQuery, AuditStore, EventStore, SuggestionQuery},
  suggestion::{Confidence, NewMappingSuggestion, SuggestionStatus},
  summary::{PortfolioCounts, PortfolioProvider, build_role_summary},
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store should open")
}

fn alert(event_type: &str, message: &str) -> NewAlert {
  NewAlert::new(event_type, message)
}

fn keyed_alert(key: &str) -> NewAlert {
  let mut input = alert("overdue_task", "task is overdue");
  input.dedupe_key = Some(key.to_owned());
  input
}

fn suggestion(project_id: &str, confidence: f64) -> NewMappingSuggestion {
  NewMappingSuggestion {
    project_id:       project_id.to_owned(),
    workday_phase_id: Some("phase-1".to_owned()),
    hour_entry_id:    None,
    task_id:          Some("task-9".to_owned()),
    suggestion_type:  "phase_mapping".to_owned(),
    confidence:       Confidence::from_f64(confidence)
      .expect("test confidence should be representable"),
    reason:           Some("name similarity".to_owned()),
    source_value:     Some("Design".to_owned()),
    target_value:     Some("design-phase".to_owned()),
  }
}

// ─── Alerts ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn emit_assigns_id_and_open_status() {
  let store = store().await;

  let created = store
    .emit_alert(alert("overdue_task", "task t1 is 3 days overdue"))
    .await
    .unwrap();

  assert!(created.id > 0);
  assert_eq!(created.status, AlertStatus::Open);
  assert!(created.acknowledged_by.is_none());

  let fetched = store.get_alert(created.id).await.unwrap().unwrap();
  assert_eq!(fetched.message, "task t1 is 3 days overdue");
  assert_eq!(fetched.created_at, created.created_at);
}

#[tokio::test]
async fn emit_rejects_blank_fields() {
  let store = store().await;

  assert!(store.emit_alert(alert("", "message")).await.is_err());
  assert!(store.emit_alert(alert("overdue_task", "  ")).await.is_err());
}

#[tokio::test]
async fn query_filters_by_status_and_project() {
  let store = store().await;

  let mut a = alert("overdue_task", "alpha overdue");
  a.related_project_id = Some("alpha".to_owned());
  let a = store.emit_alert(a).await.unwrap();

  let mut b = alert("overdue_task", "beta overdue");
  b.related_project_id = Some("beta".to_owned());
  store.emit_alert(b).await.unwrap();

  store.resolve_alert(a.id).await.unwrap();

  let open = store
    .query_alerts(&AlertQuery {
      statuses: vec![AlertStatus::Open],
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(open.len(), 1);
  assert_eq!(open[0].related_project_id.as_deref(), Some("beta"));

  let alpha = store
    .query_alerts(&AlertQuery {
      related_project_id: Some("alpha".to_owned()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(alpha.len(), 1);
  assert_eq!(alpha[0].status, AlertStatus::Resolved);
}

#[tokio::test]
async fn query_returns_newest_first_and_honours_limit() {
  let store = store().await;

  for n in 0..5 {
    store
      .emit_alert(alert("overdue_task", &format!("alert {n}")))
      .await
      .unwrap();
  }

  let page = store
    .query_alerts(&AlertQuery { limit: Some(3), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(page.len(), 3);
  assert_eq!(page[0].message, "alert 4");
  assert_eq!(page[2].message, "alert 2");

  // Without a limit the query returns every match.
  let all = store.query_alerts(&AlertQuery::default()).await.unwrap();
  assert_eq!(all.len(), 5);
}

#[tokio::test]
async fn acknowledge_sets_actor_and_timestamp_once() {
  let store = store().await;
  let created = store
    .emit_alert(alert("budget_overrun", "project over budget"))
    .await
    .unwrap();

  let acked = store
    .acknowledge_alert(created.id, "pm@example.com".to_owned())
    .await
    .unwrap();
  assert_eq!(acked.status, AlertStatus::Acknowledged);
  assert_eq!(acked.acknowledged_by.as_deref(), Some("pm@example.com"));
  assert!(acked.acknowledged_at.is_some());

  // A second acknowledge is an invalid transition; the original actor and
  // timestamp survive.
  let err = store
    .acknowledge_alert(created.id, "other@example.com".to_owned())
    .await
    .unwrap_err();
  assert!(err.to_string().contains("acknowledged"));

  let current = store.get_alert(created.id).await.unwrap().unwrap();
  assert_eq!(current.acknowledged_by.as_deref(), Some("pm@example.com"));
}

#[tokio::test]
async fn resolve_is_terminal() {
  let store = store().await;
  let created = store
    .emit_alert(alert("overdue_task", "something"))
    .await
    .unwrap();

  let resolved = store.resolve_alert(created.id).await.unwrap();
  assert_eq!(resolved.status, AlertStatus::Resolved);

  assert!(store.resolve_alert(created.id).await.is_err());
  assert!(
    store
      .acknowledge_alert(created.id, "pm@example.com".to_owned())
      .await
      .is_err()
  );
}

#[tokio::test]
async fn transitions_on_missing_alert_are_not_found() {
  let store = store().await;

  let err = store.resolve_alert(4041).await.unwrap_err();
  assert!(err.to_string().contains("not found"));
  let err = store
    .acknowledge_alert(4041, "pm@example.com".to_owned())
    .await
    .unwrap_err();
  assert!(err.to_string().contains("not found"));
}

#[tokio::test]
async fn count_open_alerts_tracks_severity() {
  let store = store().await;

  let mut critical = alert("deadline_slip", "ship date slipped");
  critical.severity = Severity::Critical;
  store.emit_alert(critical).await.unwrap();

  let info = store.emit_alert(alert("fyi", "heads up")).await.unwrap();
  let acked = store
    .emit_alert(alert("budget_overrun", "over budget"))
    .await
    .unwrap();
  store
    .acknowledge_alert(acked.id, "pm@example.com".to_owned())
    .await
    .unwrap();
  store.resolve_alert(info.id).await.unwrap();

  let counts = store.count_open_alerts().await.unwrap();
  assert_eq!(counts.open, 2); // open + acknowledged, not resolved
  assert_eq!(counts.critical, 1);
}

// ─── Deduplication ───────────────────────────────────────────────────────────

#[tokio::test]
async fn keyless_alerts_always_create() {
  let store = store().await;

  let first = emit_if_absent(&store, alert("adhoc", "one"), 24).await.unwrap();
  let second = emit_if_absent(&store, alert("adhoc", "one"), 24).await.unwrap();
  assert!(!first.is_suppressed());
  assert!(!second.is_suppressed());

  let all = store.query_alerts(&AlertQuery::default()).await.unwrap();
  assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn repeat_within_window_is_suppressed() {
  let store = store().await;

  let first = emit_if_absent(&store, keyed_alert("task:t1:overdue"), 24)
    .await
    .unwrap();
  assert!(first.created().is_some());

  let repeat = emit_if_absent(&store, keyed_alert("task:t1:overdue"), 24)
    .await
    .unwrap();
  assert!(repeat.is_suppressed());

  let all = store.query_alerts(&AlertQuery::default()).await.unwrap();
  assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn resolution_ends_suppression() {
  let store = store().await;

  let first = emit_if_absent(&store, keyed_alert("task:t1:overdue"), 24)
    .await
    .unwrap();
  let id = first.created().map(|a| a.id).unwrap();
  store.resolve_alert(id).await.unwrap();

  let after = emit_if_absent(&store, keyed_alert("task:t1:overdue"), 24)
    .await
    .unwrap();
  assert!(!after.is_suppressed());

  let all = store.query_alerts(&AlertQuery::default()).await.unwrap();
  assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn acknowledged_alert_still_suppresses() {
  let store = store().await;

  let first = emit_if_absent(&store, keyed_alert("task:t1:overdue"), 24)
    .await
    .unwrap();
  let id = first.created().map(|a| a.id).unwrap();
  store
    .acknowledge_alert(id, "pm@example.com".to_owned())
    .await
    .unwrap();

  let repeat = emit_if_absent(&store, keyed_alert("task:t1:overdue"), 24)
    .await
    .unwrap();
  assert!(repeat.is_suppressed());
}

#[tokio::test]
async fn elapsed_window_allows_new_alert() {
  let store = store().await;

  emit_if_absent(&store, keyed_alert("task:t1:overdue"), 24)
    .await
    .unwrap();

  // Evaluate the gate as if 25 hours have passed; the prior alert now
  // falls outside the lookback window.
  let later = Utc::now() + Duration::hours(25);
  let after = emit_if_absent_at(&store, keyed_alert("task:t1:overdue"), 24, later)
    .await
    .unwrap();
  assert!(!after.is_suppressed());
}

#[tokio::test]
async fn zero_lookback_is_treated_as_one_hour() {
  let store = store().await;

  emit_if_absent(&store, keyed_alert("task:t1:overdue"), 0)
    .await
    .unwrap();
  let repeat = emit_if_absent(&store, keyed_alert("task:t1:overdue"), 0)
    .await
    .unwrap();
  assert!(repeat.is_suppressed());
}

// ─── Assignment changes ──────────────────────────────────────────────────────

#[tokio::test]
async fn assignment_history_is_chronological() {
  let store = store().await;

  for (employee, previous) in
    [("alice", None), ("bob", Some("alice")), ("carol", Some("bob"))]
  {
    let mut input = NewAssignmentChange::new("task-7", employee, employee, "pm");
    input.previous_employee_id = previous.map(str::to_owned);
    store.record_assignment_change(input).await.unwrap();
  }

  let history = store.assignment_history("task-7").await.unwrap();
  assert_eq!(history.len(), 3);
  let ids: Vec<&str> =
    history.iter().map(|c| c.employee_id.as_str()).collect();
  assert_eq!(ids, ["alice", "bob", "carol"]);
  assert!(history.windows(2).all(|w| w[0].changed_at <= w[1].changed_at));

  assert!(store.assignment_history("task-8").await.unwrap().is_empty());
}

#[tokio::test]
async fn assignment_source_defaults_to_manual() {
  let store = store().await;

  let recorded = store
    .record_assignment_change(NewAssignmentChange::new(
      "task-7", "alice", "Alice", "pm",
    ))
    .await
    .unwrap();
  assert_eq!(recorded.assignment_source, "manual");
}

// ─── Mapping suggestions ─────────────────────────────────────────────────────

#[tokio::test]
async fn confidence_survives_storage_exactly() {
  let store = store().await;

  for value in [0.0, 0.5, 0.8731, 1.0] {
    let recorded = store
      .record_suggestion(suggestion("proj-1", value))
      .await
      .unwrap();
    let fetched = store
      .query_suggestions(&SuggestionQuery {
        project_id: Some("proj-1".to_owned()),
        ..Default::default()
      })
      .await
      .unwrap();
    let found = fetched.iter().find(|s| s.id == recorded.id).unwrap();
    assert_eq!(found.confidence.as_f64(), value);
  }
}

#[tokio::test]
async fn suggestion_transitions_are_terminal_and_exclusive() {
  let store = store().await;

  let a = store.record_suggestion(suggestion("proj-1", 0.9)).await.unwrap();
  let b = store.record_suggestion(suggestion("proj-1", 0.4)).await.unwrap();

  let applied = store.apply_suggestion(a.id).await.unwrap();
  assert_eq!(applied.status, SuggestionStatus::Applied);
  assert!(applied.applied_at.is_some());
  assert!(applied.dismissed_at.is_none());

  let dismissed = store.dismiss_suggestion(b.id).await.unwrap();
  assert_eq!(dismissed.status, SuggestionStatus::Dismissed);
  assert!(dismissed.dismissed_at.is_some());
  assert!(dismissed.applied_at.is_none());

  // No suggestion can leave its terminal state.
  assert!(store.dismiss_suggestion(a.id).await.is_err());
  assert!(store.apply_suggestion(b.id).await.is_err());
  assert!(store.apply_suggestion(9999).await.is_err());
}

#[tokio::test]
async fn suggestion_query_filters_by_status() {
  let store = store().await;

  let a = store.record_suggestion(suggestion("proj-1", 0.9)).await.unwrap();
  store.record_suggestion(suggestion("proj-1", 0.4)).await.unwrap();
  store.record_suggestion(suggestion("proj-2", 0.4)).await.unwrap();
  store.apply_suggestion(a.id).await.unwrap();

  let pending = store
    .query_suggestions(&SuggestionQuery {
      project_id: Some("proj-1".to_owned()),
      status: Some(SuggestionStatus::Pending),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(pending.len(), 1);
  assert_eq!(pending[0].confidence.as_f64(), 0.4);
}

// ─── Audit journal ───────────────────────────────────────────────────────────

fn audit(event_type: &str, role: Option<&str>) -> NewAuditEntry {
  let mut input = NewAuditEntry::new(event_type);
  input.role_key = role.map(str::to_owned);
  input
}

#[tokio::test]
async fn audit_entries_append_without_deduplication() {
  let store = store().await;

  store.write_audit(audit("summary_viewed", Some("pm"))).await.unwrap();
  store.write_audit(audit("summary_viewed", Some("pm"))).await.unwrap();

  let entries = store.query_audit(&AuditQuery::default()).await.unwrap();
  assert_eq!(entries.len(), 2);
  assert!(entries[0].id != entries[1].id);
}

#[tokio::test]
async fn audit_query_applies_filters() {
  let store = store().await;

  let mut entry = audit("alert_acknowledged", Some("pm"));
  entry.actor_email = Some("pm@example.com".to_owned());
  entry.project_id = Some("proj-1".to_owned());
  store.write_audit(entry).await.unwrap();
  store.write_audit(audit("summary_viewed", Some("lead"))).await.unwrap();

  let by_role = store
    .query_audit(&AuditQuery {
      role_key: Some("pm".to_owned()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(by_role.len(), 1);
  assert_eq!(by_role[0].event_type, "alert_acknowledged");

  let by_actor = store
    .query_audit(&AuditQuery {
      actor_email: Some("nobody@example.com".to_owned()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert!(by_actor.is_empty());
}

#[tokio::test]
async fn audit_counts_group_by_role_and_skip_anonymous() {
  let store = store().await;

  store.write_audit(audit("summary_viewed", Some("pm"))).await.unwrap();
  store.write_audit(audit("summary_viewed", Some("pm"))).await.unwrap();
  store.write_audit(audit("summary_viewed", Some("lead"))).await.unwrap();
  store.write_audit(audit("startup", None)).await.unwrap();

  let since = Utc::now() - Duration::hours(1);
  let counts = store.audit_counts_by_role(since).await.unwrap();
  assert_eq!(counts.len(), 2);
  assert_eq!(counts[0].role_key, "pm");
  assert_eq!(counts[0].count, 2);
  assert_eq!(counts[1].role_key, "lead");
  assert_eq!(counts[1].count, 1);

  let future = Utc::now() + Duration::hours(1);
  assert!(store.audit_counts_by_role(future).await.unwrap().is_empty());
}

// ─── Summary aggregation ─────────────────────────────────────────────────────

struct EmptyPortfolio;

impl PortfolioProvider for EmptyPortfolio {
  type Error = Infallible;

  async fn portfolio_counts(
    &self,
    _role_key: &str,
  ) -> Result<PortfolioCounts, Infallible> {
    Ok(PortfolioCounts::default())
  }
}

#[tokio::test]
async fn decision_queue_ranks_past_a_page_of_newer_noise() {
  let store = store().await;

  let mut critical = alert("integration_down", "workday sync is failing");
  critical.severity = Severity::Critical;
  let critical = store.emit_alert(critical).await.unwrap();

  // Well past any single result page of newer, lower-severity alerts.
  for n in 0..55 {
    let mut info = alert("fyi", &format!("routine notice {n}"));
    info.severity = Severity::Info;
    store.emit_alert(info).await.unwrap();
  }

  let summary = build_role_summary(
    "manager",
    &EmptyPortfolio,
    &store,
    5,
    Utc::now() - Duration::hours(1),
  )
  .await
  .unwrap();

  assert_eq!(summary.open_alerts, 56);
  assert_eq!(summary.decision_queue.len(), 5);
  assert_eq!(summary.decision_queue[0].alert.id, critical.id);
  assert_eq!(
    summary.decision_queue[0].alert.severity,
    Severity::Critical
  );
}

// ─── Bootstrap ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn schema_bootstrap_is_idempotent() {
  let store = store().await;

  store.ensure_event_schema().await.unwrap();
  store.ensure_audit_schema().await.unwrap();

  store.emit_alert(alert("overdue_task", "still works")).await.unwrap();
}
