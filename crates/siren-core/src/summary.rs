//! Role-scoped aggregation: per-role dashboard summaries.
//!
//! Composes base portfolio counts (sourced from the external project/task
//! store, a collaborator outside this core) with event-store reads, applying
//! severity/age ranking to produce a bounded decision queue. Both data
//! sources are injectable, so the aggregator itself has no storage
//! dependency and is testable with fakes.

use std::future::Future;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
  alert::{AlertEvent, AlertStatus},
  audit::RoleActivity,
  ranking::{age_label, rank_alerts},
  store::{AlertQuery, AuditStore, EventStore},
  types::Timestamp,
};

// ─── Portfolio collaborator ──────────────────────────────────────────────────

/// Base portfolio numbers supplied by the external project/task store.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
pub struct PortfolioCounts {
  pub open_tasks:      i64,
  pub overdue_tasks:   i64,
  pub active_projects: i64,
}

/// Outbound contract for the project/task count collaborator.
pub trait PortfolioProvider: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn portfolio_counts<'a>(
    &'a self,
    role_key: &'a str,
  ) -> impl Future<Output = Result<PortfolioCounts, Self::Error>> + Send + 'a;
}

// ─── Output ──────────────────────────────────────────────────────────────────

/// One decision-queue entry: a ranked alert plus its rendered age.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedAlert {
  pub alert: AlertEvent,
  pub age:   String,
}

/// The per-role summary consumed by dashboards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleSummary {
  pub role_key:        String,
  pub portfolio:       PortfolioCounts,
  pub open_alerts:     i64,
  pub critical_alerts: i64,
  /// Derived 0–100 proxy metric; see [`health_score`].
  pub health_score:    u8,
  /// Top alerts in severity/age order, bounded by the requested queue size.
  pub decision_queue:  Vec<QueuedAlert>,
  /// Audit-entry counts grouped by role over the requested window.
  pub audit_activity:  Vec<RoleActivity>,
  pub generated_at:    Timestamp,
}

/// An error from either of the aggregator's two data sources.
#[derive(Debug, Error)]
pub enum SummaryError<P, S> {
  #[error("portfolio provider error: {0}")]
  Portfolio(#[source] P),

  #[error("event store error: {0}")]
  Store(#[source] S),
}

// ─── Health score ────────────────────────────────────────────────────────────

/// `max(0, 100 − (overdue_tasks × 2 + critical_alerts × 8))`, clamped to
/// `[0, 100]`.
///
/// Intentionally simple: overdue work costs twice per unit what non-critical
/// drift does, and a critical alert four times an overdue task. More
/// overdue/critical can only lower the score, never below zero.
pub fn health_score(overdue_tasks: i64, critical_alerts: i64) -> u8 {
  let penalty = overdue_tasks.saturating_mul(2).saturating_add(critical_alerts.saturating_mul(8));
  (100 - penalty).clamp(0, 100) as u8
}

// ─── Aggregation ─────────────────────────────────────────────────────────────

/// Build the summary for `role_key`.
///
/// `queue_size` bounds the decision queue; `activity_since` is the lower
/// bound for the grouped audit counts.
pub async fn build_role_summary<P, S>(
  role_key: &str,
  portfolio: &P,
  store: &S,
  queue_size: usize,
  activity_since: Timestamp,
) -> Result<RoleSummary, SummaryError<P::Error, <S as EventStore>::Error>>
where
  P: PortfolioProvider,
  S: EventStore + AuditStore<Error = <S as EventStore>::Error>,
{
  let counts = portfolio
    .portfolio_counts(role_key)
    .await
    .map_err(SummaryError::Portfolio)?;

  let open = store
    .count_open_alerts()
    .await
    .map_err(SummaryError::Store)?;

  // No limit: ranking must see the full open set, or an old critical alert
  // could fall outside a newest-first page and never surface.
  let query = AlertQuery {
    statuses: vec![AlertStatus::Open, AlertStatus::Acknowledged],
    ..AlertQuery::default()
  };
  let mut queue = store
    .query_alerts(&query)
    .await
    .map_err(SummaryError::Store)?;
  rank_alerts(&mut queue);
  queue.truncate(queue_size);

  let audit_activity = store
    .audit_counts_by_role(activity_since)
    .await
    .map_err(SummaryError::Store)?;

  let now = Utc::now();
  let decision_queue = queue
    .into_iter()
    .map(|alert| {
      let age = age_label(now, alert.created_at);
      QueuedAlert { alert, age }
    })
    .collect();

  Ok(RoleSummary {
    role_key: role_key.to_owned(),
    portfolio: counts,
    open_alerts: open.open,
    critical_alerts: open.critical,
    health_score: health_score(counts.overdue_tasks, open.critical),
    decision_queue,
    audit_activity,
    generated_at: now,
  })
}

#[cfg(test)]
mod tests {
  use std::convert::Infallible;

  use chrono::{Duration, Utc};

  use super::*;
  use crate::{
    alert::{NewAlert, Severity},
    assignment::{AssignmentChangeEvent, NewAssignmentChange},
    audit::{AuditLogEntry, AuditQuery, NewAuditEntry},
    store::{OpenAlertCounts, SuggestionQuery},
    suggestion::{MappingSuggestionEvent, NewMappingSuggestion},
    types::EventId,
  };

  // ── Health score ──────────────────────────────────────────────────────

  #[test]
  fn perfect_health_with_no_problems() {
    assert_eq!(health_score(0, 0), 100);
  }

  #[test]
  fn penalties_apply_per_formula() {
    assert_eq!(health_score(5, 0), 90);
    assert_eq!(health_score(0, 5), 60);
    assert_eq!(health_score(10, 5), 40);
  }

  #[test]
  fn health_never_negative_nor_above_100() {
    assert_eq!(health_score(1000, 1000), 0);
    assert_eq!(health_score(i64::MAX, i64::MAX), 0);
    assert_eq!(health_score(0, 0), 100);
  }

  // ── Aggregation over fakes ────────────────────────────────────────────

  struct FakePortfolio(PortfolioCounts);

  impl PortfolioProvider for FakePortfolio {
    type Error = Infallible;

    async fn portfolio_counts(&self, _role_key: &str) -> Result<PortfolioCounts, Infallible> {
      Ok(self.0)
    }
  }

  /// In-memory fake exercising only the read paths the aggregator uses.
  struct FakeStore {
    alerts:   Vec<AlertEvent>,
    activity: Vec<RoleActivity>,
  }

  impl FakeStore {
    fn alert(id: EventId, severity: Severity, age_hours: i64) -> AlertEvent {
      AlertEvent {
        id,
        event_type: "overdue_task".into(),
        severity,
        title: None,
        message: "task overdue".into(),
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
  }

  impl EventStore for FakeStore {
    type Error = Infallible;

    async fn emit_alert(&self, _input: NewAlert) -> Result<AlertEvent, Infallible> {
      unreachable!("not exercised by the aggregator")
    }

    async fn query_alerts(&self, _query: &AlertQuery) -> Result<Vec<AlertEvent>, Infallible> {
      Ok(self.alerts.clone())
    }

    async fn get_alert(&self, _id: EventId) -> Result<Option<AlertEvent>, Infallible> {
      unreachable!("not exercised by the aggregator")
    }

    async fn acknowledge_alert(&self, _id: EventId, _by: String) -> Result<AlertEvent, Infallible> {
      unreachable!("not exercised by the aggregator")
    }

    async fn resolve_alert(&self, _id: EventId) -> Result<AlertEvent, Infallible> {
      unreachable!("not exercised by the aggregator")
    }

    async fn count_open_alerts(&self) -> Result<OpenAlertCounts, Infallible> {
      Ok(OpenAlertCounts {
        open:     self.alerts.len() as i64,
        critical: self
          .alerts
          .iter()
          .filter(|a| a.severity == Severity::Critical)
          .count() as i64,
      })
    }

    async fn record_assignment_change(
      &self,
      _input: NewAssignmentChange,
    ) -> Result<AssignmentChangeEvent, Infallible> {
      unreachable!("not exercised by the aggregator")
    }

    async fn assignment_history(
      &self,
      _task_id: &str,
    ) -> Result<Vec<AssignmentChangeEvent>, Infallible> {
      unreachable!("not exercised by the aggregator")
    }

    async fn record_suggestion(
      &self,
      _input: NewMappingSuggestion,
    ) -> Result<MappingSuggestionEvent, Infallible> {
      unreachable!("not exercised by the aggregator")
    }

    async fn query_suggestions(
      &self,
      _query: &SuggestionQuery,
    ) -> Result<Vec<MappingSuggestionEvent>, Infallible> {
      unreachable!("not exercised by the aggregator")
    }

    async fn apply_suggestion(&self, _id: EventId) -> Result<MappingSuggestionEvent, Infallible> {
      unreachable!("not exercised by the aggregator")
    }

    async fn dismiss_suggestion(&self, _id: EventId) -> Result<MappingSuggestionEvent, Infallible> {
      unreachable!("not exercised by the aggregator")
    }
  }

  impl AuditStore for FakeStore {
    type Error = Infallible;

    async fn write_audit(&self, _input: NewAuditEntry) -> Result<AuditLogEntry, Infallible> {
      unreachable!("not exercised by the aggregator")
    }

    async fn query_audit(&self, _query: &AuditQuery) -> Result<Vec<AuditLogEntry>, Infallible> {
      unreachable!("not exercised by the aggregator")
    }

    async fn audit_counts_by_role(
      &self,
      _since: Timestamp,
    ) -> Result<Vec<RoleActivity>, Infallible> {
      Ok(self.activity.clone())
    }
  }

  #[tokio::test]
  async fn summary_composes_portfolio_and_event_reads() {
    let portfolio = FakePortfolio(PortfolioCounts {
      open_tasks:      12,
      overdue_tasks:   3,
      active_projects: 4,
    });
    let store = FakeStore {
      alerts:   vec![
        FakeStore::alert(1, Severity::Info, 1),
        FakeStore::alert(2, Severity::Critical, 2),
        FakeStore::alert(3, Severity::Warning, 48),
      ],
      activity: vec![RoleActivity { role_key: "manager".into(), count: 7 }],
    };

    let summary = build_role_summary(
      "manager",
      &portfolio,
      &store,
      2,
      Utc::now() - Duration::days(7),
    )
    .await
    .unwrap();

    assert_eq!(summary.role_key, "manager");
    assert_eq!(summary.portfolio.overdue_tasks, 3);
    assert_eq!(summary.open_alerts, 3);
    assert_eq!(summary.critical_alerts, 1);
    // 100 - (3*2 + 1*8)
    assert_eq!(summary.health_score, 86);
    assert_eq!(summary.audit_activity.len(), 1);

    // Queue is ranked (critical first) and bounded at 2.
    assert_eq!(summary.decision_queue.len(), 2);
    assert_eq!(summary.decision_queue[0].alert.id, 2);
    assert_eq!(summary.decision_queue[1].alert.id, 3);
  }

  #[tokio::test]
  async fn empty_store_yields_full_health() {
    let portfolio = FakePortfolio(PortfolioCounts::default());
    let store = FakeStore { alerts: vec![], activity: vec![] };

    let summary =
      build_role_summary("viewer", &portfolio, &store, 5, Utc::now())
        .await
        .unwrap();

    assert_eq!(summary.health_score, 100);
    assert!(summary.decision_queue.is_empty());
    assert!(summary.audit_activity.is_empty());
  }
}
