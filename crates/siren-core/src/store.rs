//! The `EventStore` and `AuditStore` traits and supporting query types.
//!
//! The traits are implemented by storage backends (e.g.
//! `siren-store-sqlite`). Higher layers (`siren-api`, the deduplication gate,
//! the aggregator) depend on these abstractions, not on any concrete
//! backend.
//!
//! Every storage-touching method may block on I/O; callers must not hold any
//! in-process lock across it. Each write is a single-row, single-statement
//! operation, so there are no partial multi-row writes to clean up. Every
//! successful write is visible to reads issued after it returns.

use std::future::Future;

use crate::{
  alert::{AlertEvent, AlertStatus, NewAlert},
  assignment::{AssignmentChangeEvent, NewAssignmentChange},
  audit::{AuditLogEntry, AuditQuery, NewAuditEntry, RoleActivity},
  suggestion::{MappingSuggestionEvent, NewMappingSuggestion, SuggestionStatus},
  types::{EventId, Timestamp},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`EventStore::query_alerts`]. Only the filters a caller
/// sets are applied — there is no implicit filtering.
#[derive(Debug, Clone, Default)]
pub struct AlertQuery {
  /// Restrict to alerts in any of these statuses. Empty means all.
  pub statuses:           Vec<AlertStatus>,
  pub dedupe_key:         Option<String>,
  /// Lower bound on `created_at` (inclusive).
  pub created_after:      Option<Timestamp>,
  pub related_project_id: Option<String>,
  /// Result cap, newest-first. `None` returns every match — the aggregator
  /// relies on this to rank the full open set. Backends clamp explicit
  /// values to 500.
  pub limit:              Option<usize>,
}

/// Parameters for [`EventStore::query_suggestions`].
#[derive(Debug, Clone, Default)]
pub struct SuggestionQuery {
  pub project_id: Option<String>,
  pub status:     Option<SuggestionStatus>,
  pub limit:      Option<usize>,
}

/// Open-alert counts for the aggregator: all non-resolved alerts, and the
/// `critical` subset of them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenAlertCounts {
  pub open:     i64,
  pub critical: i64,
}

// ─── EventStore ──────────────────────────────────────────────────────────────

/// Abstraction over the durable event store.
///
/// Owns the lifecycle of alert, assignment-change, and mapping-suggestion
/// rows. Alert and suggestion rows mutate only through the explicit
/// transition methods below; assignment changes are strictly append-only.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait EventStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Alerts ────────────────────────────────────────────────────────────

  /// Validate and persist a new alert with server-assigned id, `open`
  /// status, and creation timestamp.
  fn emit_alert(
    &self,
    input: NewAlert,
  ) -> impl Future<Output = Result<AlertEvent, Self::Error>> + Send + '_;

  /// Return alerts matching `query`, newest-first. Capped at its limit when
  /// one is set; unbounded otherwise.
  fn query_alerts<'a>(
    &'a self,
    query: &'a AlertQuery,
  ) -> impl Future<Output = Result<Vec<AlertEvent>, Self::Error>> + Send + 'a;

  /// Retrieve a single alert by id. Returns `None` if not found.
  fn get_alert(
    &self,
    id: EventId,
  ) -> impl Future<Output = Result<Option<AlertEvent>, Self::Error>> + Send + '_;

  /// `open → acknowledged`. Sets `acknowledged_by`/`acknowledged_at`
  /// together, exactly once. Errors if the alert does not exist or is not
  /// `open`.
  fn acknowledge_alert(
    &self,
    id: EventId,
    by: String,
  ) -> impl Future<Output = Result<AlertEvent, Self::Error>> + Send + '_;

  /// `open → resolved` or `acknowledged → resolved`. Errors if the alert
  /// does not exist or is already resolved.
  fn resolve_alert(
    &self,
    id: EventId,
  ) -> impl Future<Output = Result<AlertEvent, Self::Error>> + Send + '_;

  /// Open/critical alert counts for the role-scoped aggregator.
  fn count_open_alerts(
    &self,
  ) -> impl Future<Output = Result<OpenAlertCounts, Self::Error>> + Send + '_;

  // ── Assignment changes — append-only ──────────────────────────────────

  /// Persist one reassignment with a server-assigned `changed_at`.
  fn record_assignment_change(
    &self,
    input: NewAssignmentChange,
  ) -> impl Future<Output = Result<AssignmentChangeEvent, Self::Error>> + Send + '_;

  /// All reassignments for `task_id` in chronological order, oldest first.
  fn assignment_history<'a>(
    &'a self,
    task_id: &'a str,
  ) -> impl Future<Output = Result<Vec<AssignmentChangeEvent>, Self::Error>> + Send + 'a;

  // ── Mapping suggestions ───────────────────────────────────────────────

  /// Validate and persist a new suggestion in `pending` status.
  fn record_suggestion(
    &self,
    input: NewMappingSuggestion,
  ) -> impl Future<Output = Result<MappingSuggestionEvent, Self::Error>> + Send + '_;

  /// Return suggestions matching `query`, newest-first.
  fn query_suggestions<'a>(
    &'a self,
    query: &'a SuggestionQuery,
  ) -> impl Future<Output = Result<Vec<MappingSuggestionEvent>, Self::Error>> + Send + 'a;

  /// `pending → applied`; sets `applied_at`. Terminal.
  fn apply_suggestion(
    &self,
    id: EventId,
  ) -> impl Future<Output = Result<MappingSuggestionEvent, Self::Error>> + Send + '_;

  /// `pending → dismissed`; sets `dismissed_at`. Terminal.
  fn dismiss_suggestion(
    &self,
    id: EventId,
  ) -> impl Future<Output = Result<MappingSuggestionEvent, Self::Error>> + Send + '_;
}

// ─── AuditStore ──────────────────────────────────────────────────────────────

/// Abstraction over the append-only audit journal.
///
/// A parallel, independent write path with no deduplication. Its schema
/// bootstrap is independent of the event store's so the two surfaces can be
/// deployed separately.
pub trait AuditStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Append one entry with a server-assigned id and timestamp. Always
  /// appends — there is no dedupe, no status, and no update path.
  fn write_audit(
    &self,
    input: NewAuditEntry,
  ) -> impl Future<Output = Result<AuditLogEntry, Self::Error>> + Send + '_;

  /// Return entries matching `query`, newest-first. Capped at its limit when
  /// one is set; unbounded otherwise.
  fn query_audit<'a>(
    &'a self,
    query: &'a AuditQuery,
  ) -> impl Future<Output = Result<Vec<AuditLogEntry>, Self::Error>> + Send + 'a;

  /// Entry counts grouped by `role_key` for entries at or after `since`.
  /// Entries with no role are excluded.
  fn audit_counts_by_role(
    &self,
    since: Timestamp,
  ) -> impl Future<Output = Result<Vec<RoleActivity>, Self::Error>> + Send + '_;
}
