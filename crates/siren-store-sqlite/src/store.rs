//! [`SqliteStore`] — the SQLite implementation of [`EventStore`] and
//! [`AuditStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, params_from_iter, types::Value};

use siren_core::{
  alert::{AlertEvent, AlertStatus, NewAlert},
  assignment::{AssignmentChangeEvent, NewAssignmentChange},
  audit::{AuditLogEntry, AuditQuery, NewAuditEntry, RoleActivity},
  store::{AlertQuery, AuditStore, EventStore, OpenAlertCounts, SuggestionQuery},
  suggestion::{
    MappingSuggestionEvent, NewMappingSuggestion, SuggestionStatus,
  },
  types::{EventId, Timestamp},
};

use crate::{
  Error, Result,
  encode::{
    RawAlert, RawAssignment, RawAudit, RawSuggestion, encode_alert_status,
    encode_dt, encode_metadata, encode_severity, encode_suggestion_status,
  },
  schema::{AUDIT_SCHEMA, EVENT_SCHEMA},
};

// ─── Column lists ────────────────────────────────────────────────────────────

const ALERT_COLUMNS: &str = "\
    id, event_type, severity, title, message, source, entity_type, \
    entity_id, related_project_id, related_task_id, dedupe_key, status, \
    metadata, acknowledged_by, acknowledged_at, created_at";

const ASSIGNMENT_COLUMNS: &str = "\
    id, task_id, employee_id, employee_name, previous_employee_id, \
    previous_employee_name, assigned_by, assignment_source, note, metadata, \
    changed_at";

const SUGGESTION_COLUMNS: &str = "\
    id, project_id, workday_phase_id, hour_entry_id, task_id, \
    suggestion_type, confidence, reason, source_value, target_value, \
    status, applied_at, dismissed_at, created_at";

const AUDIT_COLUMNS: &str = "\
    id, event_type, role_key, actor_email, project_id, entity_type, \
    entity_id, payload, created_at";

// ─── Row mappers ─────────────────────────────────────────────────────────────

fn alert_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawAlert> {
  Ok(RawAlert {
    id:                 row.get(0)?,
    event_type:         row.get(1)?,
    severity:           row.get(2)?,
    title:              row.get(3)?,
    message:            row.get(4)?,
    source:             row.get(5)?,
    entity_type:        row.get(6)?,
    entity_id:          row.get(7)?,
    related_project_id: row.get(8)?,
    related_task_id:    row.get(9)?,
    dedupe_key:         row.get(10)?,
    status:             row.get(11)?,
    metadata:           row.get(12)?,
    acknowledged_by:    row.get(13)?,
    acknowledged_at:    row.get(14)?,
    created_at:         row.get(15)?,
  })
}

fn assignment_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawAssignment> {
  Ok(RawAssignment {
    id:                     row.get(0)?,
    task_id:                row.get(1)?,
    employee_id:            row.get(2)?,
    employee_name:          row.get(3)?,
    previous_employee_id:   row.get(4)?,
    previous_employee_name: row.get(5)?,
    assigned_by:            row.get(6)?,
    assignment_source:      row.get(7)?,
    note:                   row.get(8)?,
    metadata:               row.get(9)?,
    changed_at:             row.get(10)?,
  })
}

fn suggestion_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawSuggestion> {
  Ok(RawSuggestion {
    id:               row.get(0)?,
    project_id:       row.get(1)?,
    workday_phase_id: row.get(2)?,
    hour_entry_id:    row.get(3)?,
    task_id:          row.get(4)?,
    suggestion_type:  row.get(5)?,
    confidence:       row.get(6)?,
    reason:           row.get(7)?,
    source_value:     row.get(8)?,
    target_value:     row.get(9)?,
    status:           row.get(10)?,
    applied_at:       row.get(11)?,
    dismissed_at:     row.get(12)?,
    created_at:       row.get(13)?,
  })
}

fn audit_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawAudit> {
  Ok(RawAudit {
    id:          row.get(0)?,
    event_type:  row.get(1)?,
    role_key:    row.get(2)?,
    actor_email: row.get(3)?,
    project_id:  row.get(4)?,
    entity_type: row.get(5)?,
    entity_id:   row.get(6)?,
    payload:     row.get(7)?,
    created_at:  row.get(8)?,
  })
}

fn status_label(status: AlertStatus) -> &'static str {
  encode_alert_status(status)
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Siren store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. Schema
/// bootstrap runs at construction: a failed bootstrap fails `open`, nothing
/// is memoised, and the caller's retry re-runs the DDL.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run both schema bootstraps.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.ensure_event_schema().await?;
    store.ensure_audit_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.ensure_event_schema().await?;
    store.ensure_audit_schema().await?;
    Ok(store)
  }

  /// Idempotent DDL for the event-store tables. Safe to call from multiple
  /// concurrent first-callers.
  pub async fn ensure_event_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(EVENT_SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Idempotent DDL for the audit journal, independent of the event
  /// store's bootstrap.
  pub async fn ensure_audit_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(AUDIT_SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Flip an alert's status with a guard on the expected current status.
  /// Returns the number of rows changed (0 means a concurrent transition
  /// won).
  async fn guarded_alert_update(
    &self,
    sql: &'static str,
    binds: Vec<Value>,
  ) -> Result<usize> {
    let changed = self
      .conn
      .call(move |conn| Ok(conn.execute(sql, params_from_iter(binds))?))
      .await?;
    Ok(changed)
  }

  /// Re-read an alert's status to report the precise transition error after
  /// a guarded update changed no rows.
  async fn transition_conflict(&self, id: EventId) -> Error {
    match self.get_alert(id).await {
      Ok(Some(current)) => Error::Core(siren_core::Error::InvalidTransition {
        entity: "alert",
        id,
        state:  status_label(current.status),
      }),
      Ok(None) => {
        Error::Core(siren_core::Error::NotFound { entity: "alert", id })
      }
      Err(e) => e,
    }
  }
}

// ─── EventStore impl ─────────────────────────────────────────────────────────

impl EventStore for SqliteStore {
  type Error = Error;

  // ── Alerts ────────────────────────────────────────────────────────────

  async fn emit_alert(&self, input: NewAlert) -> Result<AlertEvent> {
    input.validate().map_err(Error::Core)?;

    let created_at = Utc::now();
    let severity_str = encode_severity(input.severity).to_owned();
    let metadata_str = encode_metadata(&input.metadata)?;
    let created_str = encode_dt(created_at);
    let moved = input.clone();

    let id: i64 = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO alert_events (
             event_type, severity, title, message, source, entity_type,
             entity_id, related_project_id, related_task_id, dedupe_key,
             status, metadata, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 'open', ?11, ?12)",
          rusqlite::params![
            moved.event_type,
            severity_str,
            moved.title,
            moved.message,
            moved.source,
            moved.entity_type,
            moved.entity_id,
            moved.related_project_id,
            moved.related_task_id,
            moved.dedupe_key,
            metadata_str,
            created_str,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(AlertEvent {
      id,
      event_type: input.event_type,
      severity: input.severity,
      title: input.title,
      message: input.message,
      source: input.source,
      entity_type: input.entity_type,
      entity_id: input.entity_id,
      related_project_id: input.related_project_id,
      related_task_id: input.related_task_id,
      dedupe_key: input.dedupe_key,
      status: AlertStatus::Open,
      metadata: input.metadata,
      acknowledged_by: None,
      acknowledged_at: None,
      created_at,
    })
  }

  async fn query_alerts(&self, query: &AlertQuery) -> Result<Vec<AlertEvent>> {
    let statuses: Vec<String> = query
      .statuses
      .iter()
      .map(|s| encode_alert_status(*s).to_owned())
      .collect();
    let dedupe_key = query.dedupe_key.clone();
    let created_after = query.created_after.map(encode_dt);
    let related_project_id = query.related_project_id.clone();
    let limit = query.limit.map(|l| l.min(500) as i64);

    let raws: Vec<RawAlert> = self
      .conn
      .call(move |conn| {
        let mut conds: Vec<String> = vec![];
        let mut binds: Vec<Value> = vec![];

        if !statuses.is_empty() {
          let marks = vec!["?"; statuses.len()].join(", ");
          conds.push(format!("status IN ({marks})"));
          binds.extend(statuses.into_iter().map(Value::from));
        }
        if let Some(key) = dedupe_key {
          conds.push("dedupe_key = ?".into());
          binds.push(Value::from(key));
        }
        if let Some(after) = created_after {
          conds.push("created_at >= ?".into());
          binds.push(Value::from(after));
        }
        if let Some(project) = related_project_id {
          conds.push("related_project_id = ?".into());
          binds.push(Value::from(project));
        }

        let where_clause = if conds.is_empty() {
          String::new()
        } else {
          format!("WHERE {}", conds.join(" AND "))
        };

        let mut sql = format!(
          "SELECT {ALERT_COLUMNS} FROM alert_events {where_clause}
           ORDER BY created_at DESC, id DESC"
        );
        if let Some(limit) = limit {
          sql.push_str(" LIMIT ?");
          binds.push(Value::from(limit));
        }

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(binds), alert_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAlert::into_alert).collect()
  }

  async fn get_alert(&self, id: EventId) -> Result<Option<AlertEvent>> {
    let raw: Option<RawAlert> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {ALERT_COLUMNS} FROM alert_events WHERE id = ?1"),
              rusqlite::params![id],
              alert_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAlert::into_alert).transpose()
  }

  async fn acknowledge_alert(&self, id: EventId, by: String) -> Result<AlertEvent> {
    let existing = self.get_alert(id).await?.ok_or(Error::Core(
      siren_core::Error::NotFound { entity: "alert", id },
    ))?;
    if existing.status != AlertStatus::Open {
      return Err(Error::Core(siren_core::Error::InvalidTransition {
        entity: "alert",
        id,
        state:  status_label(existing.status),
      }));
    }

    let now = Utc::now();
    let changed = self
      .guarded_alert_update(
        "UPDATE alert_events
         SET status = 'acknowledged', acknowledged_by = ?1, acknowledged_at = ?2
         WHERE id = ?3 AND status = 'open'",
        vec![
          Value::from(by.clone()),
          Value::from(encode_dt(now)),
          Value::from(id),
        ],
      )
      .await?;
    if changed == 0 {
      return Err(self.transition_conflict(id).await);
    }

    Ok(AlertEvent {
      status: AlertStatus::Acknowledged,
      acknowledged_by: Some(by),
      acknowledged_at: Some(now),
      ..existing
    })
  }

  async fn resolve_alert(&self, id: EventId) -> Result<AlertEvent> {
    let existing = self.get_alert(id).await?.ok_or(Error::Core(
      siren_core::Error::NotFound { entity: "alert", id },
    ))?;
    if existing.status == AlertStatus::Resolved {
      return Err(Error::Core(siren_core::Error::InvalidTransition {
        entity: "alert",
        id,
        state:  "resolved",
      }));
    }

    let changed = self
      .guarded_alert_update(
        "UPDATE alert_events SET status = 'resolved'
         WHERE id = ?1 AND status IN ('open', 'acknowledged')",
        vec![Value::from(id)],
      )
      .await?;
    if changed == 0 {
      return Err(self.transition_conflict(id).await);
    }

    Ok(AlertEvent { status: AlertStatus::Resolved, ..existing })
  }

  async fn count_open_alerts(&self) -> Result<OpenAlertCounts> {
    let (open, critical): (i64, i64) = self
      .conn
      .call(|conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*),
                  COALESCE(SUM(CASE WHEN severity = 'critical' THEN 1 ELSE 0 END), 0)
           FROM alert_events
           WHERE status IN ('open', 'acknowledged')",
          [],
          |row| Ok((row.get(0)?, row.get(1)?)),
        )?)
      })
      .await?;

    Ok(OpenAlertCounts { open, critical })
  }

  // ── Assignment changes — append-only ──────────────────────────────────

  async fn record_assignment_change(
    &self,
    input: NewAssignmentChange,
  ) -> Result<AssignmentChangeEvent> {
    input.validate().map_err(Error::Core)?;

    let changed_at = Utc::now();
    let metadata_str = encode_metadata(&input.metadata)?;
    let changed_str = encode_dt(changed_at);
    let moved = input.clone();

    let id: i64 = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO assignment_changes (
             task_id, employee_id, employee_name, previous_employee_id,
             previous_employee_name, assigned_by, assignment_source, note,
             metadata, changed_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            moved.task_id,
            moved.employee_id,
            moved.employee_name,
            moved.previous_employee_id,
            moved.previous_employee_name,
            moved.assigned_by,
            moved.assignment_source,
            moved.note,
            metadata_str,
            changed_str,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(AssignmentChangeEvent {
      id,
      task_id: input.task_id,
      employee_id: input.employee_id,
      employee_name: input.employee_name,
      previous_employee_id: input.previous_employee_id,
      previous_employee_name: input.previous_employee_name,
      assigned_by: input.assigned_by,
      assignment_source: input.assignment_source,
      note: input.note,
      metadata: input.metadata,
      changed_at,
    })
  }

  async fn assignment_history(
    &self,
    task_id: &str,
  ) -> Result<Vec<AssignmentChangeEvent>> {
    let task = task_id.to_owned();

    let raws: Vec<RawAssignment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ASSIGNMENT_COLUMNS} FROM assignment_changes
           WHERE task_id = ?1
           ORDER BY changed_at ASC, id ASC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![task], assignment_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAssignment::into_change).collect()
  }

  // ── Mapping suggestions ───────────────────────────────────────────────

  async fn record_suggestion(
    &self,
    input: NewMappingSuggestion,
  ) -> Result<MappingSuggestionEvent> {
    input.validate().map_err(Error::Core)?;

    let created_at = Utc::now();
    let created_str = encode_dt(created_at);
    let confidence_raw = input.confidence.ten_thousandths();
    let moved = input.clone();

    let id: i64 = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO mapping_suggestions (
             project_id, workday_phase_id, hour_entry_id, task_id,
             suggestion_type, confidence, reason, source_value, target_value,
             status, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 'pending', ?10)",
          rusqlite::params![
            moved.project_id,
            moved.workday_phase_id,
            moved.hour_entry_id,
            moved.task_id,
            moved.suggestion_type,
            confidence_raw,
            moved.reason,
            moved.source_value,
            moved.target_value,
            created_str,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(MappingSuggestionEvent {
      id,
      project_id: input.project_id,
      workday_phase_id: input.workday_phase_id,
      hour_entry_id: input.hour_entry_id,
      task_id: input.task_id,
      suggestion_type: input.suggestion_type,
      confidence: input.confidence,
      reason: input.reason,
      source_value: input.source_value,
      target_value: input.target_value,
      status: SuggestionStatus::Pending,
      applied_at: None,
      dismissed_at: None,
      created_at,
    })
  }

  async fn query_suggestions(
    &self,
    query: &SuggestionQuery,
  ) -> Result<Vec<MappingSuggestionEvent>> {
    let project_id = query.project_id.clone();
    let status = query.status.map(encode_suggestion_status);
    let limit = query.limit.map(|l| l.min(500) as i64);

    let raws: Vec<RawSuggestion> = self
      .conn
      .call(move |conn| {
        let mut conds: Vec<&'static str> = vec![];
        let mut binds: Vec<Value> = vec![];

        if let Some(project) = project_id {
          conds.push("project_id = ?");
          binds.push(Value::from(project));
        }
        if let Some(status) = status {
          conds.push("status = ?");
          binds.push(Value::from(status.to_owned()));
        }

        let where_clause = if conds.is_empty() {
          String::new()
        } else {
          format!("WHERE {}", conds.join(" AND "))
        };

        let mut sql = format!(
          "SELECT {SUGGESTION_COLUMNS} FROM mapping_suggestions {where_clause}
           ORDER BY created_at DESC, id DESC"
        );
        if let Some(limit) = limit {
          sql.push_str(" LIMIT ?");
          binds.push(Value::from(limit));
        }

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(binds), suggestion_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(RawSuggestion::into_suggestion)
      .collect()
  }

  async fn apply_suggestion(&self, id: EventId) -> Result<MappingSuggestionEvent> {
    self
      .finish_suggestion(
        id,
        "UPDATE mapping_suggestions
         SET status = 'applied', applied_at = ?1
         WHERE id = ?2 AND status = 'pending'",
      )
      .await
  }

  async fn dismiss_suggestion(&self, id: EventId) -> Result<MappingSuggestionEvent> {
    self
      .finish_suggestion(
        id,
        "UPDATE mapping_suggestions
         SET status = 'dismissed', dismissed_at = ?1
         WHERE id = ?2 AND status = 'pending'",
      )
      .await
  }
}

impl SqliteStore {
  /// Shared guts of the two terminal suggestion transitions. The WHERE
  /// guard keeps `applied` and `dismissed` mutually exclusive even under
  /// concurrent reviewers.
  async fn finish_suggestion(
    &self,
    id: EventId,
    sql: &'static str,
  ) -> Result<MappingSuggestionEvent> {
    let now = Utc::now();
    let now_str = encode_dt(now);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(sql, rusqlite::params![now_str, id])?)
      })
      .await?;

    if changed == 0 {
      let existing: Option<RawSuggestion> = self
        .conn
        .call(move |conn| {
          Ok(
            conn
              .query_row(
                &format!(
                  "SELECT {SUGGESTION_COLUMNS} FROM mapping_suggestions WHERE id = ?1"
                ),
                rusqlite::params![id],
                suggestion_row,
              )
              .optional()?,
          )
        })
        .await?;

      return match existing {
        None => Err(Error::Core(siren_core::Error::NotFound {
          entity: "suggestion",
          id,
        })),
        Some(raw) => {
          let current = raw.into_suggestion()?;
          Err(Error::Core(siren_core::Error::InvalidTransition {
            entity: "suggestion",
            id,
            state:  encode_suggestion_status(current.status),
          }))
        }
      };
    }

    let raw: RawSuggestion = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          &format!(
            "SELECT {SUGGESTION_COLUMNS} FROM mapping_suggestions WHERE id = ?1"
          ),
          rusqlite::params![id],
          suggestion_row,
        )?)
      })
      .await?;

    raw.into_suggestion()
  }
}

// ─── AuditStore impl ─────────────────────────────────────────────────────────

impl AuditStore for SqliteStore {
  type Error = Error;

  async fn write_audit(&self, input: NewAuditEntry) -> Result<AuditLogEntry> {
    input.validate().map_err(Error::Core)?;

    let created_at = Utc::now();
    let payload_str = encode_metadata(&input.payload)?;
    let created_str = encode_dt(created_at);
    let moved = input.clone();

    let id: i64 = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO audit_log (
             event_type, role_key, actor_email, project_id, entity_type,
             entity_id, payload, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            moved.event_type,
            moved.role_key,
            moved.actor_email,
            moved.project_id,
            moved.entity_type,
            moved.entity_id,
            payload_str,
            created_str,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(AuditLogEntry {
      id,
      event_type: input.event_type,
      role_key: input.role_key,
      actor_email: input.actor_email,
      project_id: input.project_id,
      entity_type: input.entity_type,
      entity_id: input.entity_id,
      payload: input.payload,
      created_at,
    })
  }

  async fn query_audit(&self, query: &AuditQuery) -> Result<Vec<AuditLogEntry>> {
    let event_type = query.event_type.clone();
    let role_key = query.role_key.clone();
    let actor_email = query.actor_email.clone();
    let project_id = query.project_id.clone();
    let created_after = query.created_after.map(encode_dt);
    let limit = query.limit.map(|l| l.min(500) as i64);

    let raws: Vec<RawAudit> = self
      .conn
      .call(move |conn| {
        let mut conds: Vec<&'static str> = vec![];
        let mut binds: Vec<Value> = vec![];

        if let Some(v) = event_type {
          conds.push("event_type = ?");
          binds.push(Value::from(v));
        }
        if let Some(v) = role_key {
          conds.push("role_key = ?");
          binds.push(Value::from(v));
        }
        if let Some(v) = actor_email {
          conds.push("actor_email = ?");
          binds.push(Value::from(v));
        }
        if let Some(v) = project_id {
          conds.push("project_id = ?");
          binds.push(Value::from(v));
        }
        if let Some(v) = created_after {
          conds.push("created_at >= ?");
          binds.push(Value::from(v));
        }

        let where_clause = if conds.is_empty() {
          String::new()
        } else {
          format!("WHERE {}", conds.join(" AND "))
        };

        let mut sql = format!(
          "SELECT {AUDIT_COLUMNS} FROM audit_log {where_clause}
           ORDER BY created_at DESC, id DESC"
        );
        if let Some(limit) = limit {
          sql.push_str(" LIMIT ?");
          binds.push(Value::from(limit));
        }

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(binds), audit_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAudit::into_entry).collect()
  }

  async fn audit_counts_by_role(&self, since: Timestamp) -> Result<Vec<RoleActivity>> {
    let since_str = encode_dt(since);

    let rows: Vec<RoleActivity> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT role_key, COUNT(*) FROM audit_log
           WHERE role_key IS NOT NULL AND created_at >= ?1
           GROUP BY role_key
           ORDER BY COUNT(*) DESC, role_key ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![since_str], |row| {
            Ok(RoleActivity { role_key: row.get(0)?, count: row.get(1)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(rows)
  }
}

