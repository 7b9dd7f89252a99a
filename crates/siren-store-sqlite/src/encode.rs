//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings (which sort
//! chronologically). Enum-like fields are stored as their lowercase wire
//! names. `metadata`/`payload` maps are stored as compact JSON.

use chrono::{DateTime, Utc};
use siren_core::{
  alert::{AlertEvent, AlertStatus, Severity},
  assignment::AssignmentChangeEvent,
  audit::AuditLogEntry,
  suggestion::{Confidence, MappingSuggestionEvent, SuggestionStatus},
  types::Metadata,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Severity ────────────────────────────────────────────────────────────────

pub fn encode_severity(s: Severity) -> &'static str {
  match s {
    Severity::Info => "info",
    Severity::Warning => "warning",
    Severity::Critical => "critical",
    Severity::Unknown => "unknown",
  }
}

/// Unrecognised stored severities decode to [`Severity::Unknown`], which
/// ranks after `info` — never an error, so a newer producer cannot wedge an
/// older reader.
pub fn decode_severity(s: &str) -> Severity {
  match s {
    "info" => Severity::Info,
    "warning" => Severity::Warning,
    "critical" => Severity::Critical,
    _ => Severity::Unknown,
  }
}

// ─── AlertStatus ─────────────────────────────────────────────────────────────

pub fn encode_alert_status(s: AlertStatus) -> &'static str {
  match s {
    AlertStatus::Open => "open",
    AlertStatus::Acknowledged => "acknowledged",
    AlertStatus::Resolved => "resolved",
  }
}

pub fn decode_alert_status(s: &str) -> Result<AlertStatus> {
  match s {
    "open" => Ok(AlertStatus::Open),
    "acknowledged" => Ok(AlertStatus::Acknowledged),
    "resolved" => Ok(AlertStatus::Resolved),
    other => Err(Error::Decode(format!("unknown alert status: {other:?}"))),
  }
}

// ─── SuggestionStatus ────────────────────────────────────────────────────────

pub fn encode_suggestion_status(s: SuggestionStatus) -> &'static str {
  match s {
    SuggestionStatus::Pending => "pending",
    SuggestionStatus::Applied => "applied",
    SuggestionStatus::Dismissed => "dismissed",
  }
}

pub fn decode_suggestion_status(s: &str) -> Result<SuggestionStatus> {
  match s {
    "pending" => Ok(SuggestionStatus::Pending),
    "applied" => Ok(SuggestionStatus::Applied),
    "dismissed" => Ok(SuggestionStatus::Dismissed),
    other => {
      Err(Error::Decode(format!("unknown suggestion status: {other:?}")))
    }
  }
}

// ─── Metadata ────────────────────────────────────────────────────────────────

pub fn encode_metadata(m: &Metadata) -> Result<String> {
  Ok(serde_json::to_string(m)?)
}

pub fn decode_metadata(s: &str) -> Result<Metadata> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from an `alert_events` row.
pub struct RawAlert {
  pub id:                 i64,
  pub event_type:         String,
  pub severity:           String,
  pub title:              Option<String>,
  pub message:            String,
  pub source:             Option<String>,
  pub entity_type:        Option<String>,
  pub entity_id:          Option<String>,
  pub related_project_id: Option<String>,
  pub related_task_id:    Option<String>,
  pub dedupe_key:         Option<String>,
  pub status:             String,
  pub metadata:           String,
  pub acknowledged_by:    Option<String>,
  pub acknowledged_at:    Option<String>,
  pub created_at:         String,
}

impl RawAlert {
  pub fn into_alert(self) -> Result<AlertEvent> {
    Ok(AlertEvent {
      id:                 self.id,
      event_type:         self.event_type,
      severity:           decode_severity(&self.severity),
      title:              self.title,
      message:            self.message,
      source:             self.source,
      entity_type:        self.entity_type,
      entity_id:          self.entity_id,
      related_project_id: self.related_project_id,
      related_task_id:    self.related_task_id,
      dedupe_key:         self.dedupe_key,
      status:             decode_alert_status(&self.status)?,
      metadata:           decode_metadata(&self.metadata)?,
      acknowledged_by:    self.acknowledged_by,
      acknowledged_at:    self
        .acknowledged_at
        .as_deref()
        .map(decode_dt)
        .transpose()?,
      created_at:         decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from an `assignment_changes` row.
pub struct RawAssignment {
  pub id:                     i64,
  pub task_id:                String,
  pub employee_id:            String,
  pub employee_name:          String,
  pub previous_employee_id:   Option<String>,
  pub previous_employee_name: Option<String>,
  pub assigned_by:            String,
  pub assignment_source:      String,
  pub note:                   Option<String>,
  pub metadata:               String,
  pub changed_at:             String,
}

impl RawAssignment {
  pub fn into_change(self) -> Result<AssignmentChangeEvent> {
    Ok(AssignmentChangeEvent {
      id:                     self.id,
      task_id:                self.task_id,
      employee_id:            self.employee_id,
      employee_name:          self.employee_name,
      previous_employee_id:   self.previous_employee_id,
      previous_employee_name: self.previous_employee_name,
      assigned_by:            self.assigned_by,
      assignment_source:      self.assignment_source,
      note:                   self.note,
      metadata:               decode_metadata(&self.metadata)?,
      changed_at:             decode_dt(&self.changed_at)?,
    })
  }
}

/// Raw strings read directly from a `mapping_suggestions` row.
pub struct RawSuggestion {
  pub id:               i64,
  pub project_id:       String,
  pub workday_phase_id: Option<String>,
  pub hour_entry_id:    Option<String>,
  pub task_id:          Option<String>,
  pub suggestion_type:  String,
  pub confidence:       i32,
  pub reason:           Option<String>,
  pub source_value:     Option<String>,
  pub target_value:     Option<String>,
  pub status:           String,
  pub applied_at:       Option<String>,
  pub dismissed_at:     Option<String>,
  pub created_at:       String,
}

impl RawSuggestion {
  pub fn into_suggestion(self) -> Result<MappingSuggestionEvent> {
    Ok(MappingSuggestionEvent {
      id:               self.id,
      project_id:       self.project_id,
      workday_phase_id: self.workday_phase_id,
      hour_entry_id:    self.hour_entry_id,
      task_id:          self.task_id,
      suggestion_type:  self.suggestion_type,
      confidence:       Confidence::from_ten_thousandths(self.confidence)
        .map_err(Error::Core)?,
      reason:           self.reason,
      source_value:     self.source_value,
      target_value:     self.target_value,
      status:           decode_suggestion_status(&self.status)?,
      applied_at:       self.applied_at.as_deref().map(decode_dt).transpose()?,
      dismissed_at:     self
        .dismissed_at
        .as_deref()
        .map(decode_dt)
        .transpose()?,
      created_at:       decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from an `audit_log` row.
pub struct RawAudit {
  pub id:          i64,
  pub event_type:  String,
  pub role_key:    Option<String>,
  pub actor_email: Option<String>,
  pub project_id:  Option<String>,
  pub entity_type: Option<String>,
  pub entity_id:   Option<String>,
  pub payload:     String,
  pub created_at:  String,
}

impl RawAudit {
  pub fn into_entry(self) -> Result<AuditLogEntry> {
    Ok(AuditLogEntry {
      id:          self.id,
      event_type:  self.event_type,
      role_key:    self.role_key,
      actor_email: self.actor_email,
      project_id:  self.project_id,
      entity_type: self.entity_type,
      entity_id:   self.entity_id,
      payload:     decode_metadata(&self.payload)?,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}
