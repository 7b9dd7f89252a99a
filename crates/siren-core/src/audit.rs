//! Audit journal entries.
//!
//! A strictly append-only forensic trail recording who did what: role, actor,
//! entity, payload. Independent of alert semantics — no deduplication, no
//! status, and no update or delete path exists anywhere in the core. Never
//! used as a source of current state.

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  types::{EventId, Metadata, Timestamp},
};

/// A persisted audit entry. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
  pub id:          EventId,
  pub event_type:  String,
  pub role_key:    Option<String>,
  pub actor_email: Option<String>,
  pub project_id:  Option<String>,
  pub entity_type: Option<String>,
  pub entity_id:   Option<String>,
  pub payload:     Metadata,
  pub created_at:  Timestamp,
}

/// Input to [`crate::store::AuditStore::write_audit`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAuditEntry {
  pub event_type:  String,
  pub role_key:    Option<String>,
  pub actor_email: Option<String>,
  pub project_id:  Option<String>,
  pub entity_type: Option<String>,
  pub entity_id:   Option<String>,
  #[serde(default)]
  pub payload:     Metadata,
}

impl NewAuditEntry {
  /// Convenience constructor with all optional fields unset.
  pub fn new(event_type: impl Into<String>) -> Self {
    Self {
      event_type:  event_type.into(),
      role_key:    None,
      actor_email: None,
      project_id:  None,
      entity_type: None,
      entity_id:   None,
      payload:     Metadata::new(),
    }
  }

  pub fn validate(&self) -> Result<()> {
    if self.event_type.trim().is_empty() {
      return Err(Error::InvalidEvent("event_type must not be empty".into()));
    }
    Ok(())
  }
}

/// Filter parameters for [`crate::store::AuditStore::query_audit`].
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
  pub event_type:    Option<String>,
  pub role_key:      Option<String>,
  pub actor_email:   Option<String>,
  pub project_id:    Option<String>,
  pub created_after: Option<Timestamp>,
  pub limit:         Option<usize>,
}

/// One row of [`crate::store::AuditStore::audit_counts_by_role`] output:
/// how many entries each role wrote in the window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleActivity {
  pub role_key: String,
  pub count:    i64,
}
