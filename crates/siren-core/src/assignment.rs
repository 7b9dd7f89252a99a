//! Assignment-change events.
//!
//! Every reassignment of a task produces a new row; nothing is ever
//! overwritten. A task's assignment history is reconstructed by ordering its
//! rows by `changed_at`.

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  types::{EventId, Metadata, Timestamp},
};

/// A single persisted reassignment. `id` and `changed_at` are
/// server-assigned; `changed_at` is immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentChangeEvent {
  pub id:                     EventId,
  pub task_id:                String,
  pub employee_id:            String,
  pub employee_name:          String,
  pub previous_employee_id:   Option<String>,
  pub previous_employee_name: Option<String>,
  pub assigned_by:            String,
  /// Where the reassignment originated, e.g. `"manual"` or
  /// `"ai_rebalance"`.
  pub assignment_source:      String,
  pub note:                   Option<String>,
  pub metadata:               Metadata,
  pub changed_at:             Timestamp,
}

/// Input to [`crate::store::EventStore::record_assignment_change`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAssignmentChange {
  pub task_id:                String,
  pub employee_id:            String,
  pub employee_name:          String,
  pub previous_employee_id:   Option<String>,
  pub previous_employee_name: Option<String>,
  pub assigned_by:            String,
  #[serde(default = "default_source")]
  pub assignment_source:      String,
  pub note:                   Option<String>,
  #[serde(default)]
  pub metadata:               Metadata,
}

fn default_source() -> String { "manual".into() }

impl NewAssignmentChange {
  /// Convenience constructor; `assignment_source` defaults to `"manual"`.
  pub fn new(
    task_id: impl Into<String>,
    employee_id: impl Into<String>,
    employee_name: impl Into<String>,
    assigned_by: impl Into<String>,
  ) -> Self {
    Self {
      task_id:                task_id.into(),
      employee_id:            employee_id.into(),
      employee_name:          employee_name.into(),
      previous_employee_id:   None,
      previous_employee_name: None,
      assigned_by:            assigned_by.into(),
      assignment_source:      default_source(),
      note:                   None,
      metadata:               Metadata::new(),
    }
  }

  pub fn validate(&self) -> Result<()> {
    if self.task_id.trim().is_empty() {
      return Err(Error::InvalidEvent("task_id must not be empty".into()));
    }
    if self.employee_id.trim().is_empty() {
      return Err(Error::InvalidEvent("employee_id must not be empty".into()));
    }
    Ok(())
  }
}
