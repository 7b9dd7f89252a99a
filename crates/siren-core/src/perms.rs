//! The role-permission collaborator contract.
//!
//! Consulted by the enclosing service layer before any mutating call is
//! honoured. The lookup itself lives outside this core — the server binary
//! ships a config-driven table; a real deployment may back it with whatever
//! the surrounding application uses.

use std::future::Future;

/// Outbound permission check: may `role` perform `action`?
pub trait PermissionLookup: Send + Sync {
  fn has_permission<'a>(
    &'a self,
    role: &'a str,
    action: &'a str,
  ) -> impl Future<Output = bool> + Send + 'a;
}

/// Well-known action names checked before each mutating operation.
pub mod actions {
  pub const EMIT_ALERT: &str = "alert.emit";
  pub const TRANSITION_ALERT: &str = "alert.transition";
  pub const RECORD_ASSIGNMENT: &str = "assignment.record";
  pub const RECORD_SUGGESTION: &str = "suggestion.record";
  pub const REVIEW_SUGGESTION: &str = "suggestion.review";
  pub const WRITE_AUDIT: &str = "audit.write";
  /// Viewing a summary journals a `summary_viewed` entry, so it is gated
  /// like the mutating operations.
  pub const VIEW_SUMMARY: &str = "summary.view";
}
