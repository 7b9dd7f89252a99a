//! JSON REST API for Siren.
//!
//! Exposes an axum [`Router`] backed by any store implementing both
//! [`siren_core::store::EventStore`] and [`siren_core::store::AuditStore`],
//! with permission and portfolio collaborators injected alongside. Auth,
//! TLS, and transport concerns are the caller's responsibility; the only
//! identity the API consumes is the `x-role` request header, which is
//! checked against the [`PermissionLookup`] before any call that writes —
//! the mutating routes, and the summary view that journals itself.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", siren_api::api_router(ctx))
//! ```

pub mod alerts;
pub mod assignments;
pub mod audit;
pub mod error;
pub mod suggestions;
pub mod summary;

use std::sync::Arc;

use axum::{
  Router,
  http::HeaderMap,
  routing::{get, post},
};
use serde::Deserialize;
use siren_core::{
  audit::NewAuditEntry,
  perms::PermissionLookup,
  store::{AuditStore, EventStore},
  summary::PortfolioProvider,
};

pub use error::ApiError;

// ─── Settings ────────────────────────────────────────────────────────────────

/// Per-deployment tuning knobs for the API layer.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
  /// Default deduplication window for `POST /alerts/dedupe`, overridable
  /// per request.
  pub dedupe_lookback_hours:  u32,
  /// Maximum decision-queue length in role summaries.
  pub decision_queue_size:    usize,
  /// How far back role summaries count audit activity.
  pub activity_window_hours:  u32,
}

impl Default for ApiSettings {
  fn default() -> Self {
    Self {
      dedupe_lookback_hours: 24,
      decision_queue_size:   10,
      activity_window_hours: 168,
    }
  }
}

// ─── Shared state ────────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct ApiContext<S, P, F> {
  pub store:     Arc<S>,
  pub perms:     Arc<P>,
  pub portfolio: Arc<F>,
  pub settings:  ApiSettings,
}

// Manual impl: `Clone` must not require `S: Clone` etc.
impl<S, P, F> Clone for ApiContext<S, P, F> {
  fn clone(&self) -> Self {
    Self {
      store:     self.store.clone(),
      perms:     self.perms.clone(),
      portfolio: self.portfolio.clone(),
      settings:  self.settings.clone(),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `ctx`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, P, F>(ctx: ApiContext<S, P, F>) -> Router<()>
where
  S: EventStore + AuditStore<Error = <S as EventStore>::Error> + 'static,
  P: PermissionLookup + 'static,
  F: PortfolioProvider + 'static,
{
  Router::new()
    // Alerts
    .route(
      "/alerts",
      get(alerts::list::<S, P, F>).post(alerts::create::<S, P, F>),
    )
    .route("/alerts/dedupe", post(alerts::dedupe::<S, P, F>))
    .route("/alerts/{id}", get(alerts::get_one::<S, P, F>))
    .route("/alerts/{id}/acknowledge", post(alerts::acknowledge::<S, P, F>))
    .route("/alerts/{id}/resolve", post(alerts::resolve::<S, P, F>))
    // Assignment changes
    .route("/assignments", post(assignments::record::<S, P, F>))
    .route(
      "/assignments/{task_id}/history",
      get(assignments::history::<S, P, F>),
    )
    // Mapping suggestions
    .route(
      "/suggestions",
      get(suggestions::list::<S, P, F>).post(suggestions::record::<S, P, F>),
    )
    .route("/suggestions/{id}/apply", post(suggestions::apply::<S, P, F>))
    .route(
      "/suggestions/{id}/dismiss",
      post(suggestions::dismiss::<S, P, F>),
    )
    // Audit journal
    .route("/audit", get(audit::list::<S, P, F>).post(audit::record::<S, P, F>))
    // Role summaries
    .route("/summary/{role_key}", get(summary::get_one::<S, P, F>))
    .with_state(ctx)
}

// ─── Role authorisation ──────────────────────────────────────────────────────

/// Resolve the caller's role from the `x-role` header and check it against
/// the permission lookup. Returns the role for audit attribution.
pub(crate) async fn require_role<P: PermissionLookup>(
  perms: &P,
  headers: &HeaderMap,
  action: &str,
) -> Result<String, ApiError> {
  let role = headers
    .get("x-role")
    .and_then(|v| v.to_str().ok())
    .map(str::trim)
    .filter(|r| !r.is_empty())
    .ok_or_else(|| {
      ApiError::PermissionDenied("missing x-role header".to_string())
    })?;

  if !perms.has_permission(role, action).await {
    return Err(ApiError::PermissionDenied(format!(
      "role {role} may not {action}"
    )));
  }
  Ok(role.to_owned())
}

/// Append an audit entry attributing `event_type` to `role`. Called after
/// each successful mutation so the journal reflects committed actions only.
pub(crate) async fn record_action<S: AuditStore>(
  store: &S,
  role: &str,
  event_type: &str,
  entity_type: &'static str,
  entity_id: String,
  project_id: Option<String>,
) -> Result<(), ApiError> {
  let mut entry = NewAuditEntry::new(event_type);
  entry.role_key = Some(role.to_owned());
  entry.entity_type = Some(entity_type.to_owned());
  entry.entity_id = Some(entity_id);
  entry.project_id = project_id;
  store.write_audit(entry).await.map_err(error::classify)?;
  Ok(())
}

// ─── Integration tests ───────────────────────────────────────────────────────
