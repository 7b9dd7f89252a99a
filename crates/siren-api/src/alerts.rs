//! Handlers for `/alerts` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/alerts` | Optional `status`, `dedupe_key`, `project_id`, `created_after`, `limit` |
//! | `GET`  | `/alerts/:id` | Single alert |
//! | `POST` | `/alerts` | Body: [`NewAlert`]; always inserts; returns 201 |
//! | `POST` | `/alerts/dedupe` | Body: [`DedupeBody`]; 201 when created, 200 when suppressed |
//! | `POST` | `/alerts/:id/acknowledge` | Body: `{"by":"..."}` |
//! | `POST` | `/alerts/:id/resolve` | No body |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode},
  response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use siren_core::{
  alert::{AlertEvent, AlertStatus, NewAlert},
  dedupe::{EmitOutcome, emit_if_absent},
  perms::{PermissionLookup, actions},
  store::{AlertQuery, AuditStore, EventStore},
  summary::PortfolioProvider,
  types::EventId,
};

use crate::{ApiContext, error::ApiError, error::classify, record_action, require_role};

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// If set, restrict to alerts in this status.
  pub status:        Option<AlertStatus>,
  pub dedupe_key:    Option<String>,
  pub project_id:    Option<String>,
  /// Lower bound on `created_at` (inclusive, RFC 3339).
  pub created_after: Option<DateTime<Utc>>,
  pub limit:         Option<usize>,
}

/// `GET /alerts[?status=open][&project_id=...][&limit=...]`
pub async fn list<S, P, F>(
  State(ctx): State<ApiContext<S, P, F>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<AlertEvent>>, ApiError>
where
  S: EventStore + AuditStore<Error = <S as EventStore>::Error> + 'static,
  P: PermissionLookup + 'static,
  F: PortfolioProvider + 'static,
{
  let query = AlertQuery {
    statuses:           params.status.into_iter().collect(),
    dedupe_key:         params.dedupe_key,
    created_after:      params.created_after,
    related_project_id: params.project_id,
    // List endpoints always page; unbounded reads are for in-process callers.
    limit:              Some(params.limit.unwrap_or(50)),
  };
  let alerts = ctx.store.query_alerts(&query).await.map_err(classify)?;
  Ok(Json(alerts))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /alerts/:id`
pub async fn get_one<S, P, F>(
  State(ctx): State<ApiContext<S, P, F>>,
  Path(id): Path<EventId>,
) -> Result<Json<AlertEvent>, ApiError>
where
  S: EventStore + AuditStore<Error = <S as EventStore>::Error> + 'static,
  P: PermissionLookup + 'static,
  F: PortfolioProvider + 'static,
{
  let alert = ctx
    .store
    .get_alert(id)
    .await
    .map_err(classify)?
    .ok_or_else(|| ApiError::NotFound(format!("alert {id} not found")))?;
  Ok(Json(alert))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /alerts` — unconditional insert, no deduplication. Returns 201 +
/// the stored alert.
pub async fn create<S, P, F>(
  State(ctx): State<ApiContext<S, P, F>>,
  headers: HeaderMap,
  Json(body): Json<NewAlert>,
) -> Result<impl IntoResponse, ApiError>
where
  S: EventStore + AuditStore<Error = <S as EventStore>::Error> + 'static,
  P: PermissionLookup + 'static,
  F: PortfolioProvider + 'static,
{
  let role = require_role(&*ctx.perms, &headers, actions::EMIT_ALERT).await?;

  let alert = ctx.store.emit_alert(body).await.map_err(classify)?;
  record_action(
    &*ctx.store,
    &role,
    "alert_emitted",
    "alert",
    alert.id.to_string(),
    alert.related_project_id.clone(),
  )
  .await?;

  Ok((StatusCode::CREATED, Json(alert)))
}

// ─── Deduplicated create ─────────────────────────────────────────────────────

/// JSON body accepted by `POST /alerts/dedupe`: an alert plus an optional
/// per-request lookback override.
#[derive(Debug, Deserialize)]
pub struct DedupeBody {
  #[serde(flatten)]
  pub alert:          NewAlert,
  pub lookback_hours: Option<u32>,
}

/// `POST /alerts/dedupe` — insert through the deduplication gate.
///
/// Returns 201 + the alert when inserted, or 200 + `{"suppressed": true}`
/// when an equivalent recent alert already exists.
pub async fn dedupe<S, P, F>(
  State(ctx): State<ApiContext<S, P, F>>,
  headers: HeaderMap,
  Json(body): Json<DedupeBody>,
) -> Result<Response, ApiError>
where
  S: EventStore + AuditStore<Error = <S as EventStore>::Error> + 'static,
  P: PermissionLookup + 'static,
  F: PortfolioProvider + 'static,
{
  let role = require_role(&*ctx.perms, &headers, actions::EMIT_ALERT).await?;
  let lookback = body
    .lookback_hours
    .unwrap_or(ctx.settings.dedupe_lookback_hours);

  let outcome = emit_if_absent(&*ctx.store, body.alert, lookback)
    .await
    .map_err(classify)?;

  match outcome {
    EmitOutcome::Created(alert) => {
      record_action(
        &*ctx.store,
        &role,
        "alert_emitted",
        "alert",
        alert.id.to_string(),
        alert.related_project_id.clone(),
      )
      .await?;
      Ok((StatusCode::CREATED, Json(alert)).into_response())
    }
    EmitOutcome::Suppressed => {
      Ok((StatusCode::OK, Json(json!({ "suppressed": true }))).into_response())
    }
  }
}

// ─── Transitions ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AcknowledgeBody {
  /// Who is acknowledging, e.g. an email address.
  pub by: String,
}

/// `POST /alerts/:id/acknowledge` — body: `{"by":"..."}`.
pub async fn acknowledge<S, P, F>(
  State(ctx): State<ApiContext<S, P, F>>,
  Path(id): Path<EventId>,
  headers: HeaderMap,
  Json(body): Json<AcknowledgeBody>,
) -> Result<Json<AlertEvent>, ApiError>
where
  S: EventStore + AuditStore<Error = <S as EventStore>::Error> + 'static,
  P: PermissionLookup + 'static,
  F: PortfolioProvider + 'static,
{
  let role =
    require_role(&*ctx.perms, &headers, actions::TRANSITION_ALERT).await?;
  if body.by.trim().is_empty() {
    return Err(ApiError::BadRequest("by must not be empty".to_string()));
  }

  let alert = ctx
    .store
    .acknowledge_alert(id, body.by)
    .await
    .map_err(classify)?;
  record_action(
    &*ctx.store,
    &role,
    "alert_acknowledged",
    "alert",
    id.to_string(),
    alert.related_project_id.clone(),
  )
  .await?;

  Ok(Json(alert))
}

/// `POST /alerts/:id/resolve`
pub async fn resolve<S, P, F>(
  State(ctx): State<ApiContext<S, P, F>>,
  Path(id): Path<EventId>,
  headers: HeaderMap,
) -> Result<Json<AlertEvent>, ApiError>
where
  S: EventStore + AuditStore<Error = <S as EventStore>::Error> + 'static,
  P: PermissionLookup + 'static,
  F: PortfolioProvider + 'static,
{
  let role =
    require_role(&*ctx.perms, &headers, actions::TRANSITION_ALERT).await?;

  let alert = ctx.store.resolve_alert(id).await.map_err(classify)?;
  record_action(
    &*ctx.store,
    &role,
    "alert_resolved",
    "alert",
    id.to_string(),
    alert.related_project_id.clone(),
  )
  .await?;

  Ok(Json(alert))
}
