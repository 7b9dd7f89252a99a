//! Handlers for `/audit` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/audit` | Optional `event_type`, `role_key`, `actor_email`, `project_id`, `created_after`, `limit` |
//! | `POST` | `/audit` | Body: [`NewAuditEntry`]; always appends; returns 201 |

use axum::{
  Json,
  extract::{Query, State},
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use siren_core::{
  audit::{AuditLogEntry, AuditQuery, NewAuditEntry},
  perms::{PermissionLookup, actions},
  store::{AuditStore, EventStore},
  summary::PortfolioProvider,
};

use crate::{ApiContext, error::ApiError, error::classify, require_role};

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub event_type:    Option<String>,
  pub role_key:      Option<String>,
  pub actor_email:   Option<String>,
  pub project_id:    Option<String>,
  pub created_after: Option<DateTime<Utc>>,
  pub limit:         Option<usize>,
}

/// `GET /audit[?role_key=...][&event_type=...][&limit=...]`
pub async fn list<S, P, F>(
  State(ctx): State<ApiContext<S, P, F>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<AuditLogEntry>>, ApiError>
where
  S: EventStore + AuditStore<Error = <S as EventStore>::Error> + 'static,
  P: PermissionLookup + 'static,
  F: PortfolioProvider + 'static,
{
  let query = AuditQuery {
    event_type:    params.event_type,
    role_key:      params.role_key,
    actor_email:   params.actor_email,
    project_id:    params.project_id,
    created_after: params.created_after,
    limit:         Some(params.limit.unwrap_or(50)),
  };
  let entries = ctx.store.query_audit(&query).await.map_err(classify)?;
  Ok(Json(entries))
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// `POST /audit` — append one entry. The entry's `role_key` defaults to the
/// caller's `x-role` when the body leaves it unset. Returns 201.
pub async fn record<S, P, F>(
  State(ctx): State<ApiContext<S, P, F>>,
  headers: HeaderMap,
  Json(mut body): Json<NewAuditEntry>,
) -> Result<impl IntoResponse, ApiError>
where
  S: EventStore + AuditStore<Error = <S as EventStore>::Error> + 'static,
  P: PermissionLookup + 'static,
  F: PortfolioProvider + 'static,
{
  let role = require_role(&*ctx.perms, &headers, actions::WRITE_AUDIT).await?;
  if body.role_key.is_none() {
    body.role_key = Some(role);
  }

  let entry = ctx.store.write_audit(body).await.map_err(classify)?;
  Ok((StatusCode::CREATED, Json(entry)))
}
