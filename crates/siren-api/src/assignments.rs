//! Handlers for `/assignments` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/assignments` | Body: [`NewAssignmentChange`]; returns 201 |
//! | `GET`  | `/assignments/:task_id/history` | Oldest-first reassignment trail |

use axum::{
  Json,
  extract::{Path, State},
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
};
use siren_core::{
  assignment::{AssignmentChangeEvent, NewAssignmentChange},
  perms::{PermissionLookup, actions},
  store::{AuditStore, EventStore},
  summary::PortfolioProvider,
};

use crate::{ApiContext, error::ApiError, error::classify, record_action, require_role};

/// `POST /assignments` — append one reassignment. Returns 201 + the stored
/// change.
pub async fn record<S, P, F>(
  State(ctx): State<ApiContext<S, P, F>>,
  headers: HeaderMap,
  Json(body): Json<NewAssignmentChange>,
) -> Result<impl IntoResponse, ApiError>
where
  S: EventStore + AuditStore<Error = <S as EventStore>::Error> + 'static,
  P: PermissionLookup + 'static,
  F: PortfolioProvider + 'static,
{
  let role =
    require_role(&*ctx.perms, &headers, actions::RECORD_ASSIGNMENT).await?;

  let change = ctx
    .store
    .record_assignment_change(body)
    .await
    .map_err(classify)?;
  record_action(
    &*ctx.store,
    &role,
    "assignment_changed",
    "task",
    change.task_id.clone(),
    None,
  )
  .await?;

  Ok((StatusCode::CREATED, Json(change)))
}

/// `GET /assignments/:task_id/history` — the task's full reassignment
/// trail, oldest first. An unknown task yields an empty list, not 404.
pub async fn history<S, P, F>(
  State(ctx): State<ApiContext<S, P, F>>,
  Path(task_id): Path<String>,
) -> Result<Json<Vec<AssignmentChangeEvent>>, ApiError>
where
  S: EventStore + AuditStore<Error = <S as EventStore>::Error> + 'static,
  P: PermissionLookup + 'static,
  F: PortfolioProvider + 'static,
{
  let history = ctx
    .store
    .assignment_history(&task_id)
    .await
    .map_err(classify)?;
  Ok(Json(history))
}
