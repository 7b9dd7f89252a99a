//! Handlers for `/suggestions` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/suggestions` | Optional `project_id`, `status`, `limit` |
//! | `POST` | `/suggestions` | Body: [`NewMappingSuggestion`]; returns 201 |
//! | `POST` | `/suggestions/:id/apply` | Terminal; 409 once reviewed |
//! | `POST` | `/suggestions/:id/dismiss` | Terminal; 409 once reviewed |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
};
use serde::Deserialize;
use siren_core::{
  perms::{PermissionLookup, actions},
  store::{AuditStore, EventStore, SuggestionQuery},
  suggestion::{MappingSuggestionEvent, NewMappingSuggestion, SuggestionStatus},
  summary::PortfolioProvider,
  types::EventId,
};

use crate::{ApiContext, error::ApiError, error::classify, record_action, require_role};

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub project_id: Option<String>,
  pub status:     Option<SuggestionStatus>,
  pub limit:      Option<usize>,
}

/// `GET /suggestions[?project_id=...][&status=pending][&limit=...]`
pub async fn list<S, P, F>(
  State(ctx): State<ApiContext<S, P, F>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<MappingSuggestionEvent>>, ApiError>
where
  S: EventStore + AuditStore<Error = <S as EventStore>::Error> + 'static,
  P: PermissionLookup + 'static,
  F: PortfolioProvider + 'static,
{
  let query = SuggestionQuery {
    project_id: params.project_id,
    status:     params.status,
    limit:      Some(params.limit.unwrap_or(50)),
  };
  let suggestions =
    ctx.store.query_suggestions(&query).await.map_err(classify)?;
  Ok(Json(suggestions))
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// `POST /suggestions` — returns 201 + the stored suggestion in `pending`
/// status.
pub async fn record<S, P, F>(
  State(ctx): State<ApiContext<S, P, F>>,
  headers: HeaderMap,
  Json(body): Json<NewMappingSuggestion>,
) -> Result<impl IntoResponse, ApiError>
where
  S: EventStore + AuditStore<Error = <S as EventStore>::Error> + 'static,
  P: PermissionLookup + 'static,
  F: PortfolioProvider + 'static,
{
  let role =
    require_role(&*ctx.perms, &headers, actions::RECORD_SUGGESTION).await?;

  let suggestion =
    ctx.store.record_suggestion(body).await.map_err(classify)?;
  record_action(
    &*ctx.store,
    &role,
    "suggestion_recorded",
    "suggestion",
    suggestion.id.to_string(),
    Some(suggestion.project_id.clone()),
  )
  .await?;

  Ok((StatusCode::CREATED, Json(suggestion)))
}

// ─── Review transitions ──────────────────────────────────────────────────────

/// `POST /suggestions/:id/apply`
pub async fn apply<S, P, F>(
  State(ctx): State<ApiContext<S, P, F>>,
  Path(id): Path<EventId>,
  headers: HeaderMap,
) -> Result<Json<MappingSuggestionEvent>, ApiError>
where
  S: EventStore + AuditStore<Error = <S as EventStore>::Error> + 'static,
  P: PermissionLookup + 'static,
  F: PortfolioProvider + 'static,
{
  let role =
    require_role(&*ctx.perms, &headers, actions::REVIEW_SUGGESTION).await?;

  let suggestion = ctx.store.apply_suggestion(id).await.map_err(classify)?;
  record_action(
    &*ctx.store,
    &role,
    "suggestion_applied",
    "suggestion",
    id.to_string(),
    Some(suggestion.project_id.clone()),
  )
  .await?;

  Ok(Json(suggestion))
}

/// `POST /suggestions/:id/dismiss`
pub async fn dismiss<S, P, F>(
  State(ctx): State<ApiContext<S, P, F>>,
  Path(id): Path<EventId>,
  headers: HeaderMap,
) -> Result<Json<MappingSuggestionEvent>, ApiError>
where
  S: EventStore + AuditStore<Error = <S as EventStore>::Error> + 'static,
  P: PermissionLookup + 'static,
  F: PortfolioProvider + 'static,
{
  let role =
    require_role(&*ctx.perms, &headers, actions::REVIEW_SUGGESTION).await?;

  let suggestion = ctx.store.dismiss_suggestion(id).await.map_err(classify)?;
  record_action(
    &*ctx.store,
    &role,
    "suggestion_dismissed",
    "suggestion",
    id.to_string(),
    Some(suggestion.project_id.clone()),
  )
  .await?;

  Ok(Json(suggestion))
}
