//! Handler for `GET /summary/:role_key`.

use axum::{
  Json,
  extract::{Path, State},
  http::HeaderMap,
};
use chrono::{Duration, Utc};
use siren_core::{
  perms::{PermissionLookup, actions},
  store::{AuditStore, EventStore},
  summary::{PortfolioProvider, RoleSummary, build_role_summary},
};

use crate::{
  ApiContext, error::ApiError, error::classify, record_action, require_role,
};

/// `GET /summary/:role_key` — the role-scoped dashboard summary.
///
/// Journals a `summary_viewed` entry attributed to the caller's verified
/// `x-role`, not the path parameter, and only after the summary is built so
/// the response never counts its own view.
pub async fn get_one<S, P, F>(
  State(ctx): State<ApiContext<S, P, F>>,
  Path(role_key): Path<String>,
  headers: HeaderMap,
) -> Result<Json<RoleSummary>, ApiError>
where
  S: EventStore + AuditStore<Error = <S as EventStore>::Error> + 'static,
  P: PermissionLookup + 'static,
  F: PortfolioProvider + 'static,
{
  let caller =
    require_role(&*ctx.perms, &headers, actions::VIEW_SUMMARY).await?;
  let activity_since = Utc::now()
    - Duration::hours(i64::from(ctx.settings.activity_window_hours));

  let summary = build_role_summary(
    &role_key,
    &*ctx.portfolio,
    &*ctx.store,
    ctx.settings.decision_queue_size,
    activity_since,
  )
  .await
  .map_err(classify)?;

  record_action(
    &*ctx.store,
    &caller,
    "summary_viewed",
    "summary",
    role_key.clone(),
    None,
  )
  .await?;

  Ok(Json(summary))
}
