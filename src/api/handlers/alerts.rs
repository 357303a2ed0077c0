//! Alert listing and acknowledgement.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use chrono::Utc;
use serde_json::json;

use crate::api::auth::AuthUser;
use crate::api::request::{query, AlertQuery};
use crate::api::response::ApiResult;
use crate::api::state::AppState;
use crate::db::{self, alerts::AlertFilter, audit::NewAuditEntry};
use crate::models::Alert;

use super::record_audit;

/// GET /alerts
///
/// Recruiters see alerts addressed to them plus broadcasts; admins see
/// everything.
pub(super) async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    params: Result<Query<AlertQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Alert>>> {
    let params = query(params)?;
    let alerts = db::alerts::list(
        state.pool(),
        &AlertFilter {
            visible_to: auth.scope(),
            unacknowledged_only: params.unacknowledged_only,
        },
    )
    .await?;
    Ok(Json(alerts))
}

/// POST /alerts/:id/ack
///
/// Broadcasts are addressed to the admins and share one acknowledgement, so
/// only an admin may acknowledge them.
pub(super) async fn acknowledge(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Alert>> {
    let alert = db::alerts::get(state.pool(), id).await?;
    if alert.is_broadcast() {
        auth.require_admin()?;
    } else {
        auth.require_self_or_admin(alert.user_id)?;
    }

    let alert = db::alerts::acknowledge(state.pool(), id, Utc::now()).await?;
    record_audit(
        &state,
        NewAuditEntry::new(auth.0.id, "acknowledge", "alert", id, json!({"kind": alert.kind})),
    )
    .await;
    Ok(Json(alert))
}
