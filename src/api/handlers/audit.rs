//! Audit trail listing.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};

use crate::api::auth::AuthUser;
use crate::api::request::{query, AuditQuery};
use crate::api::response::ApiResult;
use crate::api::state::AppState;
use crate::db::{self, audit::AuditFilter};
use crate::models::AuditLogEntry;

/// GET /audit-logs
pub(super) async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    params: Result<Query<AuditQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<AuditLogEntry>>> {
    auth.require_admin()?;
    let params = query(params)?;
    let filter = AuditFilter {
        entity: params.entity,
        actor_id: params.actor_id,
        limit: params.limit,
    };
    Ok(Json(db::audit::list(state.pool(), &filter).await?))
}
