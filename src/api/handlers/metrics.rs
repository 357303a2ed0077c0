//! Pipeline and recruiter performance metrics.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use chrono::Datelike;

use crate::api::auth::AuthUser;
use crate::api::request::{query, PerformanceQuery};
use crate::api::response::{ApiResult, RecruiterPerformance};
use crate::api::state::AppState;
use crate::db::{self, metrics::PipelineMetrics};

use super::evaluate_user;

/// GET /metrics/pipeline
///
/// Recruiters get counts over their own rows; admins get the whole portal.
pub(super) async fn pipeline(auth: AuthUser, State(state): State<AppState>) -> ApiResult<Json<PipelineMetrics>> {
    Ok(Json(db::metrics::pipeline(state.pool(), auth.scope()).await?))
}

/// GET /metrics/performance
///
/// One row per active recruiter combining activity counts with the
/// attendance evaluation over the same range. Defaults to the current
/// month up to today.
pub(super) async fn performance(
    auth: AuthUser,
    State(state): State<AppState>,
    params: Result<Query<PerformanceQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<RecruiterPerformance>>> {
    auth.require_admin()?;
    let params = query(params)?;
    let today = state.today();
    let end = params.end.unwrap_or(today);
    let start = params.start.unwrap_or_else(|| end.with_day(1).unwrap_or(end));

    let mut rows = Vec::new();
    for recruiter in db::users::list_active_recruiters(state.pool()).await? {
        let activity = db::metrics::recruiter_activity(state.pool(), recruiter.id, start, end).await?;
        let impact = evaluate_user(&state, &recruiter, start, end, today).await?;
        rows.push(RecruiterPerformance {
            user_id: recruiter.id,
            full_name: recruiter.full_name,
            activity,
            attendance: impact.totals,
        });
    }
    Ok(Json(rows))
}
