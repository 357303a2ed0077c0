//! Attendance submission, review and policy impact.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use chrono::{Duration, NaiveDate};
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::auth::AuthUser;
use crate::api::request::{
    body, query, AttendanceQuery, ImpactQuery, ReviewRequest, SubmitAttendanceRequest,
};
use crate::api::response::ApiResult;
use crate::api::state::AppState;
use crate::db::{
    self,
    attendance::{AttendanceFilter, AttendanceSubmission, SubmissionOutcome},
    audit::NewAuditEntry,
};
use crate::error::{PortalError, PortalResult};
use crate::models::{AttendanceRecord, PolicyImpact, User};
use crate::policy::{evaluate_attendance, EvaluationInput, SANDWICH_SCAN_LIMIT_DAYS};

use super::record_audit;

/// Longest range a single impact request may cover, in days.
pub(crate) const MAX_IMPACT_RANGE_DAYS: i64 = 366;

/// Loads a user's records and applications and runs the policy evaluation.
///
/// Records are loaded [`SANDWICH_SCAN_LIMIT_DAYS`] beyond each end of the
/// range so that edge off-days can see the working days around them.
pub(crate) async fn evaluate_user(
    state: &AppState,
    user: &User,
    start: NaiveDate,
    end: NaiveDate,
    as_of: NaiveDate,
) -> PortalResult<PolicyImpact> {
    if start > end {
        return Err(PortalError::validation(
            "end",
            format!("{} is before start {}", end, start),
        ));
    }
    if (end - start).num_days() >= MAX_IMPACT_RANGE_DAYS {
        return Err(PortalError::validation(
            "end",
            format!("range may cover at most {} days", MAX_IMPACT_RANGE_DAYS),
        ));
    }

    let margin = Duration::days(SANDWICH_SCAN_LIMIT_DAYS);
    let load_from = start.checked_sub_signed(margin).unwrap_or(start);
    let load_to = end.checked_add_signed(margin).unwrap_or(end);

    let records = db::attendance::list_for_user_between(state.pool(), user.id, load_from, load_to).await?;
    let applications = db::applications::count_per_day(state.pool(), user.id, start, end).await?;

    debug!(
        user_id = user.id,
        %start,
        %end,
        %as_of,
        records = records.len(),
        "Evaluating attendance"
    );

    evaluate_attendance(EvaluationInput {
        user_id: user.id,
        start,
        end,
        as_of,
        records: &records,
        applications_per_day: &applications,
        quota_override: user.daily_quota,
        config: state.config(),
    })
}

/// GET /attendance
pub(super) async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    params: Result<Query<AttendanceQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<AttendanceRecord>>> {
    let params = query(params)?;
    let user_id = match auth.scope() {
        None => params.user_id,
        Some(own) => {
            if params.user_id.is_some_and(|requested| requested != own) {
                return Err(PortalError::forbidden("recruiters can only view their own attendance").into());
            }
            Some(own)
        }
    };
    let filter = AttendanceFilter {
        user_id,
        approval_status: params.approval_status,
        from: params.from,
        to: params.to,
    };
    Ok(Json(db::attendance::list(state.pool(), &filter).await?))
}

/// POST /attendance
///
/// Creates the caller's record for a date, or replaces a pending or
/// rejected one. Answers 201 for a new record and 200 for a replacement.
pub(super) async fn submit(
    auth: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<SubmitAttendanceRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AttendanceRecord>)> {
    let correlation_id = Uuid::new_v4();
    let request = body(payload)?;
    if let Err(e) = request.validate(state.today()) {
        warn!(correlation_id = %correlation_id, user_id = auth.0.id, error = %e, "Attendance submission rejected");
        return Err(e.into());
    }

    let (record, outcome) = db::attendance::upsert_submission(
        state.pool(),
        &AttendanceSubmission {
            user_id: auth.0.id,
            date: request.date,
            reported_status: request.reported_status,
            login_at: request.login_at,
            logout_at: request.logout_at,
            break_minutes: request.break_minutes,
            notes: request.notes.clone(),
        },
    )
    .await?;

    let (status, action) = match outcome {
        SubmissionOutcome::Created => (StatusCode::CREATED, "submit"),
        SubmissionOutcome::Replaced => (StatusCode::OK, "resubmit"),
    };
    info!(
        correlation_id = %correlation_id,
        user_id = auth.0.id,
        record_id = record.id,
        date = %record.date,
        reported_status = %record.reported_status,
        action,
        "Attendance submitted"
    );
    record_audit(
        &state,
        NewAuditEntry::new(
            auth.0.id,
            action,
            "attendance",
            record.id,
            json!({"date": record.date, "reported_status": record.reported_status}),
        ),
    )
    .await;

    Ok((status, Json(record)))
}

/// POST /attendance/:id/review
pub(super) async fn review(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<ReviewRequest>, JsonRejection>,
) -> ApiResult<Json<AttendanceRecord>> {
    auth.require_admin()?;
    let correlation_id = Uuid::new_v4();
    let request = body(payload)?;

    let record = db::attendance::review(
        state.pool(),
        id,
        request.decision,
        auth.0.id,
        request.note.as_deref(),
    )
    .await?;

    info!(
        correlation_id = %correlation_id,
        reviewer_id = auth.0.id,
        record_id = record.id,
        decision = %record.approval_status,
        "Attendance reviewed"
    );
    record_audit(
        &state,
        NewAuditEntry::new(
            auth.0.id,
            "review",
            "attendance",
            record.id,
            json!({
                "user_id": record.user_id,
                "date": record.date,
                "decision": record.approval_status,
                "note": request.note,
            }),
        ),
    )
    .await;

    Ok(Json(record))
}

/// GET /attendance/impact
pub(super) async fn impact(
    auth: AuthUser,
    State(state): State<AppState>,
    params: Result<Query<ImpactQuery>, QueryRejection>,
) -> ApiResult<Json<PolicyImpact>> {
    let params = query(params)?;
    let target = match params.user_id {
        Some(id) if id != auth.0.id => {
            auth.require_admin()?;
            db::users::get(state.pool(), id).await?
        }
        _ => auth.0.clone(),
    };
    let as_of = params.as_of.unwrap_or_else(|| state.today());

    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, user_id = target.id, "Processing impact request");

    match evaluate_user(&state, &target, params.start, params.end, as_of).await {
        Ok(impact) => {
            info!(
                correlation_id = %correlation_id,
                evaluation_id = %impact.evaluation_id,
                total_deduction_days = %impact.totals.total_deduction_days,
                duration_us = impact.trace.duration_us,
                "Impact evaluation completed"
            );
            Ok(Json(impact))
        }
        Err(e) => {
            warn!(correlation_id = %correlation_id, error = %e, "Impact evaluation failed");
            Err(e.into())
        }
    }
}
