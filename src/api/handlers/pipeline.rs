//! Applications, interviews and assessments.
//!
//! Recruiters log activity only for candidates assigned to them and see
//! only the rows they logged. Admins see everything; activity an admin logs
//! is attributed to the candidate's recruiter when there is one.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::api::auth::AuthUser;
use crate::api::request::{
    body, query, validate_score, ApplicationQuery, AssessmentQuery, CreateApplicationRequest,
    CreateAssessmentRequest, CreateInterviewRequest, InterviewQuery, UpdateApplicationRequest,
    UpdateAssessmentRequest, UpdateInterviewRequest,
};
use crate::api::response::ApiResult;
use crate::api::state::AppState;
use crate::db::{
    self,
    applications::{ApplicationFilter, ApplicationUpdate, NewApplication},
    assessments::{AssessmentFilter, AssessmentUpdate, NewAssessment},
    audit::NewAuditEntry,
    interviews::{InterviewFilter, InterviewUpdate, NewInterview},
};
use crate::error::{PortalError, PortalResult};
use crate::models::{
    ApplicationStatus, Assessment, AssessmentStatus, Candidate, Interview, JobApplication,
};

use super::record_audit;

/// Loads a candidate the caller may log activity for, and the recruiter the
/// activity is attributed to.
async fn owned_candidate(state: &AppState, auth: &AuthUser, candidate_id: i64) -> PortalResult<(Candidate, i64)> {
    let candidate = match db::candidates::get(state.pool(), candidate_id).await {
        Ok(candidate) => candidate,
        Err(PortalError::NotFound { .. }) => {
            return Err(PortalError::validation(
                "candidate_id",
                format!("candidate {} does not exist", candidate_id),
            ));
        }
        Err(other) => return Err(other),
    };
    auth.require_self_or_admin(candidate.recruiter_id)?;
    let recruiter_id = if auth.0.is_admin() {
        candidate.recruiter_id.unwrap_or(auth.0.id)
    } else {
        auth.0.id
    };
    Ok((candidate, recruiter_id))
}

// ---------------------------------------------------------------------------
// Applications
// ---------------------------------------------------------------------------

/// GET /applications
pub(super) async fn list_applications(
    auth: AuthUser,
    State(state): State<AppState>,
    params: Result<Query<ApplicationQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<JobApplication>>> {
    let params = query(params)?;
    let filter = ApplicationFilter {
        recruiter_id: auth.scope(),
        candidate_id: params.candidate_id,
        from: params.from,
        to: params.to,
        status: params.status,
    };
    Ok(Json(db::applications::list(state.pool(), &filter).await?))
}

/// POST /applications
pub(super) async fn create_application(
    auth: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<CreateApplicationRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<JobApplication>)> {
    let request = body(payload)?;
    request.validate()?;
    let (candidate, recruiter_id) = owned_candidate(&state, &auth, request.candidate_id).await?;

    let application = db::applications::insert(
        state.pool(),
        &NewApplication {
            candidate_id: candidate.id,
            recruiter_id,
            company: request.company.trim().to_string(),
            job_title: request.job_title.trim().to_string(),
            job_url: request.job_url,
            status: request.status.unwrap_or(ApplicationStatus::Applied),
            applied_on: request.applied_on.unwrap_or_else(|| state.today()),
            notes: request.notes,
        },
    )
    .await?;

    info!(
        correlation_id = %Uuid::new_v4(),
        actor_id = auth.0.id,
        application_id = application.id,
        recruiter_id = application.recruiter_id,
        applied_on = %application.applied_on,
        "Application logged"
    );
    record_audit(
        &state,
        NewAuditEntry::new(
            auth.0.id,
            "create",
            "application",
            application.id,
            json!({
                "candidate_id": application.candidate_id,
                "company": application.company,
                "applied_on": application.applied_on,
            }),
        ),
    )
    .await;

    Ok((StatusCode::CREATED, Json(application)))
}

/// PATCH /applications/:id
pub(super) async fn update_application(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateApplicationRequest>, JsonRejection>,
) -> ApiResult<Json<JobApplication>> {
    let request = body(payload)?;
    let current = db::applications::get(state.pool(), id).await?;
    auth.require_self_or_admin(Some(current.recruiter_id))?;

    let application = db::applications::update(
        state.pool(),
        id,
        &ApplicationUpdate {
            status: request.status,
            notes: request.notes.clone(),
        },
    )
    .await?;

    record_audit(
        &state,
        NewAuditEntry::new(
            auth.0.id,
            "update",
            "application",
            id,
            json!({"from_status": current.status, "changes": request}),
        ),
    )
    .await;

    Ok(Json(application))
}

// ---------------------------------------------------------------------------
// Interviews
// ---------------------------------------------------------------------------

/// GET /interviews
pub(super) async fn list_interviews(
    auth: AuthUser,
    State(state): State<AppState>,
    params: Result<Query<InterviewQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Interview>>> {
    let params = query(params)?;
    let filter = InterviewFilter {
        recruiter_id: auth.scope(),
        candidate_id: params.candidate_id,
        from: params.from,
        to: params.to,
        status: params.status,
    };
    Ok(Json(db::interviews::list(state.pool(), &filter).await?))
}

/// POST /interviews
pub(super) async fn create_interview(
    auth: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<CreateInterviewRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Interview>)> {
    let request = body(payload)?;
    request.validate()?;
    let (candidate, recruiter_id) = owned_candidate(&state, &auth, request.candidate_id).await?;

    if let Some(application_id) = request.application_id {
        let application = db::applications::get(state.pool(), application_id).await?;
        if application.candidate_id != candidate.id {
            return Err(PortalError::validation(
                "application_id",
                format!("application {} belongs to another candidate", application_id),
            )
            .into());
        }
    }

    let interview = db::interviews::insert(
        state.pool(),
        &NewInterview {
            candidate_id: candidate.id,
            application_id: request.application_id,
            recruiter_id,
            company: request.company.trim().to_string(),
            kind: request.kind,
            scheduled_at: request.scheduled_at,
        },
    )
    .await?;

    record_audit(
        &state,
        NewAuditEntry::new(
            auth.0.id,
            "create",
            "interview",
            interview.id,
            json!({
                "candidate_id": interview.candidate_id,
                "kind": interview.kind,
                "scheduled_at": interview.scheduled_at,
            }),
        ),
    )
    .await;

    Ok((StatusCode::CREATED, Json(interview)))
}

/// PATCH /interviews/:id
pub(super) async fn update_interview(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateInterviewRequest>, JsonRejection>,
) -> ApiResult<Json<Interview>> {
    let request = body(payload)?;
    let current = db::interviews::get(state.pool(), id).await?;
    auth.require_self_or_admin(Some(current.recruiter_id))?;

    let interview = db::interviews::update(
        state.pool(),
        id,
        &InterviewUpdate {
            status: request.status,
            feedback: request.feedback.clone(),
            scheduled_at: request.scheduled_at,
        },
    )
    .await?;

    record_audit(
        &state,
        NewAuditEntry::new(
            auth.0.id,
            "update",
            "interview",
            id,
            json!({"from_status": current.status, "changes": request}),
        ),
    )
    .await;

    Ok(Json(interview))
}

// ---------------------------------------------------------------------------
// Assessments
// ---------------------------------------------------------------------------

/// GET /assessments
pub(super) async fn list_assessments(
    auth: AuthUser,
    State(state): State<AppState>,
    params: Result<Query<AssessmentQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Assessment>>> {
    let params = query(params)?;
    let filter = AssessmentFilter {
        recruiter_id: auth.scope(),
        candidate_id: params.candidate_id,
        status: params.status,
    };
    Ok(Json(db::assessments::list(state.pool(), &filter).await?))
}

/// POST /assessments
pub(super) async fn create_assessment(
    auth: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<CreateAssessmentRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Assessment>)> {
    let request = body(payload)?;
    let score = request.validate()?;
    let (candidate, recruiter_id) = owned_candidate(&state, &auth, request.candidate_id).await?;

    let assessment = db::assessments::insert(
        state.pool(),
        &NewAssessment {
            candidate_id: candidate.id,
            recruiter_id,
            company: request.company.trim().to_string(),
            title: request.title.trim().to_string(),
            due_on: request.due_on,
            status: request.status.unwrap_or(AssessmentStatus::Pending),
            score,
        },
    )
    .await?;

    record_audit(
        &state,
        NewAuditEntry::new(
            auth.0.id,
            "create",
            "assessment",
            assessment.id,
            json!({"candidate_id": assessment.candidate_id, "title": assessment.title}),
        ),
    )
    .await;

    Ok((StatusCode::CREATED, Json(assessment)))
}

/// PATCH /assessments/:id
pub(super) async fn update_assessment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateAssessmentRequest>, JsonRejection>,
) -> ApiResult<Json<Assessment>> {
    let request = body(payload)?;
    let score = validate_score(request.score)?;
    let current = db::assessments::get(state.pool(), id).await?;
    auth.require_self_or_admin(Some(current.recruiter_id))?;

    let assessment = db::assessments::update(
        state.pool(),
        id,
        &AssessmentUpdate {
            status: request.status,
            score,
        },
    )
    .await?;

    record_audit(
        &state,
        NewAuditEntry::new(
            auth.0.id,
            "update",
            "assessment",
            id,
            json!({"from_status": current.status, "changes": request}),
        ),
    )
    .await;

    Ok(Json(assessment))
}
