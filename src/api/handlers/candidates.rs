//! Candidate endpoints. Recruiters see and edit only their own candidates;
//! only admins may assign or reassign.

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
    body, query, CandidateQuery, CreateCandidateRequest, UpdateCandidateRequest,
};
use crate::api::response::ApiResult;
use crate::api::state::AppState;
use crate::db::{
    self,
    audit::NewAuditEntry,
    candidates::{CandidateFilter, CandidateUpdate, NewCandidate},
};
use crate::error::{PortalError, PortalResult};
use crate::models::{Candidate, CandidateStage};

use super::record_audit;

/// Checks that `recruiter_id` names an existing user.
async fn ensure_recruiter_exists(state: &AppState, recruiter_id: i64) -> PortalResult<()> {
    match db::users::get(state.pool(), recruiter_id).await {
        Ok(_) => Ok(()),
        Err(PortalError::NotFound { .. }) => Err(PortalError::validation(
            "recruiter_id",
            format!("user {} does not exist", recruiter_id),
        )),
        Err(other) => Err(other),
    }
}

/// GET /candidates
pub(super) async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    params: Result<Query<CandidateQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Candidate>>> {
    let params = query(params)?;
    let filter = CandidateFilter {
        recruiter_id: auth.scope().or(params.recruiter_id),
        stage: params.stage,
    };
    Ok(Json(db::candidates::list(state.pool(), &filter).await?))
}

/// POST /candidates
pub(super) async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<CreateCandidateRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Candidate>)> {
    let request = body(payload)?;
    request.validate()?;

    let recruiter_id = if auth.0.is_admin() {
        if let Some(recruiter_id) = request.recruiter_id {
            ensure_recruiter_exists(&state, recruiter_id).await?;
        }
        request.recruiter_id
    } else {
        match request.recruiter_id {
            Some(other) if other != auth.0.id => {
                return Err(PortalError::forbidden("only admins can assign candidates to others").into());
            }
            _ => Some(auth.0.id),
        }
    };

    let candidate = db::candidates::insert(
        state.pool(),
        &NewCandidate {
            full_name: request.full_name.trim().to_string(),
            email: request.email,
            phone: request.phone,
            technology: request.technology,
            stage: request.stage.unwrap_or(CandidateStage::Onboarding),
            recruiter_id,
        },
    )
    .await?;

    info!(
        correlation_id = %Uuid::new_v4(),
        actor_id = auth.0.id,
        candidate_id = candidate.id,
        "Candidate created"
    );
    record_audit(
        &state,
        NewAuditEntry::new(
            auth.0.id,
            "create",
            "candidate",
            candidate.id,
            json!({"email": candidate.email, "stage": candidate.stage, "recruiter_id": candidate.recruiter_id}),
        ),
    )
    .await;

    Ok((StatusCode::CREATED, Json(candidate)))
}

/// GET /candidates/:id
pub(super) async fn get_one(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Candidate>> {
    let candidate = db::candidates::get(state.pool(), id).await?;
    auth.require_self_or_admin(candidate.recruiter_id)?;
    Ok(Json(candidate))
}

/// PATCH /candidates/:id
pub(super) async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateCandidateRequest>, JsonRejection>,
) -> ApiResult<Json<Candidate>> {
    let request = body(payload)?;
    let current = db::candidates::get(state.pool(), id).await?;
    auth.require_self_or_admin(current.recruiter_id)?;

    if let Some(recruiter_id) = request.recruiter_id {
        if !auth.0.is_admin() {
            return Err(PortalError::forbidden("only admins can reassign candidates").into());
        }
        ensure_recruiter_exists(&state, recruiter_id).await?;
    }

    let candidate = db::candidates::update(
        state.pool(),
        id,
        &CandidateUpdate {
            full_name: request.full_name.clone(),
            phone: request.phone.clone(),
            technology: request.technology.clone(),
            stage: request.stage,
            recruiter_id: request.recruiter_id,
        },
    )
    .await?;

    record_audit(
        &state,
        NewAuditEntry::new(
            auth.0.id,
            "update",
            "candidate",
            candidate.id,
            json!({
                "changes": request,
                "previous_stage": current.stage,
                "previous_recruiter_id": current.recruiter_id,
            }),
        ),
    )
    .await;

    Ok(Json(candidate))
}
