//! Health, login and current-user endpoints.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use chrono::Utc;
use tracing::{info, warn};

use crate::api::auth::{verify_password, AuthUser};
use crate::api::request::{body, LoginRequest};
use crate::api::response::{ApiResult, HealthResponse, LoginResponse};
use crate::api::state::AppState;
use crate::db;
use crate::error::PortalError;
use crate::models::User;

/// GET /health
pub(super) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// POST /auth/login
///
/// Unknown emails, wrong passwords and inactive accounts all answer 401
/// with the same message.
pub(super) async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let request = body(payload)?;
    let invalid = || PortalError::unauthorized("invalid email or password");

    let credentials = db::users::find_by_email(state.pool(), &request.email)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&request.password, &credentials.password_hash) || !credentials.user.active {
        warn!(user_id = credentials.user.id, "Login rejected");
        return Err(invalid().into());
    }

    let (token, expires_at) = state.tokens().issue(&credentials.user, Utc::now())?;
    info!(user_id = credentials.user.id, role = %credentials.user.role, "User logged in");

    Ok(Json(LoginResponse {
        token,
        expires_at,
        user: credentials.user,
    }))
}

/// GET /me
pub(super) async fn me(AuthUser(user): AuthUser) -> Json<User> {
    Json(user)
}
