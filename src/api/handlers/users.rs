//! Admin user management.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::api::auth::{hash_password, AuthUser};
use crate::api::request::{body, CreateUserRequest, UpdateUserRequest};
use crate::api::response::ApiResult;
use crate::api::state::AppState;
use crate::db::{
    self,
    audit::NewAuditEntry,
    users::{NewUser, UserUpdate},
};
use crate::models::User;

use super::record_audit;

/// GET /users
pub(super) async fn list(auth: AuthUser, State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    auth.require_admin()?;
    Ok(Json(db::users::list(state.pool()).await?))
}

/// POST /users
pub(super) async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<User>)> {
    auth.require_admin()?;
    let request = body(payload)?;
    request.validate()?;

    let user = db::users::insert(
        state.pool(),
        &NewUser {
            email: request.email,
            full_name: request.full_name.trim().to_string(),
            role: request.role,
            password_hash: hash_password(&request.password)?,
            daily_quota: request.daily_quota,
        },
    )
    .await?;

    info!(
        correlation_id = %Uuid::new_v4(),
        actor_id = auth.0.id,
        user_id = user.id,
        role = %user.role,
        "User created"
    );
    record_audit(
        &state,
        NewAuditEntry::new(
            auth.0.id,
            "create",
            "user",
            user.id,
            json!({"email": user.email, "role": user.role, "daily_quota": user.daily_quota}),
        ),
    )
    .await;

    Ok((StatusCode::CREATED, Json(user)))
}

/// PATCH /users/:id
pub(super) async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<Json<User>> {
    auth.require_admin()?;
    let request = body(payload)?;
    request.validate()?;

    let user = db::users::update(
        state.pool(),
        id,
        &UserUpdate {
            full_name: request.full_name.map(|name| name.trim().to_string()),
            role: request.role,
            daily_quota: request.daily_quota,
            active: request.active,
            password_hash: request.password.as_deref().map(hash_password).transpose()?,
        },
    )
    .await?;

    record_audit(
        &state,
        NewAuditEntry::new(
            auth.0.id,
            "update",
            "user",
            user.id,
            json!({
                "role": request.role,
                "daily_quota": request.daily_quota,
                "active": request.active,
                "password_changed": request.password.is_some(),
            }),
        ),
    )
    .await;

    Ok(Json(user))
}
