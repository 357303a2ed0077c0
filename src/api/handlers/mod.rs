//! HTTP request handlers for the staffing portal API.
//!
//! Handlers are grouped by resource. Every route except `/health` and
//! `/auth/login` takes an [`AuthUser`](super::auth::AuthUser), and every
//! mutation appends an audit row.

use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::db::{self, audit::NewAuditEntry};

use super::state::AppState;

mod alerts;
mod attendance;
mod audit;
mod candidates;
mod metrics;
mod pipeline;
mod session;
mod users;

pub(crate) use attendance::evaluate_user;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(session::health))
        .route("/auth/login", post(session::login))
        .route("/me", get(session::me))
        .route("/users", get(users::list).post(users::create))
        .route("/users/:id", patch(users::update))
        .route("/candidates", get(candidates::list).post(candidates::create))
        .route(
            "/candidates/:id",
            get(candidates::get_one).patch(candidates::update),
        )
        .route(
            "/applications",
            get(pipeline::list_applications).post(pipeline::create_application),
        )
        .route("/applications/:id", patch(pipeline::update_application))
        .route(
            "/interviews",
            get(pipeline::list_interviews).post(pipeline::create_interview),
        )
        .route("/interviews/:id", patch(pipeline::update_interview))
        .route(
            "/assessments",
            get(pipeline::list_assessments).post(pipeline::create_assessment),
        )
        .route("/assessments/:id", patch(pipeline::update_assessment))
        .route("/attendance", get(attendance::list).post(attendance::submit))
        .route("/attendance/impact", get(attendance::impact))
        .route("/attendance/:id/review", post(attendance::review))
        .route("/metrics/pipeline", get(metrics::pipeline))
        .route("/metrics/performance", get(metrics::performance))
        .route("/alerts", get(alerts::list))
        .route("/alerts/:id/ack", post(alerts::acknowledge))
        .route("/audit-logs", get(audit::list))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Appends an audit row. A failed write is logged, not returned.
async fn record_audit(state: &AppState, entry: NewAuditEntry) {
    if let Err(err) = db::audit::record(state.pool(), &entry).await {
        warn!(
            action = entry.action,
            entity = entry.entity,
            entity_id = ?entry.entity_id,
            error = %err,
            "Failed to write audit row"
        );
    }
}
