//! HTTP API module for the staffing portal.
//!
//! This module provides the REST endpoints for authentication, user
//! management, the candidate pipeline, attendance and its policy impact,
//! metrics, alerts and the audit trail.

pub mod auth;
mod handlers;
mod request;
mod response;
mod state;

pub use auth::{hash_password, verify_password, AuthUser, Claims, TokenSigner};
pub use handlers::create_router;
pub use request::{
    ApplicationQuery, AssessmentQuery, AttendanceQuery, AuditQuery, AlertQuery, CandidateQuery,
    CreateApplicationRequest, CreateAssessmentRequest, CreateCandidateRequest,
    CreateInterviewRequest, CreateUserRequest, ImpactQuery, InterviewQuery, LoginRequest,
    PerformanceQuery, ReviewRequest, SubmitAttendanceRequest, UpdateApplicationRequest,
    UpdateAssessmentRequest, UpdateCandidateRequest, UpdateInterviewRequest, UpdateUserRequest,
    MIN_PASSWORD_LENGTH,
};
pub use response::{
    ApiError, ApiErrorResponse, ApiResult, HealthResponse, LoginResponse, RecruiterPerformance,
};
pub use state::AppState;
