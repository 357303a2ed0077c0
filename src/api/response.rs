//! Response types for the staffing portal API.
//!
//! This module defines the error response structures and error handling
//! for the HTTP API, plus the few composite response bodies.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::db::metrics::RecruiterActivity;
use crate::error::PortalError;
use crate::models::{ImpactTotals, User};

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
#[derive(Debug)]
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    fn bad_request(error: ApiError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error,
        }
    }

    fn internal(code: &str, message: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: ApiError::new(code, message),
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<PortalError> for ApiErrorResponse {
    fn from(err: PortalError) -> Self {
        match err {
            PortalError::ConfigNotFound { path } => {
                error!(path = %path, "Configuration file missing at request time");
                Self::internal("CONFIG_ERROR", "Configuration error")
            }
            PortalError::ConfigParseError { path, message } => {
                error!(path = %path, error = %message, "Configuration parse error");
                Self::internal("CONFIG_ERROR", "Configuration parse error")
            }
            PortalError::PolicyNotFound { date } => Self::bad_request(ApiError::with_details(
                "POLICY_NOT_FOUND",
                format!("No attendance policy in effect on {}", date),
                "Evaluate a range covered by a configured policy version",
            )),
            PortalError::NotFound { entity, id } => ApiErrorResponse {
                status: StatusCode::NOT_FOUND,
                error: ApiError::new("NOT_FOUND", format!("{} {} not found", entity, id)),
            },
            PortalError::Validation { field, message } => Self::bad_request(ApiError::with_details(
                "VALIDATION_ERROR",
                format!("Invalid field '{}': {}", field, message),
                field,
            )),
            PortalError::Unauthorized { message } => ApiErrorResponse {
                status: StatusCode::UNAUTHORIZED,
                error: ApiError::new("UNAUTHORIZED", message),
            },
            PortalError::Forbidden { message } => ApiErrorResponse {
                status: StatusCode::FORBIDDEN,
                error: ApiError::new("FORBIDDEN", message),
            },
            PortalError::Conflict { message } => ApiErrorResponse {
                status: StatusCode::CONFLICT,
                error: ApiError::new("CONFLICT", message),
            },
            PortalError::Import { line, message } => Self::bad_request(ApiError::with_details(
                "IMPORT_ERROR",
                message,
                format!("line {}", line),
            )),
            PortalError::CorruptRecord { column, value } => {
                error!(column = %column, value = %value, "Corrupt record in database");
                Self::internal("CORRUPT_RECORD", "A stored record could not be read")
            }
            PortalError::Database(e) => {
                error!(error = %e, "Database error");
                Self::internal("DATABASE_ERROR", "Database error")
            }
            PortalError::Io(e) => {
                error!(error = %e, "I/O error");
                Self::internal("IO_ERROR", "I/O error")
            }
        }
    }
}

impl From<JsonRejection> for ApiErrorResponse {
    fn from(rejection: JsonRejection) -> Self {
        let error = match rejection {
            JsonRejection::JsonDataError(err) => {
                // The body text carries serde's description of the problem
                let body_text = err.body_text();
                warn!(error = %body_text, "JSON data error");
                if body_text.contains("missing field") {
                    ApiError::validation_error(body_text)
                } else {
                    ApiError::malformed_json(body_text)
                }
            }
            JsonRejection::JsonSyntaxError(err) => {
                warn!(error = %err, "JSON syntax error");
                ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
            }
            JsonRejection::MissingJsonContentType(_) => {
                ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
            }
            _ => ApiError::malformed_json("Failed to parse request body"),
        };
        Self::bad_request(error)
    }
}

impl From<QueryRejection> for ApiErrorResponse {
    fn from(rejection: QueryRejection) -> Self {
        warn!(error = %rejection.body_text(), "Query string rejected");
        Self::bad_request(ApiError::validation_error(rejection.body_text()))
    }
}

/// Result type returned by handlers.
pub type ApiResult<T> = Result<T, ApiErrorResponse>;

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"`.
    pub status: String,
    /// Crate version.
    pub version: String,
}

/// Body of a successful `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token.
    pub token: String,
    /// When the token stops being accepted.
    pub expires_at: DateTime<Utc>,
    /// The authenticated user.
    pub user: User,
}

/// One recruiter's row in `GET /metrics/performance`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecruiterPerformance {
    /// Recruiter id.
    pub user_id: i64,
    /// Recruiter name.
    pub full_name: String,
    /// Activity counts over the range.
    pub activity: RecruiterActivity,
    /// Attendance evaluation totals over the range.
    pub attendance: ImpactTotals,
}
