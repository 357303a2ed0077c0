//! Request types for the staffing portal API.
//!
//! This module defines the JSON bodies and query strings accepted by the
//! handlers, along with their field-level validation.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query,
    },
    Json,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{PortalError, PortalResult};
use crate::models::{
    ApplicationStatus, ApprovalStatus, AssessmentStatus, CandidateStage, InterviewKind,
    InterviewStatus, ReportedStatus, Role,
};

use super::response::ApiResult;

/// Unwraps a JSON body, turning rejections into API errors.
pub(crate) fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload.map(|Json(value)| value).map_err(Into::into)
}

/// Unwraps a query string, turning rejections into API errors.
pub(crate) fn query<T>(params: Result<Query<T>, QueryRejection>) -> ApiResult<T> {
    params.map(|Query(value)| value).map_err(Into::into)
}

fn require_non_empty(field: &str, value: &str) -> PortalResult<()> {
    if value.trim().is_empty() {
        Err(PortalError::validation(field, "must not be empty"))
    } else {
        Ok(())
    }
}

fn require_email(field: &str, value: &str) -> PortalResult<()> {
    let value = value.trim();
    match value.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(PortalError::validation(field, "must be an email address")),
    }
}

/// Validates an assessment score and narrows it to `u8`.
pub(crate) fn validate_score(score: Option<u32>) -> PortalResult<Option<u8>> {
    match score {
        None => Ok(None),
        Some(s) if s <= 100 => Ok(Some(s as u8)),
        Some(s) => Err(PortalError::validation(
            "score",
            format!("{} is out of range 0..=100", s),
        )),
    }
}

/// Minimum accepted password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Login email.
    pub email: String,
    /// Password.
    pub password: String,
}

/// `POST /users`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    /// Login email.
    pub email: String,
    /// Display name.
    pub full_name: String,
    /// Role.
    pub role: Role,
    /// Initial password.
    pub password: String,
    /// Daily application target override.
    #[serde(default)]
    pub daily_quota: Option<u32>,
}

impl CreateUserRequest {
    /// Checks field formats.
    pub fn validate(&self) -> PortalResult<()> {
        require_email("email", &self.email)?;
        require_non_empty("full_name", &self.full_name)?;
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(PortalError::validation(
                "password",
                format!("must be at least {} characters", MIN_PASSWORD_LENGTH),
            ));
        }
        Ok(())
    }
}

/// `PATCH /users/:id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    /// New display name.
    #[serde(default)]
    pub full_name: Option<String>,
    /// New role.
    #[serde(default)]
    pub role: Option<Role>,
    /// New daily quota.
    #[serde(default)]
    pub daily_quota: Option<u32>,
    /// Activate or deactivate.
    #[serde(default)]
    pub active: Option<bool>,
    /// New password.
    #[serde(default)]
    pub password: Option<String>,
}

impl UpdateUserRequest {
    /// Checks field formats.
    pub fn validate(&self) -> PortalResult<()> {
        if let Some(name) = &self.full_name {
            require_non_empty("full_name", name)?;
        }
        if let Some(password) = &self.password {
            if password.chars().count() < MIN_PASSWORD_LENGTH {
                return Err(PortalError::validation(
                    "password",
                    format!("must be at least {} characters", MIN_PASSWORD_LENGTH),
                ));
            }
        }
        Ok(())
    }
}

/// `POST /candidates`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCandidateRequest {
    /// Full name.
    pub full_name: String,
    /// Contact email.
    pub email: String,
    /// Phone.
    #[serde(default)]
    pub phone: Option<String>,
    /// Technology.
    #[serde(default)]
    pub technology: Option<String>,
    /// Initial stage; defaults to onboarding.
    #[serde(default)]
    pub stage: Option<CandidateStage>,
    /// Assigned recruiter; recruiters may only assign themselves.
    #[serde(default)]
    pub recruiter_id: Option<i64>,
}

impl CreateCandidateRequest {
    /// Checks field formats.
    pub fn validate(&self) -> PortalResult<()> {
        require_non_empty("full_name", &self.full_name)?;
        require_email("email", &self.email)
    }
}

/// `PATCH /candidates/:id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCandidateRequest {
    /// Full name.
    #[serde(default)]
    pub full_name: Option<String>,
    /// Phone.
    #[serde(default)]
    pub phone: Option<String>,
    /// Technology.
    #[serde(default)]
    pub technology: Option<String>,
    /// Stage.
    #[serde(default)]
    pub stage: Option<CandidateStage>,
    /// Reassignment; admin only.
    #[serde(default)]
    pub recruiter_id: Option<i64>,
}

/// `GET /candidates` query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateQuery {
    /// Stage filter.
    pub stage: Option<CandidateStage>,
    /// Recruiter filter; admins only, recruiters always see their own.
    pub recruiter_id: Option<i64>,
}

/// `POST /applications`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateApplicationRequest {
    /// Candidate.
    pub candidate_id: i64,
    /// Company.
    pub company: String,
    /// Position title.
    pub job_title: String,
    /// Posting URL.
    #[serde(default)]
    pub job_url: Option<String>,
    /// Status; defaults to applied.
    #[serde(default)]
    pub status: Option<ApplicationStatus>,
    /// Submission date; defaults to today.
    #[serde(default)]
    pub applied_on: Option<NaiveDate>,
    /// Notes.
    #[serde(default)]
    pub notes: Option<String>,
}

impl CreateApplicationRequest {
    /// Checks field formats.
    pub fn validate(&self) -> PortalResult<()> {
        require_non_empty("company", &self.company)?;
        require_non_empty("job_title", &self.job_title)
    }
}

/// `PATCH /applications/:id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateApplicationRequest {
    /// Status.
    #[serde(default)]
    pub status: Option<ApplicationStatus>,
    /// Notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// `GET /applications` query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationQuery {
    /// Candidate filter.
    pub candidate_id: Option<i64>,
    /// Applied on or after.
    pub from: Option<NaiveDate>,
    /// Applied on or before.
    pub to: Option<NaiveDate>,
    /// Status filter.
    pub status: Option<ApplicationStatus>,
}

/// `POST /interviews`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInterviewRequest {
    /// Candidate.
    pub candidate_id: i64,
    /// Related application.
    #[serde(default)]
    pub application_id: Option<i64>,
    /// Company.
    pub company: String,
    /// Format.
    pub kind: InterviewKind,
    /// Scheduled start, office-local.
    pub scheduled_at: NaiveDateTime,
}

impl CreateInterviewRequest {
    /// Checks field formats.
    pub fn validate(&self) -> PortalResult<()> {
        require_non_empty("company", &self.company)
    }
}

/// `PATCH /interviews/:id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateInterviewRequest {
    /// Status.
    #[serde(default)]
    pub status: Option<InterviewStatus>,
    /// Feedback.
    #[serde(default)]
    pub feedback: Option<String>,
    /// New start time.
    #[serde(default)]
    pub scheduled_at: Option<NaiveDateTime>,
}

/// `GET /interviews` query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InterviewQuery {
    /// Candidate filter.
    pub candidate_id: Option<i64>,
    /// Scheduled on or after.
    pub from: Option<NaiveDate>,
    /// Scheduled on or before.
    pub to: Option<NaiveDate>,
    /// Status filter.
    pub status: Option<InterviewStatus>,
}

/// `POST /assessments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAssessmentRequest {
    /// Candidate.
    pub candidate_id: i64,
    /// Company.
    pub company: String,
    /// Title.
    pub title: String,
    /// Deadline.
    #[serde(default)]
    pub due_on: Option<NaiveDate>,
    /// Status; defaults to pending.
    #[serde(default)]
    pub status: Option<AssessmentStatus>,
    /// Score, 0 to 100.
    #[serde(default)]
    pub score: Option<u32>,
}

impl CreateAssessmentRequest {
    /// Checks field formats and returns the narrowed score.
    pub fn validate(&self) -> PortalResult<Option<u8>> {
        require_non_empty("company", &self.company)?;
        require_non_empty("title", &self.title)?;
        validate_score(self.score)
    }
}

/// `PATCH /assessments/:id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAssessmentRequest {
    /// Status.
    #[serde(default)]
    pub status: Option<AssessmentStatus>,
    /// Score, 0 to 100.
    #[serde(default)]
    pub score: Option<u32>,
}

/// `GET /assessments` query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssessmentQuery {
    /// Candidate filter.
    pub candidate_id: Option<i64>,
    /// Status filter.
    pub status: Option<AssessmentStatus>,
}

/// `POST /attendance`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitAttendanceRequest {
    /// Date covered.
    pub date: NaiveDate,
    /// Reported status.
    pub reported_status: ReportedStatus,
    /// First login, office-local.
    #[serde(default)]
    pub login_at: Option<NaiveDateTime>,
    /// Last logout, office-local.
    #[serde(default)]
    pub logout_at: Option<NaiveDateTime>,
    /// Break minutes.
    #[serde(default)]
    pub break_minutes: u32,
    /// Notes.
    #[serde(default)]
    pub notes: Option<String>,
}

impl SubmitAttendanceRequest {
    /// Checks the submission against `today`.
    ///
    /// Timestamps must fall on the submitted date with logout not before
    /// login. Only leave and absence may be reported ahead of time.
    pub fn validate(&self, today: NaiveDate) -> PortalResult<()> {
        for (field, value) in [("login_at", self.login_at), ("logout_at", self.logout_at)] {
            if let Some(timestamp) = value {
                if timestamp.date() != self.date {
                    return Err(PortalError::validation(
                        field,
                        format!("{} does not fall on {}", timestamp, self.date),
                    ));
                }
            }
        }
        if let (Some(login), Some(logout)) = (self.login_at, self.logout_at) {
            if logout < login {
                return Err(PortalError::validation(
                    "logout_at",
                    "must not be before login_at",
                ));
            }
        }
        let worked = matches!(
            self.reported_status,
            ReportedStatus::Present | ReportedStatus::HalfDay
        );
        if worked && self.date > today {
            return Err(PortalError::validation(
                "date",
                format!("cannot report '{}' for a future date", self.reported_status),
            ));
        }
        Ok(())
    }
}

/// `POST /attendance/:id/review`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRequest {
    /// `approved` or `rejected`.
    pub decision: ApprovalStatus,
    /// Reviewer's note.
    #[serde(default)]
    pub note: Option<String>,
}

/// `GET /attendance` query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttendanceQuery {
    /// User filter; recruiters may only ask for themselves.
    pub user_id: Option<i64>,
    /// Approval filter.
    pub approval_status: Option<ApprovalStatus>,
    /// On or after.
    pub from: Option<NaiveDate>,
    /// On or before.
    pub to: Option<NaiveDate>,
}

/// `GET /attendance/impact` query.
#[derive(Debug, Clone, Deserialize)]
pub struct ImpactQuery {
    /// User to evaluate; defaults to the caller.
    pub user_id: Option<i64>,
    /// First date.
    pub start: NaiveDate,
    /// Last date.
    pub end: NaiveDate,
    /// Evaluation cut-off; defaults to today.
    pub as_of: Option<NaiveDate>,
}

/// `GET /metrics/performance` query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PerformanceQuery {
    /// First date; defaults to the first of the current month.
    pub start: Option<NaiveDate>,
    /// Last date; defaults to today.
    pub end: Option<NaiveDate>,
}

/// `GET /alerts` query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertQuery {
    /// Hide acknowledged alerts.
    #[serde(default)]
    pub unacknowledged_only: bool,
}

/// `GET /audit-logs` query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditQuery {
    /// Entity filter.
    pub entity: Option<String>,
    /// Actor filter.
    pub actor_id: Option<i64>,
    /// Page size.
    pub limit: Option<i64>,
}
