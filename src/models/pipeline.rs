//! Pipeline activity logged by recruiters against candidates: job
//! applications, interviews and assessments.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

text_enum! {
    /// Status of a job application submitted on a candidate's behalf.
    pub enum ApplicationStatus {
        /// Submitted to the client or job board.
        Applied => "applied",
        /// Under screening by the client.
        Screening => "screening",
        /// Progressed to interviews.
        Interview => "interview",
        /// Offer received.
        Offer => "offer",
        /// Rejected by the client.
        Rejected => "rejected",
        /// Withdrawn by the agency or candidate.
        Withdrawn => "withdrawn",
    }
}

text_enum! {
    /// Status of a scheduled interview.
    pub enum InterviewStatus {
        /// Booked and upcoming.
        Scheduled => "scheduled",
        /// Took place.
        Completed => "completed",
        /// Called off before it happened.
        Cancelled => "cancelled",
        /// The candidate did not attend.
        NoShow => "no_show",
    }
}

text_enum! {
    /// Format of an interview.
    pub enum InterviewKind {
        /// Phone screen.
        Phone => "phone",
        /// Video call.
        Video => "video",
        /// In person at the client.
        Onsite => "onsite",
        /// Technical or coding round.
        Technical => "technical",
    }
}

text_enum! {
    /// Status of a client assessment.
    pub enum AssessmentStatus {
        /// Assigned, not yet submitted.
        Pending => "pending",
        /// Submitted, awaiting a result.
        Submitted => "submitted",
        /// Passed.
        Passed => "passed",
        /// Failed.
        Failed => "failed",
    }
}

/// A job application logged by a recruiter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobApplication {
    /// Database identifier.
    pub id: i64,
    /// The candidate applied for.
    pub candidate_id: i64,
    /// The recruiter who logged the application; counts towards their quota.
    pub recruiter_id: i64,
    /// Client or employer name.
    pub company: String,
    /// Position title.
    pub job_title: String,
    /// Posting URL.
    pub job_url: Option<String>,
    /// Current status.
    pub status: ApplicationStatus,
    /// The day the application was submitted.
    pub applied_on: NaiveDate,
    /// Free-form notes.
    pub notes: Option<String>,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last modified.
    pub updated_at: DateTime<Utc>,
}

/// An interview arranged for a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interview {
    /// Database identifier.
    pub id: i64,
    /// The candidate being interviewed.
    pub candidate_id: i64,
    /// The application this interview belongs to, if logged.
    pub application_id: Option<i64>,
    /// The recruiter who logged the interview.
    pub recruiter_id: i64,
    /// Client or employer name.
    pub company: String,
    /// Interview format.
    pub kind: InterviewKind,
    /// Scheduled start in office-local time.
    pub scheduled_at: NaiveDateTime,
    /// Current status.
    pub status: InterviewStatus,
    /// Feedback captured after the interview.
    pub feedback: Option<String>,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
}

/// A take-home or online assessment assigned by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    /// Database identifier.
    pub id: i64,
    /// The candidate taking the assessment.
    pub candidate_id: i64,
    /// The recruiter who logged the assessment.
    pub recruiter_id: i64,
    /// Client or employer name.
    pub company: String,
    /// Assessment title.
    pub title: String,
    /// Submission deadline.
    pub due_on: Option<NaiveDate>,
    /// Current status.
    pub status: AssessmentStatus,
    /// Score out of 100, once known.
    pub score: Option<u8>,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
}
