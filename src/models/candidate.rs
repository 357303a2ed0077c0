//! Candidate model and pipeline stages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

text_enum! {
    /// Position of a candidate in the placement pipeline.
    pub enum CandidateStage {
        /// Paperwork and profile preparation.
        Onboarding => "onboarding",
        /// Profile is being marketed to clients.
        Marketing => "marketing",
        /// At least one interview is in progress.
        Interviewing => "interviewing",
        /// An offer has been extended.
        Offered => "offered",
        /// The candidate has been placed with a client.
        Placed => "placed",
        /// No longer in the active pipeline.
        Inactive => "inactive",
    }
}

/// A job seeker tracked by the agency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Database identifier.
    pub id: i64,
    /// Full name.
    pub full_name: String,
    /// Contact email, unique across candidates.
    pub email: String,
    /// Contact phone number.
    pub phone: Option<String>,
    /// Primary technology or skill the candidate is marketed for.
    pub technology: Option<String>,
    /// Current pipeline stage.
    pub stage: CandidateStage,
    /// The recruiter the candidate is assigned to.
    pub recruiter_id: Option<i64>,
    /// When the candidate was created.
    pub created_at: DateTime<Utc>,
    /// When the candidate was last modified.
    pub updated_at: DateTime<Utc>,
}

impl Candidate {
    /// Returns true if the candidate is assigned to the given recruiter.
    pub fn is_assigned_to(&self, user_id: i64) -> bool {
        self.recruiter_id == Some(user_id)
    }
}
