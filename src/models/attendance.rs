//! Attendance record model and its status enums.
//!
//! A record pairs what the recruiter reported for a day with the admin's
//! review decision. The status the rest of the portal acts on is derived
//! from both; see [`crate::policy::resolve_effective_status`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::policy::resolve_effective_status;

text_enum! {
    /// Status reported by the recruiter for a day.
    pub enum ReportedStatus {
        /// Worked the full day.
        Present => "present",
        /// Worked half the day.
        #[serde(alias = "half-day")]
        HalfDay => "half_day",
        /// Did not work.
        Absent => "absent",
        /// On leave.
        Leave => "leave",
    }
}

text_enum! {
    /// Admin review state of an attendance record.
    pub enum ApprovalStatus {
        /// Awaiting review.
        Pending => "pending",
        /// Accepted as reported.
        Approved => "approved",
        /// Rejected by an admin.
        Rejected => "rejected",
    }
}

text_enum! {
    /// Status the system acts on after combining report and review.
    pub enum EffectiveStatus {
        /// Counted as a full working day.
        Present => "present",
        /// Counted as half a working day.
        #[serde(alias = "half-day")]
        HalfDay => "half_day",
        /// Counted as a day off.
        Absent => "absent",
        /// The report was rejected.
        Rejected => "rejected",
        /// Awaiting review.
        Pending => "pending",
    }
}

/// One recruiter's attendance entry for one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Database identifier.
    pub id: i64,
    /// The recruiter this record belongs to.
    pub user_id: i64,
    /// The calendar date covered.
    pub date: NaiveDate,
    /// What the recruiter reported.
    pub reported_status: ReportedStatus,
    /// The admin review state.
    pub approval_status: ApprovalStatus,
    /// First login of the day, office-local time.
    pub login_at: Option<NaiveDateTime>,
    /// Last logout of the day, office-local time.
    pub logout_at: Option<NaiveDateTime>,
    /// Total break time taken, in minutes.
    pub break_minutes: u32,
    /// Recruiter's notes.
    pub notes: Option<String>,
    /// The admin who last reviewed the record.
    pub reviewed_by: Option<i64>,
    /// When the record was last reviewed.
    pub reviewed_at: Option<DateTime<Utc>>,
    /// The reviewer's note.
    pub review_note: Option<String>,
    /// When the record was first submitted.
    pub created_at: DateTime<Utc>,
    /// When the record was last modified.
    pub updated_at: DateTime<Utc>,
}

impl AttendanceRecord {
    /// Returns the effective status derived from the report and the review.
    pub fn effective_status(&self) -> EffectiveStatus {
        resolve_effective_status(self.reported_status, self.approval_status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn record(reported: ReportedStatus, approval: ApprovalStatus) -> AttendanceRecord {
        let now = Utc::now();
        AttendanceRecord {
            id: 1,
            user_id: 2,
            date: NaiveDate::from_ymd_opt(2026, 1, 13).unwrap(),
            reported_status: reported,
            approval_status: approval,
            login_at: None,
            logout_at: None,
            break_minutes: 0,
            notes: None,
            reviewed_by: None,
            reviewed_at: None,
            review_note: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_reported_half_day_accepts_both_spellings() {
        let hyphen: ReportedStatus = serde_json::from_str("\"half-day\"").unwrap();
        let snake: ReportedStatus = serde_json::from_str("\"half_day\"").unwrap();
        assert_eq!(hyphen, ReportedStatus::HalfDay);
        assert_eq!(snake, ReportedStatus::HalfDay);
        assert_eq!(
            ReportedStatus::from_str("half-day").unwrap(),
            ReportedStatus::HalfDay
        );
    }

    #[test]
    fn test_record_effective_status_delegates_to_rule() {
        assert_eq!(
            record(ReportedStatus::Present, ApprovalStatus::Approved).effective_status(),
            EffectiveStatus::Present
        );
        assert_eq!(
            record(ReportedStatus::Leave, ApprovalStatus::Approved).effective_status(),
            EffectiveStatus::Absent
        );
        assert_eq!(
            record(ReportedStatus::Present, ApprovalStatus::Pending).effective_status(),
            EffectiveStatus::Pending
        );
    }
}
