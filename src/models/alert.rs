//! Alerts raised by the background checks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

text_enum! {
    /// What raised an alert.
    pub enum AlertKind {
        /// A recruiter has not submitted attendance for today.
        MissingAttendance => "missing_attendance",
        /// An attendance record has waited too long for review.
        PendingApproval => "pending_approval",
        /// A recruiter is below their daily application quota.
        QuotaShortfall => "quota_shortfall",
    }
}

/// A notification row shown in the portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    /// Database identifier.
    pub id: i64,
    /// Recipient; `None` addresses every admin.
    pub user_id: Option<i64>,
    /// What raised the alert.
    pub kind: AlertKind,
    /// Human-readable text.
    pub message: String,
    /// Key that prevents the same condition from alerting twice.
    pub dedupe_key: String,
    /// When the alert was raised.
    pub created_at: DateTime<Utc>,
    /// When the recipient acknowledged it.
    pub acknowledged_at: Option<DateTime<Utc>>,
}

impl Alert {
    /// Returns true if the alert is addressed to all admins.
    pub fn is_broadcast(&self) -> bool {
        self.user_id.is_none()
    }
}
