//! Effective attendance status resolution.
//!
//! Combines the status a recruiter reported for a day with the admin's
//! review decision into the single status the rest of the portal acts on.

use crate::models::{ApprovalStatus, EffectiveStatus, EvaluationStep, ReportedStatus};

/// Resolves the effective status of an attendance record.
///
/// | approval   | reported   | effective  |
/// |------------|------------|------------|
/// | rejected   | any        | rejected   |
/// | approved   | present    | present    |
/// | approved   | half-day   | half-day   |
/// | approved   | absent/leave | absent   |
/// | pending    | any        | pending    |
///
/// # Example
///
/// ```
/// use staffing_portal::models::{ApprovalStatus, EffectiveStatus, ReportedStatus};
/// use staffing_portal::policy::resolve_effective_status;
///
/// assert_eq!(
///     resolve_effective_status(ReportedStatus::Leave, ApprovalStatus::Approved),
///     EffectiveStatus::Absent
/// );
/// assert_eq!(
///     resolve_effective_status(ReportedStatus::Present, ApprovalStatus::Rejected),
///     EffectiveStatus::Rejected
/// );
/// ```
pub fn resolve_effective_status(
    reported: ReportedStatus,
    approval: ApprovalStatus,
) -> EffectiveStatus {
    match (approval, reported) {
        (ApprovalStatus::Rejected, _) => EffectiveStatus::Rejected,
        (ApprovalStatus::Approved, ReportedStatus::Present) => EffectiveStatus::Present,
        (ApprovalStatus::Approved, ReportedStatus::HalfDay) => EffectiveStatus::HalfDay,
        (ApprovalStatus::Approved, _) => EffectiveStatus::Absent,
        (ApprovalStatus::Pending, _) => EffectiveStatus::Pending,
    }
}

/// Builds the trace step for a status resolution.
pub(crate) fn status_step(
    date: chrono::NaiveDate,
    reported: ReportedStatus,
    approval: ApprovalStatus,
    effective: EffectiveStatus,
    step_number: u32,
) -> EvaluationStep {
    EvaluationStep {
        step_number,
        rule_id: "effective_status".to_string(),
        rule_name: "Effective Status".to_string(),
        input: serde_json::json!({
            "date": date,
            "reported_status": reported,
            "approval_status": approval,
        }),
        output: serde_json::json!({ "effective_status": effective }),
        reasoning: format!(
            "Reported '{}' with approval '{}' resolves to '{}'",
            reported, approval, effective
        ),
    }
}
