//! Half-day flag detection.
//!
//! This module decides whether a recorded day carries a half-day flag. A
//! present day is flagged by a late login, an early logout, break time over
//! the allowance, or an application quota shortfall; an approved half-day
//! report is flagged as reported. A day carries at most one flag no matter
//! how many reasons apply.

use serde::{Deserialize, Serialize};

use crate::config::AttendancePolicy;
use crate::models::{AttendanceRecord, EffectiveStatus, EvaluationStep};

/// Why a day was flagged as a half-day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HalfDayReason {
    /// Logged in after the shift start plus grace.
    LateLogin,
    /// Logged out before the early-logout cutoff.
    EarlyLogout,
    /// Took more break time than allowed.
    ExcessBreak,
    /// Logged fewer applications than the shortfall threshold.
    QuotaShortfall,
    /// The recruiter reported a half-day and it was approved.
    ReportedHalfDay,
}

/// The result of half-day detection for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HalfDayDetection {
    /// Whether the day carries a half-day flag.
    pub flagged: bool,
    /// Every reason that applied, in rule order.
    pub reasons: Vec<HalfDayReason>,
    /// The trace step recording this detection.
    pub audit_step: EvaluationStep,
}

/// Detects whether a recorded day carries a half-day flag.
///
/// # Arguments
///
/// * `record` - The attendance record for the day
/// * `quota_shortfall` - Whether the day's application count was below the
///   shortfall threshold
/// * `policy` - The attendance policy in force on the record's date
/// * `step_number` - The step number for trace sequencing
///
/// Timestamp rules only apply to days whose effective status is present;
/// a missing login or logout timestamp skips the corresponding rule.
///
/// # Example
///
/// ```
/// use staffing_portal::config::ConfigLoader;
/// use staffing_portal::models::{ApprovalStatus, AttendanceRecord, ReportedStatus};
/// use staffing_portal::policy::{detect_half_day, HalfDayReason};
/// use chrono::{NaiveDate, Utc};
///
/// let config = ConfigLoader::load("./config/portal").unwrap();
/// let date = NaiveDate::from_ymd_opt(2026, 1, 13).unwrap();
/// let record = AttendanceRecord {
///     id: 1,
///     user_id: 2,
///     date,
///     reported_status: ReportedStatus::Present,
///     approval_status: ApprovalStatus::Approved,
///     login_at: Some(date.and_hms_opt(10, 5, 0).unwrap()),
///     logout_at: Some(date.and_hms_opt(18, 0, 0).unwrap()),
///     break_minutes: 30,
///     notes: None,
///     reviewed_by: None,
///     reviewed_at: None,
///     review_note: None,
///     created_at: Utc::now(),
///     updated_at: Utc::now(),
/// };
///
/// let detection = detect_half_day(&record, false, config.policy_for(date).unwrap(), 1);
/// assert!(detection.flagged);
/// assert_eq!(detection.reasons, vec![HalfDayReason::LateLogin]);
/// ```
pub fn detect_half_day(
    record: &AttendanceRecord,
    quota_shortfall: bool,
    policy: &AttendancePolicy,
    step_number: u32,
) -> HalfDayDetection {
    let effective = record.effective_status();
    let late_cutoff = record.date.and_time(policy.shift.late_login_cutoff());
    let early_cutoff = record.date.and_time(policy.shift.early_logout_cutoff());

    let mut reasons = Vec::new();
    match effective {
        EffectiveStatus::HalfDay => reasons.push(HalfDayReason::ReportedHalfDay),
        EffectiveStatus::Present => {
            if record.login_at.is_some_and(|login| login > late_cutoff) {
                reasons.push(HalfDayReason::LateLogin);
            }
            if record.logout_at.is_some_and(|logout| logout < early_cutoff) {
                reasons.push(HalfDayReason::EarlyLogout);
            }
            if record.break_minutes > policy.shift.break_allowance_minutes {
                reasons.push(HalfDayReason::ExcessBreak);
            }
            if quota_shortfall && policy.quota.shortfall_counts_as_half_day {
                reasons.push(HalfDayReason::QuotaShortfall);
            }
        }
        _ => {}
    }

    let flagged = !reasons.is_empty();

    let reasoning = match effective {
        EffectiveStatus::Present | EffectiveStatus::HalfDay if flagged => format!(
            "{} flagged as half-day: {}",
            record.date,
            reasons
                .iter()
                .map(|r| describe(*r, record, policy))
                .collect::<Vec<_>>()
                .join("; ")
        ),
        EffectiveStatus::Present => format!(
            "{} within login, logout and break limits, no half-day flag",
            record.date
        ),
        other => format!(
            "{} has effective status '{}', half-day rules do not apply",
            record.date, other
        ),
    };

    let audit_step = EvaluationStep {
        step_number,
        rule_id: "half_day_detection".to_string(),
        rule_name: "Half-Day Detection".to_string(),
        input: serde_json::json!({
            "date": record.date,
            "effective_status": effective,
            "login_at": record.login_at,
            "logout_at": record.logout_at,
            "break_minutes": record.break_minutes,
            "quota_shortfall": quota_shortfall,
            "late_login_cutoff": late_cutoff,
            "early_logout_cutoff": early_cutoff,
            "break_allowance_minutes": policy.shift.break_allowance_minutes,
        }),
        output: serde_json::json!({
            "flagged": flagged,
            "reasons": reasons,
        }),
        reasoning,
    };

    HalfDayDetection {
        flagged,
        reasons,
        audit_step,
    }
}

fn describe(reason: HalfDayReason, record: &AttendanceRecord, policy: &AttendancePolicy) -> String {
    match reason {
        HalfDayReason::LateLogin => format!(
            "login after {}",
            policy.shift.late_login_cutoff().format("%H:%M")
        ),
        HalfDayReason::EarlyLogout => format!(
            "logout before {}",
            policy.shift.early_logout_cutoff().format("%H:%M")
        ),
        HalfDayReason::ExcessBreak => format!(
            "{} break minutes exceeds {} allowed",
            record.break_minutes, policy.shift.break_allowance_minutes
        ),
        HalfDayReason::QuotaShortfall => "application quota shortfall".to_string(),
        HalfDayReason::ReportedHalfDay => "approved half-day report".to_string(),
    }
}
