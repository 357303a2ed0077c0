//! Attendance policy evaluation over a date range.
//!
//! This module ties the individual rules together: it resolves each day's
//! effective status, fills in off-days, evaluates quotas and half-day flags,
//! applies the sandwich rule and totals the deductions.

use std::collections::HashMap;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::config::ConfigLoader;
use crate::error::{PortalError, PortalResult};
use crate::models::{
    AttendanceRecord, DayEvaluation, EffectiveStatus, EvaluationStep, EvaluationTrace,
    EvaluationWarning, ImpactTotals, PolicyImpact,
};

use super::day_detection::{classify_day, dates_between, day_kind_for, DayKind};
use super::deductions::compute_deductions;
use super::effective_status::status_step;
use super::half_day::detect_half_day;
use super::quota::evaluate_quota;
use super::sandwich_leave::apply_sandwich_leave;

/// Everything needed to evaluate one user's attendance.
///
/// `records` should cover the requested range plus
/// [`super::SANDWICH_SCAN_LIMIT_DAYS`] on either side, so that off-days at
/// the edges of the range can find their bracketing working days. A working
/// day before `as_of` with no record counts as uninformed leave; on `as_of`
/// itself a missing record is still awaited and reads as pending.
#[derive(Debug, Clone)]
pub struct EvaluationInput<'a> {
    /// The evaluated user.
    pub user_id: i64,
    /// First date of the range.
    pub start: NaiveDate,
    /// Last date of the range.
    pub end: NaiveDate,
    /// The evaluation date. Days after it are not evaluated and it is not
    /// yet past.
    pub as_of: NaiveDate,
    /// The user's attendance records.
    pub records: &'a [AttendanceRecord],
    /// Applications logged by the user, keyed by date.
    pub applications_per_day: &'a HashMap<NaiveDate, u32>,
    /// The user's quota override, if any.
    pub quota_override: Option<u32>,
    /// The portal configuration.
    pub config: &'a ConfigLoader,
}

/// Evaluates a user's attendance over a date range.
///
/// # Errors
///
/// * [`PortalError::Validation`] if `start` is after `end`
/// * [`PortalError::PolicyNotFound`] if a date in the range has no policy
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use staffing_portal::config::ConfigLoader;
/// use staffing_portal::policy::{evaluate_attendance, EvaluationInput};
/// use chrono::NaiveDate;
///
/// let config = ConfigLoader::load("./config/portal").unwrap();
/// let applications = HashMap::new();
/// let impact = evaluate_attendance(EvaluationInput {
///     user_id: 7,
///     start: NaiveDate::from_ymd_opt(2026, 1, 12).unwrap(),
///     end: NaiveDate::from_ymd_opt(2026, 1, 18).unwrap(),
///     as_of: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
///     records: &[],
///     applications_per_day: &applications,
///     quota_override: None,
///     config: &config,
/// })
/// .unwrap();
///
/// // Five working days with no record are uninformed leave
/// assert_eq!(impact.totals.uninformed_leave_days, 5);
/// ```
pub fn evaluate_attendance(input: EvaluationInput<'_>) -> PortalResult<PolicyImpact> {
    let start_time = Instant::now();

    if input.start > input.end {
        return Err(PortalError::validation(
            "end",
            format!("{} is before start {}", input.end, input.start),
        ));
    }

    let config = input.config;
    let holidays = config.config().holidays();
    let records_by_date: HashMap<NaiveDate, &AttendanceRecord> = input
        .records
        .iter()
        .filter(|r| r.user_id == input.user_id)
        .map(|r| (r.date, r))
        .collect();

    let mut steps: Vec<EvaluationStep> = Vec::new();
    let mut warnings: Vec<EvaluationWarning> = Vec::new();
    let mut step_number: u32 = 1;
    let mut days: Vec<DayEvaluation> = Vec::new();

    let last = input.end.min(input.as_of);
    if last < input.start {
        warnings.push(EvaluationWarning {
            code: "NOTHING_TO_EVALUATE".to_string(),
            message: format!(
                "Range starts {} which is after as_of {}",
                input.start, input.as_of
            ),
        });
    }

    for date in dates_between(input.start, last) {
        let policy = config.policy_for(date)?;
        let day_kind = classify_day(date, policy, holidays);
        let daily_quota = input
            .quota_override
            .unwrap_or(policy.quota.daily_applications);
        let applications_logged = input
            .applications_per_day
            .get(&date)
            .copied()
            .unwrap_or(0);

        let mut day = DayEvaluation {
            date,
            day_kind,
            reported_status: None,
            approval_status: None,
            effective_status: EffectiveStatus::Present,
            auto_generated: false,
            sandwiched: false,
            uninformed_leave: false,
            half_day_flag: false,
            half_day_reasons: Vec::new(),
            applications_logged,
            daily_quota,
            quota_met: None,
        };

        match records_by_date.get(&date) {
            Some(record) => {
                let effective = record.effective_status();
                day.reported_status = Some(record.reported_status);
                day.approval_status = Some(record.approval_status);
                day.effective_status = effective;
                steps.push(status_step(
                    date,
                    record.reported_status,
                    record.approval_status,
                    effective,
                    step_number,
                ));
                step_number += 1;

                let worked = matches!(
                    effective,
                    EffectiveStatus::Present | EffectiveStatus::HalfDay
                );
                let mut quota_shortfall = false;
                if day_kind == DayKind::Working && worked {
                    let quota = evaluate_quota(applications_logged, daily_quota, &policy.quota);
                    day.quota_met = Some(quota.met);
                    quota_shortfall = quota.below_threshold;
                }

                let detection = detect_half_day(record, quota_shortfall, policy, step_number);
                steps.push(detection.audit_step);
                step_number += 1;
                day.half_day_flag = detection.flagged;
                day.half_day_reasons = detection.reasons;

                if day_kind == DayKind::Working && effective == EffectiveStatus::Rejected {
                    day.uninformed_leave = true;
                }
            }
            None if day_kind.is_off_day() => {
                day.auto_generated = true;
            }
            None if date >= input.as_of => {
                day.effective_status = EffectiveStatus::Pending;
            }
            None => {
                day.effective_status = EffectiveStatus::Absent;
                day.uninformed_leave = true;
            }
        }

        days.push(day);
    }

    // Sandwich rule over auto-present off-days whose policy enables it
    let mut candidates = Vec::new();
    for day in days.iter().filter(|d| d.auto_generated) {
        if config.policy_for(day.date)?.weekend.sandwich_leave {
            candidates.push(day.date);
        }
    }
    if !candidates.is_empty() {
        let as_of = input.as_of;
        let is_off_day = |date: NaiveDate| day_kind_for(config, date).is_some_and(|k| k.is_off_day());
        let is_absence = |date: NaiveDate| {
            if date > as_of {
                return false;
            }
            match records_by_date.get(&date) {
                Some(record) => matches!(
                    record.effective_status(),
                    EffectiveStatus::Absent | EffectiveStatus::Rejected
                ),
                None => date < as_of && day_kind_for(config, date) == Some(DayKind::Working),
            }
        };
        let sandwich = apply_sandwich_leave(&candidates, is_off_day, is_absence, step_number);
        steps.push(sandwich.audit_step);
        step_number += 1;

        for day in days.iter_mut() {
            if sandwich.sandwiched.contains(&day.date) {
                day.effective_status = EffectiveStatus::Absent;
                day.sandwiched = true;
            }
        }
    }

    let mut totals = ImpactTotals {
        evaluated_days: days.len() as u32,
        ..ImpactTotals::default()
    };
    for day in &days {
        if day.day_kind == DayKind::Working {
            totals.working_days += 1;
        }
        match day.effective_status {
            EffectiveStatus::Present => totals.present_days += 1,
            EffectiveStatus::HalfDay => totals.half_days += 1,
            EffectiveStatus::Absent => totals.absent_days += 1,
            EffectiveStatus::Pending => totals.pending_days += 1,
            EffectiveStatus::Rejected => totals.rejected_days += 1,
        }
        if day.auto_generated && !day.sandwiched {
            totals.auto_present_days += 1;
        }
        if day.half_day_flag {
            totals.half_day_flags += 1;
        }
        if day.uninformed_leave {
            totals.uninformed_leave_days += 1;
        }
        if day.sandwiched {
            totals.sandwich_days += 1;
        }
        if day.quota_met == Some(true) {
            totals.quota_met_days += 1;
        }
    }

    let ratio_policy = config.policy_for(input.end)?;
    let deductions = compute_deductions(
        totals.half_day_flags,
        totals.uninformed_leave_days,
        totals.sandwich_days,
        ratio_policy.deductions.half_days_per_full_day,
        step_number,
    );
    steps.push(deductions.audit_step);
    totals.full_day_deductions = deductions.summary.full_day_deductions;
    totals.remaining_half_day_flags = deductions.summary.remaining_half_day_flags;
    totals.leave_deduction_days = deductions.summary.leave_deduction_days;
    totals.total_deduction_days = deductions.summary.total_deduction_days;

    if totals.pending_days > 0 {
        warnings.push(EvaluationWarning {
            code: "PENDING_REVIEW".to_string(),
            message: format!(
                "{} day(s) await a report or review and are not counted towards deductions",
                totals.pending_days
            ),
        });
    }

    Ok(PolicyImpact {
        evaluation_id: Uuid::new_v4(),
        generated_at: Utc::now(),
        user_id: input.user_id,
        start: input.start,
        end: input.end,
        as_of: input.as_of,
        days,
        totals,
        trace: EvaluationTrace {
            steps,
            warnings,
            duration_us: start_time.elapsed().as_micros() as u64,
        },
    })
}
