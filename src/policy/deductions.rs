//! Deduction arithmetic.
//!
//! Converts half-day flags into full-day deductions and adds the separate
//! leave-deduction total made of uninformed leave and sandwiched off-days.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::EvaluationStep;

/// Deduction figures for an evaluated range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionSummary {
    /// Half-day flags raised.
    pub half_day_flags: u32,
    /// Full days deducted from half-day flags.
    pub full_day_deductions: u32,
    /// Flags not yet converted.
    pub remaining_half_day_flags: u32,
    /// Uninformed leave days.
    pub uninformed_leave_days: u32,
    /// Sandwiched off-days.
    pub sandwich_days: u32,
    /// `uninformed_leave_days + sandwich_days`.
    pub leave_deduction_days: u32,
    /// `full_day_deductions + leave_deduction_days`.
    pub total_deduction_days: Decimal,
}

/// The result of computing deductions, with its trace step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeductionResult {
    /// The computed figures.
    pub summary: DeductionSummary,
    /// The trace step recording the computation.
    pub audit_step: EvaluationStep,
}

/// Computes deductions.
///
/// Every `half_days_per_full_day` flags become one full-day deduction; the
/// remainder is carried as `remaining_half_day_flags`. Leave deductions are
/// counted separately and added to the total.
///
/// # Example
///
/// ```
/// use staffing_portal::policy::compute_deductions;
/// use rust_decimal::Decimal;
///
/// let result = compute_deductions(5, 1, 2, 2, 1);
/// assert_eq!(result.summary.full_day_deductions, 2);
/// assert_eq!(result.summary.remaining_half_day_flags, 1);
/// assert_eq!(result.summary.leave_deduction_days, 3);
/// assert_eq!(result.summary.total_deduction_days, Decimal::new(5, 0));
/// ```
pub fn compute_deductions(
    half_day_flags: u32,
    uninformed_leave_days: u32,
    sandwich_days: u32,
    half_days_per_full_day: u32,
    step_number: u32,
) -> DeductionResult {
    // Config validation guarantees a ratio of at least one.
    let ratio = half_days_per_full_day.max(1);
    let full_day_deductions = half_day_flags / ratio;
    let remaining_half_day_flags = half_day_flags % ratio;
    let leave_deduction_days = uninformed_leave_days + sandwich_days;
    let total_deduction_days =
        Decimal::from(full_day_deductions) + Decimal::from(leave_deduction_days);

    let summary = DeductionSummary {
        half_day_flags,
        full_day_deductions,
        remaining_half_day_flags,
        uninformed_leave_days,
        sandwich_days,
        leave_deduction_days,
        total_deduction_days,
    };

    let audit_step = EvaluationStep {
        step_number,
        rule_id: "deductions".to_string(),
        rule_name: "Deduction Totals".to_string(),
        input: serde_json::json!({
            "half_day_flags": half_day_flags,
            "half_days_per_full_day": ratio,
            "uninformed_leave_days": uninformed_leave_days,
            "sandwich_days": sandwich_days,
        }),
        output: serde_json::to_value(&summary).unwrap_or_default(),
        reasoning: format!(
            "{} half-day flags / {} = {} full days (remainder {}); {} uninformed + {} sandwich = {} leave days; total {} days",
            half_day_flags,
            ratio,
            full_day_deductions,
            remaining_half_day_flags,
            uninformed_leave_days,
            sandwich_days,
            leave_deduction_days,
            total_deduction_days
        ),
    };

    DeductionResult {
        summary,
        audit_step,
    }
}
