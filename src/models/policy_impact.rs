//! Attendance policy evaluation results.
//!
//! This module contains the [`PolicyImpact`] type and its associated structures
//! that capture everything an attendance evaluation produces: a per-day
//! breakdown, deduction totals and an evaluation trace explaining each rule
//! that fired.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ApprovalStatus, EffectiveStatus, ReportedStatus};
use crate::policy::{DayKind, HalfDayReason};

/// The outcome of evaluating a single calendar day.
///
/// # Example
///
/// ```
/// use staffing_portal::models::{DayEvaluation, EffectiveStatus};
/// use staffing_portal::policy::DayKind;
/// use chrono::NaiveDate;
///
/// let day = DayEvaluation {
///     date: NaiveDate::from_ymd_opt(2026, 1, 17).unwrap(),
///     day_kind: DayKind::Weekend,
///     reported_status: None,
///     approval_status: None,
///     effective_status: EffectiveStatus::Present,
///     auto_generated: true,
///     sandwiched: false,
///     uninformed_leave: false,
///     half_day_flag: false,
///     half_day_reasons: vec![],
///     applications_logged: 0,
///     daily_quota: 20,
///     quota_met: None,
/// };
/// assert!(day.auto_generated);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayEvaluation {
    /// The evaluated date.
    pub date: NaiveDate,
    /// Working day, weekend or holiday.
    pub day_kind: DayKind,
    /// The reported status, when a record exists.
    pub reported_status: Option<ReportedStatus>,
    /// The review state, when a record exists.
    pub approval_status: Option<ApprovalStatus>,
    /// The status the day counts as.
    pub effective_status: EffectiveStatus,
    /// True for off-days filled in without a record.
    pub auto_generated: bool,
    /// True when an auto-present off-day was converted by the sandwich rule.
    pub sandwiched: bool,
    /// True for a past working day with no record or a rejected record.
    pub uninformed_leave: bool,
    /// True when the day carries a half-day flag.
    pub half_day_flag: bool,
    /// Why the half-day flag was raised.
    pub half_day_reasons: Vec<HalfDayReason>,
    /// Applications the user logged on this date.
    pub applications_logged: u32,
    /// The quota in force for this date.
    pub daily_quota: u32,
    /// Whether the quota was met; `None` where the quota does not apply.
    pub quota_met: Option<bool>,
}

/// Aggregated counters for an evaluated range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactTotals {
    /// Days evaluated (range clipped to `as_of`).
    pub evaluated_days: u32,
    /// Working days among them.
    pub working_days: u32,
    /// Days whose effective status is present.
    pub present_days: u32,
    /// Days whose effective status is half-day.
    pub half_days: u32,
    /// Days whose effective status is absent.
    pub absent_days: u32,
    /// Days still pending review.
    pub pending_days: u32,
    /// Days whose record was rejected.
    pub rejected_days: u32,
    /// Off-days auto-generated as present.
    pub auto_present_days: u32,
    /// Half-day flags raised.
    pub half_day_flags: u32,
    /// Full days deducted from converted half-day flags.
    pub full_day_deductions: u32,
    /// Half-day flags left over after conversion.
    pub remaining_half_day_flags: u32,
    /// Working days of uninformed or unapproved leave.
    pub uninformed_leave_days: u32,
    /// Off-days converted to absent by the sandwich rule.
    pub sandwich_days: u32,
    /// Uninformed leave plus sandwich days.
    pub leave_deduction_days: u32,
    /// Everything deducted, in days.
    pub total_deduction_days: Decimal,
    /// Working days on which the application quota was met.
    pub quota_met_days: u32,
}

/// A single step in the evaluation trace recording a rule decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationStep {
    /// The sequential step number.
    pub step_number: u32,
    /// Identifier of the rule that was applied.
    pub rule_id: String,
    /// Human-readable rule name.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// A warning raised during evaluation that did not stop it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationWarning {
    /// A code identifying the type of warning.
    pub code: String,
    /// A human-readable description.
    pub message: String,
}

/// The complete trace of an evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationTrace {
    /// The sequence of rule steps.
    pub steps: Vec<EvaluationStep>,
    /// Any warnings generated.
    pub warnings: Vec<EvaluationWarning>,
    /// Evaluation duration in microseconds.
    pub duration_us: u64,
}

/// The complete result of evaluating a user's attendance over a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyImpact {
    /// Unique identifier for this evaluation.
    pub evaluation_id: Uuid,
    /// When the evaluation ran.
    pub generated_at: DateTime<Utc>,
    /// The evaluated user.
    pub user_id: i64,
    /// First date of the requested range.
    pub start: NaiveDate,
    /// Last date of the requested range.
    pub end: NaiveDate,
    /// Days after this date were not evaluated.
    pub as_of: NaiveDate,
    /// Per-day breakdown, in date order.
    pub days: Vec<DayEvaluation>,
    /// Aggregated totals.
    pub totals: ImpactTotals,
    /// Rule trace.
    pub trace: EvaluationTrace,
}
