//! Sandwich-leave rule.
//!
//! An off-day (weekend or holiday) normally counts as an auto-generated
//! present day. When the nearest working day before it and the nearest
//! working day after it are both absences, the off-day is "sandwiched" and
//! converted to absent.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};

use crate::models::EvaluationStep;

/// How far, in days, the rule looks for a bracketing working day.
pub const SANDWICH_SCAN_LIMIT_DAYS: i64 = 14;

/// The result of applying the sandwich rule to a set of off-days.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandwichResult {
    /// Off-days converted to absent.
    pub sandwiched: BTreeSet<NaiveDate>,
    /// The trace step recording the rule application.
    pub audit_step: EvaluationStep,
}

/// Finds the nearest working day strictly before or after `date`.
fn nearest_working_day<F>(date: NaiveDate, forward: bool, is_off_day: &F) -> Option<NaiveDate>
where
    F: Fn(NaiveDate) -> bool,
{
    let step = if forward {
        Duration::days(1)
    } else {
        Duration::days(-1)
    };
    let mut current = date;
    for _ in 0..SANDWICH_SCAN_LIMIT_DAYS {
        current = current.checked_add_signed(step)?;
        if !is_off_day(current) {
            return Some(current);
        }
    }
    None
}

/// Applies the sandwich rule to auto-present off-days.
///
/// # Arguments
///
/// * `candidates` - Auto-generated present off-days eligible for conversion
/// * `is_off_day` - Whether a date is a weekend or holiday
/// * `is_absence` - Whether a working date counts as an absence
/// * `step_number` - The step number for trace sequencing
///
/// # Example
///
/// ```
/// use staffing_portal::policy::apply_sandwich_leave;
/// use chrono::{Datelike, NaiveDate, Weekday};
///
/// let fri = NaiveDate::from_ymd_opt(2026, 1, 16).unwrap();
/// let sat = NaiveDate::from_ymd_opt(2026, 1, 17).unwrap();
/// let sun = NaiveDate::from_ymd_opt(2026, 1, 18).unwrap();
/// let mon = NaiveDate::from_ymd_opt(2026, 1, 19).unwrap();
///
/// let result = apply_sandwich_leave(
///     &[sat, sun],
///     |d| matches!(d.weekday(), Weekday::Sat | Weekday::Sun),
///     |d| d == fri || d == mon,
///     1,
/// );
/// assert!(result.sandwiched.contains(&sat));
/// assert!(result.sandwiched.contains(&sun));
/// ```
pub fn apply_sandwich_leave<F, A>(
    candidates: &[NaiveDate],
    is_off_day: F,
    is_absence: A,
    step_number: u32,
) -> SandwichResult
where
    F: Fn(NaiveDate) -> bool,
    A: Fn(NaiveDate) -> bool,
{
    let mut sandwiched = BTreeSet::new();
    let mut brackets = Vec::new();

    for &date in candidates {
        let before = nearest_working_day(date, false, &is_off_day);
        let after = nearest_working_day(date, true, &is_off_day);
        if let (Some(before), Some(after)) = (before, after) {
            if is_absence(before) && is_absence(after) {
                sandwiched.insert(date);
                brackets.push(serde_json::json!({
                    "date": date,
                    "absent_before": before,
                    "absent_after": after,
                }));
            }
        }
    }

    let reasoning = if sandwiched.is_empty() {
        format!(
            "None of {} auto-present off-days is bracketed by absences",
            candidates.len()
        )
    } else {
        format!(
            "{} of {} auto-present off-days bracketed by absences converted to absent",
            sandwiched.len(),
            candidates.len()
        )
    };

    let audit_step = EvaluationStep {
        step_number,
        rule_id: "sandwich_leave".to_string(),
        rule_name: "Sandwich Leave".to_string(),
        input: serde_json::json!({
            "candidates": candidates,
            "scan_limit_days": SANDWICH_SCAN_LIMIT_DAYS,
        }),
        output: serde_json::json!({
            "sandwiched": sandwiched,
            "brackets": brackets,
        }),
        reasoning,
    };

    SandwichResult {
        sandwiched,
        audit_step,
    }
}
