//! Configuration types for the staffing portal.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from the YAML files of a portal configuration directory.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Metadata about the portal deployment.
#[derive(Debug, Clone, Deserialize)]
pub struct PortalMetadata {
    /// Product name shown to users.
    pub name: String,
    /// The agency operating the portal.
    pub organisation: String,
    /// Label of the office timezone all naive timestamps are expressed in.
    pub timezone: String,
}

/// A company holiday.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Holiday {
    /// The holiday date.
    pub date: NaiveDate,
    /// The holiday name.
    pub name: String,
}

/// Holidays configuration file structure.
#[derive(Debug, Clone, Deserialize)]
pub struct HolidaysConfig {
    /// Configured holidays.
    #[serde(default)]
    pub holidays: Vec<Holiday>,
}

/// Office hours and the thresholds that raise half-day flags.
#[derive(Debug, Clone, Deserialize)]
pub struct ShiftPolicy {
    /// Shift start.
    pub start: NaiveTime,
    /// Shift end.
    pub end: NaiveTime,
    /// Minutes after `start` before a login counts as late.
    pub login_grace_minutes: u32,
    /// A logout more than this many minutes before `end` counts as early.
    pub early_logout_threshold_minutes: u32,
    /// Break minutes allowed per day.
    pub break_allowance_minutes: u32,
}

impl ShiftPolicy {
    /// Latest login time that is not late.
    pub fn late_login_cutoff(&self) -> NaiveTime {
        self.start + Duration::minutes(i64::from(self.login_grace_minutes))
    }

    /// Earliest logout time that is not early.
    pub fn early_logout_cutoff(&self) -> NaiveTime {
        self.end - Duration::minutes(i64::from(self.early_logout_threshold_minutes))
    }
}

/// How half-day flags turn into deductions.
#[derive(Debug, Clone, Deserialize)]
pub struct DeductionPolicy {
    /// Number of half-day flags that make one full-day deduction.
    pub half_days_per_full_day: u32,
}

/// Daily application quota settings.
#[derive(Debug, Clone, Deserialize)]
pub struct QuotaPolicy {
    /// Default number of applications a recruiter should log per working day.
    pub daily_applications: u32,
    /// Fraction of the quota below which a present day is a shortfall.
    pub shortfall_fraction: Decimal,
    /// Whether a shortfall raises a half-day flag.
    pub shortfall_counts_as_half_day: bool,
}

/// Weekend definition and the sandwich-leave switch.
#[derive(Debug, Clone, Deserialize)]
pub struct WeekendPolicy {
    /// Days of the week that are off.
    pub days: Vec<Weekday>,
    /// Whether off-days bracketed by absences are converted to absent.
    pub sandwich_leave: bool,
}

/// An attendance policy version, in force from `effective_date`.
#[derive(Debug, Clone, Deserialize)]
pub struct AttendancePolicy {
    /// First date this version applies to.
    pub effective_date: NaiveDate,
    /// Office hours and thresholds.
    pub shift: ShiftPolicy,
    /// Deduction conversion.
    pub deductions: DeductionPolicy,
    /// Application quota.
    pub quota: QuotaPolicy,
    /// Weekend definition.
    pub weekend: WeekendPolicy,
}

impl AttendancePolicy {
    /// Returns true if the date falls on a configured weekend day.
    pub fn is_weekend(&self, date: NaiveDate) -> bool {
        self.weekend.days.contains(&date.weekday())
    }

    /// Checks the invariants the rule functions rely on.
    pub fn validate(&self) -> Result<(), String> {
        if self.deductions.half_days_per_full_day == 0 {
            return Err("deductions.half_days_per_full_day must be at least 1".to_string());
        }
        if self.shift.start >= self.shift.end {
            return Err("shift.start must be before shift.end".to_string());
        }
        let shift_minutes = (self.shift.end - self.shift.start).num_minutes();
        if i64::from(self.shift.login_grace_minutes) > shift_minutes {
            return Err("shift.login_grace_minutes must not run past shift.end".to_string());
        }
        if i64::from(self.shift.early_logout_threshold_minutes) > shift_minutes {
            return Err(
                "shift.early_logout_threshold_minutes must not reach before shift.start".to_string(),
            );
        }
        if self.quota.shortfall_fraction < Decimal::ZERO
            || self.quota.shortfall_fraction > Decimal::ONE
        {
            return Err("quota.shortfall_fraction must be between 0 and 1".to_string());
        }
        if self.weekend.days.len() >= 7 {
            return Err("weekend.days must leave at least one working day".to_string());
        }
        Ok(())
    }
}

/// Settings shared by every alert check.
#[derive(Debug, Clone, Deserialize)]
pub struct AlertCheck {
    /// Whether the check is scheduled.
    pub enabled: bool,
    /// Seconds between runs.
    pub interval_seconds: u64,
}

/// Settings for the pending-approval check.
#[derive(Debug, Clone, Deserialize)]
pub struct PendingApprovalCheck {
    /// Whether the check is scheduled.
    pub enabled: bool,
    /// Seconds between runs.
    pub interval_seconds: u64,
    /// Hours a record may stay pending before admins are alerted.
    pub pending_hours: u32,
}

/// Settings for the quota-shortfall check.
#[derive(Debug, Clone, Deserialize)]
pub struct QuotaShortfallCheck {
    /// Whether the check is scheduled.
    pub enabled: bool,
    /// Seconds between runs.
    pub interval_seconds: u64,
    /// Local time after which shortfalls are reported.
    pub check_after: NaiveTime,
}

/// Alert scheduler configuration from alerts.yaml.
#[derive(Debug, Clone, Deserialize)]
pub struct AlertSchedule {
    /// Missing attendance check.
    pub missing_attendance: AlertCheck,
    /// Pending approval check.
    pub pending_approval: PendingApprovalCheck,
    /// Quota shortfall check.
    pub quota_shortfall: QuotaShortfallCheck,
}

/// The complete portal configuration loaded from YAML files.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    metadata: PortalMetadata,
    holidays: BTreeMap<NaiveDate, Holiday>,
    /// Sorted oldest first.
    policies: Vec<AttendancePolicy>,
    alerts: AlertSchedule,
}

impl PortalConfig {
    /// Creates a new PortalConfig from its component parts.
    pub fn new(
        metadata: PortalMetadata,
        holidays: Vec<Holiday>,
        policies: Vec<AttendancePolicy>,
        alerts: AlertSchedule,
    ) -> Self {
        let mut sorted_policies = policies;
        sorted_policies.sort_by(|a, b| a.effective_date.cmp(&b.effective_date));
        Self {
            metadata,
            holidays: holidays.into_iter().map(|h| (h.date, h)).collect(),
            policies: sorted_policies,
            alerts,
        }
    }

    /// Returns the portal metadata.
    pub fn portal(&self) -> &PortalMetadata {
        &self.metadata
    }

    /// Returns the holidays keyed by date.
    pub fn holidays(&self) -> &BTreeMap<NaiveDate, Holiday> {
        &self.holidays
    }

    /// Returns all policy versions, oldest first.
    pub fn policies(&self) -> &[AttendancePolicy] {
        &self.policies
    }

    /// Returns the alert schedule.
    pub fn alerts(&self) -> &AlertSchedule {
        &self.alerts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn policy() -> AttendancePolicy {
        serde_yaml::from_str(
            r#"
effective_date: 2025-01-01
shift:
  start: "09:00:00"
  end: "18:00:00"
  login_grace_minutes: 15
  early_logout_threshold_minutes: 120
  break_allowance_minutes: 60
deductions:
  half_days_per_full_day: 2
quota:
  daily_applications: 20
  shortfall_fraction: "0.5"
  shortfall_counts_as_half_day: true
weekend:
  days: [Sat, Sun]
  sandwich_leave: true
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_policy_deserializes() {
        let policy = policy();
        assert_eq!(policy.quota.shortfall_fraction, Decimal::from_str("0.5").unwrap());
        assert_eq!(policy.weekend.days, vec![Weekday::Sat, Weekday::Sun]);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_shift_cutoffs() {
        let policy = policy();
        assert_eq!(
            policy.shift.late_login_cutoff(),
            NaiveTime::from_hms_opt(9, 15, 0).unwrap()
        );
        assert_eq!(
            policy.shift.early_logout_cutoff(),
            NaiveTime::from_hms_opt(16, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_is_weekend() {
        let policy = policy();
        assert!(policy.is_weekend(NaiveDate::from_ymd_opt(2026, 1, 17).unwrap()));
        assert!(!policy.is_weekend(NaiveDate::from_ymd_opt(2026, 1, 16).unwrap()));
    }

    #[test]
    fn test_validate_rejects_zero_conversion_ratio() {
        let mut policy = policy();
        policy.deductions.half_days_per_full_day = 0;
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_shift() {
        let mut policy = policy();
        policy.shift.end = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_fraction_above_one() {
        let mut policy = policy();
        policy.quota.shortfall_fraction = Decimal::from_str("1.5").unwrap();
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_grace_past_shift_end() {
        let mut policy = policy();
        policy.shift.start = NaiveTime::from_hms_opt(23, 0, 0).unwrap();
        policy.shift.end = NaiveTime::from_hms_opt(23, 50, 0).unwrap();
        policy.shift.early_logout_threshold_minutes = 10;
        policy.shift.login_grace_minutes = 75;
        let message = policy.validate().unwrap_err();
        assert!(message.contains("login_grace_minutes"));

        policy.shift.login_grace_minutes = 50;
        assert!(policy.validate().is_ok());
        assert_eq!(
            policy.shift.late_login_cutoff(),
            NaiveTime::from_hms_opt(23, 50, 0).unwrap()
        );
    }

    #[test]
    fn test_validate_rejects_threshold_before_shift_start() {
        let mut policy = policy();
        policy.shift.start = NaiveTime::from_hms_opt(0, 30, 0).unwrap();
        policy.shift.end = NaiveTime::from_hms_opt(2, 0, 0).unwrap();
        policy.shift.login_grace_minutes = 15;
        policy.shift.early_logout_threshold_minutes = 120;
        let message = policy.validate().unwrap_err();
        assert!(message.contains("early_logout_threshold_minutes"));
    }
}
