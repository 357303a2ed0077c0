//! Day classification.
//!
//! Determines whether a calendar date is a working day, a weekend day or a
//! company holiday. Weekends and holidays are off-days: they default to an
//! auto-generated present day and are the days the sandwich-leave rule can
//! convert.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::{AttendancePolicy, ConfigLoader, Holiday};

/// The kind of a calendar day for attendance purposes.
///
/// # Example
///
/// ```
/// use staffing_portal::policy::DayKind;
///
/// assert!(DayKind::Weekend.is_off_day());
/// assert!(!DayKind::Working.is_off_day());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayKind {
    /// A regular working day; attendance is expected.
    Working,
    /// A configured weekend day.
    Weekend,
    /// A configured company holiday.
    Holiday,
}

impl DayKind {
    /// Returns true for weekends and holidays.
    pub fn is_off_day(&self) -> bool {
        !matches!(self, DayKind::Working)
    }
}

impl std::fmt::Display for DayKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DayKind::Working => write!(f, "Working"),
            DayKind::Weekend => write!(f, "Weekend"),
            DayKind::Holiday => write!(f, "Holiday"),
        }
    }
}

/// Classifies a date under the given policy and holiday calendar.
///
/// Holidays take precedence over weekends.
///
/// # Example
///
/// ```
/// use staffing_portal::policy::{classify_day, DayKind};
/// use staffing_portal::config::ConfigLoader;
/// use chrono::NaiveDate;
///
/// let config = ConfigLoader::load("./config/portal").unwrap();
/// let saturday = NaiveDate::from_ymd_opt(2026, 1, 17).unwrap();
/// let policy = config.policy_for(saturday).unwrap();
/// assert_eq!(
///     classify_day(saturday, policy, config.config().holidays()),
///     DayKind::Weekend
/// );
/// ```
pub fn classify_day(
    date: NaiveDate,
    policy: &AttendancePolicy,
    holidays: &BTreeMap<NaiveDate, Holiday>,
) -> DayKind {
    if holidays.contains_key(&date) {
        DayKind::Holiday
    } else if policy.is_weekend(date) {
        DayKind::Weekend
    } else {
        DayKind::Working
    }
}

/// Classifies a date using whichever policy is in force on it.
///
/// Returns `None` when no policy covers the date.
pub fn day_kind_for(config: &ConfigLoader, date: NaiveDate) -> Option<DayKind> {
    config
        .policy_for(date)
        .ok()
        .map(|policy| classify_day(date, policy, config.config().holidays()))
}

/// Iterates every date from `start` to `end`, inclusive.
pub fn dates_between(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d <= end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ConfigLoader {
        ConfigLoader::load("./config/portal").unwrap()
    }

    fn make_date(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
    }

    fn kind(config: &ConfigLoader, date_str: &str) -> DayKind {
        let date = make_date(date_str);
        classify_day(date, config.policy_for(date).unwrap(), config.config().holidays())
    }

    #[test]
    fn test_monday_is_working_day() {
        let config = config();
        // 2026-01-12 is a Monday
        assert_eq!(kind(&config, "2026-01-12"), DayKind::Working);
    }

    #[test]
    fn test_saturday_and_sunday_are_weekend() {
        let config = config();
        assert_eq!(kind(&config, "2026-01-17"), DayKind::Weekend);
        assert_eq!(kind(&config, "2026-01-18"), DayKind::Weekend);
    }

    #[test]
    fn test_configured_holiday_on_weekday() {
        let config = config();
        // 2026-01-26 is a Monday and a configured holiday
        assert_eq!(kind(&config, "2026-01-26"), DayKind::Holiday);
    }

    #[test]
    fn test_day_kind_for_date_without_policy() {
        let config = config();
        assert_eq!(day_kind_for(&config, make_date("2019-06-03")), None);
        assert_eq!(
            day_kind_for(&config, make_date("2026-01-13")),
            Some(DayKind::Working)
        );
    }

    #[test]
    fn test_dates_between_is_inclusive() {
        let dates: Vec<NaiveDate> =
            dates_between(make_date("2026-01-12"), make_date("2026-01-18")).collect();
        assert_eq!(dates.len(), 7);
        assert_eq!(dates[0], make_date("2026-01-12"));
        assert_eq!(dates[6], make_date("2026-01-18"));
    }

    #[test]
    fn test_dates_between_empty_when_reversed() {
        let dates: Vec<NaiveDate> =
            dates_between(make_date("2026-01-18"), make_date("2026-01-12")).collect();
        assert!(dates.is_empty());
    }
}
