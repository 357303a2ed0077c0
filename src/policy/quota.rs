//! Daily application quota evaluation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::QuotaPolicy;

/// How a day's application count compares with the quota.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaEvaluation {
    /// Applications logged.
    pub logged: u32,
    /// The quota in force.
    pub quota: u32,
    /// `quota * shortfall_fraction`.
    pub threshold: Decimal,
    /// `logged >= quota`.
    pub met: bool,
    /// `logged < threshold`.
    pub below_threshold: bool,
}

impl QuotaEvaluation {
    /// Number of applications still missing to reach the quota.
    pub fn shortfall(&self) -> u32 {
        self.quota.saturating_sub(self.logged)
    }
}

/// Compares the applications logged on a day with the quota.
///
/// A quota of zero is always met and never below threshold.
///
/// # Example
///
/// ```
/// use staffing_portal::config::QuotaPolicy;
/// use staffing_portal::policy::evaluate_quota;
/// use rust_decimal::Decimal;
///
/// let policy = QuotaPolicy {
///     daily_applications: 20,
///     shortfall_fraction: Decimal::new(5, 1),
///     shortfall_counts_as_half_day: true,
/// };
///
/// let eval = evaluate_quota(9, 20, &policy);
/// assert!(!eval.met);
/// assert!(eval.below_threshold);
/// assert_eq!(eval.shortfall(), 11);
/// ```
pub fn evaluate_quota(logged: u32, quota: u32, policy: &QuotaPolicy) -> QuotaEvaluation {
    let threshold = Decimal::from(quota) * policy.shortfall_fraction;
    QuotaEvaluation {
        logged,
        quota,
        threshold,
        met: logged >= quota,
        below_threshold: Decimal::from(logged) < threshold,
    }
}
