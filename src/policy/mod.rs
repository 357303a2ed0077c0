//! Attendance policy rules.
//!
//! Each rule lives in its own module and returns its result together with an
//! [`EvaluationStep`](crate::models::EvaluationStep) for the trace. The
//! [`evaluate_attendance`] function runs them in order over a date range:
//!
//! 1. Effective status for every recorded day
//! 2. Quota evaluation and half-day detection for recorded days
//! 3. Off-days without a record become auto-generated present days
//! 4. The sandwich-leave rule over those auto-generated days
//! 5. Deduction totals

mod day_detection;
mod deductions;
mod effective_status;
mod evaluator;
mod half_day;
mod quota;
mod sandwich_leave;

pub use day_detection::{classify_day, dates_between, day_kind_for, DayKind};
pub use deductions::{compute_deductions, DeductionResult, DeductionSummary};
pub use effective_status::resolve_effective_status;
pub use evaluator::{evaluate_attendance, EvaluationInput};
pub use half_day::{detect_half_day, HalfDayDetection, HalfDayReason};
pub use quota::{evaluate_quota, QuotaEvaluation};
pub use sandwich_leave::{apply_sandwich_leave, SandwichResult, SANDWICH_SCAN_LIMIT_DAYS};
