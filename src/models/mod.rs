//! Core data models for the staffing portal.
//!
//! This module contains all the domain models used throughout the portal:
//! users, the candidate pipeline, attendance, alerts, the audit trail and
//! attendance policy evaluation results.

use thiserror::Error;

/// Returned when a stored or submitted name matches no enum variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    /// The enum being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Declares a unit enum stored as snake_case text, with `as_str`, `Display`
/// and a `FromStr` that also accepts hyphenated spellings.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            /// All variants in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Returns the stored and wire name of this variant.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text, )+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::models::UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
                match normalized.as_str() {
                    $( $text => Ok($name::$variant), )+
                    _ => Err(crate::models::UnknownVariant {
                        kind: stringify!($name),
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

mod alert;
mod attendance;
mod audit;
mod candidate;
mod pipeline;
mod policy_impact;
mod user;

pub use alert::{Alert, AlertKind};
pub use attendance::{ApprovalStatus, AttendanceRecord, EffectiveStatus, ReportedStatus};
pub use audit::AuditLogEntry;
pub use candidate::{Candidate, CandidateStage};
pub use pipeline::{
    ApplicationStatus, Assessment, AssessmentStatus, Interview, InterviewKind, InterviewStatus,
    JobApplication,
};
pub use policy_impact::{
    DayEvaluation, EvaluationStep, EvaluationTrace, EvaluationWarning, ImpactTotals, PolicyImpact,
};
pub use user::{Role, User};
