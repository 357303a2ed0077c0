//! User model and roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

text_enum! {
    /// The role a portal user acts under.
    pub enum Role {
        /// Full visibility and approval rights across all recruiters' data.
        Admin => "admin",
        /// Logs applications, interviews and assessments for assigned candidates.
        Recruiter => "recruiter",
    }
}

/// A portal account.
///
/// Credentials are never part of this type; the password hash stays in the
/// persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Database identifier.
    pub id: i64,
    /// Login email, unique across the portal.
    pub email: String,
    /// Display name.
    pub full_name: String,
    /// The role this user acts under.
    pub role: Role,
    /// Per-user daily application target, overriding the policy default.
    pub daily_quota: Option<u32>,
    /// Inactive users cannot authenticate and are skipped by alert checks.
    pub active: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Returns true if the user has the admin role.
    ///
    /// # Examples
    ///
    /// ```
    /// use staffing_portal::models::{Role, User};
    /// use chrono::Utc;
    ///
    /// let admin = User {
    ///     id: 1,
    ///     email: "ops@example.com".to_string(),
    ///     full_name: "Ops".to_string(),
    ///     role: Role::Admin,
    ///     daily_quota: None,
    ///     active: true,
    ///     created_at: Utc::now(),
    /// };
    /// assert!(admin.is_admin());
    /// ```
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
