//! Audit trail entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the INSERT-only audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// Database identifier.
    pub id: i64,
    /// The user who performed the action; `None` for system jobs.
    pub actor_id: Option<i64>,
    /// Verb, e.g. `create`, `update`, `review`, `import`.
    pub action: String,
    /// Table or entity name.
    pub entity: String,
    /// Affected row, when there is a single one.
    pub entity_id: Option<i64>,
    /// Structured details of the change.
    pub details: serde_json::Value,
    /// When the action happened.
    pub created_at: DateTime<Utc>,
}
