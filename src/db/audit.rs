//! Audit trail. Rows are only ever inserted.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, QueryBuilder, Row, Sqlite, SqlitePool};

use crate::error::{PortalError, PortalResult};
use crate::models::AuditLogEntry;

/// Default and maximum page size for [`list`].
pub const MAX_AUDIT_PAGE: i64 = 500;

/// A new audit row.
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    /// Acting user; `None` for system jobs.
    pub actor_id: Option<i64>,
    /// Verb.
    pub action: &'static str,
    /// Entity name.
    pub entity: &'static str,
    /// Affected row.
    pub entity_id: Option<i64>,
    /// Structured details.
    pub details: serde_json::Value,
}

impl NewAuditEntry {
    /// Builds an entry for a user action on a single row.
    pub fn new(
        actor_id: i64,
        action: &'static str,
        entity: &'static str,
        entity_id: i64,
        details: serde_json::Value,
    ) -> Self {
        Self {
            actor_id: Some(actor_id),
            action,
            entity,
            entity_id: Some(entity_id),
            details,
        }
    }
}

/// Filters for [`list`].
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    /// Only rows for this entity name.
    pub entity: Option<String>,
    /// Only rows by this actor.
    pub actor_id: Option<i64>,
    /// Page size, capped at [`MAX_AUDIT_PAGE`].
    pub limit: Option<i64>,
}

fn from_row(row: &SqliteRow) -> PortalResult<AuditLogEntry> {
    let raw: String = row.try_get("details")?;
    let details = serde_json::from_str(&raw).map_err(|_| PortalError::CorruptRecord {
        column: "details".to_string(),
        value: raw.clone(),
    })?;

    Ok(AuditLogEntry {
        id: row.try_get("id")?,
        actor_id: row.try_get("actor_id")?,
        action: row.try_get("action")?,
        entity: row.try_get("entity")?,
        entity_id: row.try_get("entity_id")?,
        details,
        created_at: row.try_get("created_at")?,
    })
}

/// Appends an audit row. Works on a pool or inside a transaction.
pub async fn record<'e, E>(executor: E, entry: &NewAuditEntry) -> PortalResult<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let id = sqlx::query(
        "INSERT INTO audit_logs (actor_id, action, entity, entity_id, details, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(entry.actor_id)
    .bind(entry.action)
    .bind(entry.entity)
    .bind(entry.entity_id)
    .bind(entry.details.to_string())
    .bind(Utc::now())
    .execute(executor)
    .await?
    .last_insert_rowid();
    Ok(id)
}

/// Lists audit rows, newest first.
pub async fn list(pool: &SqlitePool, filter: &AuditFilter) -> PortalResult<Vec<AuditLogEntry>> {
    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT id, actor_id, action, entity, entity_id, details, created_at FROM audit_logs WHERE 1 = 1",
    );
    if let Some(entity) = &filter.entity {
        query.push(" AND entity = ").push_bind(entity.clone());
    }
    if let Some(actor_id) = filter.actor_id {
        query.push(" AND actor_id = ").push_bind(actor_id);
    }
    let limit = filter.limit.unwrap_or(MAX_AUDIT_PAGE).clamp(1, MAX_AUDIT_PAGE);
    query.push(" ORDER BY id DESC LIMIT ").push_bind(limit);

    let rows = query.build().fetch_all(pool).await?;
    rows.iter().map(from_row).collect()
}
