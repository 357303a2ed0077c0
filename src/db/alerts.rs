//! Alert rows.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use super::parse_column;
use crate::error::{PortalError, PortalResult};
use crate::models::{Alert, AlertKind};

const COLUMNS: &str = "id, user_id, kind, message, dedupe_key, created_at, acknowledged_at";

/// A new alert. `user_id: None` addresses every admin.
#[derive(Debug, Clone)]
pub struct NewAlert {
    /// Recipient.
    pub user_id: Option<i64>,
    /// Kind.
    pub kind: AlertKind,
    /// Text.
    pub message: String,
    /// Key identifying the condition; a second insert with the same key is ignored.
    pub dedupe_key: String,
}

/// Filters for [`list`].
#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    /// Restrict to alerts visible to this user: their own plus broadcasts.
    pub visible_to: Option<i64>,
    /// Skip acknowledged alerts.
    pub unacknowledged_only: bool,
}

fn from_row(row: &SqliteRow) -> PortalResult<Alert> {
    Ok(Alert {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        kind: parse_column(row, "kind")?,
        message: row.try_get("message")?,
        dedupe_key: row.try_get("dedupe_key")?,
        created_at: row.try_get("created_at")?,
        acknowledged_at: row.try_get("acknowledged_at")?,
    })
}

/// Inserts an alert unless one with the same dedupe key exists.
///
/// Returns true if a row was inserted.
pub async fn insert_if_absent(
    pool: &SqlitePool,
    alert: &NewAlert,
    now: DateTime<Utc>,
) -> PortalResult<bool> {
    let result = sqlx::query(
        "INSERT OR IGNORE INTO alerts (user_id, kind, message, dedupe_key, created_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(alert.user_id)
    .bind(alert.kind.as_str())
    .bind(&alert.message)
    .bind(&alert.dedupe_key)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Fetches an alert by id.
pub async fn get(pool: &SqlitePool, id: i64) -> PortalResult<Alert> {
    let row = sqlx::query(&format!("SELECT {COLUMNS} FROM alerts WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(PortalError::NotFound { entity: "alert", id })?;
    from_row(&row)
}

/// Lists alerts matching the filter, newest first.
pub async fn list(pool: &SqlitePool, filter: &AlertFilter) -> PortalResult<Vec<Alert>> {
    let mut query: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {COLUMNS} FROM alerts WHERE 1 = 1"));
    if let Some(user_id) = filter.visible_to {
        query
            .push(" AND (user_id IS NULL OR user_id = ")
            .push_bind(user_id)
            .push(")");
    }
    if filter.unacknowledged_only {
        query.push(" AND acknowledged_at IS NULL");
    }
    query.push(" ORDER BY id DESC");

    let rows = query.build().fetch_all(pool).await?;
    rows.iter().map(from_row).collect()
}

/// Marks an alert acknowledged. Acknowledging twice keeps the first time.
pub async fn acknowledge(pool: &SqlitePool, id: i64, now: DateTime<Utc>) -> PortalResult<Alert> {
    get(pool, id).await?;
    sqlx::query("UPDATE alerts SET acknowledged_at = COALESCE(acknowledged_at, ?) WHERE id = ?")
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    get(pool, id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support;
    use crate::models::Role;
    use chrono::Duration;

    fn alert(user_id: Option<i64>, key: &str) -> NewAlert {
        NewAlert {
            user_id,
            kind: AlertKind::MissingAttendance,
            message: "No attendance submitted for 2026-01-13".to_string(),
            dedupe_key: key.to_string(),
        }
    }

    #[tokio::test]
    async fn test_dedupe_key_prevents_duplicates() {
        let pool = test_support::pool().await;
        let user = test_support::user(&pool, "r@example.com", Role::Recruiter).await;
        let now = Utc::now();

        assert!(insert_if_absent(&pool, &alert(Some(user.id), "k1"), now).await.unwrap());
        assert!(!insert_if_absent(&pool, &alert(Some(user.id), "k1"), now).await.unwrap());
        assert_eq!(list(&pool, &AlertFilter::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_visibility_and_acknowledgement() {
        let pool = test_support::pool().await;
        let a = test_support::user(&pool, "a@example.com", Role::Recruiter).await;
        let b = test_support::user(&pool, "b@example.com", Role::Recruiter).await;
        let now = Utc::now();
        insert_if_absent(&pool, &alert(Some(a.id), "a"), now).await.unwrap();
        insert_if_absent(&pool, &alert(Some(b.id), "b"), now).await.unwrap();
        insert_if_absent(&pool, &alert(None, "all"), now).await.unwrap();

        let visible = list(
            &pool,
            &AlertFilter {
                visible_to: Some(a.id),
                unacknowledged_only: false,
            },
        )
        .await
        .unwrap();
        assert_eq!(visible.len(), 2);
        assert!(visible.iter().all(|alert| alert.user_id != Some(b.id)));

        let first = acknowledge(&pool, visible[0].id, now).await.unwrap();
        let again = acknowledge(&pool, visible[0].id, now + Duration::minutes(5))
            .await
            .unwrap();
        assert_eq!(first.acknowledged_at, again.acknowledged_at);

        let open = list(
            &pool,
            &AlertFilter {
                visible_to: Some(a.id),
                unacknowledged_only: true,
            },
        )
        .await
        .unwrap();
        assert_eq!(open.len(), 1);
    }
}
