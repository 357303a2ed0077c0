//! SQLite persistence.
//!
//! Runtime `sqlx` queries against a [`SqlitePool`]. Each table has its own
//! repository module; rows are mapped by hand so that enum columns stored as
//! text can be validated on the way out.

use std::str::FromStr;

use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use tracing::info;

use crate::error::{PortalError, PortalResult};

pub mod alerts;
pub mod applications;
pub mod assessments;
pub mod attendance;
pub mod audit;
pub mod candidates;
pub mod interviews;
pub mod metrics;
pub mod users;

const SCHEMA: &[(&str, &str)] = &[
    (
        "users",
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE,
            full_name TEXT NOT NULL,
            role TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            daily_quota INTEGER,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL
        )
        "#,
    ),
    (
        "candidates",
        r#"
        CREATE TABLE IF NOT EXISTS candidates (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            full_name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            phone TEXT,
            technology TEXT,
            stage TEXT NOT NULL,
            recruiter_id INTEGER REFERENCES users(id),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    ),
    (
        "applications",
        r#"
        CREATE TABLE IF NOT EXISTS applications (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            candidate_id INTEGER NOT NULL REFERENCES candidates(id),
            recruiter_id INTEGER NOT NULL REFERENCES users(id),
            company TEXT NOT NULL,
            job_title TEXT NOT NULL,
            job_url TEXT,
            status TEXT NOT NULL,
            applied_on TEXT NOT NULL,
            notes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    ),
    (
        "interviews",
        r#"
        CREATE TABLE IF NOT EXISTS interviews (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            candidate_id INTEGER NOT NULL REFERENCES candidates(id),
            application_id INTEGER REFERENCES applications(id),
            recruiter_id INTEGER NOT NULL REFERENCES users(id),
            company TEXT NOT NULL,
            kind TEXT NOT NULL,
            scheduled_at TEXT NOT NULL,
            status TEXT NOT NULL,
            feedback TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    ),
    (
        "assessments",
        r#"
        CREATE TABLE IF NOT EXISTS assessments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            candidate_id INTEGER NOT NULL REFERENCES candidates(id),
            recruiter_id INTEGER NOT NULL REFERENCES users(id),
            company TEXT NOT NULL,
            title TEXT NOT NULL,
            due_on TEXT,
            status TEXT NOT NULL,
            score INTEGER,
            created_at TEXT NOT NULL
        )
        "#,
    ),
    (
        "attendance",
        r#"
        CREATE TABLE IF NOT EXISTS attendance (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id),
            date TEXT NOT NULL,
            reported_status TEXT NOT NULL,
            approval_status TEXT NOT NULL,
            login_at TEXT,
            logout_at TEXT,
            break_minutes INTEGER NOT NULL DEFAULT 0,
            notes TEXT,
            reviewed_by INTEGER REFERENCES users(id),
            reviewed_at TEXT,
            review_note TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (user_id, date)
        )
        "#,
    ),
    (
        "alerts",
        r#"
        CREATE TABLE IF NOT EXISTS alerts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER REFERENCES users(id),
            kind TEXT NOT NULL,
            message TEXT NOT NULL,
            dedupe_key TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL,
            acknowledged_at TEXT
        )
        "#,
    ),
    (
        "audit_logs",
        r#"
        CREATE TABLE IF NOT EXISTS audit_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            actor_id INTEGER,
            action TEXT NOT NULL,
            entity TEXT NOT NULL,
            entity_id INTEGER,
            details TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    ),
];

/// Opens a pool for `url`, enables foreign keys and applies the schema.
pub async fn connect(url: &str) -> PortalResult<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                sqlx::query("PRAGMA foreign_keys = ON")
                    .execute(&mut *conn)
                    .await?;
                Ok(())
            })
        })
        .connect(url)
        .await?;

    migrate(&pool).await?;
    info!(url = %url, "Database ready");
    Ok(pool)
}

/// Opens a private in-memory database with the schema applied.
///
/// The pool holds a single connection that is never recycled, since an
/// in-memory SQLite database lives only as long as its connection.
pub async fn connect_in_memory() -> PortalResult<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;
    migrate(&pool).await?;
    Ok(pool)
}

/// Creates every table that does not exist yet. Safe to call repeatedly.
pub async fn migrate(pool: &SqlitePool) -> PortalResult<()> {
    for (table, ddl) in SCHEMA {
        sqlx::query(ddl).execute(pool).await?;
        tracing::debug!(table = %table, "Table ensured");
    }
    Ok(())
}

/// Maps a UNIQUE constraint violation to [`PortalError::Conflict`]; any other
/// error stays a database error.
pub(crate) fn conflict_on_unique(err: sqlx::Error, message: impl FnOnce() -> String) -> PortalError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => PortalError::Conflict {
            message: message(),
        },
        _ => PortalError::Database(err),
    }
}

/// Reads a text column and parses it, reporting unknown values as corrupt.
pub(crate) fn parse_column<T: FromStr>(row: &SqliteRow, column: &str) -> PortalResult<T> {
    let raw: String = row.try_get(column)?;
    raw.parse().map_err(|_| PortalError::CorruptRecord {
        column: column.to_string(),
        value: raw,
    })
}

/// Reads a non-negative integer column.
pub(crate) fn u32_column(row: &SqliteRow, column: &str) -> PortalResult<u32> {
    let raw: i64 = row.try_get(column)?;
    u32::try_from(raw).map_err(|_| PortalError::CorruptRecord {
        column: column.to_string(),
        value: raw.to_string(),
    })
}

/// Reads a nullable non-negative integer column.
pub(crate) fn optional_u32_column(row: &SqliteRow, column: &str) -> PortalResult<Option<u32>> {
    let raw: Option<i64> = row.try_get(column)?;
    raw.map(|value| {
        u32::try_from(value).map_err(|_| PortalError::CorruptRecord {
            column: column.to_string(),
            value: value.to_string(),
        })
    })
    .transpose()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let pool = connect_in_memory().await.unwrap();
        migrate(&pool).await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        assert_eq!(
            tables,
            vec![
                "alerts",
                "applications",
                "assessments",
                "attendance",
                "audit_logs",
                "candidates",
                "interviews",
                "users"
            ]
        );
    }

    #[tokio::test]
    async fn test_parse_column_reports_corrupt_value() {
        let pool = connect_in_memory().await.unwrap();
        let row = sqlx::query("SELECT 'sideways' AS stage")
            .fetch_one(&pool)
            .await
            .unwrap();

        let result: PortalResult<crate::models::CandidateStage> = parse_column(&row, "stage");
        match result {
            Err(PortalError::CorruptRecord { column, value }) => {
                assert_eq!(column, "stage");
                assert_eq!(value, "sideways");
            }
            other => panic!("Expected CorruptRecord, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_u32_column_rejects_negative() {
        let pool = connect_in_memory().await.unwrap();
        let row = sqlx::query("SELECT -3 AS quota").fetch_one(&pool).await.unwrap();
        assert!(matches!(
            u32_column(&row, "quota"),
            Err(PortalError::CorruptRecord { .. })
        ));
    }
}
