//! Candidate records.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use super::{conflict_on_unique, parse_column};
use crate::error::{PortalError, PortalResult};
use crate::models::{Candidate, CandidateStage};

const COLUMNS: &str =
    "id, full_name, email, phone, technology, stage, recruiter_id, created_at, updated_at";

/// Fields for a new candidate.
#[derive(Debug, Clone)]
pub struct NewCandidate {
    /// Full name.
    pub full_name: String,
    /// Contact email.
    pub email: String,
    /// Contact phone.
    pub phone: Option<String>,
    /// Primary technology.
    pub technology: Option<String>,
    /// Initial stage.
    pub stage: CandidateStage,
    /// Assigned recruiter.
    pub recruiter_id: Option<i64>,
}

/// Changes to a candidate. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct CandidateUpdate {
    /// New full name.
    pub full_name: Option<String>,
    /// New phone.
    pub phone: Option<String>,
    /// New technology.
    pub technology: Option<String>,
    /// New stage.
    pub stage: Option<CandidateStage>,
    /// New assigned recruiter.
    pub recruiter_id: Option<i64>,
}

/// Filters for [`list`].
#[derive(Debug, Clone, Default)]
pub struct CandidateFilter {
    /// Only candidates assigned to this recruiter.
    pub recruiter_id: Option<i64>,
    /// Only candidates in this stage.
    pub stage: Option<CandidateStage>,
}

pub(crate) fn from_row(row: &SqliteRow) -> PortalResult<Candidate> {
    Ok(Candidate {
        id: row.try_get("id")?,
        full_name: row.try_get("full_name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        technology: row.try_get("technology")?,
        stage: parse_column(row, "stage")?,
        recruiter_id: row.try_get("recruiter_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Inserts a candidate. A duplicate email is a [`PortalError::Conflict`].
pub async fn insert(pool: &SqlitePool, new: &NewCandidate) -> PortalResult<Candidate> {
    let email = new.email.trim().to_ascii_lowercase();
    let now = Utc::now();
    let id = sqlx::query(
        "INSERT INTO candidates (full_name, email, phone, technology, stage, recruiter_id, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&new.full_name)
    .bind(&email)
    .bind(&new.phone)
    .bind(&new.technology)
    .bind(new.stage.as_str())
    .bind(new.recruiter_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .map_err(|e| {
        conflict_on_unique(e, || format!("a candidate with email '{}' already exists", email))
    })?
    .last_insert_rowid();

    get(pool, id).await
}

/// Fetches a candidate by id.
pub async fn get(pool: &SqlitePool, id: i64) -> PortalResult<Candidate> {
    let row = sqlx::query(&format!("SELECT {COLUMNS} FROM candidates WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(PortalError::NotFound {
            entity: "candidate",
            id,
        })?;
    from_row(&row)
}

/// Lists candidates matching the filter, newest first.
pub async fn list(pool: &SqlitePool, filter: &CandidateFilter) -> PortalResult<Vec<Candidate>> {
    let mut query: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {COLUMNS} FROM candidates WHERE 1 = 1"));
    if let Some(recruiter_id) = filter.recruiter_id {
        query.push(" AND recruiter_id = ").push_bind(recruiter_id);
    }
    if let Some(stage) = filter.stage {
        query.push(" AND stage = ").push_bind(stage.as_str());
    }
    query.push(" ORDER BY id DESC");

    let rows = query.build().fetch_all(pool).await?;
    rows.iter().map(from_row).collect()
}

/// Applies an update and returns the stored candidate.
pub async fn update(pool: &SqlitePool, id: i64, changes: &CandidateUpdate) -> PortalResult<Candidate> {
    let current = get(pool, id).await?;

    sqlx::query(
        "UPDATE candidates SET full_name = ?, phone = ?, technology = ?, stage = ?,
         recruiter_id = ?, updated_at = ? WHERE id = ?",
    )
    .bind(changes.full_name.as_ref().unwrap_or(&current.full_name))
    .bind(changes.phone.as_ref().or(current.phone.as_ref()))
    .bind(changes.technology.as_ref().or(current.technology.as_ref()))
    .bind(changes.stage.unwrap_or(current.stage).as_str())
    .bind(changes.recruiter_id.or(current.recruiter_id))
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;

    get(pool, id).await
}
