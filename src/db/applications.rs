//! Job applications logged by recruiters.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use super::parse_column;
use crate::error::{PortalError, PortalResult};
use crate::models::{ApplicationStatus, JobApplication};

const COLUMNS: &str = "id, candidate_id, recruiter_id, company, job_title, job_url, status, \
                       applied_on, notes, created_at, updated_at";

/// Fields for a new application.
#[derive(Debug, Clone)]
pub struct NewApplication {
    /// Candidate applied for.
    pub candidate_id: i64,
    /// Recruiter logging the application.
    pub recruiter_id: i64,
    /// Client or employer.
    pub company: String,
    /// Position title.
    pub job_title: String,
    /// Posting URL.
    pub job_url: Option<String>,
    /// Initial status.
    pub status: ApplicationStatus,
    /// Submission date.
    pub applied_on: NaiveDate,
    /// Notes.
    pub notes: Option<String>,
}

/// Changes to an application.
#[derive(Debug, Clone, Default)]
pub struct ApplicationUpdate {
    /// New status.
    pub status: Option<ApplicationStatus>,
    /// New notes.
    pub notes: Option<String>,
}

/// Filters for [`list`].
#[derive(Debug, Clone, Default)]
pub struct ApplicationFilter {
    /// Only applications logged by this recruiter.
    pub recruiter_id: Option<i64>,
    /// Only applications for this candidate.
    pub candidate_id: Option<i64>,
    /// Applied on or after this date.
    pub from: Option<NaiveDate>,
    /// Applied on or before this date.
    pub to: Option<NaiveDate>,
    /// Only applications in this status.
    pub status: Option<ApplicationStatus>,
}

fn from_row(row: &SqliteRow) -> PortalResult<JobApplication> {
    Ok(JobApplication {
        id: row.try_get("id")?,
        candidate_id: row.try_get("candidate_id")?,
        recruiter_id: row.try_get("recruiter_id")?,
        company: row.try_get("company")?,
        job_title: row.try_get("job_title")?,
        job_url: row.try_get("job_url")?,
        status: parse_column(row, "status")?,
        applied_on: row.try_get("applied_on")?,
        notes: row.try_get("notes")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Inserts an application.
pub async fn insert(pool: &SqlitePool, new: &NewApplication) -> PortalResult<JobApplication> {
    let now = Utc::now();
    let id = sqlx::query(
        "INSERT INTO applications (candidate_id, recruiter_id, company, job_title, job_url, status,
         applied_on, notes, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(new.candidate_id)
    .bind(new.recruiter_id)
    .bind(&new.company)
    .bind(&new.job_title)
    .bind(&new.job_url)
    .bind(new.status.as_str())
    .bind(new.applied_on)
    .bind(&new.notes)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?
    .last_insert_rowid();

    get(pool, id).await
}

/// Fetches an application by id.
pub async fn get(pool: &SqlitePool, id: i64) -> PortalResult<JobApplication> {
    let row = sqlx::query(&format!("SELECT {COLUMNS} FROM applications WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(PortalError::NotFound {
            entity: "application",
            id,
        })?;
    from_row(&row)
}

/// Lists applications matching the filter, most recent first.
pub async fn list(pool: &SqlitePool, filter: &ApplicationFilter) -> PortalResult<Vec<JobApplication>> {
    let mut query: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {COLUMNS} FROM applications WHERE 1 = 1"));
    if let Some(recruiter_id) = filter.recruiter_id {
        query.push(" AND recruiter_id = ").push_bind(recruiter_id);
    }
    if let Some(candidate_id) = filter.candidate_id {
        query.push(" AND candidate_id = ").push_bind(candidate_id);
    }
    if let Some(from) = filter.from {
        query.push(" AND applied_on >= ").push_bind(from);
    }
    if let Some(to) = filter.to {
        query.push(" AND applied_on <= ").push_bind(to);
    }
    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status.as_str());
    }
    query.push(" ORDER BY applied_on DESC, id DESC");

    let rows = query.build().fetch_all(pool).await?;
    rows.iter().map(from_row).collect()
}

/// Applies an update and returns the stored application.
pub async fn update(
    pool: &SqlitePool,
    id: i64,
    changes: &ApplicationUpdate,
) -> PortalResult<JobApplication> {
    let current = get(pool, id).await?;

    sqlx::query("UPDATE applications SET status = ?, notes = ?, updated_at = ? WHERE id = ?")
        .bind(changes.status.unwrap_or(current.status).as_str())
        .bind(changes.notes.as_ref().or(current.notes.as_ref()))
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;

    get(pool, id).await
}

/// Counts a recruiter's applications per day between two dates, inclusive.
/// Days without applications are absent from the map.
pub async fn count_per_day(
    pool: &SqlitePool,
    recruiter_id: i64,
    from: NaiveDate,
    to: NaiveDate,
) -> PortalResult<HashMap<NaiveDate, u32>> {
    let rows: Vec<(NaiveDate, i64)> = sqlx::query_as(
        "SELECT applied_on, COUNT(*) FROM applications
         WHERE recruiter_id = ? AND applied_on >= ? AND applied_on <= ?
         GROUP BY applied_on",
    )
    .bind(recruiter_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(date, count)| (date, u32::try_from(count).unwrap_or(u32::MAX)))
        .collect())
}

/// Counts a recruiter's applications on one day.
pub async fn count_on(pool: &SqlitePool, recruiter_id: i64, date: NaiveDate) -> PortalResult<u32> {
    Ok(count_per_day(pool, recruiter_id, date, date)
        .await?
        .get(&date)
        .copied()
        .unwrap_or(0))
}
