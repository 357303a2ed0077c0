//! Interviews.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use super::parse_column;
use crate::error::{PortalError, PortalResult};
use crate::models::{Interview, InterviewKind, InterviewStatus};

const COLUMNS: &str = "id, candidate_id, application_id, recruiter_id, company, kind, \
                       scheduled_at, status, feedback, created_at";

/// Fields for a new interview.
#[derive(Debug, Clone)]
pub struct NewInterview {
    /// Candidate interviewed.
    pub candidate_id: i64,
    /// Related application.
    pub application_id: Option<i64>,
    /// Recruiter logging the interview.
    pub recruiter_id: i64,
    /// Client or employer.
    pub company: String,
    /// Format.
    pub kind: InterviewKind,
    /// Scheduled start.
    pub scheduled_at: NaiveDateTime,
}

/// Changes to an interview.
#[derive(Debug, Clone, Default)]
pub struct InterviewUpdate {
    /// New status.
    pub status: Option<InterviewStatus>,
    /// Feedback.
    pub feedback: Option<String>,
    /// Rescheduled start.
    pub scheduled_at: Option<NaiveDateTime>,
}

/// Filters for [`list`].
#[derive(Debug, Clone, Default)]
pub struct InterviewFilter {
    /// Only interviews logged by this recruiter.
    pub recruiter_id: Option<i64>,
    /// Only interviews for this candidate.
    pub candidate_id: Option<i64>,
    /// Scheduled on or after this date.
    pub from: Option<NaiveDate>,
    /// Scheduled on or before this date.
    pub to: Option<NaiveDate>,
    /// Only interviews in this status.
    pub status: Option<InterviewStatus>,
}

fn from_row(row: &SqliteRow) -> PortalResult<Interview> {
    Ok(Interview {
        id: row.try_get("id")?,
        candidate_id: row.try_get("candidate_id")?,
        application_id: row.try_get("application_id")?,
        recruiter_id: row.try_get("recruiter_id")?,
        company: row.try_get("company")?,
        kind: parse_column(row, "kind")?,
        scheduled_at: row.try_get("scheduled_at")?,
        status: parse_column(row, "status")?,
        feedback: row.try_get("feedback")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Inserts an interview in the scheduled state.
pub async fn insert(pool: &SqlitePool, new: &NewInterview) -> PortalResult<Interview> {
    let id = sqlx::query(
        "INSERT INTO interviews (candidate_id, application_id, recruiter_id, company, kind,
         scheduled_at, status, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(new.candidate_id)
    .bind(new.application_id)
    .bind(new.recruiter_id)
    .bind(&new.company)
    .bind(new.kind.as_str())
    .bind(new.scheduled_at)
    .bind(InterviewStatus::Scheduled.as_str())
    .bind(Utc::now())
    .execute(pool)
    .await?
    .last_insert_rowid();

    get(pool, id).await
}

/// Fetches an interview by id.
pub async fn get(pool: &SqlitePool, id: i64) -> PortalResult<Interview> {
    let row = sqlx::query(&format!("SELECT {COLUMNS} FROM interviews WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(PortalError::NotFound {
            entity: "interview",
            id,
        })?;
    from_row(&row)
}

/// Lists interviews matching the filter, soonest first.
pub async fn list(pool: &SqlitePool, filter: &InterviewFilter) -> PortalResult<Vec<Interview>> {
    let mut query: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {COLUMNS} FROM interviews WHERE 1 = 1"));
    if let Some(recruiter_id) = filter.recruiter_id {
        query.push(" AND recruiter_id = ").push_bind(recruiter_id);
    }
    if let Some(candidate_id) = filter.candidate_id {
        query.push(" AND candidate_id = ").push_bind(candidate_id);
    }
    if let Some(from) = filter.from {
        query
            .push(" AND scheduled_at >= ")
            .push_bind(from.and_time(NaiveTime::MIN));
    }
    if let Some(to) = filter.to {
        // Exclusive upper bound at the start of the following day
        if let Some(next) = to.succ_opt() {
            query
                .push(" AND scheduled_at < ")
                .push_bind(next.and_time(NaiveTime::MIN));
        }
    }
    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status.as_str());
    }
    query.push(" ORDER BY scheduled_at, id");

    let rows = query.build().fetch_all(pool).await?;
    rows.iter().map(from_row).collect()
}

/// Applies an update and returns the stored interview.
pub async fn update(pool: &SqlitePool, id: i64, changes: &InterviewUpdate) -> PortalResult<Interview> {
    let current = get(pool, id).await?;

    sqlx::query("UPDATE interviews SET status = ?, feedback = ?, scheduled_at = ? WHERE id = ?")
        .bind(changes.status.unwrap_or(current.status).as_str())
        .bind(changes.feedback.as_ref().or(current.feedback.as_ref()))
        .bind(changes.scheduled_at.unwrap_or(current.scheduled_at))
        .bind(id)
        .execute(pool)
        .await?;

    get(pool, id).await
}
