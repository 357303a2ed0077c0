//! Attendance records.
//!
//! One record per user per date. A submission replaces any record that has
//! not been approved and resets it to pending; approved records are final
//! for the recruiter and only change through another review.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use super::{parse_column, u32_column};
use crate::error::{PortalError, PortalResult};
use crate::models::{ApprovalStatus, AttendanceRecord, ReportedStatus};

const COLUMNS: &str = "id, user_id, date, reported_status, approval_status, login_at, logout_at, \
                       break_minutes, notes, reviewed_by, reviewed_at, review_note, created_at, \
                       updated_at";

/// A recruiter's submission for one date.
#[derive(Debug, Clone)]
pub struct AttendanceSubmission {
    /// Submitting user.
    pub user_id: i64,
    /// Date covered.
    pub date: NaiveDate,
    /// Reported status.
    pub reported_status: ReportedStatus,
    /// First login.
    pub login_at: Option<NaiveDateTime>,
    /// Last logout.
    pub logout_at: Option<NaiveDateTime>,
    /// Break minutes.
    pub break_minutes: u32,
    /// Notes.
    pub notes: Option<String>,
}

/// Whether a submission created a record or replaced one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// No record existed for the date.
    Created,
    /// A pending or rejected record was replaced.
    Replaced,
}

/// Filters for [`list`].
#[derive(Debug, Clone, Default)]
pub struct AttendanceFilter {
    /// Only this user's records.
    pub user_id: Option<i64>,
    /// Only records in this approval state.
    pub approval_status: Option<ApprovalStatus>,
    /// On or after this date.
    pub from: Option<NaiveDate>,
    /// On or before this date.
    pub to: Option<NaiveDate>,
}

fn from_row(row: &SqliteRow) -> PortalResult<AttendanceRecord> {
    Ok(AttendanceRecord {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        date: row.try_get("date")?,
        reported_status: parse_column(row, "reported_status")?,
        approval_status: parse_column(row, "approval_status")?,
        login_at: row.try_get("login_at")?,
        logout_at: row.try_get("logout_at")?,
        break_minutes: u32_column(row, "break_minutes")?,
        notes: row.try_get("notes")?,
        reviewed_by: row.try_get("reviewed_by")?,
        reviewed_at: row.try_get("reviewed_at")?,
        review_note: row.try_get("review_note")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Stores a submission as a pending record.
///
/// Returns [`PortalError::Conflict`] if the date already has an approved
/// record. Each write is a single guarded statement, so a review that lands
/// between two submissions is never reset to pending.
pub async fn upsert_submission(
    pool: &SqlitePool,
    submission: &AttendanceSubmission,
) -> PortalResult<(AttendanceRecord, SubmissionOutcome)> {
    let now = Utc::now();

    if let Some(id) = replace_unapproved(pool, submission, now).await? {
        return Ok((get(pool, id).await?, SubmissionOutcome::Replaced));
    }

    let inserted = sqlx::query(
        "INSERT INTO attendance (user_id, date, reported_status, approval_status, login_at,
         logout_at, break_minutes, notes, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(user_id, date) DO NOTHING
         RETURNING id",
    )
    .bind(submission.user_id)
    .bind(submission.date)
    .bind(submission.reported_status.as_str())
    .bind(ApprovalStatus::Pending.as_str())
    .bind(submission.login_at)
    .bind(submission.logout_at)
    .bind(i64::from(submission.break_minutes))
    .bind(&submission.notes)
    .bind(now)
    .bind(now)
    .fetch_optional(pool)
    .await?;
    if let Some(row) = inserted {
        let id: i64 = row.try_get("id")?;
        return Ok((get(pool, id).await?, SubmissionOutcome::Created));
    }

    // A concurrent submission created the row first
    if let Some(id) = replace_unapproved(pool, submission, now).await? {
        return Ok((get(pool, id).await?, SubmissionOutcome::Replaced));
    }

    Err(PortalError::Conflict {
        message: format!(
            "attendance for {} is already approved and cannot be resubmitted",
            submission.date
        ),
    })
}

/// Overwrites the user's record for the date unless it is approved.
/// Returns the record id when a row was replaced.
async fn replace_unapproved(
    pool: &SqlitePool,
    submission: &AttendanceSubmission,
    now: DateTime<Utc>,
) -> PortalResult<Option<i64>> {
    let row = sqlx::query(
        "UPDATE attendance SET reported_status = ?, approval_status = ?, login_at = ?,
         logout_at = ?, break_minutes = ?, notes = ?, reviewed_by = NULL,
         reviewed_at = NULL, review_note = NULL, updated_at = ?
         WHERE user_id = ? AND date = ? AND approval_status <> ?
         RETURNING id",
    )
    .bind(submission.reported_status.as_str())
    .bind(ApprovalStatus::Pending.as_str())
    .bind(submission.login_at)
    .bind(submission.logout_at)
    .bind(i64::from(submission.break_minutes))
    .bind(&submission.notes)
    .bind(now)
    .bind(submission.user_id)
    .bind(submission.date)
    .bind(ApprovalStatus::Approved.as_str())
    .fetch_optional(pool)
    .await?;
    row.map(|row| row.try_get("id").map_err(PortalError::from))
        .transpose()
}

/// Records an admin decision on a record.
///
/// `decision` must be approved or rejected.
pub async fn review(
    pool: &SqlitePool,
    id: i64,
    decision: ApprovalStatus,
    reviewer_id: i64,
    note: Option<&str>,
) -> PortalResult<AttendanceRecord> {
    if decision == ApprovalStatus::Pending {
        return Err(PortalError::validation(
            "decision",
            "must be 'approved' or 'rejected'",
        ));
    }
    get(pool, id).await?;

    let now = Utc::now();
    sqlx::query(
        "UPDATE attendance SET approval_status = ?, reviewed_by = ?, reviewed_at = ?,
         review_note = ?, updated_at = ? WHERE id = ?",
    )
    .bind(decision.as_str())
    .bind(reviewer_id)
    .bind(now)
    .bind(note)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    get(pool, id).await
}

/// Fetches a record by id.
pub async fn get(pool: &SqlitePool, id: i64) -> PortalResult<AttendanceRecord> {
    let row = sqlx::query(&format!("SELECT {COLUMNS} FROM attendance WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(PortalError::NotFound {
            entity: "attendance",
            id,
        })?;
    from_row(&row)
}

/// Fetches a user's record for a date, if any.
pub async fn find_for_user_on(
    pool: &SqlitePool,
    user_id: i64,
    date: NaiveDate,
) -> PortalResult<Option<AttendanceRecord>> {
    let row = sqlx::query(&format!(
        "SELECT {COLUMNS} FROM attendance WHERE user_id = ? AND date = ?"
    ))
    .bind(user_id)
    .bind(date)
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(from_row).transpose()
}

/// Lists records matching the filter, most recent date first.
pub async fn list(pool: &SqlitePool, filter: &AttendanceFilter) -> PortalResult<Vec<AttendanceRecord>> {
    let mut query: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {COLUMNS} FROM attendance WHERE 1 = 1"));
    if let Some(user_id) = filter.user_id {
        query.push(" AND user_id = ").push_bind(user_id);
    }
    if let Some(status) = filter.approval_status {
        query.push(" AND approval_status = ").push_bind(status.as_str());
    }
    if let Some(from) = filter.from {
        query.push(" AND date >= ").push_bind(from);
    }
    if let Some(to) = filter.to {
        query.push(" AND date <= ").push_bind(to);
    }
    query.push(" ORDER BY date DESC, user_id");

    let rows = query.build().fetch_all(pool).await?;
    rows.iter().map(from_row).collect()
}

/// Lists a user's records between two dates, inclusive, oldest first.
pub async fn list_for_user_between(
    pool: &SqlitePool,
    user_id: i64,
    from: NaiveDate,
    to: NaiveDate,
) -> PortalResult<Vec<AttendanceRecord>> {
    let rows = sqlx::query(&format!(
        "SELECT {COLUMNS} FROM attendance WHERE user_id = ? AND date >= ? AND date <= ? ORDER BY date"
    ))
    .bind(user_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;
    rows.iter().map(from_row).collect()
}

/// Lists pending records last submitted before `cutoff`.
pub async fn list_pending_since_before(
    pool: &SqlitePool,
    cutoff: DateTime<Utc>,
) -> PortalResult<Vec<AttendanceRecord>> {
    let pending = list(
        pool,
        &AttendanceFilter {
            approval_status: Some(ApprovalStatus::Pending),
            ..AttendanceFilter::default()
        },
    )
    .await?;
    Ok(pending
        .into_iter()
        .filter(|record| record.updated_at < cutoff)
        .collect())
}
