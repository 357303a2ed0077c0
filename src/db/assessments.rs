//! Client assessments.

use chrono::{NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use super::{optional_u32_column, parse_column};
use crate::error::{PortalError, PortalResult};
use crate::models::{Assessment, AssessmentStatus};

const COLUMNS: &str =
    "id, candidate_id, recruiter_id, company, title, due_on, status, score, created_at";

/// Fields for a new assessment.
#[derive(Debug, Clone)]
pub struct NewAssessment {
    /// Candidate taking the assessment.
    pub candidate_id: i64,
    /// Recruiter logging it.
    pub recruiter_id: i64,
    /// Client or employer.
    pub company: String,
    /// Title.
    pub title: String,
    /// Deadline.
    pub due_on: Option<NaiveDate>,
    /// Initial status.
    pub status: AssessmentStatus,
    /// Score, 0 to 100.
    pub score: Option<u8>,
}

/// Changes to an assessment.
#[derive(Debug, Clone, Default)]
pub struct AssessmentUpdate {
    /// New status.
    pub status: Option<AssessmentStatus>,
    /// New score, 0 to 100.
    pub score: Option<u8>,
}

/// Filters for [`list`].
#[derive(Debug, Clone, Default)]
pub struct AssessmentFilter {
    /// Only assessments logged by this recruiter.
    pub recruiter_id: Option<i64>,
    /// Only assessments for this candidate.
    pub candidate_id: Option<i64>,
    /// Only assessments in this status.
    pub status: Option<AssessmentStatus>,
}

fn from_row(row: &SqliteRow) -> PortalResult<Assessment> {
    let score = optional_u32_column(row, "score")?
        .map(|score| {
            u8::try_from(score)
                .ok()
                .filter(|s| *s <= 100)
                .ok_or(PortalError::CorruptRecord {
                    column: "score".to_string(),
                    value: score.to_string(),
                })
        })
        .transpose()?;

    Ok(Assessment {
        id: row.try_get("id")?,
        candidate_id: row.try_get("candidate_id")?,
        recruiter_id: row.try_get("recruiter_id")?,
        company: row.try_get("company")?,
        title: row.try_get("title")?,
        due_on: row.try_get("due_on")?,
        status: parse_column(row, "status")?,
        score,
        created_at: row.try_get("created_at")?,
    })
}

/// Inserts an assessment.
pub async fn insert(pool: &SqlitePool, new: &NewAssessment) -> PortalResult<Assessment> {
    let id = sqlx::query(
        "INSERT INTO assessments (candidate_id, recruiter_id, company, title, due_on, status,
         score, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(new.candidate_id)
    .bind(new.recruiter_id)
    .bind(&new.company)
    .bind(&new.title)
    .bind(new.due_on)
    .bind(new.status.as_str())
    .bind(new.score.map(i64::from))
    .bind(Utc::now())
    .execute(pool)
    .await?
    .last_insert_rowid();

    get(pool, id).await
}

/// Fetches an assessment by id.
pub async fn get(pool: &SqlitePool, id: i64) -> PortalResult<Assessment> {
    let row = sqlx::query(&format!("SELECT {COLUMNS} FROM assessments WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(PortalError::NotFound {
            entity: "assessment",
            id,
        })?;
    from_row(&row)
}

/// Lists assessments matching the filter, newest first.
pub async fn list(pool: &SqlitePool, filter: &AssessmentFilter) -> PortalResult<Vec<Assessment>> {
    let mut query: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {COLUMNS} FROM assessments WHERE 1 = 1"));
    if let Some(recruiter_id) = filter.recruiter_id {
        query.push(" AND recruiter_id = ").push_bind(recruiter_id);
    }
    if let Some(candidate_id) = filter.candidate_id {
        query.push(" AND candidate_id = ").push_bind(candidate_id);
    }
    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status.as_str());
    }
    query.push(" ORDER BY id DESC");

    let rows = query.build().fetch_all(pool).await?;
    rows.iter().map(from_row).collect()
}

/// Applies an update and returns the stored assessment.
pub async fn update(
    pool: &SqlitePool,
    id: i64,
    changes: &AssessmentUpdate,
) -> PortalResult<Assessment> {
    let current = get(pool, id).await?;

    sqlx::query("UPDATE assessments SET status = ?, score = ? WHERE id = ?")
        .bind(changes.status.unwrap_or(current.status).as_str())
        .bind(changes.score.or(current.score).map(i64::from))
        .bind(id)
        .execute(pool)
        .await?;

    get(pool, id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::candidates::{self, NewCandidate};
    use crate::db::test_support;
    use crate::models::{CandidateStage, Role};

    #[tokio::test]
    async fn test_insert_and_score() {
        let pool = test_support::pool().await;
        let recruiter = test_support::user(&pool, "r@example.com", Role::Recruiter).await;
        let candidate = candidates::insert(
            &pool,
            &NewCandidate {
                full_name: "Lena Park".to_string(),
                email: "lena@example.com".to_string(),
                phone: None,
                technology: Some("React".to_string()),
                stage: CandidateStage::Interviewing,
                recruiter_id: Some(recruiter.id),
            },
        )
        .await
        .unwrap();

        let assessment = insert(
            &pool,
            &NewAssessment {
                candidate_id: candidate.id,
                recruiter_id: recruiter.id,
                company: "Initech".to_string(),
                title: "Frontend take-home".to_string(),
                due_on: NaiveDate::from_ymd_opt(2026, 1, 20),
                status: AssessmentStatus::Pending,
                score: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(assessment.score, None);

        let graded = update(
            &pool,
            assessment.id,
            &AssessmentUpdate {
                status: Some(AssessmentStatus::Passed),
                score: Some(87),
            },
        )
        .await
        .unwrap();
        assert_eq!(graded.score, Some(87));
        assert_eq!(graded.due_on, assessment.due_on);

        let passed = list(
            &pool,
            &AssessmentFilter {
                status: Some(AssessmentStatus::Passed),
                ..AssessmentFilter::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(passed.len(), 1);
    }

    #[tokio::test]
    async fn test_out_of_range_score_is_corrupt() {
        let pool = test_support::pool().await;
        let row = sqlx::query(
            "SELECT 1 AS id, 1 AS candidate_id, 1 AS recruiter_id, 'A' AS company, 'T' AS title,
             NULL AS due_on, 'passed' AS status, 140 AS score, '2026-01-01T00:00:00Z' AS created_at",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert!(matches!(
            from_row(&row),
            Err(PortalError::CorruptRecord { .. })
        ));
    }
}
