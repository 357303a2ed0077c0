//! Grouped counts for the dashboards.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::PortalResult;

/// Pipeline counts keyed by stage or status name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineMetrics {
    /// Candidates per stage.
    pub candidates_by_stage: BTreeMap<String, i64>,
    /// Applications per status.
    pub applications_by_status: BTreeMap<String, i64>,
    /// Interviews per status.
    pub interviews_by_status: BTreeMap<String, i64>,
    /// Assessments per status.
    pub assessments_by_status: BTreeMap<String, i64>,
}

/// A recruiter's activity counts over a date range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecruiterActivity {
    /// Applications logged.
    pub applications: i64,
    /// Interviews scheduled in the range.
    pub interviews: i64,
    /// Assessments created in the range.
    pub assessments: i64,
}

async fn grouped(
    pool: &SqlitePool,
    table: &str,
    column: &str,
    recruiter_column: &str,
    recruiter_id: Option<i64>,
) -> PortalResult<BTreeMap<String, i64>> {
    let sql = match recruiter_id {
        Some(_) => format!(
            "SELECT {column}, COUNT(*) FROM {table} WHERE {recruiter_column} = ? GROUP BY {column}"
        ),
        None => format!("SELECT {column}, COUNT(*) FROM {table} GROUP BY {column}"),
    };
    let mut query = sqlx::query_as::<_, (String, i64)>(&sql);
    if let Some(recruiter_id) = recruiter_id {
        query = query.bind(recruiter_id);
    }
    Ok(query.fetch_all(pool).await?.into_iter().collect())
}

/// Counts the pipeline, optionally restricted to one recruiter's rows.
pub async fn pipeline(pool: &SqlitePool, recruiter_id: Option<i64>) -> PortalResult<PipelineMetrics> {
    Ok(PipelineMetrics {
        candidates_by_stage: grouped(pool, "candidates", "stage", "recruiter_id", recruiter_id)
            .await?,
        applications_by_status: grouped(pool, "applications", "status", "recruiter_id", recruiter_id)
            .await?,
        interviews_by_status: grouped(pool, "interviews", "status", "recruiter_id", recruiter_id)
            .await?,
        assessments_by_status: grouped(pool, "assessments", "status", "recruiter_id", recruiter_id)
            .await?,
    })
}

/// Counts one recruiter's activity between two dates, inclusive.
pub async fn recruiter_activity(
    pool: &SqlitePool,
    recruiter_id: i64,
    from: NaiveDate,
    to: NaiveDate,
) -> PortalResult<RecruiterActivity> {
    let applications: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM applications WHERE recruiter_id = ? AND applied_on >= ? AND applied_on <= ?",
    )
    .bind(recruiter_id)
    .bind(from)
    .bind(to)
    .fetch_one(pool)
    .await?;

    let start = from.and_time(NaiveTime::MIN);
    let end = to.and_hms_opt(23, 59, 59).unwrap_or(start);
    let interviews: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM interviews WHERE recruiter_id = ? AND scheduled_at >= ? AND scheduled_at <= ?",
    )
    .bind(recruiter_id)
    .bind(start)
    .bind(end)
    .fetch_one(pool)
    .await?;

    let assessments: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM assessments WHERE recruiter_id = ? AND date(created_at) >= ? AND date(created_at) <= ?",
    )
    .bind(recruiter_id)
    .bind(from)
    .bind(to)
    .fetch_one(pool)
    .await?;

    Ok(RecruiterActivity {
        applications,
        interviews,
        assessments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::applications::{self, NewApplication};
    use crate::db::candidates::{self, NewCandidate};
    use crate::db::test_support;
    use crate::models::{ApplicationStatus, CandidateStage, Role};

    #[tokio::test]
    async fn test_pipeline_scoping() {
        let pool = test_support::pool().await;
        let a = test_support::user(&pool, "a@example.com", Role::Recruiter).await;
        let b = test_support::user(&pool, "b@example.com", Role::Recruiter).await;

        let mut ids = Vec::new();
        for (email, recruiter, stage) in [
            ("c1@example.com", a.id, CandidateStage::Marketing),
            ("c2@example.com", a.id, CandidateStage::Marketing),
            ("c3@example.com", b.id, CandidateStage::Placed),
        ] {
            let candidate = candidates::insert(
                &pool,
                &NewCandidate {
                    full_name: email.to_string(),
                    email: email.to_string(),
                    phone: None,
                    technology: None,
                    stage,
                    recruiter_id: Some(recruiter),
                },
            )
            .await
            .unwrap();
            ids.push((candidate.id, recruiter));
        }
        let date = NaiveDate::from_ymd_opt(2026, 1, 13).unwrap();
        for (candidate_id, recruiter_id) in &ids {
            applications::insert(
                &pool,
                &NewApplication {
                    candidate_id: *candidate_id,
                    recruiter_id: *recruiter_id,
                    company: "Acme".to_string(),
                    job_title: "Engineer".to_string(),
                    job_url: None,
                    status: ApplicationStatus::Applied,
                    applied_on: date,
                    notes: None,
                },
            )
            .await
            .unwrap();
        }

        let all = pipeline(&pool, None).await.unwrap();
        assert_eq!(all.candidates_by_stage.get("marketing"), Some(&2));
        assert_eq!(all.candidates_by_stage.get("placed"), Some(&1));
        assert_eq!(all.applications_by_status.get("applied"), Some(&3));

        let scoped = pipeline(&pool, Some(b.id)).await.unwrap();
        assert_eq!(scoped.candidates_by_stage.get("marketing"), None);
        assert_eq!(scoped.applications_by_status.get("applied"), Some(&1));
        assert!(scoped.interviews_by_status.is_empty());

        let activity = recruiter_activity(&pool, a.id, date, date).await.unwrap();
        assert_eq!(activity.applications, 2);
        assert_eq!(activity.interviews, 0);
    }
}
