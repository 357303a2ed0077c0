//! Background alert checks.
//!
//! Each check inspects the database at a point in time and inserts alert
//! rows, returning how many it inserted. Every alert carries a dedupe key,
//! so running a check again for the same condition inserts nothing.
//! [`spawn_scheduler`] runs the enabled checks on their own intervals.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Local, NaiveDateTime, Utc};
use sqlx::SqlitePool;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::config::ConfigLoader;
use crate::db::{self, alerts::NewAlert};
use crate::error::PortalResult;
use crate::models::{AlertKind, ReportedStatus};
use crate::policy::{day_kind_for, DayKind};

/// The instant a check runs at, in UTC and in office-local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckTime {
    /// Stored on the alert rows and used for pending-age comparisons.
    pub utc: DateTime<Utc>,
    /// Compared against shift and check-after times.
    pub local: NaiveDateTime,
}

impl CheckTime {
    /// The current instant.
    pub fn now() -> Self {
        let now = Local::now();
        Self {
            utc: now.with_timezone(&Utc),
            local: now.naive_local(),
        }
    }
}

async fn raise(pool: &SqlitePool, alert: NewAlert, at: CheckTime) -> PortalResult<u64> {
    let inserted = db::alerts::insert_if_absent(pool, &alert, at.utc).await?;
    if inserted {
        debug!(kind = %alert.kind, dedupe_key = %alert.dedupe_key, "Alert raised");
    }
    Ok(u64::from(inserted))
}

/// Alerts every active recruiter with no attendance record for today.
///
/// Runs only on working days, once the login grace period has passed.
pub async fn check_missing_attendance(
    pool: &SqlitePool,
    config: &ConfigLoader,
    at: CheckTime,
) -> PortalResult<u64> {
    let today = at.local.date();
    if day_kind_for(config, today) != Some(DayKind::Working) {
        return Ok(0);
    }
    let policy = config.policy_for(today)?;
    if at.local.time() <= policy.shift.late_login_cutoff() {
        return Ok(0);
    }

    let mut raised = 0;
    for recruiter in db::users::list_active_recruiters(pool).await? {
        if db::attendance::find_for_user_on(pool, recruiter.id, today).await?.is_some() {
            continue;
        }
        raised += raise(
            pool,
            NewAlert {
                user_id: Some(recruiter.id),
                kind: AlertKind::MissingAttendance,
                message: format!("No attendance submitted for {}", today),
                dedupe_key: format!("{}:{}:{}", AlertKind::MissingAttendance, recruiter.id, today),
            },
            at,
        )
        .await?;
    }
    Ok(raised)
}

/// Raises one broadcast alert per record pending longer than the configured
/// number of hours.
pub async fn check_pending_approval(
    pool: &SqlitePool,
    config: &ConfigLoader,
    at: CheckTime,
) -> PortalResult<u64> {
    let hours = config.alerts().pending_approval.pending_hours;
    let cutoff = at.utc - Duration::hours(i64::from(hours));

    let mut raised = 0;
    for record in db::attendance::list_pending_since_before(pool, cutoff).await? {
        raised += raise(
            pool,
            NewAlert {
                user_id: None,
                kind: AlertKind::PendingApproval,
                message: format!(
                    "Attendance for user {} on {} has been pending for over {} hours",
                    record.user_id, record.date, hours
                ),
                dedupe_key: format!("{}:{}", AlertKind::PendingApproval, record.id),
            },
            at,
        )
        .await?;
    }
    Ok(raised)
}

/// Alerts every active recruiter who has logged fewer applications today
/// than their quota.
///
/// Runs only on working days after the configured check time. Recruiters
/// who reported leave or absence for today are skipped.
pub async fn check_quota_shortfall(
    pool: &SqlitePool,
    config: &ConfigLoader,
    at: CheckTime,
) -> PortalResult<u64> {
    let today = at.local.date();
    if day_kind_for(config, today) != Some(DayKind::Working) {
        return Ok(0);
    }
    if at.local.time() < config.alerts().quota_shortfall.check_after {
        return Ok(0);
    }
    let policy = config.policy_for(today)?;

    let mut raised = 0;
    for recruiter in db::users::list_active_recruiters(pool).await? {
        let off_today = db::attendance::find_for_user_on(pool, recruiter.id, today)
            .await?
            .is_some_and(|record| {
                matches!(
                    record.reported_status,
                    ReportedStatus::Leave | ReportedStatus::Absent
                )
            });
        if off_today {
            continue;
        }

        let quota = recruiter.daily_quota.unwrap_or(policy.quota.daily_applications);
        let logged = db::applications::count_on(pool, recruiter.id, today).await?;
        if logged >= quota {
            continue;
        }
        raised += raise(
            pool,
            NewAlert {
                user_id: Some(recruiter.id),
                kind: AlertKind::QuotaShortfall,
                message: format!("{} of {} applications logged on {}", logged, quota, today),
                dedupe_key: format!("{}:{}:{}", AlertKind::QuotaShortfall, recruiter.id, today),
            },
            at,
        )
        .await?;
    }
    Ok(raised)
}

/// Runs the check that raises alerts of `kind`.
pub async fn run_check(
    kind: AlertKind,
    pool: &SqlitePool,
    config: &ConfigLoader,
    at: CheckTime,
) -> PortalResult<u64> {
    match kind {
        AlertKind::MissingAttendance => check_missing_attendance(pool, config, at).await,
        AlertKind::PendingApproval => check_pending_approval(pool, config, at).await,
        AlertKind::QuotaShortfall => check_quota_shortfall(pool, config, at).await,
    }
}

/// Returns the enabled checks and their intervals in seconds.
pub fn enabled_checks(config: &ConfigLoader) -> Vec<(AlertKind, u64)> {
    let schedule = config.alerts();
    [
        (
            AlertKind::MissingAttendance,
            schedule.missing_attendance.enabled,
            schedule.missing_attendance.interval_seconds,
        ),
        (
            AlertKind::PendingApproval,
            schedule.pending_approval.enabled,
            schedule.pending_approval.interval_seconds,
        ),
        (
            AlertKind::QuotaShortfall,
            schedule.quota_shortfall.enabled,
            schedule.quota_shortfall.interval_seconds,
        ),
    ]
    .into_iter()
    .filter(|(_, enabled, _)| *enabled)
    .map(|(kind, _, seconds)| (kind, seconds.max(1)))
    .collect()
}

/// Spawns one task per enabled check.
///
/// A failed run is logged and the task waits for its next tick. The tasks
/// run until aborted or the runtime shuts down.
pub fn spawn_scheduler(pool: SqlitePool, config: Arc<ConfigLoader>) -> Vec<JoinHandle<()>> {
    enabled_checks(&config)
        .into_iter()
        .map(|(kind, seconds)| {
            info!(check = %kind, interval_seconds = seconds, "Starting alert check");
            let pool = pool.clone();
            let config = Arc::clone(&config);
            tokio::spawn(async move {
                let mut timer = interval(StdDuration::from_secs(seconds));
                timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    timer.tick().await;
                    match run_check(kind, &pool, &config, CheckTime::now()).await {
                        Ok(0) => debug!(check = %kind, "No new alerts"),
                        Ok(raised) => info!(check = %kind, raised, "Alerts raised"),
                        Err(e) => error!(check = %kind, error = %e, "Alert check failed"),
                    }
                }
            })
        })
        .collect()
}
