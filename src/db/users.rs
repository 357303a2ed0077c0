//! User accounts.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::{conflict_on_unique, optional_u32_column, parse_column};
use crate::error::{PortalError, PortalResult};
use crate::models::{Role, User};

const COLUMNS: &str = "id, email, full_name, role, daily_quota, active, created_at";

/// Fields for a new account. The password must already be hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Login email.
    pub email: String,
    /// Display name.
    pub full_name: String,
    /// Role.
    pub role: Role,
    /// Stored password hash.
    pub password_hash: String,
    /// Per-user daily application target.
    pub daily_quota: Option<u32>,
}

/// Changes to an existing account. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    /// New display name.
    pub full_name: Option<String>,
    /// New role.
    pub role: Option<Role>,
    /// New daily quota.
    pub daily_quota: Option<u32>,
    /// Activate or deactivate the account.
    pub active: Option<bool>,
    /// Replacement password hash.
    pub password_hash: Option<String>,
}

/// A user together with the stored password hash, for login.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    /// The account.
    pub user: User,
    /// Stored password hash.
    pub password_hash: String,
}

fn from_row(row: &SqliteRow) -> PortalResult<User> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        full_name: row.try_get("full_name")?,
        role: parse_column(row, "role")?,
        daily_quota: optional_u32_column(row, "daily_quota")?,
        active: row.try_get("active")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Inserts a user. A duplicate email is a [`PortalError::Conflict`].
pub async fn insert(pool: &SqlitePool, new: &NewUser) -> PortalResult<User> {
    let email = new.email.trim().to_ascii_lowercase();

    let id = sqlx::query(
        "INSERT INTO users (email, full_name, role, password_hash, daily_quota, active, created_at)
         VALUES (?, ?, ?, ?, ?, 1, ?)",
    )
    .bind(&email)
    .bind(&new.full_name)
    .bind(new.role.as_str())
    .bind(&new.password_hash)
    .bind(new.daily_quota.map(i64::from))
    .bind(Utc::now())
    .execute(pool)
    .await
    .map_err(|e| conflict_on_unique(e, || format!("a user with email '{}' already exists", email)))?
    .last_insert_rowid();

    get(pool, id).await
}

/// Fetches a user by id.
pub async fn get(pool: &SqlitePool, id: i64) -> PortalResult<User> {
    let row = sqlx::query(&format!("SELECT {COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(PortalError::NotFound { entity: "user", id })?;
    from_row(&row)
}

/// Looks a user up by email (case-insensitive) along with the password hash.
pub async fn find_by_email(pool: &SqlitePool, email: &str) -> PortalResult<Option<UserCredentials>> {
    let row = sqlx::query(&format!(
        "SELECT {COLUMNS}, password_hash FROM users WHERE email = ?"
    ))
    .bind(email.trim().to_ascii_lowercase())
    .fetch_optional(pool)
    .await?;

    row.map(|row| {
        Ok(UserCredentials {
            user: from_row(&row)?,
            password_hash: row.try_get("password_hash")?,
        })
    })
    .transpose()
}

/// Lists every user ordered by id.
pub async fn list(pool: &SqlitePool) -> PortalResult<Vec<User>> {
    let rows = sqlx::query(&format!("SELECT {COLUMNS} FROM users ORDER BY id"))
        .fetch_all(pool)
        .await?;
    rows.iter().map(from_row).collect()
}

/// Lists active recruiters, the population the alert checks run over.
pub async fn list_active_recruiters(pool: &SqlitePool) -> PortalResult<Vec<User>> {
    let rows = sqlx::query(&format!(
        "SELECT {COLUMNS} FROM users WHERE role = ? AND active = 1 ORDER BY id"
    ))
    .bind(Role::Recruiter.as_str())
    .fetch_all(pool)
    .await?;
    rows.iter().map(from_row).collect()
}

/// Applies an update and returns the stored user.
pub async fn update(pool: &SqlitePool, id: i64, changes: &UserUpdate) -> PortalResult<User> {
    let current = get(pool, id).await?;

    sqlx::query(
        "UPDATE users SET full_name = ?, role = ?, daily_quota = ?, active = ?,
         password_hash = COALESCE(?, password_hash) WHERE id = ?",
    )
    .bind(changes.full_name.as_ref().unwrap_or(&current.full_name))
    .bind(changes.role.unwrap_or(current.role).as_str())
    .bind(changes.daily_quota.or(current.daily_quota).map(i64::from))
    .bind(changes.active.unwrap_or(current.active))
    .bind(changes.password_hash.as_deref())
    .bind(id)
    .execute(pool)
    .await?;

    get(pool, id).await
}

/// Counts users, used to decide whether a bootstrap admin is needed.
pub async fn count(pool: &SqlitePool) -> PortalResult<i64> {
    Ok(sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            full_name: "Priya Nair".to_string(),
            role: Role::Recruiter,
            password_hash: "abc$def".to_string(),
            daily_quota: Some(12),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let pool = test_support::pool().await;
        let user = insert(&pool, &new_user("Priya@Example.com")).await.unwrap();

        assert_eq!(user.email, "priya@example.com");
        assert_eq!(user.daily_quota, Some(12));
        assert!(user.active);
        assert_eq!(get(&pool, user.id).await.unwrap(), user);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let pool = test_support::pool().await;
        insert(&pool, &new_user("priya@example.com")).await.unwrap();
        let result = insert(&pool, &new_user("PRIYA@example.com")).await;
        assert!(matches!(result, Err(PortalError::Conflict { .. })));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_simultaneous_duplicate_inserts_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let pool = test_support::file_pool(&dir).await;

        for i in 0..20 {
            let user = new_user(&format!("dup{i}@example.com"));
            let (left, right) = tokio::join!(insert(&pool, &user), insert(&pool, &user));
            let outcomes = [left, right];
            assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
            assert!(outcomes
                .iter()
                .any(|r| matches!(r, Err(PortalError::Conflict { .. }))));
        }
    }

    #[tokio::test]
    async fn test_find_by_email_returns_hash() {
        let pool = test_support::pool().await;
        insert(&pool, &new_user("priya@example.com")).await.unwrap();

        let found = find_by_email(&pool, " Priya@example.com ").await.unwrap().unwrap();
        assert_eq!(found.password_hash, "abc$def");
        assert!(find_by_email(&pool, "nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let pool = test_support::pool().await;
        assert!(matches!(
            get(&pool, 42).await,
            Err(PortalError::NotFound { entity: "user", id: 42 })
        ));
    }

    #[tokio::test]
    async fn test_update_and_active_recruiters() {
        let pool = test_support::pool().await;
        let a = insert(&pool, &new_user("a@example.com")).await.unwrap();
        let b = insert(&pool, &new_user("b@example.com")).await.unwrap();

        let updated = update(
            &pool,
            b.id,
            &UserUpdate {
                active: Some(false),
                ..UserUpdate::default()
            },
        )
        .await
        .unwrap();
        assert!(!updated.active);
        assert_eq!(updated.full_name, b.full_name);

        let recruiters = list_active_recruiters(&pool).await.unwrap();
        assert_eq!(recruiters.len(), 1);
        assert_eq!(recruiters[0].id, a.id);
        assert_eq!(count(&pool).await.unwrap(), 2);
    }
}
