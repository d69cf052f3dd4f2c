//! User domain - DB queries for users
//!
//! All functions use the generic Executor pattern, allowing them to work with
//! both `&PgPool` (for standalone queries) and `&mut PgConnection` (for transactions).

use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub is_verified: bool,
    pub verification_code: Option<String>,
    pub is_subscribed: bool,
    pub subscription_end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

const USER_COLUMNS: &str =
    "id, email, is_verified, verification_code, is_subscribed, subscription_end_date, created_at";

pub async fn find_by_email<'e, E>(executor: E, email: &str) -> Result<Option<User>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
        .bind(email)
        .fetch_optional(executor)
        .await
}

pub async fn find_by_id<'e, E>(executor: E, user_id: i64) -> Result<Option<User>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(user_id)
        .fetch_optional(executor)
        .await
}

/// Insert a new user. `verification_code` is set for registrations that go
/// through email verification; logins auto-create verified users with none.
pub async fn create<'e, E>(
    executor: E,
    email: &str,
    verification_code: Option<&str>,
    verified: bool,
) -> Result<User, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        r#"
        INSERT INTO users (email, verification_code, is_verified)
        VALUES ($1, $2, $3)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(email)
    .bind(verification_code)
    .bind(verified)
    .fetch_one(executor)
    .await
}

/// Mark a user verified and clear any outstanding verification code.
pub async fn mark_verified<'e, E>(executor: E, user_id: i64) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query("UPDATE users SET is_verified = TRUE, verification_code = NULL WHERE id = $1")
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Mirror an activated subscription window onto the user record.
pub async fn set_subscribed<'e, E>(
    executor: E,
    user_id: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        r#"
        UPDATE users
        SET is_subscribed = TRUE,
            subscription_start_date = $2,
            subscription_end_date = $3
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .execute(executor)
    .await?;
    Ok(())
}
