//! Subscription domain - purchase history and the active-window lookup
//!
//! A user accumulates subscription rows over time; "active" is decided by
//! query (`status = 'active' AND end_date > now`), not by a flag that could
//! go stale. `payment_id` is UNIQUE so a payment callback replayed by the
//! provider cannot mint a second active subscription.

use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Subscription {
    pub id: i64,
    pub plan_type: String,
    pub status: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

const SUBSCRIPTION_COLUMNS: &str = "id, plan_type, status, start_date, end_date";

/// The user's active, unexpired subscription, if any.
pub async fn find_active<'e, E>(
    executor: E,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<Option<Subscription>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        r#"
        SELECT {SUBSCRIPTION_COLUMNS}
        FROM subscriptions
        WHERE user_id = $1 AND status = 'active' AND end_date > $2
        ORDER BY end_date DESC
        LIMIT 1
        "#
    ))
    .bind(user_id)
    .bind(now)
    .fetch_optional(executor)
    .await
}

/// Insert a subscription row. Returns `None` when `payment_id` was already
/// recorded (replayed payment callback).
#[allow(clippy::too_many_arguments)]
pub async fn insert<'e, E>(
    executor: E,
    user_id: i64,
    plan_type: &str,
    amount: f64,
    payment_method: &str,
    payment_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Option<Subscription>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        r#"
        INSERT INTO subscriptions
            (user_id, plan_type, amount, payment_method, payment_id, status, start_date, end_date)
        VALUES ($1, $2, $3, $4, $5, 'active', $6, $7)
        ON CONFLICT (payment_id) DO NOTHING
        RETURNING {SUBSCRIPTION_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(plan_type)
    .bind(amount)
    .bind(payment_method)
    .bind(payment_id)
    .bind(start)
    .bind(end)
    .fetch_optional(executor)
    .await
}

/// Look up the subscription a payment reference already created.
pub async fn find_by_payment_id<'e, E>(
    executor: E,
    payment_id: &str,
) -> Result<Option<Subscription>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE payment_id = $1"
    ))
    .bind(payment_id)
    .fetch_optional(executor)
    .await
}
