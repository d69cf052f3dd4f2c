//! Daily usage domain - the per-(user, date) analysis counter
//!
//! `UNIQUE (user_id, usage_date)` holds the one-row-per-day invariant; the
//! increment is a single conditional upsert so concurrent increments never
//! lose counts. The quota check itself is a separate read (see
//! `services::usage`) - that check-then-increment window is an accepted race
//! for a soft daily counter.

use chrono::NaiveDate;
use sqlx::{Executor, Postgres};

/// Today's count for a user; 0 when no row exists yet.
pub async fn count_for_day<'e, E>(
    executor: E,
    user_id: i64,
    day: NaiveDate,
) -> Result<i32, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let row: Option<(i32,)> = sqlx::query_as(
        "SELECT analysis_count FROM daily_usage WHERE user_id = $1 AND usage_date = $2",
    )
    .bind(user_id)
    .bind(day)
    .fetch_optional(executor)
    .await?;
    Ok(row.map(|(count,)| count).unwrap_or(0))
}

/// Create the day's row lazily or bump it, returning the new count.
pub async fn increment<'e, E>(executor: E, user_id: i64, day: NaiveDate) -> Result<i32, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let row: (i32,) = sqlx::query_as(
        r#"
        INSERT INTO daily_usage (user_id, usage_date, analysis_count)
        VALUES ($1, $2, 1)
        ON CONFLICT (user_id, usage_date) DO UPDATE SET
            analysis_count = daily_usage.analysis_count + 1,
            updated_at = NOW()
        RETURNING analysis_count
        "#,
    )
    .bind(user_id)
    .bind(day)
    .fetch_one(executor)
    .await?;
    Ok(row.0)
}
