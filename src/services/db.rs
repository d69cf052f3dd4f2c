//! Database schema bootstrap and transaction conventions.
//!
//! The schema is ensured at startup; statements are idempotent so restarts
//! are safe. Domain functions use sqlx's generic `Executor` trait and accept
//! both `&PgPool` and `&mut PgConnection`, with routes and services owning
//! transaction boundaries:
//!
//! ```ignore
//! let mut tx = pool.begin().await?;
//! domain::subscriptions::insert(&mut *tx, ...).await?;
//! domain::users::set_subscribed(&mut *tx, ...).await?;
//! tx.commit().await?;
//! ```

use sqlx::PgPool;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        email TEXT UNIQUE NOT NULL,
        is_verified BOOLEAN NOT NULL DEFAULT FALSE,
        verification_code TEXT,
        is_subscribed BOOLEAN NOT NULL DEFAULT FALSE,
        subscription_start_date TIMESTAMPTZ,
        subscription_end_date TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS analysis_results (
        id BIGSERIAL PRIMARY KEY,
        user_id BIGINT NOT NULL REFERENCES users(id),
        analysis_type TEXT NOT NULL,
        filename TEXT NOT NULL,
        result JSONB NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_analysis_results_user_created
        ON analysis_results (user_id, created_at DESC)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS daily_usage (
        id BIGSERIAL PRIMARY KEY,
        user_id BIGINT NOT NULL REFERENCES users(id),
        usage_date DATE NOT NULL,
        analysis_count INTEGER NOT NULL DEFAULT 0,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ,
        UNIQUE (user_id, usage_date)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS subscriptions (
        id BIGSERIAL PRIMARY KEY,
        user_id BIGINT NOT NULL REFERENCES users(id),
        plan_type TEXT NOT NULL,
        amount DOUBLE PRECISION NOT NULL,
        payment_method TEXT NOT NULL,
        payment_id TEXT UNIQUE,
        status TEXT NOT NULL DEFAULT 'active',
        start_date TIMESTAMPTZ NOT NULL,
        end_date TIMESTAMPTZ NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
];

/// Create all tables and indexes if they do not exist yet.
pub async fn init_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
