//! Analysis record domain - append-only history of analysis results

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Executor, Postgres};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AnalysisRecord {
    pub id: i64,
    pub analysis_type: String,
    pub filename: String,
    pub result: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Persist one analysis result. Records are immutable once written.
pub async fn insert<'e, E>(
    executor: E,
    user_id: i64,
    analysis_type: &str,
    filename: &str,
    result: &serde_json::Value,
) -> Result<AnalysisRecord, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        INSERT INTO analysis_results (user_id, analysis_type, filename, result)
        VALUES ($1, $2, $3, $4)
        RETURNING id, analysis_type, filename, result, created_at
        "#,
    )
    .bind(user_id)
    .bind(analysis_type)
    .bind(filename)
    .bind(result)
    .fetch_one(executor)
    .await
}

/// All records for a user, newest first.
pub async fn history_for_user<'e, E>(
    executor: E,
    user_id: i64,
) -> Result<Vec<AnalysisRecord>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        SELECT id, analysis_type, filename, result, created_at
        FROM analysis_results
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}
