//! Analysis endpoints (/analysis/*)
//!
//! Upload flow per request: quota gate, multipart read, orchestrator run,
//! usage increment, persist, respond. The orchestrator never raises, so a
//! malformed image still produces a stored `{success: false}` record rather
//! than a 500.

use axum::{
    Json, Router,
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::AppState;
use crate::analysis::AnalysisKind;
use crate::domain::analyses::{self, AnalysisRecord};
use crate::services::{error::LogErr, usage};
use super::auth::AuthUser;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/analysis/classification", post(analyze_classification))
        .route("/analysis/forgery", post(analyze_forgery))
        .route("/analysis/deepfake", post(analyze_deepfake))
        .route("/analysis/history", get(get_history))
}

async fn analyze_classification(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    multipart: Multipart,
) -> Result<Response, StatusCode> {
    run_analysis(&state, user_id, AnalysisKind::Classification, multipart).await
}

async fn analyze_forgery(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    multipart: Multipart,
) -> Result<Response, StatusCode> {
    run_analysis(&state, user_id, AnalysisKind::Forgery, multipart).await
}

async fn analyze_deepfake(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    multipart: Multipart,
) -> Result<Response, StatusCode> {
    run_analysis(&state, user_id, AnalysisKind::Deepfake, multipart).await
}

async fn run_analysis(
    state: &AppState,
    user_id: i64,
    kind: AnalysisKind,
    mut multipart: Multipart,
) -> Result<Response, StatusCode> {
    let check = usage::check_usage_limit(&state.db, user_id)
        .await
        .log_500("Usage check error")?;

    if !check.can_analyze {
        return Ok((
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({
                "error": "Daily limit exceeded",
                "message": check
                    .message
                    .unwrap_or_else(|| "You have reached your daily limit".to_string()),
                "usage_count": check.usage_count,
                "limit": check.limit,
                "subscription_required": true,
            })),
        )
            .into_response());
    }

    let field = multipart
        .next_field()
        .await
        .log_400("Multipart field error")?
        .ok_or(StatusCode::BAD_REQUEST)?;

    let content_type = field
        .content_type()
        .map(|s| s.to_string())
        .unwrap_or_default();
    if !content_type.starts_with("image/") {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "File must be an image" })),
        )
            .into_response());
    }

    let filename = field.file_name().unwrap_or("upload").to_string();
    let bytes = field.bytes().await.log_400("Failed to read upload")?;

    let result = state.analyzer.analyze(kind, bytes).await;

    // No rollback path: once the analysis ran, it counts
    usage::increment_usage(&state.db, user_id)
        .await
        .log_500("Usage increment error")?;

    let record = analyses::insert(&state.db, user_id, kind.as_str(), &filename, &result)
        .await
        .log_500("Save analysis error")?;

    Ok(Json(record).into_response())
}

#[derive(Serialize)]
struct HistoryResponse {
    history: Vec<AnalysisRecord>,
}

/// GET /analysis/history - The caller's past analyses, newest first
async fn get_history(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<HistoryResponse>, StatusCode> {
    let history = analyses::history_for_user(&state.db, user_id)
        .await
        .log_500("History query error")?;

    Ok(Json(HistoryResponse { history }))
}
