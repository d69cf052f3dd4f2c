//! Usage statistics endpoint (/usage/stats)

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use std::sync::Arc;

use crate::AppState;
use crate::services::{
    error::LogErr,
    usage::{self, UsageStats},
};
use super::auth::AuthUser;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/usage/stats", get(get_stats))
}

/// GET /usage/stats - Today's count, limit, and subscription window
async fn get_stats(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UsageStats>, StatusCode> {
    let stats = usage::get_usage_stats(&state.db, user_id)
        .await
        .log_500("Usage stats error")?;

    Ok(Json(stats))
}
