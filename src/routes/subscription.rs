//! Subscription endpoint (/subscription/create)

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::AppState;
use crate::services::billing;
use super::auth::AuthUser;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/subscription/create", post(create))
}

#[derive(Deserialize)]
struct CreateSubscriptionRequest {
    payment_method: String,
    payment_id: String,
}

/// POST /subscription/create - Activate a 30-day monthly subscription
async fn create(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<CreateSubscriptionRequest>,
) -> Result<Response, StatusCode> {
    match billing::create_subscription(&state.db, user_id, &req.payment_method, &req.payment_id)
        .await
    {
        Ok(receipt) => Ok(Json(json!({
            "success": true,
            "subscription_id": receipt.subscription_id,
            "end_date": receipt.end_date,
            "message": receipt.message,
        }))
        .into_response()),
        Err(e) => {
            eprintln!("[subscription] Create error: {}", e);
            Ok((
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "error": e.to_string() })),
            )
                .into_response())
        }
    }
}
