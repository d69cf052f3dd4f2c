//! Authentication endpoints (/auth/*) and the bearer-token extractor
//!
//! Identity is email-only: registering or logging in with a fresh address
//! creates the account, and both return a bearer access token.

use axum::{
    Json, Router,
    extract::{FromRequestParts, State},
    http::{StatusCode, request::Parts},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};

use crate::AppState;
use crate::domain::users;
use crate::services::{error::LogErr, mailer, session};

pub fn routes() -> Router<Arc<AppState>> {
    // Rate limit auth endpoints to slow down email enumeration
    let rate_limit_config = GovernorConfigBuilder::default()
        .per_second(6)
        .burst_size(10)
        .key_extractor(SmartIpKeyExtractor)
        .finish()
        .expect("Failed to build rate limit config");

    let rate_limit_layer = GovernorLayer {
        config: rate_limit_config.into(),
    };

    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/verify", post(verify))
        .route("/auth/me", get(get_me))
        .layer(rate_limit_layer)
}

// ============================================================================
// Auth Extractor - validates the bearer token and extracts the user_id
// ============================================================================

/// Extractor that validates the `Authorization: Bearer` token and returns
/// the user_id
pub struct AuthUser(pub i64);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let user_id = session::validate_access_token(token, &state.jwt_secret).map_err(|e| {
            eprintln!("JWT validation failed: {}", e);
            StatusCode::UNAUTHORIZED
        })?;

        Ok(AuthUser(user_id))
    }
}

// ============================================================================
// Endpoints
// ============================================================================

#[derive(Deserialize)]
struct EmailRequest {
    email: String,
}

#[derive(Serialize)]
struct TokenResponse {
    access_token: String,
    token_type: &'static str,
}

fn normalize_email(raw: &str) -> Result<String, StatusCode> {
    let email = raw.trim().to_lowercase();
    // Light shape check; identity is email-only, there is no password to get wrong
    if email.len() < 3 || !email.contains('@') {
        return Err(StatusCode::BAD_REQUEST);
    }
    Ok(email)
}

fn issue_token(state: &AppState, user_id: i64) -> Result<Json<TokenResponse>, StatusCode> {
    let access_token =
        session::create_access_token(user_id, &state.jwt_secret).log_500("Token create error")?;
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
    }))
}

/// POST /auth/register - Create an account (or re-activate an existing one)
async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EmailRequest>,
) -> Result<Json<TokenResponse>, StatusCode> {
    let email = normalize_email(&req.email)?;

    let user = match users::find_by_email(&state.db, &email)
        .await
        .log_500("Find user error")?
    {
        Some(user) => {
            users::mark_verified(&state.db, user.id)
                .await
                .log_500("Mark verified error")?;
            user
        }
        None => {
            let code = mailer::generate_verification_code();
            let user = users::create(&state.db, &email, Some(&code), false)
                .await
                .log_500("Create user error")?;
            state.mailer.send_verification_code(&email, &code).await;
            user
        }
    };

    issue_token(&state, user.id)
}

/// POST /auth/login - Email-only login; unknown addresses become accounts
async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EmailRequest>,
) -> Result<Json<TokenResponse>, StatusCode> {
    let email = normalize_email(&req.email)?;

    let user = match users::find_by_email(&state.db, &email)
        .await
        .log_500("Find user error")?
    {
        Some(user) => user,
        None => users::create(&state.db, &email, None, true)
            .await
            .log_500("Create user error")?,
    };

    issue_token(&state, user.id)
}

#[derive(Deserialize)]
struct VerifyRequest {
    email: String,
    code: String,
}

#[derive(Serialize)]
struct VerifyResponse {
    success: bool,
    message: &'static str,
}

/// POST /auth/verify - Complete email verification with the mailed code
async fn verify(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, StatusCode> {
    let email = normalize_email(&req.email)?;

    let user = users::find_by_email(&state.db, &email)
        .await
        .log_500("Find user error")?
        .ok_or(StatusCode::NOT_FOUND)?;

    if user.verification_code.as_deref() != Some(req.code.as_str()) {
        return Err(StatusCode::BAD_REQUEST);
    }

    users::mark_verified(&state.db, user.id)
        .await
        .log_500("Mark verified error")?;

    Ok(Json(VerifyResponse {
        success: true,
        message: "Email verified",
    }))
}

/// User API response DTO
#[derive(Debug, Serialize)]
struct UserResponse {
    id: i64,
    email: String,
    is_verified: bool,
    created_at: DateTime<Utc>,
}

/// GET /auth/me - Get current user info
async fn get_me(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserResponse>, StatusCode> {
    // A valid token for a deleted user is still unauthorized - don't leak
    // user existence via a 404/401 distinction
    let user = users::find_by_id(&state.db, user_id)
        .await
        .log_500("Find user error")?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    Ok(Json(UserResponse {
        id: user.id,
        email: user.email,
        is_verified: user.is_verified,
        created_at: user.created_at,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(
            normalize_email("  User@Example.COM ").unwrap(),
            "user@example.com"
        );
        assert!(normalize_email("not-an-email").is_err());
        assert!(normalize_email("").is_err());
    }
}
