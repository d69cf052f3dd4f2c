//! Session management: JWT bearer access tokens

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// JWT claims for access tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id as string
    pub exp: i64,    // expiry timestamp
    pub iat: i64,    // issued at
}

#[derive(Debug)]
pub enum SessionError {
    InvalidToken,
    Expired,
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::InvalidToken => write!(f, "Invalid token"),
            SessionError::Expired => write!(f, "Token expired"),
        }
    }
}

const ACCESS_TOKEN_EXPIRY_HOURS: i64 = 24;

/// Create a JWT access token valid for 24 hours
pub fn create_access_token(user_id: i64, secret: &[u8]) -> Result<String, SessionError> {
    let now = Utc::now();
    let exp = now + Duration::hours(ACCESS_TOKEN_EXPIRY_HOURS);

    let claims = Claims {
        sub: user_id.to_string(),
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|_| SessionError::InvalidToken)
}

/// Validate a JWT access token and return the user_id
pub fn validate_access_token(token: &str, secret: &[u8]) -> Result<i64, SessionError> {
    // Explicitly validate with HS256 algorithm only to prevent algorithm confusion attacks
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_required_spec_claims(&["exp", "sub", "iat"]);

    let token_data =
        decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => SessionError::Expired,
                _ => SessionError::InvalidToken,
            }
        })?;

    token_data
        .claims
        .sub
        .parse::<i64>()
        .map_err(|_| SessionError::InvalidToken)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_roundtrip() {
        let secret = b"test-secret";
        let token = create_access_token(42, secret).unwrap();
        assert_eq!(validate_access_token(&token, secret).unwrap(), 42);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = create_access_token(42, b"secret-a").unwrap();
        assert!(matches!(
            validate_access_token(&token, b"secret-b"),
            Err(SessionError::InvalidToken)
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(validate_access_token("not.a.jwt", b"secret").is_err());
    }
}
