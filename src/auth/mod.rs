use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config;

/// Claims carried by the bearer token of an authenticated staff user.
/// Access decisions are made by whoever issues the token; this service only
/// checks that it is genuine and unexpired.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user: String,
    pub access: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user: impl Into<String>, access: impl Into<String>) -> Self {
        let now = Utc::now();
        let expiry_hours = config::config().security.jwt_expiry_hours;
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            user: user.into(),
            access: access.into(),
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT secret not configured")]
    InvalidSecret,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),
}

pub fn generate_jwt(claims: &Claims) -> Result<String, JwtError> {
    generate_jwt_with_secret(claims, &config::config().security.jwt_secret)
}

pub fn generate_jwt_with_secret(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

pub fn validate_jwt(token: &str) -> Result<Claims, JwtError> {
    validate_jwt_with_secret(token, &config::config().security.jwt_secret)
}

pub fn validate_jwt_with_secret(token: &str, secret: &str) -> Result<Claims, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    decode::<Claims>(token, &decoding_key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| JwtError::InvalidToken(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_with_secret() {
        let claims = Claims {
            user: "ada".to_string(),
            access: "full".to_string(),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
            iat: Utc::now().timestamp(),
        };
        let token = generate_jwt_with_secret(&claims, "s3cret").unwrap();
        let decoded = validate_jwt_with_secret(&token, "s3cret").unwrap();
        assert_eq!(decoded.user, "ada");

        assert!(matches!(
            validate_jwt_with_secret(&token, "other").unwrap_err(),
            JwtError::InvalidToken(_)
        ));
    }

    #[test]
    fn test_empty_secret_is_rejected() {
        let claims = Claims {
            user: "ada".to_string(),
            access: "full".to_string(),
            exp: 0,
            iat: 0,
        };
        assert!(matches!(
            generate_jwt_with_secret(&claims, "").unwrap_err(),
            JwtError::InvalidSecret
        ));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let claims = Claims {
            user: "ada".to_string(),
            access: "full".to_string(),
            exp: (Utc::now() - Duration::hours(2)).timestamp(),
            iat: (Utc::now() - Duration::hours(3)).timestamp(),
        };
        let token = generate_jwt_with_secret(&claims, "s3cret").unwrap();
        assert!(validate_jwt_with_secret(&token, "s3cret").is_err());
    }
}
