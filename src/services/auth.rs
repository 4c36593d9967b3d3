//! Bearer-token authentication: HS256 JWTs whose subject is the user email.
//!
//! The transport layer extracts and validates the token, then resolves the
//! user row inside the request's session. Users are provisioned ahead of
//! time; an unknown subject is an authentication failure, not a signup.

use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::errors::ApiError;
use crate::models::User;
use crate::repository::Db;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User email.
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

pub fn create_access_token(
    email: &str,
    secret: &[u8],
    expiration_minutes: i64,
) -> Result<String, ApiError> {
    let now = Utc::now();
    let claims = Claims {
        sub: email.to_string(),
        exp: (now + Duration::minutes(expiration_minutes)).timestamp(),
        iat: now.timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|err| ApiError::Authentication(format!("could not issue token: {err}")))
}

pub fn decode_token(token: &str, secret: &[u8]) -> Result<Claims, ApiError> {
    // HS256 only, to rule out algorithm confusion
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)
        .map(|data| data.claims)
        .map_err(|_| ApiError::Authentication("invalid bearer token".to_string()))
}

pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Authentication("missing bearer token".to_string()))
}

/// Resolve the authenticated user row for a validated token.
pub async fn current_user(db: &mut Db<'_>, claims: &Claims) -> Result<User, ApiError> {
    db.get_user_by_email(&claims.sub)
        .await
        .map_err(|err| match err {
            ApiError::NotFound(_) => ApiError::Authentication("unknown user".to_string()),
            other => other,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret";

    #[test]
    fn test_token_round_trip() {
        let token = create_access_token("user@example.com", SECRET, 10).unwrap();
        let claims = decode_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, "user@example.com");
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = create_access_token("user@example.com", SECRET, 10).unwrap();
        let err = decode_token(&token, b"other-secret").unwrap_err();
        assert!(matches!(err, ApiError::Authentication(_)), "{err}");
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let token = create_access_token("user@example.com", SECRET, -10).unwrap();
        let err = decode_token(&token, SECRET).unwrap_err();
        assert!(matches!(err, ApiError::Authentication(_)), "{err}");
    }

    #[test]
    fn test_bearer_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def.ghi");

        headers.insert("authorization", "Basic dXNlcg==".parse().unwrap());
        assert!(bearer_token(&headers).is_err());
    }
}
