//! JWT and password primitives plus the bearer-token extractor.
//!
//! Tokens carry a single `userId` claim and expire after seven days.
//! A missing token rejects with 401, an invalid or expired one with 403.

use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use vybgo_core::ride::UserId;

use crate::error::ApiError;
use crate::state::AppState;

pub const TOKEN_TTL_DAYS: i64 = 7;
const BCRYPT_COST: u32 = 10;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    pub exp: i64,
}

pub fn sign_token(user_id: UserId, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        user_id,
        exp: (Utc::now() + Duration::days(TOKEN_TTL_DAYS)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, BCRYPT_COST)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    bcrypt::verify(password, hash)
}

/// Extractor for the authenticated user id from `Authorization: Bearer`.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub UserId);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|header| header.strip_prefix("Bearer "))
            .ok_or_else(|| ApiError::Unauthorized("Access token required".into()))?;

        let claims = verify_token(token, &state.config.jwt_secret)
            .map_err(|_| ApiError::Forbidden("Invalid or expired token".into()))?;

        Ok(AuthUser(claims.user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips_user_id() {
        let user = UserId::new();
        let token = sign_token(user, "test-secret").expect("sign");
        let claims = verify_token(&token, "test-secret").expect("verify");
        assert_eq!(claims.user_id, user);
    }

    #[test]
    fn token_fails_with_wrong_secret() {
        let token = sign_token(UserId::new(), "secret-a").expect("sign");
        assert!(verify_token(&token, "secret-b").is_err());
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("hunter2").expect("hash");
        assert!(verify_password("hunter2", &hash).expect("verify"));
        assert!(!verify_password("hunter3", &hash).expect("verify"));
    }
}
