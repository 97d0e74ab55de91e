use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::auth::{hash_password, sign_token, verify_password, AuthUser};
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{NewUser, PublicUser};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
        .route("/whoami", get(whoami_handler))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub user: PublicUser,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct WhoamiResponse {
    pub user: PublicUser,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let (Some(email), Some(password)) = (non_empty(body.email), non_empty(body.password)) else {
        return Err(ApiError::bad_request("Email and password are required"));
    };

    if state.db.find_user_by_email(&email).await?.is_some() {
        return Err(ApiError::bad_request("User already exists"));
    }

    let password_hash = hash_password(&password)?;
    let user = state
        .db
        .create_user(NewUser {
            email,
            password_hash,
            name: non_empty(body.name),
            phone: non_empty(body.phone),
            is_admin: false,
        })
        .await?;

    let token = sign_token(user.id, &state.config.jwt_secret)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully",
            user: user.public(),
            token,
        }),
    ))
}

async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let (Some(email), Some(password)) = (non_empty(body.email), non_empty(body.password)) else {
        return Err(ApiError::bad_request("Email and password are required"));
    };

    // Same response for unknown email and wrong password.
    let user = state
        .db
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".into()))?;

    if !verify_password(&password, &user.password_hash)? {
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }

    let token = sign_token(user.id, &state.config.jwt_secret)?;

    Ok(Json(AuthResponse {
        message: "Login successful",
        user: user.public(),
        token,
    }))
}

async fn whoami_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<WhoamiResponse>, ApiError> {
    let user = state
        .db
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(WhoamiResponse {
        user: user.public(),
    }))
}
