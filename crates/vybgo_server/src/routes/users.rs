use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route(
        "/fcm-token",
        post(set_fcm_token_handler)
            .get(get_fcm_token_handler)
            .delete(clear_fcm_token_handler),
    )
}

#[derive(Debug, Deserialize)]
pub struct FcmTokenRequest {
    pub token: Option<String>,
}

async fn set_fcm_token_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<FcmTokenRequest>,
) -> Result<Json<Value>, ApiError> {
    let Some(token) = body.token.filter(|t| !t.trim().is_empty()) else {
        return Err(ApiError::bad_request("FCM token is required"));
    };

    let user = state.db.set_fcm_token(user_id, Some(token)).await?;

    Ok(Json(json!({
        "message": "FCM token updated successfully",
        "user": {
            "id": user.id,
            "email": user.email,
            "name": user.name,
            "fcmToken": user.fcm_token,
            "updatedAt": user.updated_at,
        },
    })))
}

async fn get_fcm_token_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Value>, ApiError> {
    let user = state
        .db
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(json!({ "fcmToken": user.fcm_token })))
}

async fn clear_fcm_token_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Value>, ApiError> {
    state.db.set_fcm_token(user_id, None).await?;

    Ok(Json(json!({ "message": "FCM token cleared successfully" })))
}
