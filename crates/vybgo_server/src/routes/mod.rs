pub mod auth;
pub mod rides;
pub mod users;
pub mod vibes;

use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::state::AppState;

pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api/auth", auth::router())
        .nest("/api/vibes", vibes::router())
        .nest("/api/rides", rides::router())
        .nest("/api/users", users::router())
        .route("/api/health", get(health_handler))
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok", "message": "VYBGO API is running" }))
}
