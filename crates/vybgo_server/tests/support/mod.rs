#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use vybgo_core::scheduler::{Scheduler, VirtualScheduler};
use vybgo_server::config::Config;
use vybgo_server::state::AppState;
use vybgo_server::store::MemoryStore;

/// A full app wired to an in-memory store and a virtual clock; each test
/// gets its own, so timers never leak between tests.
pub struct TestApp {
    pub app: Router,
    pub store: Arc<MemoryStore>,
    pub scheduler: Arc<VirtualScheduler>,
}

pub fn test_app() -> TestApp {
    let config = Config {
        port: 0,
        jwt_secret: "test-secret".into(),
        fcm_server_api_key: None,
        supabase: None,
    };
    let store = Arc::new(MemoryStore::new());
    let scheduler = Arc::new(VirtualScheduler::new());
    let state = AppState::new(
        config,
        Arc::clone(&store),
        Arc::clone(&scheduler) as Arc<dyn Scheduler>,
    );
    TestApp {
        app: vybgo_server::app(state),
        store,
        scheduler,
    }
}

/// Fire one request at the router and return status plus parsed JSON body.
pub async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

/// Register a fresh user and return their bearer token.
pub async fn register_user(app: &Router, email: &str) -> String {
    let (status, body) = send_json(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "email": email, "password": "hunter2", "name": "Test Rider" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    body["token"].as_str().expect("token").to_string()
}

/// Create a ride for the given token and return its id string.
pub async fn create_ride(app: &Router, token: &str) -> String {
    let (status, body) = send_json(
        app,
        "POST",
        "/api/rides",
        Some(token),
        Some(json!({ "pickup": "Airport Terminal 2", "dropoff": "Harbor Market", "vibe": "CHILL" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "ride creation failed: {body}");
    body["id"].as_str().expect("ride id").to_string()
}
