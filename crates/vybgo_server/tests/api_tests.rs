mod support;

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;
use support::{create_ride, register_user, send_json, test_app};

#[tokio::test]
async fn health_check_reports_ok() {
    let fixture = test_app();
    let (status, body) = send_json(&fixture.app, "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn register_then_login_round_trip() {
    let fixture = test_app();
    register_user(&fixture.app, "rider@example.com").await;

    let (status, body) = send_json(
        &fixture.app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "rider@example.com", "password": "hunter2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["user"]["email"], "rider@example.com");
    assert!(body["token"].as_str().is_some());
    // The password hash must never appear in a response.
    assert!(body["user"].get("passwordHash").is_none());
}

#[tokio::test]
async fn register_requires_email_and_password() {
    let fixture = test_app();
    let (status, body) = send_json(
        &fixture.app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "email": "rider@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Email and password are required");
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let fixture = test_app();
    register_user(&fixture.app, "rider@example.com").await;

    let (status, body) = send_json(
        &fixture.app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "email": "rider@example.com", "password": "other" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User already exists");
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let fixture = test_app();
    register_user(&fixture.app, "rider@example.com").await;

    let (status, body) = send_json(
        &fixture.app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "rider@example.com", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");
}

#[tokio::test]
async fn missing_token_is_401_and_bad_token_is_403() {
    let fixture = test_app();

    let (status, body) = send_json(&fixture.app, "GET", "/api/rides", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Access token required");

    let (status, body) =
        send_json(&fixture.app, "GET", "/api/rides", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Invalid or expired token");
}

#[tokio::test]
async fn whoami_returns_the_authenticated_user() {
    let fixture = test_app();
    let token = register_user(&fixture.app, "rider@example.com").await;

    let (status, body) =
        send_json(&fixture.app, "GET", "/api/auth/whoami", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "rider@example.com");
    assert_eq!(body["user"]["isAdmin"], false);
}

#[tokio::test]
async fn created_ride_is_pending_and_embeds_owner() {
    let fixture = test_app();
    let token = register_user(&fixture.app, "rider@example.com").await;

    let (status, body) = send_json(
        &fixture.app,
        "POST",
        "/api/rides",
        Some(&token),
        Some(json!({ "pickup": "A", "dropoff": "B", "vibe": "UPBEAT" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "PENDING");
    assert_eq!(body["vibe"], "UPBEAT");
    assert_eq!(body["user"]["email"], "rider@example.com");
}

#[tokio::test]
async fn ride_creation_validates_fields_and_vibe() {
    let fixture = test_app();
    let token = register_user(&fixture.app, "rider@example.com").await;

    let (status, body) = send_json(
        &fixture.app,
        "POST",
        "/api/rides",
        Some(&token),
        Some(json!({ "pickup": "A", "dropoff": "B" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Pickup, dropoff, and vibe are required");

    let (status, body) = send_json(
        &fixture.app,
        "POST",
        "/api/rides",
        Some(&token),
        Some(json!({ "pickup": "A", "dropoff": "B", "vibe": "PARTY" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid vibe type");
}

#[tokio::test]
async fn ride_creation_starts_the_lifecycle_simulation() {
    let fixture = test_app();
    let token = register_user(&fixture.app, "rider@example.com").await;
    let ride_id = create_ride(&fixture.app, &token).await;
    let uri = format!("/api/rides/{ride_id}");

    fixture.scheduler.advance(Duration::from_secs(5)).await;
    let (status, body) = send_json(&fixture.app, "GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ACCEPTED");

    fixture.scheduler.advance(Duration::from_secs(25)).await;
    let (_, body) = send_json(&fixture.app, "GET", &uri, Some(&token), None).await;
    assert_eq!(body["status"], "COMPLETED");
}

#[tokio::test]
async fn cancelling_a_ride_stops_the_simulation() {
    let fixture = test_app();
    let token = register_user(&fixture.app, "rider@example.com").await;
    let ride_id = create_ride(&fixture.app, &token).await;

    fixture.scheduler.advance(Duration::from_secs(5)).await;

    let (status, body) = send_json(
        &fixture.app,
        "PATCH",
        &format!("/api/rides/{ride_id}/status"),
        Some(&token),
        Some(json!({ "status": "CANCELLED" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "CANCELLED");

    // Later scheduled transitions must not resurrect the ride.
    fixture.scheduler.advance(Duration::from_secs(60)).await;
    let (_, body) = send_json(
        &fixture.app,
        "GET",
        &format!("/api/rides/{ride_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(body["status"], "CANCELLED");
}

#[tokio::test]
async fn status_update_rejects_unknown_values() {
    let fixture = test_app();
    let token = register_user(&fixture.app, "rider@example.com").await;
    let ride_id = create_ride(&fixture.app, &token).await;

    let (status, body) = send_json(
        &fixture.app,
        "PATCH",
        &format!("/api/rides/{ride_id}/status"),
        Some(&token),
        Some(json!({ "status": "TELEPORTED" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid status");
}

#[tokio::test]
async fn rides_are_scoped_to_their_owner() {
    let fixture = test_app();
    let owner = register_user(&fixture.app, "owner@example.com").await;
    let other = register_user(&fixture.app, "other@example.com").await;
    let ride_id = create_ride(&fixture.app, &owner).await;

    let (status, body) = send_json(
        &fixture.app,
        "GET",
        &format!("/api/rides/{ride_id}"),
        Some(&other),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Ride not found");

    let (_, rides) = send_json(&fixture.app, "GET", "/api/rides", Some(&other), None).await;
    assert_eq!(rides.as_array().expect("array").len(), 0);
}

#[tokio::test]
async fn ride_history_is_newest_first() {
    let fixture = test_app();
    let token = register_user(&fixture.app, "rider@example.com").await;
    let first = create_ride(&fixture.app, &token).await;
    let second = create_ride(&fixture.app, &token).await;

    let (status, rides) = send_json(&fixture.app, "GET", "/api/rides", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<_> = rides
        .as_array()
        .expect("array")
        .iter()
        .map(|ride| ride["id"].as_str().expect("id").to_string())
        .collect();
    assert_eq!(ids.len(), 2);
    // Insertion timestamps can collide; both orders put the set intact.
    assert!(ids.contains(&first) && ids.contains(&second));
}

#[tokio::test]
async fn vibes_catalog_lists_the_canonical_set() {
    let fixture = test_app();
    let (status, body) = send_json(&fixture.app, "GET", "/api/vibes", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<_> = body
        .as_array()
        .expect("array")
        .iter()
        .map(|vibe| vibe["id"].as_str().expect("id"))
        .collect();
    assert_eq!(ids, vec!["CHILL", "UPBEAT", "FOCUSED", "CUSTOM"]);
    assert_eq!(body[0]["color"], "#4A90E2");
}

#[tokio::test]
async fn fcm_token_set_get_and_clear() {
    let fixture = test_app();
    let token = register_user(&fixture.app, "rider@example.com").await;

    let (status, body) = send_json(
        &fixture.app,
        "POST",
        "/api/users/fcm-token",
        Some(&token),
        Some(json!({ "token": "device-token-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["fcmToken"], "device-token-1");

    let (_, body) = send_json(&fixture.app, "GET", "/api/users/fcm-token", Some(&token), None).await;
    assert_eq!(body["fcmToken"], "device-token-1");

    let (status, _) = send_json(
        &fixture.app,
        "DELETE",
        "/api/users/fcm-token",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send_json(&fixture.app, "GET", "/api/users/fcm-token", Some(&token), None).await;
    assert!(body["fcmToken"].is_null());
}

#[tokio::test]
async fn test_push_requires_a_registered_device() {
    let fixture = test_app();
    let token = register_user(&fixture.app, "rider@example.com").await;

    let (status, body) = send_json(
        &fixture.app,
        "POST",
        "/api/rides/admin/test-push",
        Some(&token),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "No FCM token found for this user. Register device first."
    );
}
