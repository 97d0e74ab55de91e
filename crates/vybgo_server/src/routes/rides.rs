use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;
use vybgo_core::ride::{Ride, RideId, RideStatus, Vibe};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::UserSummary;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_rides_handler).post(create_ride_handler))
        .route("/admin/test-push", post(test_push_handler))
        .route("/:id", get(get_ride_handler))
        .route("/:id/status", patch(update_status_handler))
}

/// Ride payload with the owner summary embedded, as the mobile app expects.
#[derive(Debug, Serialize)]
pub struct RideResponse {
    #[serde(flatten)]
    pub ride: Ride,
    pub user: UserSummary,
}

#[derive(Debug, Deserialize)]
pub struct CreateRideRequest {
    pub pickup: Option<String>,
    pub dropoff: Option<String>,
    pub vibe: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestPushRequest {
    #[serde(default)]
    pub ride_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

fn parse_ride_id(raw: &str) -> Result<RideId, ApiError> {
    Uuid::parse_str(raw)
        .map(RideId)
        .map_err(|_| ApiError::not_found("Ride not found"))
}

async fn owner_summary(state: &AppState, AuthUser(user_id): AuthUser) -> Result<UserSummary, ApiError> {
    let user = state
        .db
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(user.summary())
}

async fn list_rides_handler(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<RideResponse>>, ApiError> {
    let user = owner_summary(&state, auth).await?;
    let rides = state.db.rides_for_user(auth.0).await?;

    Ok(Json(
        rides
            .into_iter()
            .map(|ride| RideResponse {
                ride,
                user: user.clone(),
            })
            .collect(),
    ))
}

async fn create_ride_handler(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<CreateRideRequest>,
) -> Result<(StatusCode, Json<RideResponse>), ApiError> {
    let (Some(pickup), Some(dropoff), Some(vibe)) = (
        body.pickup.filter(|s| !s.trim().is_empty()),
        body.dropoff.filter(|s| !s.trim().is_empty()),
        body.vibe.filter(|s| !s.trim().is_empty()),
    ) else {
        return Err(ApiError::bad_request(
            "Pickup, dropoff, and vibe are required",
        ));
    };

    let vibe: Vibe = vibe
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid vibe type"))?;

    let user = owner_summary(&state, auth).await?;
    let ride = state
        .db
        .create_ride(Ride::new(auth.0, pickup, dropoff, vibe))
        .await?;

    // Non-blocking: the transitions run on the scheduler.
    state.simulator.start(ride.id);

    Ok((
        StatusCode::CREATED,
        Json(RideResponse { ride, user }),
    ))
}

async fn get_ride_handler(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<RideResponse>, ApiError> {
    let ride_id = parse_ride_id(&id)?;
    let ride = state
        .db
        .find_ride_for_user(ride_id, auth.0)
        .await?
        .ok_or_else(|| ApiError::not_found("Ride not found"))?;
    let user = owner_summary(&state, auth).await?;

    Ok(Json(RideResponse { ride, user }))
}

async fn update_status_handler(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<RideResponse>, ApiError> {
    let Some(status) = body.status.filter(|s| !s.trim().is_empty()) else {
        return Err(ApiError::bad_request("Status is required"));
    };
    let status: RideStatus = status
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid status"))?;

    let ride_id = parse_ride_id(&id)?;
    state
        .db
        .find_ride_for_user(ride_id, auth.0)
        .await?
        .ok_or_else(|| ApiError::not_found("Ride not found"))?;

    let updated = state.db.update_status(ride_id, status).await?;

    // A terminal status from outside ends the simulated timeline.
    if status.is_terminal() {
        state.simulator.stop(ride_id);
    }

    let user = owner_summary(&state, auth).await?;
    Ok(Json(RideResponse {
        ride: updated,
        user,
    }))
}

async fn test_push_handler(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<TestPushRequest>,
) -> Result<Json<Value>, ApiError> {
    let user = state
        .db
        .find_user_by_id(auth.0)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let Some(device_token) = user.fcm_token else {
        return Err(ApiError::bad_request(
            "No FCM token found for this user. Register device first.",
        ));
    };

    let result = state
        .fcm
        .send_ride_notification(
            &device_token,
            body.ride_id.as_deref().unwrap_or("test-ride-123"),
            body.status.as_deref().unwrap_or("accepted"),
            Some("Test Driver"),
        )
        .await;

    Ok(Json(json!({
        "message": "Test push sent",
        "result": result,
        "note": "Check your device for notification (might be in background)",
    })))
}
