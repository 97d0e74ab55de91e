use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Opaque ride identifier, assigned by the store at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RideId(pub Uuid);

impl RideId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RideId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque user identifier; a ride belongs to exactly one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle status of a ride. `Completed` and `Cancelled` are terminal:
/// once either is written no further transition may occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RideStatus {
    Pending,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
}

impl RideStatus {
    pub const ALL: [RideStatus; 5] = [
        RideStatus::Pending,
        RideStatus::Accepted,
        RideStatus::InProgress,
        RideStatus::Completed,
        RideStatus::Cancelled,
    ];

    pub fn is_terminal(self) -> bool {
        matches!(self, RideStatus::Completed | RideStatus::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RideStatus::Pending => "PENDING",
            RideStatus::Accepted => "ACCEPTED",
            RideStatus::InProgress => "IN_PROGRESS",
            RideStatus::Completed => "COMPLETED",
            RideStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for RideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid ride status")]
pub struct ParseRideStatusError;

impl FromStr for RideStatus {
    type Err = ParseRideStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RideStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or(ParseRideStatusError)
    }
}

/// Categorical mood tag attached to a ride.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Vibe {
    Chill,
    Upbeat,
    Focused,
    Custom,
}

impl Vibe {
    pub const ALL: [Vibe; 4] = [Vibe::Chill, Vibe::Upbeat, Vibe::Focused, Vibe::Custom];

    pub fn as_str(self) -> &'static str {
        match self {
            Vibe::Chill => "CHILL",
            Vibe::Upbeat => "UPBEAT",
            Vibe::Focused => "FOCUSED",
            Vibe::Custom => "CUSTOM",
        }
    }
}

impl fmt::Display for Vibe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid vibe type")]
pub struct ParseVibeError;

impl FromStr for Vibe {
    type Err = ParseVibeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Vibe::ALL
            .into_iter()
            .find(|vibe| vibe.as_str() == s)
            .ok_or(ParseVibeError)
    }
}

/// A single requested trip record. Mutated only through status updates;
/// rows are never deleted by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ride {
    pub id: RideId,
    pub user_id: UserId,
    pub pickup: String,
    pub dropoff: String,
    pub vibe: Vibe,
    pub status: RideStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ride {
    /// A freshly requested ride starts out `Pending`.
    pub fn new(user_id: UserId, pickup: String, dropoff: String, vibe: Vibe) -> Self {
        let now = Utc::now();
        Self {
            id: RideId::new(),
            user_id,
            pickup,
            dropoff,
            vibe,
            status: RideStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}
