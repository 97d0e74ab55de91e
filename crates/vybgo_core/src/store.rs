use async_trait::async_trait;
use thiserror::Error;

use crate::ride::{Ride, RideId, RideStatus};

/// Errors surfaced by ride persistence backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Persistence contract consumed by the lifecycle simulator. The backing
/// engine is opaque; the core only needs read-by-id and a status write.
#[async_trait]
pub trait RideStore: Send + Sync {
    /// Fetch a ride by id, `None` when no record exists.
    async fn find_by_id(&self, id: RideId) -> Result<Option<Ride>, StoreError>;

    /// Write a new status for the ride, returning the updated record.
    /// Fails with [StoreError::NotFound] when the id is absent.
    async fn update_status(&self, id: RideId, status: RideStatus) -> Result<Ride, StoreError>;
}
