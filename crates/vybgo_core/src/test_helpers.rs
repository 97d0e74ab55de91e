//! Shared test utilities: an in-memory [RideStore] with failure injection
//! and a write log, plus fixture builders used across the test files.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::ride::{Ride, RideId, RideStatus, UserId, Vibe};
use crate::store::{RideStore, StoreError};

/// In-memory ride store. Records every successful status write so tests
/// can assert on the exact sequence the simulator produced.
#[derive(Default)]
pub struct MemoryRideStore {
    rides: Mutex<HashMap<RideId, Ride>>,
    writes: Mutex<Vec<(RideId, RideStatus)>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryRideStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn rides(&self) -> MutexGuard<'_, HashMap<RideId, Ride>> {
        self.rides.lock().expect("ride map lock poisoned")
    }

    /// Seed a ride and return its id.
    pub fn insert(&self, ride: Ride) -> RideId {
        let id = ride.id;
        self.rides().insert(id, ride);
        id
    }

    pub fn get(&self, id: RideId) -> Option<Ride> {
        self.rides().get(&id).cloned()
    }

    pub fn status_of(&self, id: RideId) -> Option<RideStatus> {
        self.rides().get(&id).map(|ride| ride.status)
    }

    /// Every `(ride, status)` pair successfully written via [RideStore::update_status].
    pub fn writes(&self) -> Vec<(RideId, RideStatus)> {
        self.writes.lock().expect("write log lock poisoned").clone()
    }

    /// Make subsequent reads fail with a backend error.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent writes fail with a backend error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl RideStore for MemoryRideStore {
    async fn find_by_id(&self, id: RideId) -> Result<Option<Ride>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected read failure".into()));
        }
        Ok(self.get(id))
    }

    async fn update_status(&self, id: RideId, status: RideStatus) -> Result<Ride, StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected write failure".into()));
        }
        let mut rides = self.rides();
        let ride = rides.get_mut(&id).ok_or(StoreError::NotFound)?;
        ride.status = status;
        ride.updated_at = Utc::now();
        let updated = ride.clone();
        drop(rides);
        self.writes
            .lock()
            .expect("write log lock poisoned")
            .push((id, status));
        Ok(updated)
    }
}

/// A freshly requested ride fixture (`PENDING`, arbitrary locations).
pub fn pending_ride() -> Ride {
    Ride::new(
        UserId::new(),
        "Airport Terminal 2".into(),
        "Harbor Market".into(),
        Vibe::Chill,
    )
}
