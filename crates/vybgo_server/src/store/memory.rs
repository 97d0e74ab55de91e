use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use vybgo_core::ride::{Ride, RideId, RideStatus, UserId};
use vybgo_core::store::{RideStore, StoreError};

use super::{Database, NewUser, UserRecord};

/// Mutex-guarded in-memory [Database]. Backs keyless development runs and
/// the handler test suites.
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<UserId, UserRecord>>,
    rides: Mutex<HashMap<RideId, Ride>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn users(&self) -> MutexGuard<'_, HashMap<UserId, UserRecord>> {
        self.users.lock().expect("user map lock poisoned")
    }

    fn rides(&self) -> MutexGuard<'_, HashMap<RideId, Ride>> {
        self.rides.lock().expect("ride map lock poisoned")
    }

    fn update_user<F>(&self, id: UserId, apply: F) -> Result<UserRecord, StoreError>
    where
        F: FnOnce(&mut UserRecord),
    {
        let mut users = self.users();
        let user = users.get_mut(&id).ok_or(StoreError::NotFound)?;
        apply(user);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[async_trait]
impl RideStore for MemoryStore {
    async fn find_by_id(&self, id: RideId) -> Result<Option<Ride>, StoreError> {
        Ok(self.rides().get(&id).cloned())
    }

    async fn update_status(&self, id: RideId, status: RideStatus) -> Result<Ride, StoreError> {
        let mut rides = self.rides();
        let ride = rides.get_mut(&id).ok_or(StoreError::NotFound)?;
        ride.status = status;
        ride.updated_at = Utc::now();
        Ok(ride.clone())
    }
}

#[async_trait]
impl Database for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let record = user.into_record();
        self.users().insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self
            .users()
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users().get(&id).cloned())
    }

    async fn set_fcm_token(
        &self,
        id: UserId,
        token: Option<String>,
    ) -> Result<UserRecord, StoreError> {
        self.update_user(id, |user| user.fcm_token = token)
    }

    async fn set_password_hash(
        &self,
        id: UserId,
        password_hash: String,
    ) -> Result<UserRecord, StoreError> {
        self.update_user(id, |user| user.password_hash = password_hash)
    }

    async fn set_admin(&self, id: UserId, is_admin: bool) -> Result<UserRecord, StoreError> {
        self.update_user(id, |user| user.is_admin = is_admin)
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        let mut users: Vec<_> = self.users().values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users)
    }

    async fn create_ride(&self, ride: Ride) -> Result<Ride, StoreError> {
        self.rides().insert(ride.id, ride.clone());
        Ok(ride)
    }

    async fn rides_for_user(&self, user: UserId) -> Result<Vec<Ride>, StoreError> {
        let mut rides: Vec<_> = self
            .rides()
            .values()
            .filter(|ride| ride.user_id == user)
            .cloned()
            .collect();
        rides.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rides)
    }

    async fn find_ride_for_user(
        &self,
        id: RideId,
        user: UserId,
    ) -> Result<Option<Ride>, StoreError> {
        Ok(self
            .rides()
            .get(&id)
            .filter(|ride| ride.user_id == user)
            .cloned())
    }
}
