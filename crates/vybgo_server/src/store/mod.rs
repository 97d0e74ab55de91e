pub mod memory;
pub mod supabase;

pub use memory::MemoryStore;
pub use supabase::SupabaseStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vybgo_core::ride::{Ride, RideId, UserId};
use vybgo_core::store::{RideStore, StoreError};

/// A registered user as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub is_admin: bool,
    pub fcm_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// Owner summary embedded in ride responses.
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
        }
    }

    /// The public view returned by auth endpoints; never the hash.
    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            phone: self.phone.clone(),
            is_admin: self.is_admin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub email: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: UserId,
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub is_admin: bool,
}

/// Input for user creation; the store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub is_admin: bool,
}

impl NewUser {
    pub fn into_record(self) -> UserRecord {
        let now = Utc::now();
        UserRecord {
            id: UserId::new(),
            email: self.email,
            password_hash: self.password_hash,
            name: self.name,
            phone: self.phone,
            is_admin: self.is_admin,
            fcm_token: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Full persistence surface of the backend: the core [RideStore] contract
/// plus user management and the ride queries the API layer needs.
#[async_trait]
pub trait Database: RideStore {
    async fn create_user(&self, user: NewUser) -> Result<UserRecord, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;
    async fn find_user_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError>;
    async fn set_fcm_token(
        &self,
        id: UserId,
        token: Option<String>,
    ) -> Result<UserRecord, StoreError>;
    async fn set_password_hash(
        &self,
        id: UserId,
        password_hash: String,
    ) -> Result<UserRecord, StoreError>;
    async fn set_admin(&self, id: UserId, is_admin: bool) -> Result<UserRecord, StoreError>;
    async fn list_users(&self) -> Result<Vec<UserRecord>, StoreError>;

    async fn create_ride(&self, ride: Ride) -> Result<Ride, StoreError>;
    /// The user's rides, newest first.
    async fn rides_for_user(&self, user: UserId) -> Result<Vec<Ride>, StoreError>;
    /// A single ride, scoped to its owner.
    async fn find_ride_for_user(
        &self,
        id: RideId,
        user: UserId,
    ) -> Result<Option<Ride>, StoreError>;
}
