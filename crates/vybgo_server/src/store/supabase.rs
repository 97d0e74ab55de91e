//! Supabase PostgREST adapter. Talks to the project's REST endpoint over
//! HTTPS instead of a direct Postgres connection; rows live in the
//! `users` and `rides` tables with snake_case columns.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;
use vybgo_core::ride::{Ride, RideId, RideStatus, UserId, Vibe};
use vybgo_core::store::{RideStore, StoreError};

use super::{Database, NewUser, UserRecord};
use crate::config::SupabaseConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const RETURN_REPRESENTATION: &str = "return=representation";

pub struct SupabaseStore {
    client: Client,
    base: String,
}

impl SupabaseStore {
    /// Build a client for the configured project. The service-role key is
    /// attached to every request as both `apikey` and bearer token.
    pub fn new(config: &SupabaseConfig) -> Self {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&config.service_role_key)
            .expect("service role key is not a valid header value");
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.service_role_key))
            .expect("service role key is not a valid header value");
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()
            .expect("failed to build Supabase client");

        Self {
            client,
            base: config.url.trim_end_matches('/').to_string(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base, table)
    }

    async fn rows<T: DeserializeOwned>(response: Response) -> Result<Vec<T>, StoreError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Backend(format!(
                "supabase returned {status}: {body}"
            )));
        }
        response
            .json()
            .await
            .map_err(|err| StoreError::Backend(format!("supabase response decode failed: {err}")))
    }

    fn transport(err: reqwest::Error) -> StoreError {
        StoreError::Backend(format!("supabase request failed: {err}"))
    }

    async fn first_user(response: Response) -> Result<Option<UserRecord>, StoreError> {
        let mut rows: Vec<UserRow> = Self::rows(response).await?;
        let first = rows.drain(..).next().map(UserRecord::from);
        Ok(first)
    }

    async fn first_ride(response: Response) -> Result<Option<Ride>, StoreError> {
        let mut rows: Vec<RideRow> = Self::rows(response).await?;
        let first = rows.drain(..).next().map(Ride::from);
        Ok(first)
    }

    async fn patch_user(
        &self,
        id: UserId,
        body: serde_json::Value,
    ) -> Result<UserRecord, StoreError> {
        let response = self
            .client
            .patch(self.table_url("users"))
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&body)
            .send()
            .await
            .map_err(Self::transport)?;
        Self::first_user(response).await?.ok_or(StoreError::NotFound)
    }

    /// Run one SQL statement through the project's `exec_sql` RPC.
    /// Used by the provisioning CLI only.
    pub async fn execute_sql(&self, statement: &str) -> Result<(), StoreError> {
        debug!(len = statement.len(), "executing sql statement");
        let response = self
            .client
            .post(self.table_url("rpc/exec_sql"))
            .json(&json!({ "query": statement }))
            .send()
            .await
            .map_err(Self::transport)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Backend(format!(
                "supabase returned {status}: {body}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RideStore for SupabaseStore {
    async fn find_by_id(&self, id: RideId) -> Result<Option<Ride>, StoreError> {
        let response = self
            .client
            .get(self.table_url("rides"))
            .query(&[("id", format!("eq.{id}")), ("limit", "1".into())])
            .send()
            .await
            .map_err(Self::transport)?;
        Self::first_ride(response).await
    }

    async fn update_status(&self, id: RideId, status: RideStatus) -> Result<Ride, StoreError> {
        let response = self
            .client
            .patch(self.table_url("rides"))
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&json!({
                "status": status,
                "updated_at": Utc::now(),
            }))
            .send()
            .await
            .map_err(Self::transport)?;
        Self::first_ride(response).await?.ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl Database for SupabaseStore {
    async fn create_user(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let row = UserRow::from(user.into_record());
        let response = self
            .client
            .post(self.table_url("users"))
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&[row])
            .send()
            .await
            .map_err(Self::transport)?;
        Self::first_user(response).await?.ok_or_else(|| {
            StoreError::Backend("supabase insert returned no representation".into())
        })
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let response = self
            .client
            .get(self.table_url("users"))
            .query(&[("email", format!("eq.{email}")), ("limit", "1".into())])
            .send()
            .await
            .map_err(Self::transport)?;
        Self::first_user(response).await
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        let response = self
            .client
            .get(self.table_url("users"))
            .query(&[("id", format!("eq.{id}")), ("limit", "1".into())])
            .send()
            .await
            .map_err(Self::transport)?;
        Self::first_user(response).await
    }

    async fn set_fcm_token(
        &self,
        id: UserId,
        token: Option<String>,
    ) -> Result<UserRecord, StoreError> {
        self.patch_user(id, json!({ "fcm_token": token, "updated_at": Utc::now() }))
            .await
    }

    async fn set_password_hash(
        &self,
        id: UserId,
        password_hash: String,
    ) -> Result<UserRecord, StoreError> {
        self.patch_user(
            id,
            json!({ "password_hash": password_hash, "updated_at": Utc::now() }),
        )
        .await
    }

    async fn set_admin(&self, id: UserId, is_admin: bool) -> Result<UserRecord, StoreError> {
        self.patch_user(id, json!({ "is_admin": is_admin, "updated_at": Utc::now() }))
            .await
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        let response = self
            .client
            .get(self.table_url("users"))
            .query(&[("order", "created_at.asc")])
            .send()
            .await
            .map_err(Self::transport)?;
        let rows: Vec<UserRow> = Self::rows(response).await?;
        Ok(rows.into_iter().map(UserRecord::from).collect())
    }

    async fn create_ride(&self, ride: Ride) -> Result<Ride, StoreError> {
        let row = RideRow::from(ride);
        let response = self
            .client
            .post(self.table_url("rides"))
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&[row])
            .send()
            .await
            .map_err(Self::transport)?;
        Self::first_ride(response).await?.ok_or_else(|| {
            StoreError::Backend("supabase insert returned no representation".into())
        })
    }

    async fn rides_for_user(&self, user: UserId) -> Result<Vec<Ride>, StoreError> {
        let response = self
            .client
            .get(self.table_url("rides"))
            .query(&[
                ("user_id", format!("eq.{user}")),
                ("order", "created_at.desc".into()),
            ])
            .send()
            .await
            .map_err(Self::transport)?;
        let rows: Vec<RideRow> = Self::rows(response).await?;
        Ok(rows.into_iter().map(Ride::from).collect())
    }

    async fn find_ride_for_user(
        &self,
        id: RideId,
        user: UserId,
    ) -> Result<Option<Ride>, StoreError> {
        let response = self
            .client
            .get(self.table_url("rides"))
            .query(&[
                ("id", format!("eq.{id}")),
                ("user_id", format!("eq.{user}")),
                ("limit", "1".into()),
            ])
            .send()
            .await
            .map_err(Self::transport)?;
        Self::first_ride(response).await
    }
}

/// `rides` table row; snake_case columns, unlike the camelCase wire shape.
#[derive(Debug, Serialize, Deserialize)]
struct RideRow {
    id: RideId,
    user_id: UserId,
    pickup: String,
    dropoff: String,
    vibe: Vibe,
    status: RideStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<Ride> for RideRow {
    fn from(ride: Ride) -> Self {
        Self {
            id: ride.id,
            user_id: ride.user_id,
            pickup: ride.pickup,
            dropoff: ride.dropoff,
            vibe: ride.vibe,
            status: ride.status,
            created_at: ride.created_at,
            updated_at: ride.updated_at,
        }
    }
}

impl From<RideRow> for Ride {
    fn from(row: RideRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            pickup: row.pickup,
            dropoff: row.dropoff,
            vibe: row.vibe,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// `users` table row.
#[derive(Debug, Serialize, Deserialize)]
struct UserRow {
    id: UserId,
    email: String,
    password_hash: String,
    name: Option<String>,
    phone: Option<String>,
    is_admin: bool,
    fcm_token: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRecord> for UserRow {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            email: user.email,
            password_hash: user.password_hash,
            name: user.name,
            phone: user.phone,
            is_admin: user.is_admin,
            fcm_token: user.fcm_token,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            name: row.name,
            phone: row.phone,
            is_admin: row.is_admin,
            fcm_token: row.fcm_token,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
