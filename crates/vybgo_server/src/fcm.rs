//! Firebase Cloud Messaging client (legacy HTTP send API).
//!
//! Push delivery is best-effort: configuration gaps, rejected tokens and
//! network failures all fold into an [FcmOutcome] rather than an error.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

const FCM_SEND_ENDPOINT: &str = "https://fcm.googleapis.com/fcm/send";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of one delivery attempt, reported back to API callers verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FcmOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FcmOutcome {
    fn delivered(message_id: Option<String>) -> Self {
        Self {
            success: true,
            message_id,
            error: None,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message_id: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FcmSendResponse {
    success: Option<i64>,
    failure: Option<i64>,
    multicast_id: Option<i64>,
}

#[derive(Clone)]
pub struct FcmClient {
    server_api_key: Option<String>,
    client: Client,
    endpoint: String,
}

impl FcmClient {
    pub fn new(server_api_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build FCM client");
        Self {
            server_api_key,
            client,
            endpoint: FCM_SEND_ENDPOINT.to_string(),
        }
    }

    /// Point the client at a different send endpoint (tests).
    #[cfg(test)]
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.server_api_key.is_some()
    }

    /// Send a push notification to a single device.
    pub async fn send_notification(
        &self,
        device_token: &str,
        title: &str,
        body: &str,
        data: HashMap<String, String>,
    ) -> FcmOutcome {
        let Some(key) = &self.server_api_key else {
            return FcmOutcome::failed("FCM is not configured. Set FCM_SERVER_API_KEY");
        };

        let payload = json!({
            "to": device_token,
            "notification": { "title": title, "body": body },
            "data": data,
            "priority": "high",
            "android": { "priority": "high" },
        });

        let result = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, format!("key={key}"))
            .json(&payload)
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                warn!(%err, "fcm send failed");
                return FcmOutcome::failed(err.to_string());
            }
        };

        match response.json::<FcmSendResponse>().await {
            Ok(parsed) if parsed.success == Some(1) => {
                FcmOutcome::delivered(parsed.multicast_id.map(|id| id.to_string()))
            }
            Ok(parsed) if parsed.failure.unwrap_or(0) > 0 => {
                FcmOutcome::failed("Device token invalid or unregistered")
            }
            Ok(_) => FcmOutcome::failed("Unknown error"),
            Err(err) => {
                warn!(%err, "fcm response decode failed");
                FcmOutcome::failed(err.to_string())
            }
        }
    }

    /// Send a ride status push with the canned title/body for the event.
    /// Unknown statuses fall back to the generic "Ride Update" copy.
    pub async fn send_ride_notification(
        &self,
        device_token: &str,
        ride_id: &str,
        status: &str,
        driver_name: Option<&str>,
    ) -> FcmOutcome {
        let (title, body) = match status {
            "accepted" => (
                "Ride Accepted".to_string(),
                match driver_name {
                    Some(name) => format!("{name} has accepted your ride"),
                    None => "Your ride has been accepted".to_string(),
                },
            ),
            "completed" => (
                "Ride Completed".to_string(),
                "Your ride is complete. Thank you for using VYBGO!".to_string(),
            ),
            "cancelled" => (
                "Ride Cancelled".to_string(),
                "Your ride has been cancelled".to_string(),
            ),
            _ => (
                "Ride Update".to_string(),
                "Your ride status has been updated".to_string(),
            ),
        };

        let data = HashMap::from([
            ("type".to_string(), "ride_status_update".to_string()),
            ("rideId".to_string(), ride_id.to_string()),
            ("status".to_string(), status.to_string()),
        ]);

        self.send_notification(device_token, &title, &body, data)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_client_reports_failure_without_sending() {
        let client = FcmClient::new(None);
        assert!(!client.is_configured());

        let outcome = client
            .send_ride_notification("device", "ride-1", "accepted", None)
            .await;
        assert!(!outcome.success);
        assert!(outcome.error.expect("error").contains("not configured"));
    }

    #[tokio::test]
    async fn unreachable_endpoint_folds_into_outcome() {
        let client =
            FcmClient::new(Some("key".into())).with_endpoint("http://127.0.0.1:1/fcm/send");
        let outcome = client
            .send_notification("device", "t", "b", HashMap::new())
            .await;
        assert!(!outcome.success);
        assert!(outcome.error.is_some());
    }
}
