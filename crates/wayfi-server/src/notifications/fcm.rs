//! FCM HTTP v1 API client.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{Notification, NotificationError};

/// FCM HTTP v1 API endpoint template.
const FCM_API_URL_TEMPLATE: &str =
    "https://fcm.googleapis.com/v1/projects/{project_id}/messages:send";

/// The parts of a Google service account key file this client reads.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountCredentials {
    pub project_id: String,
    #[serde(default)]
    pub client_email: String,
}

/// Request body of `messages:send`.
#[derive(Debug, Serialize)]
pub struct FcmMessage {
    pub message: FcmMessageBody,
}

#[derive(Debug, Serialize)]
pub struct FcmMessageBody {
    /// Device registration token.
    pub token: String,
    pub notification: FcmNotification,
    #[serde(skip_serializing_if = "std::collections::HashMap::is_empty")]
    pub data: std::collections::HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct FcmNotification {
    pub title: String,
    pub body: String,
}

/// Client for the FCM HTTP v1 API.
#[derive(Debug)]
pub struct FcmClient {
    http: reqwest::Client,
    project_id: String,
    api_url: String,
    /// OAuth bearer token for the service account.
    access_token: Option<String>,
}

impl FcmClient {
    /// Load service account credentials from a JSON key file.
    pub fn from_credentials_file(
        path: &Path,
        access_token: Option<String>,
    ) -> Result<Self, NotificationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            NotificationError::Credentials(format!(
                "Failed to read credentials file {}: {e}",
                path.display()
            ))
        })?;

        let credentials: ServiceAccountCredentials =
            serde_json::from_str(&content).map_err(|e| {
                NotificationError::Credentials(format!("Failed to parse credentials JSON: {e}"))
            })?;

        if access_token.is_none() {
            warn!("No FCM access token supplied; FCM will reject deliveries");
        }

        let api_url = FCM_API_URL_TEMPLATE.replace("{project_id}", &credentials.project_id);
        debug!(
            project_id = %credentials.project_id,
            client_email = %credentials.client_email,
            "FCM client initialized"
        );

        Ok(Self {
            http: build_http_client()?,
            project_id: credentials.project_id,
            api_url,
            access_token,
        })
    }

    /// A client that posts to an arbitrary endpoint.
    #[cfg(test)]
    #[allow(clippy::expect_used)]
    pub(crate) fn for_testing(api_url: &str) -> Self {
        Self {
            http: build_http_client().expect("failed to build test HTTP client"),
            project_id: "test-project".to_string(),
            api_url: api_url.to_string(),
            access_token: Some("test-access-token".to_string()),
        }
    }

    /// Build a `messages:send` body for one device.
    pub fn build_message(device_token: &str, notification: &Notification) -> FcmMessage {
        FcmMessage {
            message: FcmMessageBody {
                token: device_token.to_string(),
                notification: FcmNotification {
                    title: notification.title.clone(),
                    body: notification.body.clone(),
                },
                data: notification.data.clone(),
            },
        }
    }

    /// Send a message.
    ///
    /// Returns `NotificationError::Request` if the HTTP request fails, or
    /// `NotificationError::ApiError` on a non-2xx status.
    pub async fn send(&self, message: &FcmMessage) -> Result<(), NotificationError> {
        let mut request = self.http.post(&self.api_url).json(message);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| NotificationError::Request(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!("FCM notification sent");
            return Ok(());
        }

        let status = status.as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<failed to read body>".to_string());
        Err(NotificationError::ApiError { status, body })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

/// reqwest is built with `rustls-no-provider`; install ring before building.
fn build_http_client() -> Result<reqwest::Client, NotificationError> {
    // No-op if a provider is already installed.
    let _ = rustls::crypto::ring::default_provider().install_default();
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .map_err(|e| NotificationError::Request(format!("Failed to build HTTP client: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn message_serializes_to_fcm_shape() {
        let n = Notification::new("Alex was added", "Share the setup link");
        let json = serde_json::to_value(FcmClient::build_message("tok", &n)).unwrap();

        assert_eq!(json["message"]["token"], "tok");
        assert_eq!(json["message"]["notification"]["title"], "Alex was added");
        assert!(json["message"].get("data").is_none());
    }

    #[test]
    fn message_carries_data_when_present() {
        let n = Notification::new("t", "b").with_data("kind", "child_added");
        let json = serde_json::to_value(FcmClient::build_message("tok", &n)).unwrap();
        assert_eq!(json["message"]["data"]["kind"], "child_added");
    }

    #[test]
    fn credentials_file_resolves_project_url() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"project_id": "wayfi-prod", "client_email": "svc@wayfi-prod.iam"}}"#
        )
        .unwrap();

        let client = FcmClient::from_credentials_file(file.path(), Some("t".into())).unwrap();
        assert_eq!(client.project_id(), "wayfi-prod");
        assert_eq!(
            client.api_url(),
            "https://fcm.googleapis.com/v1/projects/wayfi-prod/messages:send"
        );
    }

    #[test]
    fn missing_credentials_file_is_an_error() {
        let err = FcmClient::from_credentials_file(Path::new("/nonexistent/key.json"), None)
            .unwrap_err();
        assert!(matches!(err, NotificationError::Credentials(_)));
    }
}
