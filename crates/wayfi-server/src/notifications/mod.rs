//! Notification sender.
//!
//! Delivery is fire-and-forget: provisioning operations hand a message to
//! [`Notifier::notify_detached`] and never observe the outcome. Failures are
//! logged and swallowed.
//!
//! The FCM backend is only compiled when the `push-notifications` Cargo
//! feature is enabled.

#[cfg(feature = "push-notifications")]
pub mod fcm;

use std::collections::HashMap;
#[cfg(feature = "push-notifications")]
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use wayfi_core::config::NotificationConfig;

use crate::provisioning::ProvisionError;

#[cfg(feature = "push-notifications")]
pub use fcm::FcmClient;

/// Errors that can occur while delivering a notification.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    /// Failed to read or parse the FCM service account credentials file.
    #[error("FCM credentials error: {0}")]
    Credentials(String),

    /// HTTP request to FCM failed.
    #[error("FCM request error: {0}")]
    Request(String),

    /// FCM returned a non-success status code.
    #[error("FCM API error (status {status}): {body}")]
    ApiError { status: u16, body: String },
}

/// A message for one or more devices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub data: HashMap<String, String>,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            data: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

/// Where notifications go.
#[derive(Clone)]
pub enum Notifier {
    /// No delivery backend configured; messages are only logged.
    Disabled,
    #[cfg(feature = "push-notifications")]
    Fcm(Arc<FcmClient>),
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disabled => f.write_str("Notifier::Disabled"),
            #[cfg(feature = "push-notifications")]
            Self::Fcm(client) => write!(f, "Notifier::Fcm({})", client.project_id()),
        }
    }
}

impl Notifier {
    /// Build the notifier described by the configuration.
    ///
    /// `access_token` is the FCM bearer token; it is ignored when no
    /// credentials file is configured.
    pub fn from_config(
        config: &NotificationConfig,
        access_token: Option<String>,
    ) -> Result<Self, NotificationError> {
        let Some(path) = config.fcm_credentials_path.as_deref() else {
            info!("No FCM credentials configured; notifications will only be logged");
            return Ok(Self::Disabled);
        };

        #[cfg(feature = "push-notifications")]
        {
            let client = FcmClient::from_credentials_file(path, access_token)?;
            Ok(Self::Fcm(Arc::new(client)))
        }
        #[cfg(not(feature = "push-notifications"))]
        {
            let _ = access_token;
            warn!(
                path = %path.display(),
                "FCM credentials configured but push-notifications feature is disabled"
            );
            Ok(Self::Disabled)
        }
    }

    /// Deliver a notification to one device.
    pub async fn send(
        &self,
        target: &str,
        notification: &Notification,
    ) -> Result<(), NotificationError> {
        match self {
            Self::Disabled => {
                debug!(
                    target_prefix = %token_prefix(target),
                    title = %notification.title,
                    "Notification not delivered (disabled)"
                );
                Ok(())
            }
            #[cfg(feature = "push-notifications")]
            Self::Fcm(client) => {
                let message = FcmClient::build_message(target, notification);
                client.send(&message).await
            }
        }
    }

    /// Deliver a notification to every target on a background task.
    ///
    /// Never fails; delivery errors are logged at `warn!`. The handle is
    /// returned for callers that want to wait, and may be dropped.
    pub fn notify_detached(
        &self,
        targets: Vec<String>,
        notification: Notification,
    ) -> JoinHandle<()> {
        let notifier = self.clone();
        tokio::spawn(async move {
            for target in &targets {
                if let Err(e) = notifier.send(target, &notification).await {
                    let e = ProvisionError::from(e);
                    warn!(
                        error = %e,
                        target_prefix = %token_prefix(target),
                        "Notification delivery failed"
                    );
                }
            }
            debug!(count = targets.len(), "Notification fan-out finished");
        })
    }
}

fn token_prefix(token: &str) -> String {
    token.chars().take(8).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn notification_builder_collects_data() {
        let n = Notification::new("Hi", "There").with_data("kind", "child_added");
        assert_eq!(n.title, "Hi");
        assert_eq!(n.data.get("kind").unwrap(), "child_added");
    }

    #[test]
    fn missing_credentials_path_disables_delivery() {
        let notifier = Notifier::from_config(&NotificationConfig::default(), None).unwrap();
        assert!(matches!(notifier, Notifier::Disabled));
    }

    #[tokio::test]
    async fn disabled_notifier_accepts_everything() {
        let notifier = Notifier::Disabled;
        notifier
            .send("device", &Notification::new("t", "b"))
            .await
            .unwrap();
        notifier
            .notify_detached(vec!["a".into(), "b".into()], Notification::new("t", "b"))
            .await
            .unwrap();
    }

    #[cfg(feature = "push-notifications")]
    #[tokio::test]
    async fn delivery_failures_are_swallowed() {
        let client = FcmClient::for_testing("http://127.0.0.1:9/unreachable");
        let notifier = Notifier::Fcm(Arc::new(client));

        let direct = notifier.send("device", &Notification::new("t", "b")).await;
        assert!(direct.is_err());

        // The detached task completes normally despite the failure.
        notifier
            .notify_detached(vec!["device".into()], Notification::new("t", "b"))
            .await
            .unwrap();
    }
}
