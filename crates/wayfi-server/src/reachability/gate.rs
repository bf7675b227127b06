//! Heartbeats and the network-eligibility check.

use serde::Serialize;
use tracing::{debug, instrument};
use uuid::Uuid;
use wayfi_core::db::unix_timestamp;

use crate::provisioning::{ProvisionError, ProvisionResult, PushState};
use crate::storage::{DeviceHeartbeat, ProvisioningDatabase};

/// Outcome of the eligibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Eligibility {
    pub eligible: bool,
    pub push_subscribed: bool,
    /// Whether the last push-status report falls within the check window.
    pub recently_checked: bool,
}

/// A profile may use the network only while its client stays reachable by
/// push.
#[derive(Clone)]
pub struct ReachabilityGate {
    db: ProvisioningDatabase,
    push_check_window_secs: i64,
}

impl ReachabilityGate {
    pub const fn new(db: ProvisioningDatabase, push_check_window_secs: i64) -> Self {
        Self {
            db,
            push_check_window_secs,
        }
    }

    /// Eligible iff push is subscribed and was confirmed within the window.
    pub async fn is_network_eligible(
        &self,
        profile_id: &str,
        now: i64,
    ) -> ProvisionResult<Eligibility> {
        let profile = self.db.get_profile(profile_id).await?;

        let push_subscribed = PushState::parse(&profile.push_state) == Some(PushState::Subscribed);
        let recently_checked = profile
            .push_checked_at
            .is_some_and(|checked| now - checked <= self.push_check_window_secs);

        let eligibility = Eligibility {
            eligible: push_subscribed && recently_checked,
            push_subscribed,
            recently_checked,
        };
        debug!(profile_id, ?eligibility, "Network eligibility evaluated");
        Ok(eligibility)
    }

    /// Record a heartbeat from one of a profile's devices.
    #[instrument(skip(self, push_subscription_id))]
    pub async fn record_heartbeat(
        &self,
        profile_id: &str,
        device_id: &str,
        push_subscription_id: Option<&str>,
    ) -> ProvisionResult<DeviceHeartbeat> {
        let device_id = device_id.trim();
        if device_id.is_empty() || device_id.len() > 128 {
            return Err(ProvisionError::Validation(
                "device id must be 1-128 characters".to_string(),
            ));
        }
        let push_subscription_id = push_subscription_id
            .map(str::trim)
            .filter(|s| !s.is_empty());

        // Unknown profiles surface as NotFound rather than a foreign key error.
        self.db.get_profile(profile_id).await?;

        let id = Uuid::new_v4().to_string();
        let heartbeat = self
            .db
            .upsert_heartbeat(&id, profile_id, device_id, push_subscription_id, unix_timestamp())
            .await?;
        debug!(profile_id, device_id, "Heartbeat recorded");
        Ok(heartbeat)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::provisioning::AccountService;

    const WEEK: i64 = 7 * 24 * 60 * 60;

    async fn setup() -> (ProvisioningDatabase, ReachabilityGate, String) {
        let db = ProvisioningDatabase::open_in_memory().await.unwrap();
        let profile = AccountService::new(db.clone())
            .register_profile("idp|gate", "Gale")
            .await
            .unwrap();
        let gate = ReachabilityGate::new(db.clone(), WEEK);
        (db, gate, profile.id)
    }

    #[tokio::test]
    async fn new_profiles_are_not_eligible() {
        let (_db, gate, id) = setup().await;
        let e = gate.is_network_eligible(&id, unix_timestamp()).await.unwrap();
        assert!(!e.eligible);
        assert!(!e.push_subscribed);
    }

    #[tokio::test]
    async fn recent_subscription_is_eligible() {
        let (db, gate, id) = setup().await;
        let now = unix_timestamp();
        db.update_push_state(&id, "subscribed", now - 60).await.unwrap();

        assert!(gate.is_network_eligible(&id, now).await.unwrap().eligible);
    }

    #[tokio::test]
    async fn stale_subscription_check_is_not_eligible() {
        let (db, gate, id) = setup().await;
        let now = unix_timestamp();
        db.update_push_state(&id, "subscribed", now - WEEK - 1).await.unwrap();

        let e = gate.is_network_eligible(&id, now).await.unwrap();
        assert!(e.push_subscribed);
        assert!(!e.recently_checked);
        assert!(!e.eligible);
    }

    #[tokio::test]
    async fn denied_push_is_not_eligible() {
        let (db, gate, id) = setup().await;
        let now = unix_timestamp();
        db.update_push_state(&id, "denied", now).await.unwrap();
        assert!(!gate.is_network_eligible(&id, now).await.unwrap().eligible);
    }

    #[tokio::test]
    async fn heartbeat_upserts_per_device() {
        let (db, gate, id) = setup().await;

        gate.record_heartbeat(&id, "phone-1", Some("fcm-abc")).await.unwrap();
        let again = gate.record_heartbeat(&id, "phone-1", None).await.unwrap();
        assert_eq!(again.push_subscription_id.as_deref(), Some("fcm-abc"));
        assert!(again.is_installed);

        gate.record_heartbeat(&id, "tablet", Some("fcm-def")).await.unwrap();
        assert_eq!(db.get_devices_for_profile(&id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn heartbeat_validates_input() {
        let (_db, gate, id) = setup().await;
        assert!(matches!(
            gate.record_heartbeat(&id, "  ", None).await,
            Err(ProvisionError::Validation(_))
        ));
        assert!(matches!(
            gate.record_heartbeat("missing", "phone", None).await,
            Err(ProvisionError::NotFound(_))
        ));
    }
}
