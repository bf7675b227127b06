//! Device heartbeat queries and the staleness sweep writes.

use wayfi_core::db::DatabaseError;

use super::db::ProvisioningDatabase;
use super::models::DeviceHeartbeat;

impl ProvisioningDatabase {
    /// Record a heartbeat, creating the device row on first contact.
    ///
    /// A heartbeat always marks the device installed and active again. A
    /// missing `push_subscription_id` keeps the previously stored one.
    pub async fn upsert_heartbeat(
        &self,
        id: &str,
        profile_id: &str,
        device_id: &str,
        push_subscription_id: Option<&str>,
        now: i64,
    ) -> Result<DeviceHeartbeat, DatabaseError> {
        sqlx::query(
            "INSERT INTO device_heartbeats \
             (id, profile_id, device_id, push_subscription_id, last_heartbeat_at, is_installed, is_active) \
             VALUES (?, ?, ?, ?, ?, 1, 1) \
             ON CONFLICT(profile_id, device_id) DO UPDATE SET \
             push_subscription_id = COALESCE(excluded.push_subscription_id, push_subscription_id), \
             last_heartbeat_at = excluded.last_heartbeat_at, is_installed = 1, is_active = 1",
        )
        .bind(id)
        .bind(profile_id)
        .bind(device_id)
        .bind(push_subscription_id)
        .bind(now)
        .execute(self.pool())
        .await?;

        sqlx::query_as::<_, DeviceHeartbeat>(
            "SELECT * FROM device_heartbeats WHERE profile_id = ? AND device_id = ?",
        )
        .bind(profile_id)
        .bind(device_id)
        .fetch_optional(self.pool())
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("Device {device_id}")))
    }

    /// All devices registered for a profile, most recent heartbeat first.
    pub async fn get_devices_for_profile(
        &self,
        profile_id: &str,
    ) -> Result<Vec<DeviceHeartbeat>, DatabaseError> {
        let devices = sqlx::query_as::<_, DeviceHeartbeat>(
            "SELECT * FROM device_heartbeats WHERE profile_id = ? ORDER BY last_heartbeat_at DESC",
        )
        .bind(profile_id)
        .fetch_all(self.pool())
        .await?;

        Ok(devices)
    }

    /// Push subscription ids of a profile's installed devices.
    pub async fn push_targets_for_profile(
        &self,
        profile_id: &str,
    ) -> Result<Vec<String>, DatabaseError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT push_subscription_id FROM device_heartbeats \
             WHERE profile_id = ? AND is_installed = 1 AND push_subscription_id IS NOT NULL",
        )
        .bind(profile_id)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Mark devices whose last heartbeat is older than `cutoff` uninstalled.
    pub async fn mark_stale_devices(&self, cutoff: i64) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            "UPDATE device_heartbeats SET is_installed = 0, is_active = 0 \
             WHERE last_heartbeat_at < ? AND (is_installed = 1 OR is_active = 1)",
        )
        .bind(cutoff)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected())
    }

    /// Deactivate active credentials of profiles that have registered devices
    /// but none still installed.
    pub async fn deactivate_credentials_without_installed_devices(
        &self,
    ) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            "UPDATE wifi_credentials SET is_active = 0 \
             WHERE is_active = 1 \
             AND profile_id IN (SELECT profile_id FROM device_heartbeats) \
             AND profile_id NOT IN \
                 (SELECT profile_id FROM device_heartbeats WHERE is_installed = 1)",
        )
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected())
    }
}
