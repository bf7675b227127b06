//! WiFi credential queries.

use wayfi_core::db::{DatabaseError, unix_timestamp};

use super::db::ProvisioningDatabase;
use super::models::{CREDENTIAL_COLUMNS, CredentialWithProfile, OWNER_COLUMNS, WifiCredential};

/// Parameters for creating a credential.
#[derive(Debug, Clone)]
pub struct NewCredential<'a> {
    pub id: &'a str,
    pub profile_id: &'a str,
    pub passpoint_profile_id: &'a str,
    pub username: &'a str,
    pub secret: &'a str,
}

impl ProvisioningDatabase {
    /// Insert an active credential unless one already exists for the
    /// `(profile, passpoint profile)` pair.
    ///
    /// Returns `true` if this call inserted the row. A username collision is
    /// not absorbed and surfaces as [`DatabaseError::Conflict`].
    pub async fn insert_credential_if_absent(
        &self,
        params: &NewCredential<'_>,
    ) -> Result<bool, DatabaseError> {
        let now = unix_timestamp();

        let result = sqlx::query(
            "INSERT INTO wifi_credentials \
             (id, profile_id, passpoint_profile_id, username, secret, is_active, provisioned_at, last_used_at) \
             VALUES (?, ?, ?, ?, ?, 1, ?, ?) \
             ON CONFLICT(profile_id, passpoint_profile_id) WHERE is_active = 1 DO NOTHING",
        )
        .bind(params.id)
        .bind(params.profile_id)
        .bind(params.passpoint_profile_id)
        .bind(params.username)
        .bind(params.secret)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Get the active credential for a `(profile, passpoint profile)` pair.
    pub async fn get_active_credential(
        &self,
        profile_id: &str,
        passpoint_profile_id: &str,
    ) -> Result<Option<WifiCredential>, DatabaseError> {
        let credential = sqlx::query_as::<_, WifiCredential>(
            "SELECT * FROM wifi_credentials \
             WHERE profile_id = ? AND passpoint_profile_id = ? AND is_active = 1",
        )
        .bind(profile_id)
        .bind(passpoint_profile_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(credential)
    }

    /// Get a credential by ID.
    pub async fn get_credential(&self, id: &str) -> Result<WifiCredential, DatabaseError> {
        sqlx::query_as::<_, WifiCredential>("SELECT * FROM wifi_credentials WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Credential {id}")))
    }

    /// Get a credential together with its owning profile.
    pub async fn get_credential_with_profile(
        &self,
        id: &str,
    ) -> Result<Option<CredentialWithProfile>, DatabaseError> {
        let sql = format!(
            "SELECT {CREDENTIAL_COLUMNS}, {OWNER_COLUMNS} \
             FROM wifi_credentials c JOIN account_profiles p ON p.id = c.profile_id \
             WHERE c.id = ?"
        );
        let row = sqlx::query_as::<_, CredentialWithProfile>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?;

        Ok(row)
    }

    /// Whether any credential (active or not) already uses `username`.
    pub async fn username_exists(&self, username: &str) -> Result<bool, DatabaseError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM wifi_credentials WHERE username = ?")
            .bind(username)
            .fetch_one(self.pool())
            .await?;

        Ok(row.0 > 0)
    }

    /// Update a credential's `last_used_at` timestamp.
    pub async fn touch_credential(&self, id: &str, now: i64) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE wifi_credentials SET last_used_at = ? WHERE id = ?")
            .bind(now)
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(())
    }

    /// Deactivate a credential. Returns `false` if it was already inactive.
    pub async fn deactivate_credential(&self, id: &str) -> Result<bool, DatabaseError> {
        let result =
            sqlx::query("UPDATE wifi_credentials SET is_active = 0 WHERE id = ? AND is_active = 1")
                .bind(id)
                .execute(self.pool())
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count active credentials owned by a profile.
    pub async fn count_active_credentials(&self, profile_id: &str) -> Result<i64, DatabaseError> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM wifi_credentials WHERE profile_id = ? AND is_active = 1",
        )
        .bind(profile_id)
        .fetch_one(self.pool())
        .await?;

        Ok(row.0)
    }
}
