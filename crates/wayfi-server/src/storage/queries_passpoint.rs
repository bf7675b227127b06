//! Passpoint deployment profile queries.
//!
//! The core only reads these; the insert/flag helpers back the operator
//! `seed-passpoint` command and tests.

use wayfi_core::db::{DatabaseError, unix_timestamp};

use super::db::ProvisioningDatabase;
use super::models::PasspointProfileRecord;

/// Parameters for inserting a Passpoint profile.
#[derive(Debug, Clone, Default)]
pub struct NewPasspointProfile<'a> {
    pub id: &'a str,
    pub friendly_name: Option<&'a str>,
    pub domain: Option<&'a str>,
    pub realm: Option<&'a str>,
    pub eap_method: Option<&'a str>,
    pub inner_auth: Option<&'a str>,
    pub roaming_consortium_ois: Option<&'a str>,
    pub ssid: Option<&'a str>,
    pub operator_name: Option<&'a str>,
    pub is_default: bool,
    pub is_active: bool,
}

impl ProvisioningDatabase {
    /// Insert a Passpoint profile.
    pub async fn insert_passpoint_profile(
        &self,
        params: &NewPasspointProfile<'_>,
    ) -> Result<PasspointProfileRecord, DatabaseError> {
        sqlx::query(
            "INSERT INTO passpoint_profiles (id, friendly_name, domain, realm, eap_method, \
             inner_auth, roaming_consortium_ois, ssid, operator_name, is_default, is_active, \
             created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(params.id)
        .bind(params.friendly_name)
        .bind(params.domain)
        .bind(params.realm)
        .bind(params.eap_method)
        .bind(params.inner_auth)
        .bind(params.roaming_consortium_ois)
        .bind(params.ssid)
        .bind(params.operator_name)
        .bind(params.is_default)
        .bind(params.is_active)
        .bind(unix_timestamp())
        .execute(self.pool())
        .await?;

        self.get_passpoint_profile(params.id).await
    }

    /// Get a Passpoint profile by ID.
    pub async fn get_passpoint_profile(
        &self,
        id: &str,
    ) -> Result<PasspointProfileRecord, DatabaseError> {
        sqlx::query_as::<_, PasspointProfileRecord>("SELECT * FROM passpoint_profiles WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Passpoint profile {id}")))
    }

    /// All profiles flagged both default and active, oldest first.
    pub async fn list_default_active_passpoint(
        &self,
    ) -> Result<Vec<PasspointProfileRecord>, DatabaseError> {
        let rows = sqlx::query_as::<_, PasspointProfileRecord>(
            "SELECT * FROM passpoint_profiles WHERE is_default = 1 AND is_active = 1 \
             ORDER BY created_at ASC, id ASC",
        )
        .fetch_all(self.pool())
        .await?;

        Ok(rows)
    }

    /// Make `id` the only default profile.
    pub async fn set_default_passpoint(&self, id: &str) -> Result<(), DatabaseError> {
        let mut tx = self.pool().begin().await?;

        sqlx::query("UPDATE passpoint_profiles SET is_default = 0 WHERE id != ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result =
            sqlx::query("UPDATE passpoint_profiles SET is_default = 1, is_active = 1 WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Passpoint profile {id}")));
        }

        tx.commit().await?;
        Ok(())
    }
}
