//! Provisioning token queries.

use wayfi_core::db::{DatabaseError, unix_timestamp};

use super::db::ProvisioningDatabase;
use super::models::{
    CREDENTIAL_COLUMNS, OWNER_COLUMNS, ProvisioningToken, TOKEN_COLUMNS, TokenWithCredential,
};

impl ProvisioningDatabase {
    /// Store a provisioning token digest.
    pub async fn create_provisioning_token(
        &self,
        id: &str,
        token_hash: &str,
        credential_id: &str,
        created_by: &str,
        expires_at: i64,
    ) -> Result<ProvisioningToken, DatabaseError> {
        let now = unix_timestamp();

        sqlx::query(
            "INSERT INTO provisioning_tokens \
             (id, token_hash, credential_id, created_by, expires_at, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(token_hash)
        .bind(credential_id)
        .bind(created_by)
        .bind(expires_at)
        .bind(now)
        .execute(self.pool())
        .await?;

        self.get_provisioning_token(id).await
    }

    /// Get a token by ID.
    pub async fn get_provisioning_token(
        &self,
        id: &str,
    ) -> Result<ProvisioningToken, DatabaseError> {
        sqlx::query_as::<_, ProvisioningToken>("SELECT * FROM provisioning_tokens WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Provisioning token {id}")))
    }

    /// Look up a token by digest together with its credential and owner.
    ///
    /// Expired tokens are returned too; the caller decides how to report them.
    pub async fn get_token_with_credential(
        &self,
        token_hash: &str,
    ) -> Result<Option<TokenWithCredential>, DatabaseError> {
        let sql = format!(
            "SELECT {TOKEN_COLUMNS}, {CREDENTIAL_COLUMNS}, {OWNER_COLUMNS} \
             FROM provisioning_tokens t \
             JOIN wifi_credentials c ON c.id = t.credential_id \
             JOIN account_profiles p ON p.id = c.profile_id \
             WHERE t.token_hash = ?"
        );
        let row = sqlx::query_as::<_, TokenWithCredential>(&sql)
            .bind(token_hash)
            .fetch_optional(self.pool())
            .await?;

        Ok(row)
    }

    /// Mark a token consumed, only while it is still unexpired.
    ///
    /// `used_at` keeps its first value on repeat reads. Returns `false` if the
    /// token had expired by the time of the write.
    pub async fn mark_token_consumed(&self, id: &str, now: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE provisioning_tokens SET used_at = COALESCE(used_at, ?) \
             WHERE id = ? AND expires_at > ?",
        )
        .bind(now)
        .bind(id)
        .bind(now)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
