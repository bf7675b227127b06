//! Account profile queries.

use sqlx::sqlite::SqliteConnection;
use wayfi_core::db::{DatabaseError, unix_timestamp};

use super::db::ProvisioningDatabase;
use super::models::{AccountProfile, ChildSummary, CredentialWithProfile};
use super::queries_credentials::NewCredential;

/// Parameters for creating a managed child profile.
#[derive(Debug, Clone)]
pub struct NewChildProfile<'a> {
    pub id: &'a str,
    pub parent_id: &'a str,
    pub display_name: &'a str,
    pub age: i64,
    pub policy_label: &'a str,
}

/// The first provisioning token written together with a child. It is granted
/// for the child's credential and created by the child's parent.
#[derive(Debug, Clone)]
pub struct NewChildToken<'a> {
    pub id: &'a str,
    pub token_hash: &'a str,
    pub expires_at: i64,
}

async fn insert_child_row(
    conn: &mut SqliteConnection,
    child: &NewChildProfile<'_>,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO account_profiles \
         (id, display_name, is_child, managed_by, age, policy_label, created_at, updated_at) \
         VALUES (?, ?, 1, ?, ?, ?, ?, ?)",
    )
    .bind(child.id)
    .bind(child.display_name)
    .bind(child.parent_id)
    .bind(child.age)
    .bind(child.policy_label)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

impl ProvisioningDatabase {
    /// Register a non-child profile for an identity-provider subject, or
    /// refresh the display name of the existing one.
    pub async fn upsert_profile_by_external_id(
        &self,
        id: &str,
        external_id: &str,
        display_name: &str,
    ) -> Result<AccountProfile, DatabaseError> {
        let now = unix_timestamp();

        sqlx::query(
            "INSERT INTO account_profiles (id, external_id, display_name, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT(external_id) DO UPDATE SET display_name = excluded.display_name, \
             updated_at = excluded.updated_at",
        )
        .bind(id)
        .bind(external_id)
        .bind(display_name)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?;

        self.get_profile_by_external_id(external_id).await
    }

    /// Get a profile by ID.
    pub async fn get_profile(&self, id: &str) -> Result<AccountProfile, DatabaseError> {
        sqlx::query_as::<_, AccountProfile>("SELECT * FROM account_profiles WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Profile {id}")))
    }

    /// Get a profile by its identity-provider subject.
    pub async fn get_profile_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<AccountProfile, DatabaseError> {
        sqlx::query_as::<_, AccountProfile>("SELECT * FROM account_profiles WHERE external_id = ?")
            .bind(external_id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Profile for subject {external_id}")))
    }

    /// Create a child profile managed by `parent_id`.
    pub async fn create_child_profile(
        &self,
        id: &str,
        parent_id: &str,
        display_name: &str,
        age: i64,
        policy_label: &str,
    ) -> Result<AccountProfile, DatabaseError> {
        let mut conn = self.pool().acquire().await?;
        insert_child_row(
            &mut conn,
            &NewChildProfile {
                id,
                parent_id,
                display_name,
                age,
                policy_label,
            },
            unix_timestamp(),
        )
        .await?;
        drop(conn);

        self.get_profile(id).await
    }

    /// Create a child profile, its credential and its first provisioning
    /// token in one transaction. Nothing is written if any insert fails.
    ///
    /// The credential is always owned by the child, whatever
    /// `credential.profile_id` holds.
    pub async fn create_child_with_credential(
        &self,
        child: &NewChildProfile<'_>,
        credential: &NewCredential<'_>,
        token: &NewChildToken<'_>,
    ) -> Result<CredentialWithProfile, DatabaseError> {
        let now = unix_timestamp();
        let mut tx = self.pool().begin().await?;

        insert_child_row(&mut tx, child, now).await?;

        sqlx::query(
            "INSERT INTO wifi_credentials \
             (id, profile_id, passpoint_profile_id, username, secret, is_active, provisioned_at, last_used_at) \
             VALUES (?, ?, ?, ?, ?, 1, ?, ?)",
        )
        .bind(credential.id)
        .bind(child.id)
        .bind(credential.passpoint_profile_id)
        .bind(credential.username)
        .bind(credential.secret)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO provisioning_tokens \
             (id, token_hash, credential_id, created_by, expires_at, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(token.id)
        .bind(token.token_hash)
        .bind(credential.id)
        .bind(child.parent_id)
        .bind(token.expires_at)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_credential_with_profile(credential.id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Credential {}", credential.id)))
    }

    /// List the children managed by a parent, with their active credential
    /// usernames where one exists.
    pub async fn list_children(&self, parent_id: &str) -> Result<Vec<ChildSummary>, DatabaseError> {
        let children = sqlx::query_as::<_, ChildSummary>(
            "SELECT p.id AS profile_id, p.display_name, p.age, p.policy_label, \
             c.id AS credential_id, c.username \
             FROM account_profiles p \
             LEFT JOIN wifi_credentials c ON c.profile_id = p.id AND c.is_active = 1 \
             WHERE p.managed_by = ? \
             ORDER BY p.created_at ASC, p.display_name ASC",
        )
        .bind(parent_id)
        .fetch_all(self.pool())
        .await?;

        Ok(children)
    }

    /// Record the push-subscription state of a profile.
    pub async fn update_push_state(
        &self,
        id: &str,
        state: &str,
        checked_at: i64,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE account_profiles SET push_state = ?, push_checked_at = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(state)
        .bind(checked_at)
        .bind(unix_timestamp())
        .bind(id)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
