//! Data models for wayfi provisioning storage.

use serde::{Deserialize, Serialize};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

/// A person using the service. Children always have `managed_by` set.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AccountProfile {
    pub id: String,
    pub external_id: Option<String>,
    pub display_name: String,
    pub is_child: bool,
    pub managed_by: Option<String>,
    pub age: Option<i64>,
    pub policy_label: String,
    pub push_state: String,
    pub push_checked_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A stored Passpoint deployment profile. `None` columns are filled from the
/// static configuration layer by the resolver.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PasspointProfileRecord {
    pub id: String,
    pub friendly_name: Option<String>,
    pub domain: Option<String>,
    pub realm: Option<String>,
    pub eap_method: Option<String>,
    pub inner_auth: Option<String>,
    /// Comma-separated organisation identifiers.
    pub roaming_consortium_ois: Option<String>,
    pub ssid: Option<String>,
    pub operator_name: Option<String>,
    pub is_default: bool,
    pub is_active: bool,
    pub created_at: i64,
}

/// An issued WiFi identity.
#[derive(Clone, sqlx::FromRow)]
pub struct WifiCredential {
    pub id: String,
    pub profile_id: String,
    pub passpoint_profile_id: String,
    pub username: String,
    pub secret: String,
    pub is_active: bool,
    pub provisioned_at: i64,
    pub last_used_at: i64,
}

impl std::fmt::Debug for WifiCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WifiCredential")
            .field("id", &self.id)
            .field("profile_id", &self.profile_id)
            .field("passpoint_profile_id", &self.passpoint_profile_id)
            .field("username", &self.username)
            .field("secret", &"[REDACTED]")
            .field("is_active", &self.is_active)
            .field("provisioned_at", &self.provisioned_at)
            .field("last_used_at", &self.last_used_at)
            .finish()
    }
}

/// A single-use, time-boxed grant for one credential. Only the digest of the
/// token string is stored.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProvisioningToken {
    pub id: String,
    pub token_hash: String,
    pub credential_id: String,
    pub created_by: String,
    pub expires_at: i64,
    pub used_at: Option<i64>,
    pub created_at: i64,
}

/// Per-device liveness record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeviceHeartbeat {
    pub id: String,
    pub profile_id: String,
    pub device_id: String,
    pub push_subscription_id: Option<String>,
    pub last_heartbeat_at: i64,
    pub is_installed: bool,
    pub is_active: bool,
}

/// A credential joined with the profile that owns it.
#[derive(Debug, Clone)]
pub struct CredentialWithProfile {
    pub credential: WifiCredential,
    pub owner: AccountProfile,
}

/// A token joined with its credential and the credential's owner.
#[derive(Debug, Clone)]
pub struct TokenWithCredential {
    pub token: ProvisioningToken,
    pub credential: WifiCredential,
    pub owner: AccountProfile,
}

/// A managed child as shown to its parent. Never carries the secret.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChildSummary {
    pub profile_id: String,
    pub display_name: String,
    pub age: Option<i64>,
    pub policy_label: String,
    pub credential_id: Option<String>,
    pub username: Option<String>,
}

/// Column list for joins: credential columns prefixed `c_`.
pub(crate) const CREDENTIAL_COLUMNS: &str = "c.id AS c_id, c.profile_id AS c_profile_id, \
     c.passpoint_profile_id AS c_passpoint_profile_id, c.username AS c_username, \
     c.secret AS c_secret, c.is_active AS c_is_active, c.provisioned_at AS c_provisioned_at, \
     c.last_used_at AS c_last_used_at";

/// Column list for joins: owner profile columns prefixed `p_`.
pub(crate) const OWNER_COLUMNS: &str = "p.id AS p_id, p.external_id AS p_external_id, \
     p.display_name AS p_display_name, p.is_child AS p_is_child, p.managed_by AS p_managed_by, \
     p.age AS p_age, p.policy_label AS p_policy_label, p.push_state AS p_push_state, \
     p.push_checked_at AS p_push_checked_at, p.created_at AS p_created_at, \
     p.updated_at AS p_updated_at";

/// Column list for joins: token columns prefixed `t_`.
pub(crate) const TOKEN_COLUMNS: &str = "t.id AS t_id, t.token_hash AS t_token_hash, \
     t.credential_id AS t_credential_id, t.created_by AS t_created_by, \
     t.expires_at AS t_expires_at, t.used_at AS t_used_at, t.created_at AS t_created_at";

fn credential_from_prefixed(row: &SqliteRow) -> Result<WifiCredential, sqlx::Error> {
    Ok(WifiCredential {
        id: row.try_get("c_id")?,
        profile_id: row.try_get("c_profile_id")?,
        passpoint_profile_id: row.try_get("c_passpoint_profile_id")?,
        username: row.try_get("c_username")?,
        secret: row.try_get("c_secret")?,
        is_active: row.try_get("c_is_active")?,
        provisioned_at: row.try_get("c_provisioned_at")?,
        last_used_at: row.try_get("c_last_used_at")?,
    })
}

fn owner_from_prefixed(row: &SqliteRow) -> Result<AccountProfile, sqlx::Error> {
    Ok(AccountProfile {
        id: row.try_get("p_id")?,
        external_id: row.try_get("p_external_id")?,
        display_name: row.try_get("p_display_name")?,
        is_child: row.try_get("p_is_child")?,
        managed_by: row.try_get("p_managed_by")?,
        age: row.try_get("p_age")?,
        policy_label: row.try_get("p_policy_label")?,
        push_state: row.try_get("p_push_state")?,
        push_checked_at: row.try_get("p_push_checked_at")?,
        created_at: row.try_get("p_created_at")?,
        updated_at: row.try_get("p_updated_at")?,
    })
}

impl<'r> sqlx::FromRow<'r, SqliteRow> for CredentialWithProfile {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            credential: credential_from_prefixed(row)?,
            owner: owner_from_prefixed(row)?,
        })
    }
}

impl<'r> sqlx::FromRow<'r, SqliteRow> for TokenWithCredential {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            token: ProvisioningToken {
                id: row.try_get("t_id")?,
                token_hash: row.try_get("t_token_hash")?,
                credential_id: row.try_get("t_credential_id")?,
                created_by: row.try_get("t_created_by")?,
                expires_at: row.try_get("t_expires_at")?,
                used_at: row.try_get("t_used_at")?,
                created_at: row.try_get("t_created_at")?,
            },
            credential: credential_from_prefixed(row)?,
            owner: owner_from_prefixed(row)?,
        })
    }
}
