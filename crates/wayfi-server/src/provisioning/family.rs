//! Delegated Provisioning Flow: child profiles and provisioning tokens.
//!
//! A token is `Created` when minted and becomes `Consumed` on its first
//! redemption. It is `Expired` once `expires_at` has passed, whatever its
//! `used_at`. Redemption before expiry may be repeated; each read returns the
//! same credential and `used_at` keeps its first value.

use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use wayfi_core::db::unix_timestamp;

use super::accounts::validate_display_name;
use super::error::{ProvisionError, ProvisionResult};
use super::issuer::CredentialIssuer;
use super::policy::ContentPolicy;
use super::resolver::ResolvedConfig;
use crate::notifications::{Notification, Notifier};
use crate::storage::{
    AccountProfile, ChildSummary, CredentialWithProfile, NewChildProfile, NewChildToken,
    NewCredential, ProvisioningDatabase, WifiCredential,
};

/// A freshly minted provisioning token. The raw token exists only here; the
/// database stores its digest.
#[derive(Debug, Clone)]
pub struct MintedToken {
    pub token: String,
    pub credential_id: String,
    pub expires_at: i64,
}

/// Result of adding a child.
#[derive(Debug, Clone)]
pub struct ChildProvisioning {
    pub child: AccountProfile,
    pub credential: WifiCredential,
    pub token: MintedToken,
}

/// What a device holding a valid token receives.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Redemption {
    pub display_name: String,
    pub username: String,
    pub secret: String,
    pub policy_label: String,
    pub expires_at: i64,
    #[serde(skip)]
    pub credential: WifiCredential,
}

/// Parent-driven provisioning of managed child profiles.
#[derive(Clone)]
pub struct FamilyProvisioner {
    db: ProvisioningDatabase,
    issuer: CredentialIssuer,
    notifier: Notifier,
    token_ttl_secs: i64,
}

impl FamilyProvisioner {
    pub const fn new(
        db: ProvisioningDatabase,
        issuer: CredentialIssuer,
        notifier: Notifier,
        token_ttl_secs: i64,
    ) -> Self {
        Self {
            db,
            issuer,
            notifier,
            token_ttl_secs,
        }
    }

    /// Create a child profile under `parent_id`, issue its credential and
    /// mint a first provisioning token.
    ///
    /// The deployment configuration is resolved before anything is written,
    /// and the child, credential and token are stored in one transaction: a
    /// failed call leaves no partial child behind. The parent's registered
    /// devices are notified in the background; a delivery failure never
    /// fails this call.
    #[instrument(skip(self))]
    pub async fn create_child_profile(
        &self,
        parent_id: &str,
        child_name: &str,
        child_age: i64,
    ) -> ProvisionResult<ChildProvisioning> {
        let child_name = validate_display_name(child_name)?;
        let policy = ContentPolicy::for_child_age(child_age)?;

        let parent = self.db.get_profile(parent_id).await?;
        if parent.is_child {
            return Err(ProvisionError::Unauthorized(
                "child profiles cannot manage other profiles".to_string(),
            ));
        }

        let config = self.issuer.resolver().resolve().await?;
        let child_id = Uuid::new_v4().to_string();

        let result = match self
            .write_child(parent_id, &child_id, &child_name, child_age, policy, &config)
            .await
        {
            Err(ProvisionError::Conflict(reason)) => {
                // Another request took the derived username; draft again.
                debug!(reason = %reason, "Child provisioning conflicted; retrying once");
                self.write_child(parent_id, &child_id, &child_name, child_age, policy, &config)
                    .await?
            }
            other => other?,
        };

        info!(
            parent_id,
            child_id = %result.child.id,
            credential_id = %result.credential.id,
            policy = policy.label(),
            "Child profile provisioned"
        );

        self.notify_parent(parent_id, &result.child).await;

        Ok(result)
    }

    async fn write_child(
        &self,
        parent_id: &str,
        child_id: &str,
        child_name: &str,
        child_age: i64,
        policy: ContentPolicy,
        config: &ResolvedConfig,
    ) -> ProvisionResult<ChildProvisioning> {
        let draft = self.issuer.draft(child_id).await?;
        let token = wayfi_crypto::generate_token()?;
        let token_id = Uuid::new_v4().to_string();
        let expires_at = unix_timestamp() + self.token_ttl_secs;

        let CredentialWithProfile { credential, owner } = self
            .db
            .create_child_with_credential(
                &NewChildProfile {
                    id: child_id,
                    parent_id,
                    display_name: child_name,
                    age: child_age,
                    policy_label: policy.label(),
                },
                &NewCredential {
                    id: &draft.id,
                    profile_id: child_id,
                    passpoint_profile_id: &config.passpoint_profile_id,
                    username: &draft.username,
                    secret: &draft.secret,
                },
                &NewChildToken {
                    id: &token_id,
                    token_hash: &wayfi_crypto::token_digest(&token),
                    expires_at,
                },
            )
            .await?;

        Ok(ChildProvisioning {
            child: owner,
            token: MintedToken {
                token,
                credential_id: credential.id.clone(),
                expires_at,
            },
            credential,
        })
    }

    /// Mint a new token for an existing credential.
    ///
    /// Only the managing parent of the credential's owner may do this.
    #[instrument(skip(self))]
    pub async fn mint_provisioning_token(
        &self,
        credential_id: &str,
        requesting_profile_id: &str,
    ) -> ProvisionResult<MintedToken> {
        let record = self
            .db
            .get_credential_with_profile(credential_id)
            .await?
            .ok_or_else(|| ProvisionError::NotFound(format!("Credential {credential_id}")))?;

        if record.owner.managed_by.as_deref() != Some(requesting_profile_id) {
            warn!(
                credential_id,
                requesting_profile_id, "Rejected token mint by non-managing profile"
            );
            return Err(ProvisionError::Unauthorized(
                "only the managing parent may create provisioning links".to_string(),
            ));
        }

        if !record.credential.is_active {
            return Err(ProvisionError::NotFound(format!(
                "Active credential {credential_id}"
            )));
        }

        self.store_token(credential_id, requesting_profile_id).await
    }

    /// Exchange a token for the credential it grants.
    ///
    /// Unknown or malformed tokens are `NotFound`; tokens past expiry are
    /// `Expired` regardless of earlier use.
    #[instrument(skip_all)]
    pub async fn redeem_token(&self, token: &str) -> ProvisionResult<Redemption> {
        if !wayfi_crypto::is_well_formed_token(token) {
            return Err(ProvisionError::NotFound("Provisioning token".to_string()));
        }

        let digest = wayfi_crypto::token_digest(token);
        let record = self
            .db
            .get_token_with_credential(&digest)
            .await?
            .ok_or_else(|| ProvisionError::NotFound("Provisioning token".to_string()))?;

        let now = unix_timestamp();
        if record.token.expires_at <= now {
            debug!(token_id = %record.token.id, "Redemption of expired token");
            return Err(ProvisionError::Expired);
        }

        // The minting parent must still manage the owner.
        if record.owner.managed_by.as_deref() != Some(record.token.created_by.as_str()) {
            warn!(
                token_id = %record.token.id,
                owner = %record.owner.id,
                "Token creator no longer manages the credential owner"
            );
            return Err(ProvisionError::Unauthorized(
                "provisioning link is no longer valid for this profile".to_string(),
            ));
        }

        if !record.credential.is_active {
            return Err(ProvisionError::NotFound(
                "Credential for provisioning token".to_string(),
            ));
        }

        // Conditional on expiry in the same write.
        if !self.db.mark_token_consumed(&record.token.id, now).await? {
            return Err(ProvisionError::Expired);
        }

        if record.token.used_at.is_some() {
            debug!(token_id = %record.token.id, "Token re-read before expiry");
        } else {
            info!(
                token_id = %record.token.id,
                credential_id = %record.credential.id,
                "Provisioning token consumed"
            );
        }

        Ok(Redemption {
            display_name: record.owner.display_name,
            username: record.credential.username.clone(),
            secret: record.credential.secret.clone(),
            policy_label: record.owner.policy_label,
            expires_at: record.token.expires_at,
            credential: record.credential,
        })
    }

    /// Children managed by a parent, without secrets.
    pub async fn list_children(&self, parent_id: &str) -> ProvisionResult<Vec<ChildSummary>> {
        Ok(self.db.list_children(parent_id).await?)
    }

    async fn store_token(
        &self,
        credential_id: &str,
        created_by: &str,
    ) -> ProvisionResult<MintedToken> {
        let token = wayfi_crypto::generate_token()?;
        let expires_at = unix_timestamp() + self.token_ttl_secs;
        let id = Uuid::new_v4().to_string();

        self.db
            .create_provisioning_token(
                &id,
                &wayfi_crypto::token_digest(&token),
                credential_id,
                created_by,
                expires_at,
            )
            .await?;

        info!(
            token_id = %id,
            token_prefix = %&token[..6],
            credential_id,
            expires_at,
            "Provisioning token minted"
        );

        Ok(MintedToken {
            token,
            credential_id: credential_id.to_string(),
            expires_at,
        })
    }

    async fn notify_parent(&self, parent_id: &str, child: &AccountProfile) {
        let targets = match self.db.push_targets_for_profile(parent_id).await {
            Ok(targets) => targets,
            Err(e) => {
                warn!(error = %e, parent_id, "Could not load push targets; skipping notification");
                return;
            }
        };
        if targets.is_empty() {
            debug!(parent_id, "Parent has no push targets");
            return;
        }

        let notification = Notification::new(
            format!("{} is ready for WiFi", child.display_name),
            "Open the setup link on their device to install the profile.",
        )
        .with_data("kind", "child_added")
        .with_data("child_profile_id", child.id.clone());

        drop(self.notifier.notify_detached(targets, notification));
    }
}
