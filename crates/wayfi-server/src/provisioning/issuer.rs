//! Credential Issuer: idempotent fetch-or-create of WiFi identities.

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use wayfi_core::config::ProvisioningConfig;
use wayfi_core::db::unix_timestamp;
use wayfi_crypto::MIN_SECRET_LENGTH;

use super::error::{ProvisionError, ProvisionResult};
use super::resolver::{ProfileConfigResolver, ResolvedConfig};
use crate::storage::{NewCredential, ProvisioningDatabase, WifiCredential};

/// Prefix lengths tried, in order, when deriving a username from a profile id.
const USERNAME_LENGTHS: [usize; 3] = [8, 12, 16];

/// Numbered suffixes tried once every prefix length is taken.
const MAX_USERNAME_SUFFIX: u32 = 32;

/// Tuning for credential creation.
#[derive(Debug, Clone)]
pub struct IssuerSettings {
    pub secret_length: usize,
    pub username_prefix: String,
}

impl From<&ProvisioningConfig> for IssuerSettings {
    fn from(cfg: &ProvisioningConfig) -> Self {
        Self {
            secret_length: cfg.secret_length,
            username_prefix: cfg.username_prefix.clone(),
        }
    }
}

impl Default for IssuerSettings {
    fn default() -> Self {
        Self::from(&ProvisioningConfig::default())
    }
}

/// An active credential plus the configuration it was issued under; the
/// input shape of every artifact generator.
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    pub credential: WifiCredential,
    pub config: ResolvedConfig,
}

/// Username, secret and id for a credential not yet stored.
pub(crate) struct CredentialDraft {
    pub id: String,
    pub username: String,
    pub secret: String,
}

/// Issues and revokes WiFi credentials.
#[derive(Clone)]
pub struct CredentialIssuer {
    db: ProvisioningDatabase,
    resolver: ProfileConfigResolver,
    settings: IssuerSettings,
}

impl CredentialIssuer {
    pub const fn new(
        db: ProvisioningDatabase,
        resolver: ProfileConfigResolver,
        settings: IssuerSettings,
    ) -> Self {
        Self {
            db,
            resolver,
            settings,
        }
    }

    pub const fn resolver(&self) -> &ProfileConfigResolver {
        &self.resolver
    }

    /// Return the active credential of a profile under the default Passpoint
    /// profile, creating it on first use.
    ///
    /// Repeat calls return the same username and secret; only `last_used_at`
    /// moves. Concurrent first calls converge on a single row through the
    /// storage-level uniqueness constraint.
    #[instrument(skip(self))]
    pub async fn ensure_credential(&self, profile_id: &str) -> ProvisionResult<IssuedCredential> {
        self.db.get_profile(profile_id).await?;

        let config = self.resolver.resolve().await?;

        if let Some(credential) = self.fetch_and_touch(profile_id, &config).await? {
            return Ok(IssuedCredential { credential, config });
        }

        let credential = match self.create(profile_id, &config).await {
            Ok(credential) => credential,
            Err(ProvisionError::Conflict(reason)) => {
                debug!(profile_id, reason = %reason, "Credential creation conflicted; re-reading");
                match self.fetch_and_touch(profile_id, &config).await? {
                    Some(credential) => credential,
                    None => self.create(profile_id, &config).await?,
                }
            }
            Err(e) => return Err(e),
        };

        Ok(IssuedCredential { credential, config })
    }

    /// Deactivate a credential. Allowed for its owner and the owner's
    /// managing parent. Returns `false` if it was already inactive.
    #[instrument(skip(self))]
    pub async fn revoke_credential(
        &self,
        credential_id: &str,
        requesting_profile_id: &str,
    ) -> ProvisionResult<bool> {
        let record = self
            .db
            .get_credential_with_profile(credential_id)
            .await?
            .ok_or_else(|| ProvisionError::NotFound(format!("Credential {credential_id}")))?;

        let is_owner = record.owner.id == requesting_profile_id;
        let is_manager = record.owner.managed_by.as_deref() == Some(requesting_profile_id);
        if !is_owner && !is_manager {
            warn!(credential_id, requesting_profile_id, "Rejected credential revocation");
            return Err(ProvisionError::Unauthorized(
                "only the owner or its managing parent may revoke this credential".to_string(),
            ));
        }

        let revoked = self.db.deactivate_credential(credential_id).await?;
        if revoked {
            info!(credential_id, owner = %record.owner.id, "Credential revoked");
        }
        Ok(revoked)
    }

    async fn fetch_and_touch(
        &self,
        profile_id: &str,
        config: &ResolvedConfig,
    ) -> ProvisionResult<Option<WifiCredential>> {
        let Some(mut credential) = self
            .db
            .get_active_credential(profile_id, &config.passpoint_profile_id)
            .await?
        else {
            return Ok(None);
        };

        let now = unix_timestamp();
        self.db.touch_credential(&credential.id, now).await?;
        credential.last_used_at = now;
        Ok(Some(credential))
    }

    /// Generate a username and secret for `profile_id` without storing them.
    pub(crate) async fn draft(&self, profile_id: &str) -> ProvisionResult<CredentialDraft> {
        let username = self.derive_username(profile_id).await?;
        let secret =
            wayfi_crypto::generate_secret(self.settings.secret_length.max(MIN_SECRET_LENGTH))?;
        Ok(CredentialDraft {
            id: Uuid::new_v4().to_string(),
            username,
            secret,
        })
    }

    async fn create(
        &self,
        profile_id: &str,
        config: &ResolvedConfig,
    ) -> ProvisionResult<WifiCredential> {
        let draft = self.draft(profile_id).await?;

        let inserted = self
            .db
            .insert_credential_if_absent(&NewCredential {
                id: &draft.id,
                profile_id,
                passpoint_profile_id: &config.passpoint_profile_id,
                username: &draft.username,
                secret: &draft.secret,
            })
            .await?;

        let credential = self
            .db
            .get_active_credential(profile_id, &config.passpoint_profile_id)
            .await?
            .ok_or_else(|| {
                ProvisionError::Conflict("active credential missing after insert".to_string())
            })?;

        if inserted {
            info!(
                profile_id,
                credential_id = %credential.id,
                username = %credential.username,
                passpoint_profile_id = %config.passpoint_profile_id,
                "Issued WiFi credential"
            );
        } else {
            debug!(profile_id, "Concurrent request issued the credential first");
        }
        Ok(credential)
    }

    async fn derive_username(&self, profile_id: &str) -> ProvisionResult<String> {
        for candidate in username_candidates(&self.settings.username_prefix, profile_id)? {
            if !self.db.username_exists(&candidate).await? {
                return Ok(candidate);
            }
        }
        Err(ProvisionError::Conflict(format!(
            "no free username derivable from profile {profile_id}"
        )))
    }
}

/// Usernames derivable from a profile id, most readable first: short
/// prefixes of the id, then the full id, then the full id with a numbered
/// suffix.
pub fn username_candidates(prefix: &str, profile_id: &str) -> ProvisionResult<Vec<String>> {
    let compact: String = profile_id
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if compact.is_empty() {
        return Err(ProvisionError::Validation(format!(
            "profile id {profile_id:?} has no usable characters"
        )));
    }

    let mut out: Vec<String> = USERNAME_LENGTHS
        .iter()
        .filter(|&&len| len < compact.len())
        .map(|&len| format!("{prefix}{}", &compact[..len]))
        .collect();
    out.push(format!("{prefix}{compact}"));
    out.extend((2..=MAX_USERNAME_SUFFIX).map(|n| format!("{prefix}{compact}-{n}")));
    Ok(out)
}
