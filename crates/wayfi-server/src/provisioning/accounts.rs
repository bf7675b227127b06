//! Account registration and push-status bookkeeping.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;
use wayfi_core::db::unix_timestamp;

use super::error::{ProvisionError, ProvisionResult};
use crate::storage::{AccountProfile, ProvisioningDatabase};

/// Longest accepted display name, in characters.
pub const MAX_DISPLAY_NAME_LEN: usize = 64;

/// Push-subscription state reported by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PushState {
    Subscribed,
    Unsubscribed,
    Denied,
}

impl PushState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Subscribed => "subscribed",
            Self::Unsubscribed => "unsubscribed",
            Self::Denied => "denied",
        }
    }

    /// Parse a stored state. `unknown` and anything unrecognised map to `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "subscribed" => Some(Self::Subscribed),
            "unsubscribed" => Some(Self::Unsubscribed),
            "denied" => Some(Self::Denied),
            _ => None,
        }
    }
}

/// Trim a display name and check it is non-empty and not too long.
pub fn validate_display_name(name: &str) -> ProvisionResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ProvisionError::Validation(
            "display name must not be empty".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_DISPLAY_NAME_LEN {
        return Err(ProvisionError::Validation(format!(
            "display name must be at most {MAX_DISPLAY_NAME_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Profile registration and lookups keyed by identity-provider subject.
#[derive(Clone)]
pub struct AccountService {
    db: ProvisioningDatabase,
}

impl AccountService {
    pub const fn new(db: ProvisioningDatabase) -> Self {
        Self { db }
    }

    /// Register the caller's profile, or refresh its display name.
    #[instrument(skip(self))]
    pub async fn register_profile(
        &self,
        external_id: &str,
        display_name: &str,
    ) -> ProvisionResult<AccountProfile> {
        if external_id.trim().is_empty() {
            return Err(ProvisionError::Validation(
                "identity subject must not be empty".to_string(),
            ));
        }
        let display_name = validate_display_name(display_name)?;

        let id = Uuid::new_v4().to_string();
        let profile = self
            .db
            .upsert_profile_by_external_id(&id, external_id, &display_name)
            .await?;

        info!(profile_id = %profile.id, "Profile registered");
        Ok(profile)
    }

    /// The profile registered for an identity-provider subject.
    pub async fn profile_for_subject(&self, external_id: &str) -> ProvisionResult<AccountProfile> {
        Ok(self.db.get_profile_by_external_id(external_id).await?)
    }

    /// Record a push-status report for a profile.
    #[instrument(skip(self))]
    pub async fn update_push_status(
        &self,
        profile_id: &str,
        state: PushState,
    ) -> ProvisionResult<AccountProfile> {
        let now = unix_timestamp();
        if !self.db.update_push_state(profile_id, state.as_str(), now).await? {
            return Err(ProvisionError::NotFound(format!("Profile {profile_id}")));
        }
        info!(profile_id, state = state.as_str(), "Push status updated");
        Ok(self.db.get_profile(profile_id).await?)
    }
}
