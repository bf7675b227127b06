//! Profile Config Resolver: stored Passpoint profile merged over static defaults.

use tracing::{debug, error};
use wayfi_core::config::PasspointDefaults;

use super::eap::{EapMethod, InnerAuth};
use super::error::{ProvisionError, ProvisionResult};
use crate::storage::{PasspointProfileRecord, ProvisioningDatabase};

/// The effective deployment configuration for one provisioning request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub passpoint_profile_id: String,
    pub friendly_name: String,
    pub domain: String,
    pub realm: String,
    pub eap_method: EapMethod,
    pub inner_auth: InnerAuth,
    pub roaming_consortium_ois: Vec<String>,
    pub ssid: String,
    pub operator_name: String,
}

/// Reads the default + active Passpoint profile and fills gaps from the
/// static configuration layer. Holds no mutable state.
#[derive(Clone)]
pub struct ProfileConfigResolver {
    db: ProvisioningDatabase,
    defaults: PasspointDefaults,
}

impl ProfileConfigResolver {
    pub const fn new(db: ProvisioningDatabase, defaults: PasspointDefaults) -> Self {
        Self { db, defaults }
    }

    /// Resolve the active deployment configuration.
    ///
    /// Fails with [`ProvisionError::ConfigurationMissing`] when no profile is
    /// flagged default + active, or when several are.
    pub async fn resolve(&self) -> ProvisionResult<ResolvedConfig> {
        let mut candidates = self.db.list_default_active_passpoint().await?;

        let record = match candidates.len() {
            0 => {
                error!("No default active Passpoint profile; provisioning halted");
                return Err(ProvisionError::ConfigurationMissing(
                    "no Passpoint profile is flagged default and active".to_string(),
                ));
            }
            1 => candidates.remove(0),
            n => {
                let ids: Vec<&str> = candidates.iter().map(|p| p.id.as_str()).collect();
                error!(count = n, ids = ?ids, "Ambiguous default Passpoint profiles");
                return Err(ProvisionError::ConfigurationMissing(format!(
                    "{n} Passpoint profiles are flagged default and active"
                )));
            }
        };

        debug!(passpoint_profile_id = %record.id, "Resolved Passpoint profile");
        Ok(merge(record, &self.defaults))
    }

    /// Resolve a specific Passpoint profile, default or not.
    ///
    /// Used for credentials already bound to a profile, so that documents
    /// describe the network the credential was issued for. Unknown or
    /// inactive profiles are [`ProvisionError::NotFound`].
    pub async fn resolve_for(&self, passpoint_profile_id: &str) -> ProvisionResult<ResolvedConfig> {
        let record = self.db.get_passpoint_profile(passpoint_profile_id).await?;
        if !record.is_active {
            return Err(ProvisionError::NotFound(format!(
                "Active Passpoint profile {passpoint_profile_id}"
            )));
        }

        debug!(passpoint_profile_id, "Resolved bound Passpoint profile");
        Ok(merge(record, &self.defaults))
    }
}

fn merge(record: PasspointProfileRecord, defaults: &PasspointDefaults) -> ResolvedConfig {
    let present = |stored: Option<String>| {
        stored
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };
    let pick = |stored: Option<String>, fallback: &str| {
        present(stored).unwrap_or_else(|| fallback.to_string())
    };

    let roaming_consortium_ois = record
        .roaming_consortium_ois
        .as_deref()
        .map(parse_ois)
        .filter(|ois| !ois.is_empty())
        .unwrap_or_else(|| defaults.roaming_consortium_ois.clone());

    let stored_realm = present(record.realm);
    // A stored realm without a stored domain implies the same domain.
    let domain = match (present(record.domain), &stored_realm) {
        (Some(domain), _) => domain,
        (None, Some(realm)) => realm.clone(),
        (None, None) => defaults.domain.clone(),
    };
    let realm = stored_realm.unwrap_or_else(|| defaults.realm.clone());

    ResolvedConfig {
        passpoint_profile_id: record.id,
        friendly_name: pick(record.friendly_name, &defaults.friendly_name),
        domain,
        eap_method: EapMethod::from_label(&pick(record.eap_method, &defaults.eap_method)),
        inner_auth: InnerAuth::from_label(&pick(record.inner_auth, &defaults.inner_auth)),
        roaming_consortium_ois,
        ssid: pick(record.ssid, &defaults.ssid),
        operator_name: pick(record.operator_name, &defaults.operator_name),
        realm,
    }
}

fn parse_ois(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_ascii_uppercase)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::NewPasspointProfile;

    async fn resolver_with(profiles: &[NewPasspointProfile<'_>]) -> ProfileConfigResolver {
        let db = ProvisioningDatabase::open_in_memory().await.unwrap();
        for p in profiles {
            db.insert_passpoint_profile(p).await.unwrap();
        }
        ProfileConfigResolver::new(db, PasspointDefaults::default())
    }

    #[tokio::test]
    async fn missing_default_is_configuration_missing() {
        let resolver = resolver_with(&[NewPasspointProfile {
            id: "pp-inactive",
            is_default: true,
            is_active: false,
            ..Default::default()
        }])
        .await;

        let err = resolver.resolve().await.unwrap_err();
        assert!(matches!(err, ProvisionError::ConfigurationMissing(_)));
    }

    #[tokio::test]
    async fn multiple_defaults_are_ambiguous() {
        let resolver = resolver_with(&[
            NewPasspointProfile {
                id: "pp-a",
                is_default: true,
                is_active: true,
                ..Default::default()
            },
            NewPasspointProfile {
                id: "pp-b",
                is_default: true,
                is_active: true,
                ..Default::default()
            },
        ])
        .await;

        let err = resolver.resolve().await.unwrap_err();
        assert!(matches!(err, ProvisionError::ConfigurationMissing(msg) if msg.contains('2')));
    }

    #[tokio::test]
    async fn absent_fields_fall_back_to_defaults() {
        let resolver = resolver_with(&[
            NewPasspointProfile {
                id: "pp-other",
                realm: Some("ignored.example"),
                is_default: false,
                is_active: true,
                ..Default::default()
            },
            NewPasspointProfile {
                id: "pp-main",
                realm: Some("roam.example.org"),
                is_default: true,
                is_active: true,
                ..Default::default()
            },
        ])
        .await;

        let cfg = resolver.resolve().await.unwrap();
        assert_eq!(cfg.passpoint_profile_id, "pp-main");
        assert_eq!(cfg.realm, "roam.example.org");
        assert_eq!(cfg.domain, "roam.example.org");
        assert_eq!(cfg.eap_method, EapMethod::Ttls);
        assert_eq!(cfg.inner_auth, InnerAuth::MsChapV2);
        assert_eq!(cfg.roaming_consortium_ois, vec!["5A03BA0000".to_string()]);
        assert_eq!(cfg.ssid, "wayfi");
    }

    #[tokio::test]
    async fn stored_fields_override_defaults() {
        let resolver = resolver_with(&[NewPasspointProfile {
            id: "pp-main",
            friendly_name: Some("Metro WiFi"),
            domain: Some("metro.example"),
            realm: Some("aaa.metro.example"),
            eap_method: Some("PEAP"),
            inner_auth: Some("pap"),
            roaming_consortium_ois: Some("004096, 5a03ba0000 ,"),
            is_default: true,
            is_active: true,
            ..Default::default()
        }])
        .await;

        let cfg = resolver.resolve().await.unwrap();
        assert_eq!(cfg.friendly_name, "Metro WiFi");
        assert_eq!(cfg.domain, "metro.example");
        assert_eq!(cfg.realm, "aaa.metro.example");
        assert_eq!(cfg.eap_method, EapMethod::Peap);
        assert_eq!(cfg.inner_auth, InnerAuth::Pap);
        assert_eq!(cfg.roaming_consortium_ois, vec!["004096", "5A03BA0000"]);
    }

    #[tokio::test]
    async fn resolve_for_reads_non_default_profiles() {
        let resolver = resolver_with(&[
            NewPasspointProfile {
                id: "pp-old",
                realm: Some("old.example"),
                is_default: false,
                is_active: true,
                ..Default::default()
            },
            NewPasspointProfile {
                id: "pp-new",
                realm: Some("new.example"),
                is_default: true,
                is_active: true,
                ..Default::default()
            },
        ])
        .await;

        let cfg = resolver.resolve_for("pp-old").await.unwrap();
        assert_eq!(cfg.passpoint_profile_id, "pp-old");
        assert_eq!(cfg.realm, "old.example");
        assert_eq!(cfg.ssid, PasspointDefaults::default().ssid);
    }

    #[tokio::test]
    async fn resolve_for_rejects_unknown_and_inactive_profiles() {
        let resolver = resolver_with(&[NewPasspointProfile {
            id: "pp-retired",
            is_default: false,
            is_active: false,
            ..Default::default()
        }])
        .await;

        let err = resolver.resolve_for("pp-retired").await.unwrap_err();
        assert!(matches!(err, ProvisionError::NotFound(_)));
        let err = resolver.resolve_for("pp-missing").await.unwrap_err();
        assert!(matches!(err, ProvisionError::NotFound(_)));
    }

    #[tokio::test]
    async fn blank_stored_fields_count_as_absent() {
        let resolver = resolver_with(&[NewPasspointProfile {
            id: "pp-main",
            realm: Some("   "),
            roaming_consortium_ois: Some(" , "),
            is_default: true,
            is_active: true,
            ..Default::default()
        }])
        .await;

        let cfg = resolver.resolve().await.unwrap();
        assert_eq!(cfg.realm, PasspointDefaults::default().realm);
        assert_eq!(
            cfg.roaming_consortium_ois,
            PasspointDefaults::default().roaming_consortium_ois
        );
    }
}
