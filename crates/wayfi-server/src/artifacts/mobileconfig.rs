//! iOS/macOS configuration profile (`.mobileconfig`) generation.
//!
//! One `com.apple.wifi.managed` Passpoint payload inside a `Configuration`
//! document. Both carry a fresh UUID on every call so reinstalling on the
//! same device replaces the previous profile.

use tracing::warn;
use uuid::Uuid;

use super::plist::{self, Dict, Value};
use super::{ArtifactError, require_active};
use crate::provisioning::ResolvedConfig;
use crate::storage::WifiCredential;

/// Content type that makes iOS offer to install the document.
pub const MOBILECONFIG_CONTENT_TYPE: &str = "application/x-apple-aspen-config";

/// A rendered configuration profile.
#[derive(Debug, Clone)]
pub struct MobileConfig {
    pub document_uuid: Uuid,
    pub payload_uuid: Uuid,
    pub xml: String,
}

impl MobileConfig {
    /// Suggested download file name.
    pub fn file_name(config: &ResolvedConfig) -> String {
        let stem: String = config
            .friendly_name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect();
        format!("{}.mobileconfig", stem.trim_matches('-'))
    }
}

/// Render the configuration profile for a credential.
pub fn generate(
    credential: &WifiCredential,
    config: &ResolvedConfig,
) -> Result<MobileConfig, ArtifactError> {
    let document_uuid = Uuid::new_v4();
    let payload_uuid = Uuid::new_v4();
    let root = build_document(credential, config, document_uuid, payload_uuid)?;
    let xml = plist::to_xml(&Value::Dict(root))?;

    Ok(MobileConfig {
        document_uuid,
        payload_uuid,
        xml,
    })
}

/// Build the document tree with the given identifiers.
pub fn build_document(
    credential: &WifiCredential,
    config: &ResolvedConfig,
    document_uuid: Uuid,
    payload_uuid: Uuid,
) -> Result<Dict, ArtifactError> {
    require_active(credential)?;

    if !config.eap_method.is_known() {
        warn!(
            eap_method = %config.eap_method,
            "Unknown EAP method; encoding as TTLS"
        );
    }
    if !config.inner_auth.is_known() {
        warn!(
            inner_auth = %config.inner_auth,
            "Unknown inner authentication; encoding as MSCHAPv2"
        );
    }

    let identifier_root = reverse_dns(&config.domain);
    let document_uuid = document_uuid.to_string().to_uppercase();
    let payload_uuid = payload_uuid.to_string().to_uppercase();

    let eap = Dict::new()
        .with("AcceptEAPTypes", vec![config.eap_method.type_code()])
        .with("UserName", format!("{}@{}", credential.username, config.realm))
        .with("UserPassword", credential.secret.as_str())
        .with("OuterIdentity", format!("anonymous@{}", config.realm))
        .with("TTLSInnerAuthentication", config.inner_auth.name())
        .with("InnerAuthenticationType", config.inner_auth.code());

    let wifi = Dict::new()
        .with("AutoJoin", true)
        .with("IsHotspot", true)
        .with("ServiceProviderRoamingEnabled", true)
        .with("DisplayedOperatorName", config.operator_name.as_str())
        .with("DomainName", config.domain.as_str())
        .with("NAIRealmNames", vec![config.realm.as_str()])
        .with(
            "RoamingConsortiumOIs",
            config
                .roaming_consortium_ois
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>(),
        )
        .with("EncryptionType", "WPA2")
        .with("HIDDEN_NETWORK", false)
        .with("EAPClientConfiguration", eap)
        .with("PayloadDisplayName", format!("{} Wi-Fi", config.friendly_name))
        .with(
            "PayloadIdentifier",
            format!("{identifier_root}.wifi.{payload_uuid}"),
        )
        .with("PayloadType", "com.apple.wifi.managed")
        .with("PayloadUUID", payload_uuid)
        .with("PayloadVersion", 1_i64);

    Ok(Dict::new()
        .with("PayloadContent", vec![wifi])
        .with(
            "PayloadDescription",
            format!(
                "Connects automatically to {} Passpoint hotspots.",
                config.friendly_name
            ),
        )
        .with("PayloadDisplayName", config.friendly_name.as_str())
        .with(
            "PayloadIdentifier",
            format!("{identifier_root}.passpoint.{document_uuid}"),
        )
        .with("PayloadOrganization", config.operator_name.as_str())
        .with("PayloadRemovalDisallowed", false)
        .with("PayloadType", "Configuration")
        .with("PayloadUUID", document_uuid)
        .with("PayloadVersion", 1_i64))
}

/// `wifi.example.net` -> `net.example.wifi`, keeping only identifier-safe
/// characters.
fn reverse_dns(domain: &str) -> String {
    let labels: Vec<String> = domain
        .split('.')
        .rev()
        .map(|label| {
            label
                .chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
                .collect::<String>()
        })
        .filter(|label| !label.is_empty())
        .collect();
    if labels.is_empty() {
        "net.wayfi".to_string()
    } else {
        labels.join(".")
    }
}
