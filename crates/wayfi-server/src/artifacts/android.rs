//! Android / manual configuration assistance.
//!
//! Android Passpoint provisioning files are not produced. The output is the
//! list of values a user types into the system WiFi dialog, and says so.

use serde::Serialize;

use super::{ArtifactError, require_active};
use crate::provisioning::ResolvedConfig;
use crate::storage::WifiCredential;

const SECURITY_LABEL: &str = "WPA2/WPA3-Enterprise (802.1X EAP)";

const CA_CERTIFICATE_NOTE: &str = "Choose \"Use system certificates\" and enter the domain \
     shown above. If your device does not offer that option, select \"Do not validate\" only \
     as a last resort.";

const MANUAL_NOTE: &str = "Manual setup: these settings must be entered by hand. Automatic \
     Passpoint installation is not available on Android.";

/// Flat settings record plus human-readable steps.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AndroidSettings {
    pub ssid: String,
    pub security: String,
    pub eap_method: String,
    pub phase2_auth: String,
    pub identity: String,
    pub anonymous_identity: String,
    pub password: String,
    pub realm: String,
    pub domain: String,
    pub ca_certificate_note: String,
    pub automatic_provisioning: bool,
    pub note: String,
    pub steps: Vec<String>,
}

/// Build the manual settings for a credential.
pub fn generate(
    credential: &WifiCredential,
    config: &ResolvedConfig,
) -> Result<AndroidSettings, ArtifactError> {
    require_active(credential)?;

    let eap_method = config.eap_method.display_label().to_string();
    let phase2_auth = config.inner_auth.name().to_uppercase();
    let identity = format!("{}@{}", credential.username, config.realm);
    let anonymous_identity = format!("anonymous@{}", config.realm);

    let steps = vec![
        "Open Settings > Network & internet > Internet.".to_string(),
        format!("Tap \"Add network\" and enter \"{}\" as the network name.", config.ssid),
        format!("Set Security to \"{SECURITY_LABEL}\" and EAP method to \"{eap_method}\"."),
        format!("Set Phase 2 authentication to \"{phase2_auth}\"."),
        format!("Set CA certificate to \"Use system certificates\" and Domain to \"{}\".", config.domain),
        format!("Enter \"{identity}\" as Identity and \"{anonymous_identity}\" as Anonymous identity."),
        "Enter the password shown on this page and tap Save.".to_string(),
    ];

    Ok(AndroidSettings {
        ssid: config.ssid.clone(),
        security: SECURITY_LABEL.to_string(),
        eap_method,
        phase2_auth,
        identity,
        anonymous_identity,
        password: credential.secret.clone(),
        realm: config.realm.clone(),
        domain: config.domain.clone(),
        ca_certificate_note: CA_CERTIFICATE_NOTE.to_string(),
        automatic_provisioning: false,
        note: MANUAL_NOTE.to_string(),
        steps,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::artifacts::fixtures::{config, credential};
    use crate::provisioning::{EapMethod, InnerAuth};

    #[test]
    fn settings_reflect_credential_and_config() {
        let s = generate(&credential(), &config()).unwrap();

        assert_eq!(s.ssid, "wayfi");
        assert_eq!(s.eap_method, "TTLS");
        assert_eq!(s.phase2_auth, "MSCHAPV2");
        assert_eq!(s.identity, "u3f2a9c1e@wifi.example.net");
        assert_eq!(s.anonymous_identity, "anonymous@wifi.example.net");
        assert_eq!(s.password, credential().secret);
        assert_eq!(s.realm, "wifi.example.net");
    }

    #[test]
    fn output_declares_manual_configuration() {
        let s = generate(&credential(), &config()).unwrap();
        assert!(!s.automatic_provisioning);
        assert!(s.note.contains("Manual setup"));
        assert!(!s.steps.is_empty());

        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["automaticProvisioning"], false);
        assert_eq!(json["phase2Auth"], "MSCHAPV2");
        assert!(json["caCertificateNote"].is_string());
    }

    #[test]
    fn labels_follow_resolved_methods() {
        let cfg = ResolvedConfig {
            eap_method: EapMethod::Peap,
            inner_auth: InnerAuth::Pap,
            ..config()
        };
        let s = generate(&credential(), &cfg).unwrap();
        assert_eq!(s.eap_method, "PEAP");
        assert_eq!(s.phase2_auth, "PAP");
        assert!(s.steps.iter().any(|step| step.contains("\"PEAP\"")));
    }

    #[test]
    fn inactive_credentials_are_rejected() {
        let mut cred = credential();
        cred.is_active = false;
        assert!(matches!(
            generate(&cred, &config()),
            Err(ArtifactError::InactiveCredential(_))
        ));
    }
}
