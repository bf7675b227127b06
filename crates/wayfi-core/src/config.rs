//! Configuration resolution for wayfi.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/wayfi/settings.json)
//! 3. Explicit config file (`--config`)
//! 4. Environment variables
//! 5. CLI arguments (highest priority, applied by the binary)

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Complete wayfi configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub passpoint: PasspointDefaults,
    #[serde(default)]
    pub provisioning: ProvisioningConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub database_path: Option<PathBuf>,
    /// Externally reachable base URL, used to build QR provisioning links.
    pub public_base_url: String,
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            database_path: None,
            public_base_url: "https://wifi.example.net".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Static Passpoint defaults merged under stored deployment profiles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PasspointDefaults {
    pub friendly_name: String,
    pub domain: String,
    pub realm: String,
    pub eap_method: String,
    pub inner_auth: String,
    pub roaming_consortium_ois: Vec<String>,
    pub ssid: String,
    pub operator_name: String,
}

impl Default for PasspointDefaults {
    fn default() -> Self {
        Self {
            friendly_name: "wayfi Passpoint".to_string(),
            domain: "wifi.example.net".to_string(),
            realm: "wifi.example.net".to_string(),
            eap_method: "TTLS".to_string(),
            inner_auth: "MSCHAPv2".to_string(),
            roaming_consortium_ois: vec!["5A03BA0000".to_string()],
            ssid: "wayfi".to_string(),
            operator_name: "wayfi".to_string(),
        }
    }
}

/// Credential and token lifecycle tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisioningConfig {
    /// Lifetime of a provisioning token (seconds). Default: 24 hours.
    pub token_ttl_secs: i64,
    /// Generated secret length. Never below 16.
    pub secret_length: usize,
    /// Prefix for derived WiFi usernames.
    pub username_prefix: String,
    /// A device without a heartbeat for this long is considered uninstalled.
    pub stale_device_after_secs: i64,
    /// How recent a push-status check must be for the reachability gate.
    pub push_check_window_secs: i64,
    /// Interval of the background staleness sweep.
    pub sweep_interval_secs: u64,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            token_ttl_secs: 24 * 60 * 60,
            secret_length: 24,
            username_prefix: "u".to_string(),
            stale_device_after_secs: 30 * 24 * 60 * 60, // 30 days
            push_check_window_secs: 7 * 24 * 60 * 60,   // 7 days
            sweep_interval_secs: 3600,
        }
    }
}

/// Signing secret used when none is configured. Only fit for local
/// development: anyone who knows it can mint bearer tokens.
pub const DEV_JWT_SECRET: &str = "dev-secret-change-me";

/// Identity-provider token validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

impl AuthConfig {
    /// Whether the built-in development secret is still in use.
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEV_JWT_SECRET.to_string(),
        }
    }
}

/// Push notification delivery.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NotificationConfig {
    /// Path to an FCM service account JSON file. Notifications are only
    /// logged when unset.
    pub fcm_credentials_path: Option<PathBuf>,
}

/// Load configuration with hierarchical resolution.
///
/// Files are layered key by key: a file only overrides the settings it
/// actually names, so a partial `--config` keeps values from the global file.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let global = global_config_path().filter(|p| p.exists());
    let paths: Vec<&Path> = global.as_deref().into_iter().chain(explicit).collect();

    let mut config = load_layers(&paths)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    Ok(config)
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .ok()
            .map(|h| PathBuf::from(h).join(".wayfi").join("settings.json"))
    }
    #[cfg(target_os = "macos")]
    {
        std::env::var("HOME")
            .ok()
            .map(|h| PathBuf::from(h).join("Library/Application Support/wayfi/settings.json"))
    }
    #[cfg(target_os = "linux")]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| std::env::var("HOME").ok().map(|h| PathBuf::from(h).join(".config")))
            .map(|p| p.join("wayfi").join("settings.json"))
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    {
        None
    }
}

fn load_layers(paths: &[&Path]) -> Result<Config> {
    let mut merged = Value::Object(Map::new());
    for path in paths {
        merge_layer(&mut merged, read_layer(path)?);
    }
    Ok(Config::deserialize(&merged)?)
}

/// Read one config file, rejecting it on its own if it does not describe a
/// valid configuration.
fn read_layer(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    let layer: Value = serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })?;
    Config::deserialize(&layer).map_err(|e| {
        Error::Config(format!("Invalid config file {}: {}", path.display(), e))
    })?;
    Ok(layer)
}

/// Objects merge key by key; anything else in `overlay` replaces `base`.
fn merge_layer(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_layer(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Apply `WAYFI_*` overrides using the given variable lookup.
pub fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(n) = lookup("WAYFI_ADDR").and_then(|v| v.parse().ok()) {
        config.server.addr = n;
    }
    if let Some(val) = lookup("WAYFI_DB_PATH") {
        config.server.database_path = Some(PathBuf::from(val));
    }
    if let Some(val) = lookup("WAYFI_PUBLIC_BASE_URL") {
        config.server.public_base_url = val;
    }
    if let Some(val) = lookup("WAYFI_LOG_LEVEL") {
        config.server.log_level = val;
    }
    if let Some(val) = lookup("WAYFI_JWT_SECRET") {
        config.auth.jwt_secret = val;
    }
    if let Some(val) = lookup("WAYFI_REALM") {
        config.passpoint.realm = val;
    }
    if let Some(val) = lookup("WAYFI_DOMAIN") {
        config.passpoint.domain = val;
    }
    if let Some(val) = lookup("WAYFI_SSID") {
        config.passpoint.ssid = val;
    }
    if let Some(n) = lookup("WAYFI_TOKEN_TTL_SECS").and_then(|v| v.parse().ok()) {
        config.provisioning.token_ttl_secs = n;
    }
    if let Some(val) = lookup("WAYFI_FCM_CREDENTIALS") {
        config.notifications.fcm_credentials_path = Some(PathBuf::from(val));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn default_token_ttl_is_24_hours() {
        let config = Config::default();
        assert_eq!(config.provisioning.token_ttl_secs, 86_400);
    }

    #[test]
    fn dev_secret_is_detected_until_overridden() {
        let mut config = Config::default();
        assert!(config.auth.uses_dev_secret());

        apply_env_overrides(&mut config, |k| {
            (k == "WAYFI_JWT_SECRET").then(|| "a-real-deployment-secret".to_string())
        });
        assert!(!config.auth.uses_dev_secret());
    }

    #[test]
    fn default_passpoint_uses_ttls_mschapv2() {
        let config = Config::default();
        assert_eq!(config.passpoint.eap_method, "TTLS");
        assert_eq!(config.passpoint.inner_auth, "MSCHAPv2");
    }

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn partial_file_keeps_section_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "settings.json",
            r#"{ "passpoint": { "realm": "corp.example.org" } }"#,
        );

        let config = load_layers(&[&path]).unwrap();
        assert_eq!(config.passpoint.realm, "corp.example.org");
        assert_eq!(config.passpoint.eap_method, "TTLS");
        assert_eq!(config.provisioning.secret_length, 24);
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "settings.json", "{ not json");

        let err = load_layers(&[&path]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn invalid_value_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "bad.json", r#"{ "server": { "addr": "nowhere" } }"#);

        let err = load_layers(&[&path]).unwrap_err();
        assert!(matches!(&err, Error::Config(msg) if msg.contains("bad.json")));
    }

    #[test]
    fn later_file_only_overrides_keys_it_names() {
        let dir = tempfile::tempdir().unwrap();
        let global = write(
            dir.path(),
            "global.json",
            r#"{
                "server": { "addr": "127.0.0.1:9100", "database_path": "/var/lib/wayfi.db" },
                "passpoint": { "realm": "corp.example.org", "ssid": "CorpWiFi" },
                "auth": { "jwt_secret": "from-global" }
            }"#,
        );
        let explicit = write(
            dir.path(),
            "explicit.json",
            r#"{ "server": { "log_level": "debug" }, "passpoint": { "ssid": "GuestWiFi" } }"#,
        );

        let config = load_layers(&[&global, &explicit]).unwrap();
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.server.addr.port(), 9100);
        assert_eq!(
            config.server.database_path.as_deref(),
            Some(Path::new("/var/lib/wayfi.db"))
        );
        assert_eq!(config.passpoint.realm, "corp.example.org");
        assert_eq!(config.passpoint.ssid, "GuestWiFi");
        assert_eq!(config.auth.jwt_secret, "from-global");
        assert_eq!(config.provisioning.token_ttl_secs, 86_400);
    }

    #[test]
    fn no_files_means_defaults() {
        let config = load_layers(&[]).unwrap();
        assert_eq!(config.server.addr, ServerConfig::default().addr);
        assert_eq!(config.passpoint, PasspointDefaults::default());
    }

    #[test]
    fn env_overrides_apply() {
        let vars: HashMap<&str, &str> = [
            ("WAYFI_REALM", "roam.example.com"),
            ("WAYFI_TOKEN_TTL_SECS", "600"),
            ("WAYFI_ADDR", "127.0.0.1:9000"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        apply_env_overrides(&mut config, |k| vars.get(k).map(ToString::to_string));

        assert_eq!(config.passpoint.realm, "roam.example.com");
        assert_eq!(config.provisioning.token_ttl_secs, 600);
        assert_eq!(config.server.addr.port(), 9000);
    }

    #[test]
    fn unparsable_env_values_are_ignored() {
        let mut config = Config::default();
        apply_env_overrides(&mut config, |k| {
            (k == "WAYFI_TOKEN_TTL_SECS").then(|| "soon".to_string())
        });
        assert_eq!(config.provisioning.token_ttl_secs, 86_400);
    }

    #[test]
    fn merge_replaces_lists_and_scalars() {
        let mut base = serde_json::json!({ "passpoint": { "roaming_consortium_ois": ["A", "B"] } });
        merge_layer(
            &mut base,
            serde_json::json!({ "passpoint": { "roaming_consortium_ois": ["C"] } }),
        );
        assert_eq!(
            base,
            serde_json::json!({ "passpoint": { "roaming_consortium_ois": ["C"] } })
        );
    }
}
