//! Artifact Generators: pure transforms from an issued credential and its
//! resolved configuration to something a device can install or display.
//!
//! None of these touch storage. Callers must only pass active credentials.

pub mod android;
pub mod mobileconfig;
pub mod plist;
pub mod qr;

use crate::storage::WifiCredential;

pub use android::AndroidSettings;
pub use mobileconfig::{MOBILECONFIG_CONTENT_TYPE, MobileConfig};

/// Malformed generator input.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// A field contains a character XML 1.0 cannot carry.
    #[error("Character U+{0:04X} cannot be represented in a configuration profile")]
    UnrepresentableCharacter(u32),

    /// The credential is revoked.
    #[error("Credential {0} is not active")]
    InactiveCredential(String),

    /// Not a token produced by the token generator.
    #[error("Malformed provisioning token")]
    MalformedToken,

    /// The public base URL is not an absolute http(s) URL.
    #[error("Invalid public base URL: {0}")]
    InvalidBaseUrl(String),
}

fn require_active(credential: &WifiCredential) -> Result<(), ArtifactError> {
    if credential.is_active {
        Ok(())
    } else {
        Err(ArtifactError::InactiveCredential(credential.id.clone()))
    }
}
