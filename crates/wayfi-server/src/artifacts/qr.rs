//! QR-encodable provisioning links.
//!
//! The URL carries only the opaque token. Rendering it as an image is left
//! to the client.

use super::ArtifactError;

/// Path under which tokens are redeemed.
pub const PROVISION_PATH: &str = "/api/provision/";

/// Build the link for a token: `{base}/api/provision/{token}`.
pub fn provisioning_url(public_base_url: &str, token: &str) -> Result<String, ArtifactError> {
    if !wayfi_crypto::is_well_formed_token(token) {
        return Err(ArtifactError::MalformedToken);
    }

    let base = public_base_url.trim_end_matches('/');
    let has_host = base
        .strip_prefix("https://")
        .or_else(|| base.strip_prefix("http://"))
        .is_some_and(|rest| !rest.is_empty());
    if !has_host {
        return Err(ArtifactError::InvalidBaseUrl(public_base_url.to_string()));
    }

    Ok(format!("{base}{PROVISION_PATH}{token}"))
}

/// Extract the token from a link built by [`provisioning_url`].
pub fn token_from_url(url: &str) -> Option<&str> {
    let (_, rest) = url.rsplit_once(PROVISION_PATH)?;
    let token = rest.split(['?', '#', '/']).next()?;
    wayfi_crypto::is_well_formed_token(token).then_some(token)
}
