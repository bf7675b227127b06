//! JWT claims carried by identity-provider access tokens.

use serde::{Deserialize, Serialize};

/// Token type of an access token.
pub const ACCESS_TOKEN_TYPE: &str = "access";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// JWT ID (unique per token).
    pub jti: String,
    /// Identity-provider subject; the profile's `external_id`.
    pub sub: String,
    /// Display name suggested by the identity provider.
    #[serde(default)]
    pub name: Option<String>,
    pub iat: i64,
    pub exp: i64,
    pub token_type: String,
}

impl Claims {
    pub fn is_access(&self) -> bool {
        self.token_type == ACCESS_TOKEN_TYPE
    }
}
