//! Access token validation (and issuance for tests and local development).

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use wayfi_core::db::unix_timestamp;

use super::claims::{ACCESS_TOKEN_TYPE, Claims};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),

    #[error("Expected an access token, got {0:?}")]
    WrongTokenType(String),
}

/// Verifies identity-provider access tokens.
#[derive(Clone)]
pub struct JwtVerifier {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl_secs: i64,
}

impl JwtVerifier {
    pub fn new(secret: &[u8], access_ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_ttl_secs,
        }
    }

    /// Issue an access token for a subject. Returns the token and its TTL.
    pub fn issue_access_token(
        &self,
        subject: &str,
        name: Option<&str>,
    ) -> Result<(String, i64), AuthError> {
        let now = unix_timestamp();
        let claims = Claims {
            jti: uuid::Uuid::new_v4().to_string(),
            sub: subject.to_string(),
            name: name.map(str::to_string),
            iat: now,
            exp: now + self.access_ttl_secs,
            token_type: ACCESS_TOKEN_TYPE.to_string(),
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok((token, self.access_ttl_secs))
    }

    /// Validate a bearer token and return its claims. Only access tokens are
    /// accepted.
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let data =
            jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &Validation::default())?;
        if !data.claims.is_access() {
            return Err(AuthError::WrongTokenType(data.claims.token_type));
        }
        Ok(data.claims)
    }
}
