//! Request extractors.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use tracing::debug;

use super::AppState;
use super::error::ApiError;

/// The authenticated caller, taken from an identity-provider bearer token.
#[derive(Debug, Clone)]
pub struct Caller {
    /// Identity-provider subject.
    pub subject: String,
    pub name: Option<String>,
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthenticated("missing bearer token".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Unauthenticated("malformed authorization header".to_string()))?;

        let claims = state.jwt.validate(token).map_err(|e| {
            debug!(error = %e, "Bearer token rejected");
            ApiError::Unauthenticated("invalid or expired token".to_string())
        })?;

        Ok(Self {
            subject: claims.sub,
            name: claims.name,
        })
    }
}
