//! HTTP mapping of provisioning errors.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{error, info, warn};

use crate::artifacts::ArtifactError;
use crate::provisioning::ProvisionError;

/// Error returned by every handler.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Provision(#[from] ProvisionError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    /// No usable bearer token.
    #[error("Authentication required: {0}")]
    Unauthenticated(String),
}

impl ApiError {
    /// Status code and machine-readable code.
    pub const fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Provision(e) => match e {
                ProvisionError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
                ProvisionError::Expired => (StatusCode::GONE, "expired"),
                ProvisionError::Unauthorized(_) => (StatusCode::FORBIDDEN, "forbidden"),
                ProvisionError::Validation(_) => (StatusCode::BAD_REQUEST, "validation"),
                ProvisionError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
                ProvisionError::ConfigurationMissing(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "configuration_missing")
                }
                ProvisionError::Storage(_) | ProvisionError::Secret(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
                }
                ProvisionError::ExternalService(_) => (StatusCode::BAD_GATEWAY, "external_service"),
            },
            Self::Artifact(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            Self::Unauthenticated(_) => (StatusCode::UNAUTHORIZED, "unauthenticated"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Provision(ProvisionError::ConfigurationMissing(detail)) => {
                error!(detail = %detail, "Provisioning halted: no deployment configuration");
                "Provisioning is temporarily unavailable".to_string()
            }
            Self::Provision(ProvisionError::Storage(_) | ProvisionError::Secret(_)) => {
                error!(error = %self, "Request failed");
                "Temporary failure; please retry".to_string()
            }
            Self::Artifact(e) => {
                error!(error = %e, "Artifact generation failed");
                "Internal server error".to_string()
            }
            Self::Provision(ProvisionError::Expired) => {
                info!("Expired provisioning link used");
                "This link has expired. Ask for a new one.".to_string()
            }
            Self::Provision(ProvisionError::Unauthorized(_)) | Self::Unauthenticated(_) => {
                warn!(error = %self, "Access denied");
                self.to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(json!({ "error": code, "message": message }))).into_response()
    }
}
