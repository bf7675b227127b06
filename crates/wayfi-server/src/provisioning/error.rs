//! Provisioning error taxonomy.

use wayfi_core::db::DatabaseError;
use wayfi_crypto::CryptoError;

use crate::notifications::NotificationError;

/// Errors surfaced by the provisioning core.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    /// Profile, credential, token or passpoint profile absent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The caller lacks the required relationship to the resource.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The provisioning token is past its expiry.
    #[error("Provisioning token expired; request a new one")]
    Expired,

    /// A uniqueness race that could not be resolved by re-reading.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// No usable default + active Passpoint profile. A deployment problem,
    /// not a user error.
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    /// Malformed input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Transient storage failure; callers may retry.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Notification delivery failed. Never returned from a provisioning
    /// operation; only logged.
    #[error("External service error: {0}")]
    ExternalService(String),

    /// The secure random source failed.
    #[error("Secret generation failed: {0}")]
    Secret(#[from] CryptoError),
}

impl From<DatabaseError> for ProvisionError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::NotFound(what) => Self::NotFound(what),
            DatabaseError::Conflict(what) => Self::Conflict(what),
            other => Self::Storage(other.to_string()),
        }
    }
}

impl From<NotificationError> for ProvisionError {
    fn from(e: NotificationError) -> Self {
        Self::ExternalService(e.to_string())
    }
}

/// Result alias for provisioning operations.
pub type ProvisionResult<T> = Result<T, ProvisionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_errors_map_onto_taxonomy() {
        assert!(matches!(
            ProvisionError::from(DatabaseError::NotFound("Profile p1".into())),
            ProvisionError::NotFound(_)
        ));
        assert!(matches!(
            ProvisionError::from(DatabaseError::Conflict("username".into())),
            ProvisionError::Conflict(_)
        ));
        assert!(matches!(
            ProvisionError::from(DatabaseError::Connection("gone".into())),
            ProvisionError::Storage(_)
        ));
    }

    #[test]
    fn notification_failures_are_external() {
        let e = ProvisionError::from(NotificationError::ApiError {
            status: 404,
            body: "UNREGISTERED".into(),
        });
        assert!(matches!(e, ProvisionError::ExternalService(ref m) if m.contains("404")));
    }
}
