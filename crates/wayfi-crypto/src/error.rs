//! Crypto error types.

/// Errors from secret generation.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// The OS random source could not be read. Never retried with a weaker source.
    #[error("Secure random source unavailable: {0}")]
    RandomUnavailable(String),

    #[error("Secret too short: minimum {minimum}, requested {requested}")]
    SecretTooShort { minimum: usize, requested: usize },
}
