//! `wayfi` credential secret library
//!
//! Everything that touches randomness or hashing for provisioning lives here:
//!
//! - **Secrets**: mixed-case alphanumeric WiFi passwords drawn from the OS
//!   random source (never a userspace PRNG)
//! - **Tokens**: opaque provisioning-token strings handed out via QR/link
//! - **Digests**: SHA-256 hex digests so raw tokens are never stored

pub mod digest;
pub mod error;
pub mod secret;

pub use digest::token_digest;
pub use error::CryptoError;
pub use secret::{
    MIN_SECRET_LENGTH, TOKEN_LENGTH, generate_secret, generate_token, is_well_formed_token,
};
