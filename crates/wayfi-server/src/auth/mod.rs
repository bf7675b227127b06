//! Caller identity.
//!
//! Sessions belong to the external identity provider; this module only
//! verifies the HS256 access tokens it issues.

pub mod claims;
pub mod jwt;

pub use claims::Claims;
pub use jwt::{AuthError, JwtVerifier};
