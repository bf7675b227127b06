//! Credential provisioning core.
//!
//! - [`resolver`]: the effective Passpoint deployment configuration
//! - [`issuer`]: idempotent credential issuance and revocation
//! - [`family`]: child profiles and single-purpose provisioning tokens
//! - [`accounts`]: registration and push status

pub mod accounts;
pub mod eap;
pub mod error;
pub mod family;
pub mod issuer;
pub mod policy;
pub mod resolver;


pub use accounts::{AccountService, PushState};
pub use eap::{EapMethod, InnerAuth};
pub use error::{ProvisionError, ProvisionResult};
pub use family::{ChildProvisioning, FamilyProvisioner, MintedToken, Redemption};
pub use issuer::{CredentialIssuer, IssuedCredential, IssuerSettings};
pub use policy::ContentPolicy;
pub use resolver::{ProfileConfigResolver, ResolvedConfig};
