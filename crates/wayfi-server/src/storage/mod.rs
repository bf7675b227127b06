//! SQLite storage for the wayfi provisioning server.
//!
//! Provides persistence for account profiles, Passpoint deployment profiles,
//! WiFi credentials, provisioning tokens, and device heartbeats.

mod db;
mod models;
mod queries_credentials;
mod queries_devices;
mod queries_passpoint;
mod queries_profiles;
mod queries_tokens;

#[cfg(test)]
mod tests;

pub use db::ProvisioningDatabase;
pub use models::*;
pub use queries_credentials::NewCredential;
pub use queries_passpoint::NewPasspointProfile;
pub use queries_profiles::{NewChildProfile, NewChildToken};
pub use wayfi_core::db::DatabaseError;
