//! wayfi Provisioning Server Library
//!
//! Credential provisioning for Passpoint/Hotspot 2.0 WiFi:
//! - SQLite storage for profiles, credentials, tokens and device heartbeats
//! - Profile config resolution and idempotent credential issuance
//! - iOS configuration profiles, Android manual settings and QR links
//! - Delegated (parent to child) provisioning with short-lived tokens
//! - Push-reachability gate and staleness sweep
//! - Notification sender and identity-provider token verification
//! - axum HTTP surface

pub mod artifacts;
pub mod auth;
pub mod http;
pub mod notifications;
pub mod provisioning;
pub mod reachability;
pub mod storage;
