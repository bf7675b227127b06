//! axum HTTP surface.

pub mod error;
pub mod extract;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use wayfi_core::Config;

use crate::auth::JwtVerifier;
use crate::notifications::Notifier;
use crate::provisioning::{
    AccountService, CredentialIssuer, FamilyProvisioner, IssuerSettings, ProfileConfigResolver,
};
use crate::reachability::ReachabilityGate;
use crate::storage::ProvisioningDatabase;

pub use error::ApiError;
pub use extract::Caller;

/// TTL of access tokens issued by [`JwtVerifier::issue_access_token`].
pub const ACCESS_TOKEN_TTL_SECS: i64 = 3600;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub issuer: CredentialIssuer,
    pub family: FamilyProvisioner,
    pub gate: ReachabilityGate,
    pub jwt: Arc<JwtVerifier>,
    pub public_base_url: Arc<str>,
}

impl AppState {
    /// Wire every service onto one database.
    pub fn new(db: ProvisioningDatabase, config: &Config, notifier: Notifier) -> Self {
        let resolver = ProfileConfigResolver::new(db.clone(), config.passpoint.clone());
        let issuer = CredentialIssuer::new(
            db.clone(),
            resolver,
            IssuerSettings::from(&config.provisioning),
        );
        let family = FamilyProvisioner::new(
            db.clone(),
            issuer.clone(),
            notifier,
            config.provisioning.token_ttl_secs,
        );

        Self {
            accounts: AccountService::new(db.clone()),
            issuer,
            family,
            gate: ReachabilityGate::new(db, config.provisioning.push_check_window_secs),
            jwt: Arc::new(JwtVerifier::new(
                config.auth.jwt_secret.as_bytes(),
                ACCESS_TOKEN_TTL_SECS,
            )),
            public_base_url: Arc::from(config.server.public_base_url.as_str()),
        }
    }
}

/// Build the router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(routes::healthz))
        .route("/api/profiles/me", post(routes::register_profile))
        .route("/api/profiles/me/push", put(routes::update_push_status))
        .route("/api/profiles/me/eligibility", get(routes::eligibility))
        .route("/api/devices/heartbeat", post(routes::heartbeat))
        .route("/api/credentials/me", get(routes::my_credential))
        .route("/api/credentials/me/mobileconfig", get(routes::my_mobileconfig))
        .route("/api/credentials/me/android", get(routes::my_android_settings))
        .route("/api/credentials/{id}", delete(routes::revoke_credential))
        .route("/api/credentials/{id}/tokens", post(routes::mint_token))
        .route(
            "/api/children",
            post(routes::create_child).get(routes::list_children),
        )
        .route("/api/provision/{token}", get(routes::redeem))
        .route(
            "/api/provision/{token}/mobileconfig",
            get(routes::redeem_mobileconfig),
        )
        .with_state(state)
}
