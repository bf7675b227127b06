//! Route handlers.
//!
//! Authenticated handlers resolve the caller's profile from the bearer
//! token subject; the provision routes are reachable with a token alone.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::http::header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use wayfi_core::db::unix_timestamp;

use super::AppState;
use super::error::ApiError;
use super::extract::Caller;
use crate::artifacts::{self, AndroidSettings, MOBILECONFIG_CONTENT_TYPE, MobileConfig, qr};
use crate::provisioning::{ProvisionError, PushState, Redemption};
use crate::reachability::Eligibility;
use crate::storage::{AccountProfile, ChildSummary};

type ApiResult<T> = Result<T, ApiError>;

const NO_STORE: &str = "no-store";

// =========================================================================
// Request / response bodies
// =========================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PushStatusRequest {
    pub state: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatRequest {
    pub device_id: String,
    #[serde(default)]
    pub push_subscription_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateChildRequest {
    pub name: String,
    pub age: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub id: String,
    pub display_name: String,
    pub is_child: bool,
    pub policy_label: String,
    pub push_state: String,
    pub push_checked_at: Option<i64>,
}

impl From<AccountProfile> for ProfileView {
    fn from(p: AccountProfile) -> Self {
        Self {
            id: p.id,
            display_name: p.display_name,
            is_child: p.is_child,
            policy_label: p.policy_label,
            push_state: p.push_state,
            push_checked_at: p.push_checked_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatResponse {
    pub device_id: String,
    pub last_heartbeat_at: i64,
    pub is_installed: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialView {
    pub credential_id: String,
    pub username: String,
    pub identity: String,
    pub secret: String,
    pub realm: String,
    pub ssid: String,
    pub friendly_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildCreatedResponse {
    pub child_profile_id: String,
    pub credential_id: String,
    pub username: String,
    pub policy_label: String,
    pub token: String,
    pub expires_at: i64,
    pub qr_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildView {
    pub profile_id: String,
    pub display_name: String,
    pub age: Option<i64>,
    pub policy_label: String,
    pub credential_id: Option<String>,
    pub username: Option<String>,
}

impl From<ChildSummary> for ChildView {
    fn from(c: ChildSummary) -> Self {
        Self {
            profile_id: c.profile_id,
            display_name: c.display_name,
            age: c.age,
            policy_label: c.policy_label,
            credential_id: c.credential_id,
            username: c.username,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
    pub expires_at: i64,
    pub qr_url: String,
}

#[derive(Debug, Serialize)]
pub struct RevokeResponse {
    pub revoked: bool,
}

// =========================================================================
// Handlers
// =========================================================================

/// `GET /healthz`
pub async fn healthz() -> &'static str {
    "ok"
}

/// `POST /api/profiles/me`
pub async fn register_profile(
    State(state): State<AppState>,
    caller: Caller,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<ProfileView>> {
    let name = req
        .display_name
        .or(caller.name)
        .unwrap_or_default();
    let profile = state.accounts.register_profile(&caller.subject, &name).await?;
    Ok(Json(profile.into()))
}

/// `PUT /api/profiles/me/push`
pub async fn update_push_status(
    State(state): State<AppState>,
    caller: Caller,
    Json(req): Json<PushStatusRequest>,
) -> ApiResult<Json<ProfileView>> {
    let push_state = PushState::parse(&req.state).ok_or_else(|| {
        ProvisionError::Validation(
            "state must be one of subscribed, unsubscribed, denied".to_string(),
        )
    })?;
    let profile = state.accounts.profile_for_subject(&caller.subject).await?;
    let updated = state
        .accounts
        .update_push_status(&profile.id, push_state)
        .await?;
    Ok(Json(updated.into()))
}

/// `GET /api/profiles/me/eligibility`
pub async fn eligibility(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Json<Eligibility>> {
    let profile = state.accounts.profile_for_subject(&caller.subject).await?;
    let eligibility = state
        .gate
        .is_network_eligible(&profile.id, unix_timestamp())
        .await?;
    Ok(Json(eligibility))
}

/// `POST /api/devices/heartbeat`
pub async fn heartbeat(
    State(state): State<AppState>,
    caller: Caller,
    Json(req): Json<HeartbeatRequest>,
) -> ApiResult<Json<HeartbeatResponse>> {
    let profile = state.accounts.profile_for_subject(&caller.subject).await?;
    let hb = state
        .gate
        .record_heartbeat(
            &profile.id,
            &req.device_id,
            req.push_subscription_id.as_deref(),
        )
        .await?;
    Ok(Json(HeartbeatResponse {
        device_id: hb.device_id,
        last_heartbeat_at: hb.last_heartbeat_at,
        is_installed: hb.is_installed,
    }))
}

/// `GET /api/credentials/me`
pub async fn my_credential(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Response> {
    let profile = state.accounts.profile_for_subject(&caller.subject).await?;
    let issued = state.issuer.ensure_credential(&profile.id).await?;

    let view = CredentialView {
        identity: format!("{}@{}", issued.credential.username, issued.config.realm),
        credential_id: issued.credential.id,
        username: issued.credential.username,
        secret: issued.credential.secret,
        realm: issued.config.realm,
        ssid: issued.config.ssid,
        friendly_name: issued.config.friendly_name,
    };
    Ok(([(CACHE_CONTROL, NO_STORE)], Json(view)).into_response())
}

/// `GET /api/credentials/me/mobileconfig`
pub async fn my_mobileconfig(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Response> {
    let profile = state.accounts.profile_for_subject(&caller.subject).await?;
    let issued = state.issuer.ensure_credential(&profile.id).await?;
    let doc = artifacts::mobileconfig::generate(&issued.credential, &issued.config)?;
    Ok(mobileconfig_response(&doc, &MobileConfig::file_name(&issued.config)))
}

/// `GET /api/credentials/me/android`
pub async fn my_android_settings(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Response> {
    let profile = state.accounts.profile_for_subject(&caller.subject).await?;
    let issued = state.issuer.ensure_credential(&profile.id).await?;
    let settings: AndroidSettings =
        artifacts::android::generate(&issued.credential, &issued.config)?;
    Ok(([(CACHE_CONTROL, NO_STORE)], Json(settings)).into_response())
}

/// `POST /api/children`
pub async fn create_child(
    State(state): State<AppState>,
    caller: Caller,
    Json(req): Json<CreateChildRequest>,
) -> ApiResult<(StatusCode, Json<ChildCreatedResponse>)> {
    let parent = state.accounts.profile_for_subject(&caller.subject).await?;
    let result = state
        .family
        .create_child_profile(&parent.id, &req.name, req.age)
        .await?;
    let qr_url = qr::provisioning_url(&state.public_base_url, &result.token.token)?;

    Ok((
        StatusCode::CREATED,
        Json(ChildCreatedResponse {
            child_profile_id: result.child.id,
            credential_id: result.credential.id,
            username: result.credential.username,
            policy_label: result.child.policy_label,
            token: result.token.token,
            expires_at: result.token.expires_at,
            qr_url,
        }),
    ))
}

/// `GET /api/children`
pub async fn list_children(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Json<Vec<ChildView>>> {
    let parent = state.accounts.profile_for_subject(&caller.subject).await?;
    let children = state.family.list_children(&parent.id).await?;
    Ok(Json(children.into_iter().map(ChildView::from).collect()))
}

/// `POST /api/credentials/{id}/tokens`
pub async fn mint_token(
    State(state): State<AppState>,
    caller: Caller,
    Path(credential_id): Path<String>,
) -> ApiResult<(StatusCode, Json<TokenResponse>)> {
    let requester = state.accounts.profile_for_subject(&caller.subject).await?;
    let minted = state
        .family
        .mint_provisioning_token(&credential_id, &requester.id)
        .await?;
    let qr_url = qr::provisioning_url(&state.public_base_url, &minted.token)?;

    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            token: minted.token,
            expires_at: minted.expires_at,
            qr_url,
        }),
    ))
}

/// `DELETE /api/credentials/{id}`
pub async fn revoke_credential(
    State(state): State<AppState>,
    caller: Caller,
    Path(credential_id): Path<String>,
) -> ApiResult<Json<RevokeResponse>> {
    let requester = state.accounts.profile_for_subject(&caller.subject).await?;
    let revoked = state
        .issuer
        .revoke_credential(&credential_id, &requester.id)
        .await?;
    Ok(Json(RevokeResponse { revoked }))
}

/// `GET /api/provision/{token}` (unauthenticated)
pub async fn redeem(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<Response> {
    let redemption: Redemption = state.family.redeem_token(&token).await?;
    Ok(([(CACHE_CONTROL, NO_STORE)], Json(redemption)).into_response())
}

/// `GET /api/provision/{token}/mobileconfig` (unauthenticated)
pub async fn redeem_mobileconfig(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<Response> {
    let redemption = state.family.redeem_token(&token).await?;
    let config = state
        .issuer
        .resolver()
        .resolve_for(&redemption.credential.passpoint_profile_id)
        .await?;
    let doc = artifacts::mobileconfig::generate(&redemption.credential, &config)?;
    Ok(mobileconfig_response(&doc, &MobileConfig::file_name(&config)))
}

fn mobileconfig_response(doc: &MobileConfig, file_name: &str) -> Response {
    (
        [
            (CONTENT_TYPE, MOBILECONFIG_CONTENT_TYPE.to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
            (CACHE_CONTROL, NO_STORE.to_string()),
        ],
        doc.xml.clone(),
    )
        .into_response()
}
