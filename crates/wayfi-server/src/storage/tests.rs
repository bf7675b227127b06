//! Storage layer tests for the wayfi provisioning database.

#![allow(clippy::unwrap_used)]

use super::db::ProvisioningDatabase;
use super::queries_credentials::NewCredential;
use super::queries_passpoint::NewPasspointProfile;
use super::queries_profiles::{NewChildProfile, NewChildToken};
use wayfi_core::db::{DatabaseError, unix_timestamp};

async fn test_db() -> ProvisioningDatabase {
    ProvisioningDatabase::open_in_memory().await.unwrap()
}

async fn seeded_db() -> ProvisioningDatabase {
    let db = test_db().await;
    db.upsert_profile_by_external_id("p1", "idp|p1", "Pat")
        .await
        .unwrap();
    db.insert_passpoint_profile(&NewPasspointProfile {
        id: "pp1",
        is_default: true,
        is_active: true,
        ..Default::default()
    })
    .await
    .unwrap();
    db
}

fn new_credential<'a>(id: &'a str, profile_id: &'a str, username: &'a str) -> NewCredential<'a> {
    NewCredential {
        id,
        profile_id,
        passpoint_profile_id: "pp1",
        username,
        secret: "Secret0123456789Ab",
    }
}

// === Profile tests ===

#[tokio::test]
async fn upsert_profile_keeps_id_per_subject() {
    let db = test_db().await;
    let a = db
        .upsert_profile_by_external_id("p1", "idp|1", "Pat")
        .await
        .unwrap();
    let b = db
        .upsert_profile_by_external_id("p2", "idp|1", "Patricia")
        .await
        .unwrap();

    assert_eq!(a.id, "p1");
    assert_eq!(b.id, "p1");
    assert_eq!(b.display_name, "Patricia");
    assert_eq!(a.push_state, "unknown");
    assert_eq!(a.policy_label, "standard");
}

#[tokio::test]
async fn child_profile_records_manager() {
    let db = seeded_db().await;
    let child = db
        .create_child_profile("c1", "p1", "Alex", 10, "strict")
        .await
        .unwrap();

    assert!(child.is_child);
    assert_eq!(child.managed_by.as_deref(), Some("p1"));
    assert_eq!(child.age, Some(10));
    assert!(child.external_id.is_none());
}

#[tokio::test]
async fn child_without_existing_parent_is_rejected() {
    let db = test_db().await;
    assert!(
        db.create_child_profile("c1", "ghost", "Alex", 10, "strict")
            .await
            .is_err()
    );
}

#[tokio::test]
async fn child_flag_requires_manager() {
    let db = test_db().await;
    let now = unix_timestamp();
    let result = sqlx::query(
        "INSERT INTO account_profiles (id, display_name, is_child, created_at, updated_at) \
         VALUES ('x', 'Orphan', 1, ?, ?)",
    )
    .bind(now)
    .bind(now)
    .execute(db.pool())
    .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn missing_profile_is_not_found() {
    let db = test_db().await;
    assert!(matches!(
        db.get_profile("nope").await,
        Err(DatabaseError::NotFound(_))
    ));
}

#[tokio::test]
async fn push_state_update_reports_missing_rows() {
    let db = seeded_db().await;
    assert!(db.update_push_state("p1", "subscribed", 100).await.unwrap());
    assert!(!db.update_push_state("nope", "subscribed", 100).await.unwrap());

    let p = db.get_profile("p1").await.unwrap();
    assert_eq!(p.push_state, "subscribed");
    assert_eq!(p.push_checked_at, Some(100));
}

fn new_child<'a>(id: &'a str, name: &'a str) -> NewChildProfile<'a> {
    NewChildProfile {
        id,
        parent_id: "p1",
        display_name: name,
        age: 10,
        policy_label: "strict",
    }
}

#[tokio::test]
async fn child_with_credential_is_written_together() {
    let db = seeded_db().await;
    let expires_at = unix_timestamp() + 3600;

    let record = db
        .create_child_with_credential(
            &new_child("kid", "Alex"),
            &new_credential("c1", "kid", "ukid"),
            &NewChildToken {
                id: "t1",
                token_hash: "hash-1",
                expires_at,
            },
        )
        .await
        .unwrap();

    assert_eq!(record.owner.id, "kid");
    assert_eq!(record.owner.managed_by.as_deref(), Some("p1"));
    assert_eq!(record.credential.username, "ukid");
    assert!(record.credential.is_active);

    let token = db.get_provisioning_token("t1").await.unwrap();
    assert_eq!(token.credential_id, "c1");
    assert_eq!(token.created_by, "p1");
    assert_eq!(token.expires_at, expires_at);
}

#[tokio::test]
async fn child_with_credential_rolls_back_on_failure() {
    let db = seeded_db().await;
    db.insert_credential_if_absent(&new_credential("c0", "p1", "taken"))
        .await
        .unwrap();

    let err = db
        .create_child_with_credential(
            &new_child("kid", "Alex"),
            &new_credential("c1", "kid", "taken"),
            &NewChildToken {
                id: "t1",
                token_hash: "hash-1",
                expires_at: unix_timestamp() + 3600,
            },
        )
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    assert!(db.list_children("p1").await.unwrap().is_empty());
    assert!(matches!(
        db.get_profile("kid").await,
        Err(DatabaseError::NotFound(_))
    ));
    assert!(matches!(
        db.get_provisioning_token("t1").await,
        Err(DatabaseError::NotFound(_))
    ));
}

#[tokio::test]
async fn list_children_includes_children_without_credentials() {
    let db = seeded_db().await;
    db.create_child_profile("kid-a", "p1", "Alex", 10, "strict")
        .await
        .unwrap();
    db.create_child_profile("kid-b", "p1", "Sam", 16, "light")
        .await
        .unwrap();
    db.insert_credential_if_absent(&new_credential("c1", "kid-a", "ukida"))
        .await
        .unwrap();

    let mut children = db.list_children("p1").await.unwrap();
    children.sort_by(|a, b| a.display_name.cmp(&b.display_name));
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].display_name, "Alex");
    assert_eq!(children[0].username.as_deref(), Some("ukida"));
    assert_eq!(children[1].display_name, "Sam");
    assert!(children[1].credential_id.is_none());

    assert!(db.list_children("kid-a").await.unwrap().is_empty());
}

// === Passpoint tests ===

#[tokio::test]
async fn default_active_listing_ignores_inactive() {
    let db = seeded_db().await;
    db.insert_passpoint_profile(&NewPasspointProfile {
        id: "pp-off",
        is_default: true,
        is_active: false,
        ..Default::default()
    })
    .await
    .unwrap();

    let rows = db.list_default_active_passpoint().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, "pp1");
}

#[tokio::test]
async fn set_default_passpoint_is_exclusive() {
    let db = seeded_db().await;
    db.insert_passpoint_profile(&NewPasspointProfile {
        id: "pp2",
        realm: Some("roam.example.com"),
        is_active: true,
        ..Default::default()
    })
    .await
    .unwrap();

    db.set_default_passpoint("pp2").await.unwrap();
    let rows = db.list_default_active_passpoint().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, "pp2");

    assert!(matches!(
        db.set_default_passpoint("missing").await,
        Err(DatabaseError::NotFound(_))
    ));
    // The failed call rolled back.
    assert_eq!(db.list_default_active_passpoint().await.unwrap()[0].id, "pp2");
}

// === Credential tests ===

#[tokio::test]
async fn insert_if_absent_keeps_first_credential() {
    let db = seeded_db().await;

    assert!(
        db.insert_credential_if_absent(&new_credential("c1", "p1", "ua"))
            .await
            .unwrap()
    );
    assert!(
        !db.insert_credential_if_absent(&new_credential("c2", "p1", "ub"))
            .await
            .unwrap()
    );

    let active = db.get_active_credential("p1", "pp1").await.unwrap().unwrap();
    assert_eq!(active.id, "c1");
    assert_eq!(active.username, "ua");
    assert_eq!(db.count_active_credentials("p1").await.unwrap(), 1);
    assert!(!db.username_exists("ub").await.unwrap());
}

#[tokio::test]
async fn duplicate_username_is_a_conflict() {
    let db = seeded_db().await;
    db.upsert_profile_by_external_id("p2", "idp|p2", "Quinn")
        .await
        .unwrap();

    db.insert_credential_if_absent(&new_credential("c1", "p1", "same"))
        .await
        .unwrap();
    let err = db
        .insert_credential_if_absent(&new_credential("c2", "p2", "same"))
        .await
        .unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
async fn deactivated_credential_frees_the_pair() {
    let db = seeded_db().await;
    db.insert_credential_if_absent(&new_credential("c1", "p1", "ua"))
        .await
        .unwrap();

    assert!(db.deactivate_credential("c1").await.unwrap());
    assert!(!db.deactivate_credential("c1").await.unwrap());
    assert!(db.get_active_credential("p1", "pp1").await.unwrap().is_none());

    assert!(
        db.insert_credential_if_absent(&new_credential("c2", "p1", "ub"))
            .await
            .unwrap()
    );
    // The old row is kept, inactive.
    assert!(!db.get_credential("c1").await.unwrap().is_active);
    assert!(db.username_exists("ua").await.unwrap());
}

#[tokio::test]
async fn touch_moves_only_last_used() {
    let db = seeded_db().await;
    db.insert_credential_if_absent(&new_credential("c1", "p1", "ua"))
        .await
        .unwrap();
    let before = db.get_credential("c1").await.unwrap();

    db.touch_credential("c1", before.last_used_at + 500)
        .await
        .unwrap();
    let after = db.get_credential("c1").await.unwrap();
    assert_eq!(after.last_used_at, before.last_used_at + 500);
    assert_eq!(after.provisioned_at, before.provisioned_at);
    assert_eq!(after.secret, before.secret);
}

#[tokio::test]
async fn credential_with_profile_is_typed_join() {
    let db = seeded_db().await;
    db.create_child_profile("kid", "p1", "Alex", 10, "strict")
        .await
        .unwrap();
    db.insert_credential_if_absent(&new_credential("c1", "kid", "ukid"))
        .await
        .unwrap();

    let record = db.get_credential_with_profile("c1").await.unwrap().unwrap();
    assert_eq!(record.credential.username, "ukid");
    assert_eq!(record.owner.id, "kid");
    assert_eq!(record.owner.managed_by.as_deref(), Some("p1"));

    assert!(db.get_credential_with_profile("nope").await.unwrap().is_none());
}

#[tokio::test]
async fn secrets_are_redacted_in_debug_output() {
    let db = seeded_db().await;
    db.insert_credential_if_absent(&new_credential("c1", "p1", "ua"))
        .await
        .unwrap();
    let c = db.get_credential("c1").await.unwrap();
    let debug = format!("{c:?}");
    assert!(!debug.contains("Secret0123456789Ab"));
    assert!(debug.contains("[REDACTED]"));
}

// === Token tests ===

async fn seeded_token(expires_at: i64) -> ProvisioningDatabase {
    let db = seeded_db().await;
    db.create_child_profile("kid", "p1", "Alex", 10, "strict")
        .await
        .unwrap();
    db.insert_credential_if_absent(&new_credential("c1", "kid", "ukid"))
        .await
        .unwrap();
    db.create_provisioning_token("t1", "hash-1", "c1", "p1", expires_at)
        .await
        .unwrap();
    db
}

#[tokio::test]
async fn token_lookup_joins_credential_and_owner() {
    let db = seeded_token(unix_timestamp() + 3600).await;

    let record = db.get_token_with_credential("hash-1").await.unwrap().unwrap();
    assert_eq!(record.token.id, "t1");
    assert!(record.token.used_at.is_none());
    assert_eq!(record.credential.id, "c1");
    assert_eq!(record.owner.display_name, "Alex");

    assert!(db.get_token_with_credential("other").await.unwrap().is_none());
}

#[tokio::test]
async fn expired_tokens_are_still_returned_by_lookup() {
    let db = seeded_token(unix_timestamp() - 60).await;
    assert!(db.get_token_with_credential("hash-1").await.unwrap().is_some());
}

#[tokio::test]
async fn consuming_keeps_first_used_at() {
    let now = unix_timestamp();
    let db = seeded_token(now + 3600).await;

    assert!(db.mark_token_consumed("t1", now).await.unwrap());
    assert!(db.mark_token_consumed("t1", now + 10).await.unwrap());

    let token = db.get_provisioning_token("t1").await.unwrap();
    assert_eq!(token.used_at, Some(now));
}

#[tokio::test]
async fn consuming_an_expired_token_writes_nothing() {
    let now = unix_timestamp();
    let db = seeded_token(now - 1).await;

    assert!(!db.mark_token_consumed("t1", now).await.unwrap());
    assert!(db.get_provisioning_token("t1").await.unwrap().used_at.is_none());
}

#[tokio::test]
async fn duplicate_token_hash_is_a_conflict() {
    let db = seeded_token(unix_timestamp() + 3600).await;
    let err = db
        .create_provisioning_token("t2", "hash-1", "c1", "p1", unix_timestamp() + 3600)
        .await
        .unwrap_err();
    assert!(err.is_conflict());
}

// === Device tests ===

#[tokio::test]
async fn heartbeat_upsert_reactivates_device() {
    let db = seeded_db().await;
    db.upsert_heartbeat("d1", "p1", "phone", Some("fcm-1"), 100)
        .await
        .unwrap();
    db.mark_stale_devices(200).await.unwrap();
    assert!(!db.get_devices_for_profile("p1").await.unwrap()[0].is_installed);

    let hb = db
        .upsert_heartbeat("d2", "p1", "phone", None, 300)
        .await
        .unwrap();
    assert_eq!(hb.id, "d1");
    assert!(hb.is_installed);
    assert!(hb.is_active);
    assert_eq!(hb.last_heartbeat_at, 300);
    assert_eq!(hb.push_subscription_id.as_deref(), Some("fcm-1"));
}

#[tokio::test]
async fn push_targets_skip_uninstalled_and_unsubscribed_devices() {
    let db = seeded_db().await;
    db.upsert_heartbeat("d1", "p1", "phone", Some("fcm-1"), 100)
        .await
        .unwrap();
    db.upsert_heartbeat("d2", "p1", "tablet", None, 100)
        .await
        .unwrap();
    db.upsert_heartbeat("d3", "p1", "old", Some("fcm-3"), 10)
        .await
        .unwrap();
    db.mark_stale_devices(50).await.unwrap();

    assert_eq!(db.push_targets_for_profile("p1").await.unwrap(), vec!["fcm-1"]);
}

#[tokio::test]
async fn stale_marking_is_idempotent() {
    let db = seeded_db().await;
    db.upsert_heartbeat("d1", "p1", "phone", None, 10)
        .await
        .unwrap();

    assert_eq!(db.mark_stale_devices(50).await.unwrap(), 1);
    assert_eq!(db.mark_stale_devices(50).await.unwrap(), 0);
}
