use std::time::Duration;

use memberid::auth::ConsentService;
use memberid::models::ConsentState;
use memberid::repos::sqlite::SqliteIdentityRepo;
use memberid::repos::ConsentStore;

#[path = "common.rs"]
mod common;

fn consent_service(pool: &memberid::db::DbPool) -> ConsentService {
    ConsentService::new(SqliteIdentityRepo::new(pool.clone()))
}

#[tokio::test]
async fn grant_then_get_round_trips() {
    let test_db = common::init_test_db().expect("init db");
    let user = common::seed_user(&test_db.pool, "jmember", "pw");
    let service = common::seed_service(&test_db.pool, "svc-a", "calendar", 89);
    let consents = consent_service(&test_db.pool);

    let granted = consents
        .grant_consent(user, service, ConsentState::Agreed, 89)
        .await
        .unwrap();
    assert_eq!(granted.state(), ConsentState::Agreed);
    assert_eq!(granted.data_permissions, 89);

    let read = consents.get_consent(user, service).await.unwrap().unwrap();
    assert_eq!(read.state(), ConsentState::Agreed);
    assert_eq!(read.data_permissions, 89);
    assert_eq!(read.created, granted.created);
}

#[tokio::test]
async fn regrant_updates_modified_and_preserves_created() {
    let test_db = common::init_test_db().expect("init db");
    let user = common::seed_user(&test_db.pool, "jmember", "pw");
    let service = common::seed_service(&test_db.pool, "svc-a", "calendar", 89);
    let consents = consent_service(&test_db.pool);

    let first = consents
        .grant_consent(user, service, ConsentState::Agreed, 89)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    let second = consents
        .grant_consent(user, service, ConsentState::Agreed, 2047)
        .await
        .unwrap();

    assert_eq!(second.id, first.id, "upsert must reuse the single row");
    assert_eq!(second.created, first.created);
    assert_ne!(second.modified, first.modified);
    assert_eq!(second.data_permissions, 2047);
}

#[tokio::test]
async fn revoke_is_idempotent_and_keeps_the_row() {
    let test_db = common::init_test_db().expect("init db");
    let user = common::seed_user(&test_db.pool, "jmember", "pw");
    let service = common::seed_service(&test_db.pool, "svc-a", "calendar", 89);
    let consents = consent_service(&test_db.pool);

    consents
        .grant_consent(user, service, ConsentState::Agreed, 2047)
        .await
        .unwrap();

    for _ in 0..2 {
        consents.revoke(user, service).await.unwrap();
        let row = consents.get_consent(user, service).await.unwrap().unwrap();
        assert_eq!(row.state(), ConsentState::NotAgreed);
        // The granted mask is history, not deleted with the revocation.
        assert_eq!(row.data_permissions, 2047);
    }
}

#[tokio::test]
async fn revoke_without_a_grant_is_a_noop() {
    let test_db = common::init_test_db().expect("init db");
    let user = common::seed_user(&test_db.pool, "jmember", "pw");
    let service = common::seed_service(&test_db.pool, "svc-a", "calendar", 89);
    let consents = consent_service(&test_db.pool);

    consents.revoke(user, service).await.unwrap();
    assert!(consents.get_consent(user, service).await.unwrap().is_none());
}

#[tokio::test]
async fn authorization_requires_full_mask_coverage() {
    let test_db = common::init_test_db().expect("init db");
    let user = common::seed_user(&test_db.pool, "jmember", "pw");
    let service = common::seed_service(&test_db.pool, "svc-a", "calendar", 89);
    let consents = consent_service(&test_db.pool);

    // No row at all.
    assert!(!consents.is_authorized(user, service, 89).await.unwrap());

    // Nonzero but insufficient grant.
    consents
        .grant_consent(user, service, ConsentState::Agreed, 16)
        .await
        .unwrap();
    assert!(!consents.is_authorized(user, service, 89).await.unwrap());

    // Full coverage.
    consents
        .grant_consent(user, service, ConsentState::Agreed, 2047)
        .await
        .unwrap();
    assert!(consents.is_authorized(user, service, 89).await.unwrap());

    // Agreed state is required, whatever the mask says.
    consents.revoke(user, service).await.unwrap();
    assert!(!consents.is_authorized(user, service, 89).await.unwrap());
}

#[tokio::test]
async fn policy_update_outdates_agreed_rows_only() {
    let test_db = common::init_test_db().expect("init db");
    let alice = common::seed_user(&test_db.pool, "alice", "pw");
    let bob = common::seed_user(&test_db.pool, "bob", "pw");
    let carol = common::seed_user(&test_db.pool, "carol", "pw");
    let service = common::seed_service(&test_db.pool, "svc-a", "calendar", 89);
    let consents = consent_service(&test_db.pool);

    consents.grant_consent(alice, service, ConsentState::Agreed, 2047).await.unwrap();
    consents.grant_consent(bob, service, ConsentState::Agreed, 2047).await.unwrap();
    consents.grant_consent(carol, service, ConsentState::Agreed, 2047).await.unwrap();
    consents.revoke(carol, service).await.unwrap();

    let touched = consents.mark_policy_outdated(service).await.unwrap();
    assert_eq!(touched, 2);

    let alice_row = consents.get_consent(alice, service).await.unwrap().unwrap();
    assert_eq!(alice_row.state(), ConsentState::AgreedOutdated);
    let carol_row = consents.get_consent(carol, service).await.unwrap().unwrap();
    assert_eq!(carol_row.state(), ConsentState::NotAgreed);

    // Outdated agreement still authorizes until the user acts on it.
    assert!(consents.is_authorized(alice, service, 89).await.unwrap());

    // Re-consent returns to plain Agreed.
    let regranted = consents
        .grant_consent(alice, service, ConsentState::Agreed, 2047)
        .await
        .unwrap();
    assert_eq!(regranted.state(), ConsentState::Agreed);
}

#[tokio::test]
async fn concurrent_grants_settle_on_one_row() {
    let test_db = common::init_test_db().expect("init db");
    let user = common::seed_user(&test_db.pool, "jmember", "pw");
    let service = common::seed_service(&test_db.pool, "svc-a", "calendar", 89);

    let repo = SqliteIdentityRepo::new(test_db.pool.clone());
    let mut handles = Vec::new();
    for mask in [1, 3, 7, 15, 31] {
        let repo = repo.clone();
        handles.push(tokio::spawn(async move {
            repo.upsert_consent(user, service, ConsentState::Agreed, mask).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let consents = consent_service(&test_db.pool);
    let row = consents.get_consent(user, service).await.unwrap().unwrap();
    assert_eq!(row.state(), ConsentState::Agreed);
    assert!([1, 3, 7, 15, 31].contains(&row.data_permissions), "last write wins");
}
