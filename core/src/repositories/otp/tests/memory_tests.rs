//! Unit tests for the in-memory OTP record store

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::domain::entities::otp_record::{OtpKey, OtpPurpose, OtpRecord};
use crate::repositories::otp::{AttemptOutcome, InMemoryOtpStore, OtpRecordStore};

fn pending(identity: &str, purpose: OtpPurpose) -> OtpRecord {
    OtpRecord::issue(identity, purpose, "123456", Utc::now(), purpose.expiry())
}

#[tokio::test]
async fn test_upsert_replaces_record_for_same_key() {
    let store = InMemoryOtpStore::new();
    let first = pending("a@x.com", OtpPurpose::Register);
    let second = pending("a@x.com", OtpPurpose::Register);

    store.upsert(&first).await.unwrap();
    store.upsert(&second).await.unwrap();

    assert_eq!(store.len().await, 1);
    let stored = store.get(&first.key()).await.unwrap().unwrap();
    assert_eq!(stored.issuance_id, second.issuance_id);
}

#[tokio::test]
async fn test_purposes_are_isolated() {
    let store = InMemoryOtpStore::new();
    store.upsert(&pending("a@x.com", OtpPurpose::Register)).await.unwrap();
    store.upsert(&pending("a@x.com", OtpPurpose::ResetPassword)).await.unwrap();

    assert_eq!(store.len().await, 2);
    store
        .delete(&OtpKey::new("a@x.com", OtpPurpose::Register))
        .await
        .unwrap();
    assert!(store
        .get(&OtpKey::new("a@x.com", OtpPurpose::ResetPassword))
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_compare_and_swap() {
    let store = InMemoryOtpStore::new();
    let first = pending("a@x.com", OtpPurpose::Register);

    assert!(store.compare_and_swap(&first, None).await.unwrap());
    // A second "insert if absent" loses
    let rival = pending("a@x.com", OtpPurpose::Register);
    assert!(!store.compare_and_swap(&rival, None).await.unwrap());
    // Swapping against the current issuance wins
    assert!(store.compare_and_swap(&rival, Some(first.issuance_id)).await.unwrap());
    // Swapping against a stale issuance loses
    let late = pending("a@x.com", OtpPurpose::Register);
    assert!(!store.compare_and_swap(&late, Some(first.issuance_id)).await.unwrap());
}

#[tokio::test]
async fn test_increment_attempts_is_guarded_by_issuance() {
    let store = InMemoryOtpStore::new();
    let record = pending("a@x.com", OtpPurpose::Register);
    let key = record.key();
    store.upsert(&record).await.unwrap();

    assert_eq!(
        store.increment_attempts(&key, record.issuance_id, 5).await.unwrap(),
        AttemptOutcome::Applied(1)
    );
    assert_eq!(
        store.increment_attempts(&key, record.issuance_id, 5).await.unwrap(),
        AttemptOutcome::Applied(2)
    );
    assert_eq!(
        store.increment_attempts(&key, Uuid::new_v4(), 5).await.unwrap(),
        AttemptOutcome::Stale
    );

    let stored = store.get(&key).await.unwrap().unwrap();
    assert_eq!(stored.attempts, 2);
}

#[tokio::test]
async fn test_attempt_cap_is_enforced_by_store() {
    let store = InMemoryOtpStore::new();
    let record = pending("a@x.com", OtpPurpose::Register);
    let key = record.key();
    store.upsert(&record).await.unwrap();

    for _ in 0..3 {
        store.increment_attempts(&key, record.issuance_id, 3).await.unwrap();
    }
    assert_eq!(
        store.increment_attempts(&key, record.issuance_id, 3).await.unwrap(),
        AttemptOutcome::Exhausted
    );
    assert_eq!(
        store.mark_verified(&key, record.issuance_id, 3).await.unwrap(),
        AttemptOutcome::Exhausted
    );

    let stored = store.get(&key).await.unwrap().unwrap();
    assert_eq!(stored.attempts, 3);
    assert!(!stored.verified);
}

#[tokio::test]
async fn test_mark_verified_only_once() {
    let store = InMemoryOtpStore::new();
    let record = pending("a@x.com", OtpPurpose::ResetPassword);
    let key = record.key();
    store.upsert(&record).await.unwrap();

    assert_eq!(
        store.mark_verified(&key, record.issuance_id, 5).await.unwrap(),
        AttemptOutcome::Applied(0)
    );
    assert_eq!(
        store.mark_verified(&key, record.issuance_id, 5).await.unwrap(),
        AttemptOutcome::Stale
    );
    // Verified records no longer take attempts
    assert_eq!(
        store.increment_attempts(&key, record.issuance_id, 5).await.unwrap(),
        AttemptOutcome::Stale
    );
}

#[tokio::test]
async fn test_delete_issuance_ignores_newer_record() {
    let store = InMemoryOtpStore::new();
    let old = pending("a@x.com", OtpPurpose::Register);
    let new = pending("a@x.com", OtpPurpose::Register);
    store.upsert(&new).await.unwrap();

    assert!(!store.delete_issuance(&old.key(), old.issuance_id).await.unwrap());
    assert!(store.delete_issuance(&new.key(), new.issuance_id).await.unwrap());
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_purge_expired() {
    let store = InMemoryOtpStore::new();
    let now = Utc::now();
    let stale = OtpRecord::issue("old@x.com", OtpPurpose::Register, "111111", now - Duration::minutes(6), Duration::minutes(5));
    let live = OtpRecord::issue("new@x.com", OtpPurpose::Register, "222222", now, Duration::minutes(5));
    store.upsert(&stale).await.unwrap();
    store.upsert(&live).await.unwrap();

    assert_eq!(store.purge_expired(now).await.unwrap(), 1);
    assert!(store.get(&live.key()).await.unwrap().is_some());
}
