use chrono::{Duration, Utc};
use std::sync::Arc;

use crate::domain::entities::otp_record::{OtpPurpose, OtpRecord};
use crate::repositories::otp::{InMemoryOtpStore, OtpRecordStore};
use crate::services::otp::{ManualClock, OtpCleanupConfig, OtpCleanupService};

#[tokio::test]
async fn test_run_cleanup_purges_only_expired() {
    let start = Utc::now();
    let store = Arc::new(InMemoryOtpStore::new());
    let clock = Arc::new(ManualClock::new(start));

    let register = OtpRecord::issue("a@x.com", OtpPurpose::Register, "111111", start, Duration::minutes(5));
    let reset = OtpRecord::issue("a@x.com", OtpPurpose::ResetPassword, "222222", start, Duration::minutes(10));
    store.upsert(&register).await.unwrap();
    store.upsert(&reset).await.unwrap();

    let service = OtpCleanupService::with_clock(store.clone(), OtpCleanupConfig::default(), clock.clone());

    clock.advance(Duration::minutes(6));
    let result = service.run_cleanup().await.unwrap();
    assert_eq!(result.expired_records_deleted, 1);
    assert!(store.get(&reset.key()).await.unwrap().is_some());

    clock.advance(Duration::minutes(5));
    assert_eq!(service.run_cleanup().await.unwrap().expired_records_deleted, 1);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_disabled_cleanup_does_nothing() {
    let start = Utc::now();
    let store = Arc::new(InMemoryOtpStore::new());
    let clock = Arc::new(ManualClock::new(start + Duration::hours(1)));
    store
        .upsert(&OtpRecord::issue("a@x.com", OtpPurpose::Register, "111111", start, Duration::minutes(5)))
        .await
        .unwrap();

    let service = Arc::new(OtpCleanupService::with_clock(
        store.clone(),
        OtpCleanupConfig::from_interval(0),
        clock,
    ));

    assert_eq!(service.run_cleanup().await.unwrap().expired_records_deleted, 0);
    assert!(service.start_background_task().is_none());
    assert_eq!(store.len().await, 1);
}
