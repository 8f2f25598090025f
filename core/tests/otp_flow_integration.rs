//! End-to-end OTP scenarios through the public API of the core crate

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::{Arc, Mutex};

use bh_core::services::otp::ManualClock;
use bh_core::{
    DeliveryChannel, DeliveryContext, DeliveryError, DomainError, InMemoryOtpStore,
    InMemoryUserRepository, OtpError, OtpKey, OtpManager, OtpManagerConfig, OtpPurpose,
    OtpRecordStore, Recipient, UserRole,
};

/// Keeps every code it is asked to deliver
#[derive(Default)]
struct Outbox {
    codes: Mutex<Vec<(String, String)>>,
}

impl Outbox {
    fn last_code(&self) -> String {
        self.codes.lock().unwrap().last().unwrap().1.clone()
    }

    fn len(&self) -> usize {
        self.codes.lock().unwrap().len()
    }
}

#[async_trait]
impl DeliveryChannel for Outbox {
    async fn send(
        &self,
        identity: &str,
        code: &str,
        _context: &DeliveryContext,
    ) -> Result<String, DeliveryError> {
        self.codes
            .lock()
            .unwrap()
            .push((identity.to_string(), code.to_string()));
        Ok(format!("outbox-{}", self.len()))
    }
}

struct Setup {
    manager: OtpManager<InMemoryOtpStore, Outbox, InMemoryUserRepository>,
    store: Arc<InMemoryOtpStore>,
    outbox: Arc<Outbox>,
    clock: Arc<ManualClock>,
}

fn setup() -> Setup {
    let store = Arc::new(InMemoryOtpStore::new());
    let outbox = Arc::new(Outbox::default());
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let manager = OtpManager::with_clock(
        store.clone(),
        outbox.clone(),
        Arc::new(InMemoryUserRepository::new()),
        OtpManagerConfig::default(),
        clock.clone(),
    );
    Setup {
        manager,
        store,
        outbox,
        clock,
    }
}

fn tenant() -> Recipient {
    Recipient::new(UserRole::Tenant)
}

fn otp_error<T: std::fmt::Debug>(result: Result<T, DomainError>) -> OtpError {
    match result {
        Err(DomainError::Otp(e)) => e,
        other => panic!("expected an OTP error, got {:?}", other),
    }
}

#[tokio::test]
async fn register_verify_consume_then_code_is_gone() {
    let s = setup();

    s.manager
        .request_code("a@x.com", OtpPurpose::Register, &tenant())
        .await
        .unwrap();
    let code = s.outbox.last_code();
    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_digit()));

    s.manager
        .verify_code("a@x.com", OtpPurpose::Register, &code)
        .await
        .unwrap();

    let record = s
        .manager
        .consume_verified("a@x.com", OtpPurpose::Register)
        .await
        .unwrap();
    assert!(record.verified);

    // Registration finalized by the caller
    s.manager.discard(&record).await.unwrap();

    assert_eq!(
        otp_error(s.manager.verify_code("a@x.com", OtpPurpose::Register, &code).await),
        OtpError::NotFound
    );
    assert_eq!(
        otp_error(s.manager.consume_verified("a@x.com", OtpPurpose::Register).await),
        OtpError::NotVerified
    );
}

#[tokio::test]
async fn second_request_within_ten_seconds_hits_cooldown() {
    let s = setup();

    s.manager
        .request_code("a@x.com", OtpPurpose::Register, &tenant())
        .await
        .unwrap();
    s.clock.advance(Duration::seconds(10));

    assert_eq!(
        otp_error(
            s.manager
                .request_code("a@x.com", OtpPurpose::Register, &tenant())
                .await
        ),
        OtpError::Cooldown {
            remaining_seconds: 110
        }
    );
}

#[tokio::test]
async fn cooldown_elapses_at_two_minutes() {
    let s = setup();

    s.manager
        .request_code("a@x.com", OtpPurpose::Register, &tenant())
        .await
        .unwrap();

    s.clock.advance(Duration::seconds(119));
    assert_eq!(
        otp_error(
            s.manager
                .request_code("a@x.com", OtpPurpose::Register, &tenant())
                .await
        ),
        OtpError::Cooldown {
            remaining_seconds: 1
        }
    );

    s.clock.advance(Duration::seconds(1));
    s.manager
        .request_code("a@x.com", OtpPurpose::Register, &tenant())
        .await
        .unwrap();

    // Only the newest code is stored
    let stored = s
        .store
        .get(&OtpKey::new("a@x.com", OtpPurpose::Register))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.code, s.outbox.last_code());
    assert_eq!(s.store.len().await, 1);
}

#[tokio::test]
async fn register_code_accepted_until_five_minutes() {
    let s = setup();
    s.manager
        .request_code("a@x.com", OtpPurpose::Register, &tenant())
        .await
        .unwrap();
    let code = s.outbox.last_code();

    s.clock.advance(Duration::seconds(299));
    assert!(s
        .manager
        .verify_code("a@x.com", OtpPurpose::Register, &code)
        .await
        .is_ok());
}

#[tokio::test]
async fn register_code_expired_after_five_minutes() {
    let s = setup();
    s.manager
        .request_code("a@x.com", OtpPurpose::Register, &tenant())
        .await
        .unwrap();
    let code = s.outbox.last_code();

    s.clock.advance(Duration::seconds(301));
    assert_eq!(
        otp_error(s.manager.verify_code("a@x.com", OtpPurpose::Register, &code).await),
        OtpError::Expired
    );
    assert!(s.store.is_empty().await);
}

#[tokio::test]
async fn five_wrong_codes_then_too_many_attempts() {
    let s = setup();
    s.manager
        .request_code("a@x.com", OtpPurpose::Register, &tenant())
        .await
        .unwrap();
    let wrong = "0000000";

    for _ in 0..5 {
        assert!(matches!(
            otp_error(s.manager.verify_code("a@x.com", OtpPurpose::Register, wrong).await),
            OtpError::Incorrect { .. }
        ));
    }

    assert_eq!(
        otp_error(s.manager.verify_code("a@x.com", OtpPurpose::Register, wrong).await),
        OtpError::TooManyAttempts
    );
    assert_eq!(
        otp_error(s.manager.verify_code("a@x.com", OtpPurpose::Register, wrong).await),
        OtpError::NotFound
    );
}

#[tokio::test]
async fn verifying_twice_reports_already_verified() {
    let s = setup();
    s.manager
        .request_code("a@x.com", OtpPurpose::Register, &tenant())
        .await
        .unwrap();
    let code = s.outbox.last_code();
    let key = OtpKey::new("a@x.com", OtpPurpose::Register);

    s.manager
        .verify_code("a@x.com", OtpPurpose::Register, &code)
        .await
        .unwrap();
    let attempts = s.store.get(&key).await.unwrap().unwrap().attempts;

    assert_eq!(
        otp_error(s.manager.verify_code("a@x.com", OtpPurpose::Register, &code).await),
        OtpError::AlreadyVerified
    );
    assert_eq!(s.store.get(&key).await.unwrap().unwrap().attempts, attempts);
}
