//! Test doubles for the OTP manager

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

use crate::domain::entities::otp_record::{OtpKey, OtpRecord};
use crate::errors::DomainError;
use crate::repositories::otp::{AttemptOutcome, InMemoryOtpStore, OtpRecordStore};
use crate::services::otp::{DeliveryChannel, DeliveryContext, DeliveryError};

/// A message captured by [`RecordingDelivery`]
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub identity: String,
    pub code: String,
    pub context: DeliveryContext,
}

/// Delivery channel that records what it was asked to send
#[derive(Default)]
pub struct RecordingDelivery {
    pub sent: Mutex<Vec<SentMessage>>,
    pub should_fail: AtomicBool,
    pub should_hang: AtomicBool,
}

impl RecordingDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let delivery = Self::default();
        delivery.set_failing(true);
        delivery
    }

    pub fn set_failing(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    /// Make every send wait forever, like a stalled SMTP session
    pub fn set_hanging(&self, hang: bool) {
        self.should_hang.store(hang, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<SentMessage> {
        self.sent.lock().unwrap().last().cloned()
    }

    pub fn last_code(&self) -> String {
        self.last().map(|m| m.code).expect("no code was sent")
    }
}

#[async_trait]
impl DeliveryChannel for RecordingDelivery {
    async fn send(
        &self,
        identity: &str,
        code: &str,
        context: &DeliveryContext,
    ) -> Result<String, DeliveryError> {
        if self.should_hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(DeliveryError::Transport("mailbox unavailable".to_string()));
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(SentMessage {
            identity: identity.to_string(),
            code: code.to_string(),
            context: context.clone(),
        });
        Ok(format!("test-msg-{}", sent.len()))
    }
}

/// In-memory store whose reads take a few milliseconds, so concurrent
/// callers interleave the way they do against a networked store
pub struct SlowReadStore {
    pub inner: InMemoryOtpStore,
    pub delay: Duration,
}

impl SlowReadStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: InMemoryOtpStore::new(),
            delay,
        }
    }
}

#[async_trait]
impl OtpRecordStore for SlowReadStore {
    async fn get(&self, key: &OtpKey) -> Result<Option<OtpRecord>, DomainError> {
        let record = self.inner.get(key).await?;
        tokio::time::sleep(self.delay).await;
        Ok(record)
    }

    async fn upsert(&self, record: &OtpRecord) -> Result<(), DomainError> {
        self.inner.upsert(record).await
    }

    async fn compare_and_swap(
        &self,
        record: &OtpRecord,
        expected: Option<Uuid>,
    ) -> Result<bool, DomainError> {
        self.inner.compare_and_swap(record, expected).await
    }

    async fn increment_attempts(
        &self,
        key: &OtpKey,
        issuance_id: Uuid,
        max_attempts: u32,
    ) -> Result<AttemptOutcome, DomainError> {
        self.inner.increment_attempts(key, issuance_id, max_attempts).await
    }

    async fn mark_verified(
        &self,
        key: &OtpKey,
        issuance_id: Uuid,
        max_attempts: u32,
    ) -> Result<AttemptOutcome, DomainError> {
        self.inner.mark_verified(key, issuance_id, max_attempts).await
    }

    async fn delete(&self, key: &OtpKey) -> Result<bool, DomainError> {
        self.inner.delete(key).await
    }

    async fn delete_issuance(&self, key: &OtpKey, issuance_id: Uuid) -> Result<bool, DomainError> {
        self.inner.delete_issuance(key, issuance_id).await
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, DomainError> {
        self.inner.purge_expired(now).await
    }
}
