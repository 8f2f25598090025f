//! Process-local OTP record store.
//!
//! Holds state in a map guarded by one lock, which makes every operation
//! trivially atomic. State is lost on restart and not shared between
//! instances, so this backs tests and single-process development runs only.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::otp_record::{OtpKey, OtpRecord};
use crate::errors::DomainError;

use super::trait_::{AttemptOutcome, OtpRecordStore};

/// In-memory OTP record store
#[derive(Clone, Default)]
pub struct InMemoryOtpStore {
    records: Arc<RwLock<HashMap<OtpKey, OtpRecord>>>,
}

impl InMemoryOtpStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, expired ones included
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store holds no records
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl OtpRecordStore for InMemoryOtpStore {
    async fn get(&self, key: &OtpKey) -> Result<Option<OtpRecord>, DomainError> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn upsert(&self, record: &OtpRecord) -> Result<(), DomainError> {
        self.records
            .write()
            .await
            .insert(record.key(), record.clone());
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        record: &OtpRecord,
        expected: Option<Uuid>,
    ) -> Result<bool, DomainError> {
        let mut records = self.records.write().await;
        let key = record.key();
        let current = records.get(&key).map(|r| r.issuance_id);
        if current != expected {
            return Ok(false);
        }
        records.insert(key, record.clone());
        Ok(true)
    }

    async fn increment_attempts(
        &self,
        key: &OtpKey,
        issuance_id: Uuid,
        max_attempts: u32,
    ) -> Result<AttemptOutcome, DomainError> {
        let mut records = self.records.write().await;
        match records.get_mut(key) {
            Some(record) if record.issuance_id == issuance_id && !record.verified => {
                if record.attempts_exhausted(max_attempts) {
                    return Ok(AttemptOutcome::Exhausted);
                }
                record.attempts += 1;
                Ok(AttemptOutcome::Applied(record.attempts))
            }
            _ => Ok(AttemptOutcome::Stale),
        }
    }

    async fn mark_verified(
        &self,
        key: &OtpKey,
        issuance_id: Uuid,
        max_attempts: u32,
    ) -> Result<AttemptOutcome, DomainError> {
        let mut records = self.records.write().await;
        match records.get_mut(key) {
            Some(record) if record.issuance_id == issuance_id && !record.verified => {
                if record.attempts_exhausted(max_attempts) {
                    return Ok(AttemptOutcome::Exhausted);
                }
                record.verified = true;
                Ok(AttemptOutcome::Applied(record.attempts))
            }
            _ => Ok(AttemptOutcome::Stale),
        }
    }

    async fn delete(&self, key: &OtpKey) -> Result<bool, DomainError> {
        Ok(self.records.write().await.remove(key).is_some())
    }

    async fn delete_issuance(&self, key: &OtpKey, issuance_id: Uuid) -> Result<bool, DomainError> {
        let mut records = self.records.write().await;
        if records.get(key).map(|r| r.issuance_id) == Some(issuance_id) {
            records.remove(key);
            return Ok(true);
        }
        Ok(false)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, DomainError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| !record.is_expired_at(now));
        Ok((before - records.len()) as u64)
    }
}
