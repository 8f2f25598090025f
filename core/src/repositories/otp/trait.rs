//! OTP record store trait.
//!
//! Every write that depends on the current record state is conditional on
//! the record's `issuance_id`. Implementations must make each method atomic
//! per key (row lock, Lua script, mutex...) so that a verification racing a
//! resend can never touch the newer issuance.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::otp_record::{OtpKey, OtpRecord};
use crate::errors::DomainError;

/// Result of a write that is guarded by issuance and by the attempt cap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The write happened; carries the stored attempt count afterwards
    Applied(u32),
    /// The issuance has already used up its attempts; nothing was written
    Exhausted,
    /// The issuance is gone, replaced or already verified
    Stale,
}

/// Persistence for OTP records keyed by `(identity, purpose)`
#[async_trait]
pub trait OtpRecordStore: Send + Sync {
    /// Fetch the record for a key, expired or not
    async fn get(&self, key: &OtpKey) -> Result<Option<OtpRecord>, DomainError>;

    /// Unconditionally replace whatever is stored under the record's key
    async fn upsert(&self, record: &OtpRecord) -> Result<(), DomainError>;

    /// Replace the stored record only if its issuance matches `expected`
    /// (`None` meaning "no record stored").
    ///
    /// Returns `false` without writing when another writer got there first.
    async fn compare_and_swap(
        &self,
        record: &OtpRecord,
        expected: Option<Uuid>,
    ) -> Result<bool, DomainError>;

    /// Add one failed attempt to the given issuance if it is still stored,
    /// unverified and below `max_attempts`. The cap check and the increment
    /// happen in the same atomic step, so the stored count never exceeds
    /// `max_attempts` however many callers race.
    async fn increment_attempts(
        &self,
        key: &OtpKey,
        issuance_id: Uuid,
        max_attempts: u32,
    ) -> Result<AttemptOutcome, DomainError>;

    /// Flag the given issuance as verified if it is still stored, not yet
    /// verified and below `max_attempts`. `Applied` means this call made the
    /// transition.
    async fn mark_verified(
        &self,
        key: &OtpKey,
        issuance_id: Uuid,
        max_attempts: u32,
    ) -> Result<AttemptOutcome, DomainError>;

    /// Delete whatever is stored under the key
    async fn delete(&self, key: &OtpKey) -> Result<bool, DomainError>;

    /// Delete the record only if it is still the given issuance
    async fn delete_issuance(&self, key: &OtpKey, issuance_id: Uuid) -> Result<bool, DomainError>;

    /// Remove every record whose `expires_at <= now`; returns how many went
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, DomainError>;
}
