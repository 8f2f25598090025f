//! OTP manager: issuance, verification and the verified gate

use bh_shared::utils::email::{mask_email, normalize_email};
use constant_time_eq::constant_time_eq;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::otp_record::{OtpKey, OtpPurpose, OtpRecord};
use crate::errors::{DomainError, DomainResult, OtpError};
use crate::repositories::otp::{AttemptOutcome, OtpRecordStore};

use super::clock::{Clock, SystemClock};
use super::config::OtpManagerConfig;
use super::generator::generate_code;
use super::traits::{DeliveryChannel, DeliveryContext, IdentityLookup, Recipient};
use super::types::{SendCodeResult, VerifyCodeResult};

/// How many times a guarded write is retried after losing a race
const MAX_GUARDED_RETRIES: usize = 3;

/// Stateless coordinator over a record store, a delivery channel and an
/// identity lookup. All per-key state lives in the store, so any number of
/// managers (threads, processes, hosts) may share one store.
pub struct OtpManager<S, D, L>
where
    S: OtpRecordStore + ?Sized,
    D: DeliveryChannel + ?Sized,
    L: IdentityLookup + ?Sized,
{
    store: Arc<S>,
    delivery: Arc<D>,
    identities: Arc<L>,
    clock: Arc<dyn Clock>,
    config: OtpManagerConfig,
}

impl<S, D, L> OtpManager<S, D, L>
where
    S: OtpRecordStore + ?Sized + 'static,
    D: DeliveryChannel + ?Sized,
    L: IdentityLookup + ?Sized,
{
    /// Create a manager using the wall clock
    pub fn new(
        store: Arc<S>,
        delivery: Arc<D>,
        identities: Arc<L>,
        config: OtpManagerConfig,
    ) -> Self {
        Self::with_clock(store, delivery, identities, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<S>,
        delivery: Arc<D>,
        identities: Arc<L>,
        config: OtpManagerConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            delivery,
            identities,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &OtpManagerConfig {
        &self.config
    }

    /// Issue a fresh code for `(identity, purpose)` and deliver it.
    ///
    /// Fails with `AlreadyRegistered` / `IdentityNotFound` when the account
    /// precondition of the purpose does not hold, `Cooldown` while the
    /// previous issuance is younger than the cooldown window, and
    /// `DeliveryFailed` when the channel refuses the message. A failed
    /// delivery removes the record it had just written, and so does dropping
    /// the returned future before delivery finished.
    pub async fn request_code(
        &self,
        identity: &str,
        purpose: OtpPurpose,
        recipient: &Recipient,
    ) -> DomainResult<SendCodeResult> {
        let identity = normalize_email(identity);
        let masked = mask_email(&identity);

        self.check_account_precondition(&identity, purpose, recipient)
            .await?;

        let key = OtpKey::new(identity.clone(), purpose);
        let lifetime = self.config.expiry_for(purpose);
        let record = self.issue(&key, lifetime).await?;
        let pending = UndeliveredRecord::new(self.store.clone(), key.clone(), record.issuance_id);

        tracing::info!(
            identity = %masked,
            purpose = %purpose,
            issuance_id = %record.issuance_id,
            expires_at = %record.expires_at,
            event = "otp_issued",
            "Issued verification code"
        );

        let context = DeliveryContext {
            purpose,
            role: recipient.role,
            display_name: recipient.display_name.clone(),
            expires_in_minutes: lifetime.num_minutes(),
        };

        let message_id = match self.delivery.send(&identity, &record.code, &context).await {
            Ok(id) => {
                pending.disarm();
                id
            }
            Err(e) => {
                tracing::error!(
                    identity = %masked,
                    purpose = %purpose,
                    error = %e,
                    event = "otp_delivery_failed",
                    "Failed to deliver verification code, rolling back"
                );
                self.rollback(&key, record.issuance_id).await;
                pending.disarm();
                return Err(OtpError::DeliveryFailed {
                    reason: e.to_string(),
                }
                .into());
            }
        };

        tracing::info!(
            identity = %masked,
            purpose = %purpose,
            message_id = %message_id,
            event = "otp_delivered",
            "Verification code delivered"
        );

        Ok(SendCodeResult {
            purpose,
            message_id,
            expires_at: record.expires_at,
            next_resend_at: record.issued_at + self.config.cooldown,
        })
    }

    /// Compare `submitted` against the live code for `(identity, purpose)`.
    ///
    /// The attempt cap is checked before comparing: the N-th wrong code
    /// (N = max attempts) still reports `Incorrect` with zero attempts left,
    /// and the call after it discards the record with `TooManyAttempts`.
    pub async fn verify_code(
        &self,
        identity: &str,
        purpose: OtpPurpose,
        submitted: &str,
    ) -> DomainResult<VerifyCodeResult> {
        let identity = normalize_email(identity);
        let masked = mask_email(&identity);
        let key = OtpKey::new(identity, purpose);
        let submitted = submitted.trim();

        // Guarded writes fail when the record changed under us (resend or a
        // concurrent verification); re-evaluate against the current state.
        for _ in 0..MAX_GUARDED_RETRIES {
            let now = self.clock.now();
            let record = match self.store.get(&key).await? {
                Some(record) => record,
                None => return Err(OtpError::NotFound.into()),
            };

            if record.verified {
                return Err(OtpError::AlreadyVerified.into());
            }

            if record.is_expired_at(now) {
                self.store.delete_issuance(&key, record.issuance_id).await?;
                tracing::info!(
                    identity = %masked,
                    purpose = %purpose,
                    event = "otp_expired",
                    "Verification code expired"
                );
                return Err(OtpError::Expired.into());
            }

            if record.attempts_exhausted(self.config.max_attempts) {
                return Err(self.exhaust(&key, record.issuance_id).await?);
            }

            // The store re-checks the cap inside the write, so concurrent
            // guesses that all passed the check above cannot overshoot it.
            let max_attempts = self.config.max_attempts;
            if constant_time_eq(submitted.as_bytes(), record.code.trim().as_bytes()) {
                match self
                    .store
                    .mark_verified(&key, record.issuance_id, max_attempts)
                    .await?
                {
                    AttemptOutcome::Applied(_) => {
                        tracing::info!(
                            identity = %masked,
                            purpose = %purpose,
                            event = "otp_verified",
                            "Verification code accepted"
                        );
                        return Ok(VerifyCodeResult {
                            purpose,
                            verified_at: now,
                            expires_at: record.expires_at,
                        });
                    }
                    AttemptOutcome::Exhausted => {
                        return Err(self.exhaust(&key, record.issuance_id).await?);
                    }
                    AttemptOutcome::Stale => continue,
                }
            }

            match self
                .store
                .increment_attempts(&key, record.issuance_id, max_attempts)
                .await?
            {
                AttemptOutcome::Applied(attempts) => {
                    let remaining_attempts = max_attempts.saturating_sub(attempts);
                    tracing::warn!(
                        identity = %masked,
                        purpose = %purpose,
                        attempts = attempts,
                        remaining_attempts = remaining_attempts,
                        event = "otp_incorrect",
                        "Incorrect verification code"
                    );
                    return Err(OtpError::Incorrect { remaining_attempts }.into());
                }
                AttemptOutcome::Exhausted => {
                    return Err(self.exhaust(&key, record.issuance_id).await?);
                }
                AttemptOutcome::Stale => {}
            }
        }

        Err(contention_error(&key))
    }

    /// Return the live record if it has been verified.
    ///
    /// Does not delete anything on success: the caller removes the record
    /// with [`OtpManager::discard`] once its own operation has succeeded.
    pub async fn consume_verified(
        &self,
        identity: &str,
        purpose: OtpPurpose,
    ) -> DomainResult<OtpRecord> {
        let key = OtpKey::new(normalize_email(identity), purpose);
        let record = match self.store.get(&key).await? {
            Some(record) => record,
            None => return Err(OtpError::NotVerified.into()),
        };

        if record.is_expired_at(self.clock.now()) {
            self.store.delete_issuance(&key, record.issuance_id).await?;
            return Err(OtpError::NotVerified.into());
        }

        if !record.verified {
            return Err(OtpError::NotVerified.into());
        }

        Ok(record)
    }

    /// Delete a consumed record, but only the issuance that was consumed
    pub async fn discard(&self, record: &OtpRecord) -> DomainResult<bool> {
        let deleted = self
            .store
            .delete_issuance(&record.key(), record.issuance_id)
            .await?;

        tracing::debug!(
            identity = %mask_email(&record.identity),
            purpose = %record.purpose,
            deleted = deleted,
            event = "otp_consumed",
            "Verified code consumed"
        );

        Ok(deleted)
    }

    async fn check_account_precondition(
        &self,
        identity: &str,
        purpose: OtpPurpose,
        recipient: &Recipient,
    ) -> DomainResult<()> {
        let exists = self.identities.exists(identity, recipient.role).await?;
        match purpose {
            OtpPurpose::Register if exists => Err(OtpError::AlreadyRegistered.into()),
            OtpPurpose::ResetPassword if !exists => Err(OtpError::IdentityNotFound.into()),
            _ => Ok(()),
        }
    }

    /// Write a fresh pending record unless the current one is in cooldown.
    ///
    /// The write is a compare-and-swap against the issuance that was read,
    /// so of two concurrent requests only one issues a code; the loser sees
    /// the winner's record on its next read and reports the cooldown.
    async fn issue(&self, key: &OtpKey, lifetime: chrono::Duration) -> DomainResult<OtpRecord> {
        for _ in 0..MAX_GUARDED_RETRIES {
            let now = self.clock.now();
            let existing = self.store.get(key).await?;

            if let Some(current) = &existing {
                if let Some(remaining_seconds) = current.cooldown_remaining(now, self.config.cooldown)
                {
                    tracing::info!(
                        identity = %mask_email(&key.identity),
                        purpose = %key.purpose,
                        remaining_seconds = remaining_seconds,
                        event = "otp_cooldown",
                        "Code requested during cooldown"
                    );
                    return Err(OtpError::Cooldown { remaining_seconds }.into());
                }
            }

            let record = OtpRecord::issue(
                key.identity.clone(),
                key.purpose,
                generate_code(self.config.code_length),
                now,
                lifetime,
            );

            let expected = existing.map(|r| r.issuance_id);
            if self.store.compare_and_swap(&record, expected).await? {
                return Ok(record);
            }
        }

        Err(contention_error(key))
    }

    /// Discard an issuance that ran out of attempts and build the error
    /// to report for it
    async fn exhaust(&self, key: &OtpKey, issuance_id: Uuid) -> DomainResult<DomainError> {
        self.store.delete_issuance(key, issuance_id).await?;
        tracing::warn!(
            identity = %mask_email(&key.identity),
            purpose = %key.purpose,
            max_attempts = self.config.max_attempts,
            event = "otp_attempts_exhausted",
            "Verification attempts exhausted, code discarded"
        );
        Ok(OtpError::TooManyAttempts.into())
    }

    async fn rollback(&self, key: &OtpKey, issuance_id: Uuid) {
        if let Err(e) = self.store.delete_issuance(key, issuance_id).await {
            tracing::error!(
                identity = %mask_email(&key.identity),
                purpose = %key.purpose,
                error = %e,
                event = "otp_rollback_failed",
                "Failed to remove undelivered code"
            );
        }
    }
}

/// A freshly written record whose delivery has not finished yet.
///
/// Dropped while still armed (the request future was cancelled mid-send),
/// it removes that issuance in a background task so no undelivered code
/// holds the key in cooldown.
struct UndeliveredRecord<S: OtpRecordStore + ?Sized + 'static> {
    store: Arc<S>,
    key: Option<OtpKey>,
    issuance_id: Uuid,
}

impl<S: OtpRecordStore + ?Sized + 'static> UndeliveredRecord<S> {
    fn new(store: Arc<S>, key: OtpKey, issuance_id: Uuid) -> Self {
        Self {
            store,
            key: Some(key),
            issuance_id,
        }
    }

    fn disarm(mut self) {
        self.key = None;
    }
}

impl<S: OtpRecordStore + ?Sized + 'static> Drop for UndeliveredRecord<S> {
    fn drop(&mut self) {
        let Some(key) = self.key.take() else {
            return;
        };

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::error!(
                identity = %mask_email(&key.identity),
                purpose = %key.purpose,
                event = "otp_rollback_failed",
                "No runtime to remove undelivered code"
            );
            return;
        };

        let store = self.store.clone();
        let issuance_id = self.issuance_id;
        runtime.spawn(async move {
            match store.delete_issuance(&key, issuance_id).await {
                Ok(deleted) => tracing::warn!(
                    identity = %mask_email(&key.identity),
                    purpose = %key.purpose,
                    deleted = deleted,
                    event = "otp_request_cancelled",
                    "Code request cancelled before delivery, record removed"
                ),
                Err(e) => tracing::error!(
                    identity = %mask_email(&key.identity),
                    purpose = %key.purpose,
                    error = %e,
                    event = "otp_rollback_failed",
                    "Failed to remove undelivered code"
                ),
            }
        });
    }
}

fn contention_error(key: &OtpKey) -> DomainError {
    DomainError::Internal {
        message: format!("Record for {} kept changing during update", key.purpose),
    }
}
