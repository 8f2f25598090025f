//! Redis-backed OTP record store
//!
//! Each record is a hash under `{prefix}:otp:{purpose}:{identity}` whose TTL
//! is the record's remaining lifetime plus a grace period. The manager still
//! sees an expired record during the grace period and reports it as expired;
//! after that Redis drops it without a sweeper. Every conditional write is a
//! Lua script: Redis runs scripts atomically, which gives the per-key
//! compare-and-swap the manager relies on.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use redis::Script;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use bh_core::domain::entities::otp_record::{OtpKey, OtpRecord};
use bh_core::errors::DomainError;
use bh_core::repositories::{AttemptOutcome, OtpRecordStore};

use super::redis_client::RedisClient;
use crate::InfrastructureError;

/// Replace the hash only if its `issuance_id` equals ARGV[1] ('' = absent)
const COMPARE_AND_SWAP: &str = r#"
local current = redis.call('HGET', KEYS[1], 'issuance_id')
if (current or '') ~= ARGV[1] then
    return 0
end
redis.call('DEL', KEYS[1])
redis.call('HSET', KEYS[1],
    'issuance_id', ARGV[2], 'identity', ARGV[3], 'purpose', ARGV[4],
    'code', ARGV[5], 'issued_at_ms', ARGV[6], 'expires_at_ms', ARGV[7],
    'attempts', ARGV[8], 'verified', ARGV[9])
redis.call('PEXPIRE', KEYS[1], ARGV[10])
return 1
"#;

/// Script replies for a write that did not happen
const REPLY_STALE: i64 = -1;
const REPLY_EXHAUSTED: i64 = -2;

/// ARGV[1] = issuance id, ARGV[2] = max attempts
const INCREMENT_ATTEMPTS: &str = r#"
if redis.call('HGET', KEYS[1], 'issuance_id') ~= ARGV[1] then
    return -1
end
if redis.call('HGET', KEYS[1], 'verified') == '1' then
    return -1
end
if tonumber(redis.call('HGET', KEYS[1], 'attempts') or '0') >= tonumber(ARGV[2]) then
    return -2
end
return redis.call('HINCRBY', KEYS[1], 'attempts', 1)
"#;

/// Same arguments and replies as `INCREMENT_ATTEMPTS`; returns the attempt
/// count on success
const MARK_VERIFIED: &str = r#"
if redis.call('HGET', KEYS[1], 'issuance_id') ~= ARGV[1] then
    return -1
end
if redis.call('HGET', KEYS[1], 'verified') == '1' then
    return -1
end
local attempts = tonumber(redis.call('HGET', KEYS[1], 'attempts') or '0')
if attempts >= tonumber(ARGV[2]) then
    return -2
end
redis.call('HSET', KEYS[1], 'verified', '1')
return attempts
"#;

const DELETE_ISSUANCE: &str = r#"
if redis.call('HGET', KEYS[1], 'issuance_id') ~= ARGV[1] then
    return 0
end
return redis.call('DEL', KEYS[1])
"#;

/// OTP record store on Redis
pub struct RedisOtpStore {
    client: RedisClient,
    expiry_grace: Duration,
    compare_and_swap: Script,
    increment_attempts: Script,
    mark_verified: Script,
    delete_issuance: Script,
}

impl RedisOtpStore {
    /// `expiry_grace` is how long a record outlives its `expires_at` in
    /// Redis; a verification inside that window reports the code as expired
    /// instead of unknown.
    pub fn new(client: RedisClient, expiry_grace: Duration) -> Self {
        Self {
            client,
            expiry_grace,
            compare_and_swap: Script::new(COMPARE_AND_SWAP),
            increment_attempts: Script::new(INCREMENT_ATTEMPTS),
            mark_verified: Script::new(MARK_VERIFIED),
            delete_issuance: Script::new(DELETE_ISSUANCE),
        }
    }

    fn redis_key(&self, key: &OtpKey) -> String {
        self.client.key(&record_key(key))
    }
}

/// Key suffix for a record, before the configured prefix is applied
pub(crate) fn record_key(key: &OtpKey) -> String {
    format!("otp:{}:{}", key.purpose.as_str(), key.identity)
}

/// Milliseconds the record should live in Redis: its remaining lifetime
/// plus the grace period, at least one
pub(crate) fn ttl_millis(record: &OtpRecord, now: DateTime<Utc>, grace: Duration) -> i64 {
    (record.expires_at + grace - now).num_milliseconds().max(1)
}

/// Map a reply of the guarded attempt scripts
pub(crate) fn attempt_outcome(reply: i64) -> AttemptOutcome {
    match reply {
        REPLY_EXHAUSTED => AttemptOutcome::Exhausted,
        REPLY_STALE => AttemptOutcome::Stale,
        attempts => u32::try_from(attempts)
            .map(AttemptOutcome::Applied)
            .unwrap_or(AttemptOutcome::Stale),
    }
}

/// Hash fields for a record, in the order the swap script expects them
pub(crate) fn record_to_fields(record: &OtpRecord) -> Vec<(&'static str, String)> {
    vec![
        ("issuance_id", record.issuance_id.to_string()),
        ("identity", record.identity.clone()),
        ("purpose", record.purpose.as_str().to_string()),
        ("code", record.code.clone()),
        ("issued_at_ms", record.issued_at.timestamp_millis().to_string()),
        ("expires_at_ms", record.expires_at.timestamp_millis().to_string()),
        ("attempts", record.attempts.to_string()),
        ("verified", if record.verified { "1" } else { "0" }.to_string()),
    ]
}

/// Rebuild a record from its hash; `None` for an empty (missing) hash
pub(crate) fn record_from_fields(
    fields: &HashMap<String, String>,
) -> Result<Option<OtpRecord>, InfrastructureError> {
    if fields.is_empty() {
        return Ok(None);
    }

    let field = |name: &str| {
        fields
            .get(name)
            .ok_or_else(|| InfrastructureError::Corrupt(format!("OTP hash missing field {}", name)))
    };
    let millis = |name: &str| -> Result<DateTime<Utc>, InfrastructureError> {
        let raw: i64 = field(name)?
            .parse()
            .map_err(|_| InfrastructureError::Corrupt(format!("OTP field {} is not a number", name)))?;
        Utc.timestamp_millis_opt(raw)
            .single()
            .ok_or_else(|| InfrastructureError::Corrupt(format!("OTP field {} is out of range", name)))
    };

    Ok(Some(OtpRecord {
        issuance_id: Uuid::parse_str(field("issuance_id")?)
            .map_err(|e| InfrastructureError::Corrupt(format!("Invalid issuance id: {}", e)))?,
        identity: field("identity")?.clone(),
        purpose: field("purpose")?
            .parse()
            .map_err(InfrastructureError::Corrupt)?,
        code: field("code")?.clone(),
        issued_at: millis("issued_at_ms")?,
        expires_at: millis("expires_at_ms")?,
        attempts: field("attempts")?
            .parse()
            .map_err(|_| InfrastructureError::Corrupt("OTP attempts is not a number".to_string()))?,
        verified: field("verified")? == "1",
    }))
}

#[async_trait]
impl OtpRecordStore for RedisOtpStore {
    async fn get(&self, key: &OtpKey) -> Result<Option<OtpRecord>, DomainError> {
        let fields = self.client.hgetall(&self.redis_key(key)).await?;
        Ok(record_from_fields(&fields)?)
    }

    async fn upsert(&self, record: &OtpRecord) -> Result<(), DomainError> {
        let key = self.redis_key(&record.key());
        let fields = record_to_fields(record);

        let mut pipeline = redis::pipe();
        pipeline
            .atomic()
            .del(&key)
            .ignore()
            .hset_multiple(&key, fields.as_slice())
            .ignore()
            .cmd("PEXPIRE")
            .arg(&key)
            .arg(ttl_millis(record, Utc::now(), self.expiry_grace))
            .ignore();

        self.client.run_pipeline(&pipeline).await?;
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        record: &OtpRecord,
        expected: Option<Uuid>,
    ) -> Result<bool, DomainError> {
        let key = self.redis_key(&record.key());
        let expected = expected.map(|id| id.to_string()).unwrap_or_default();

        let mut invocation = self.compare_and_swap.key(&key);
        invocation.arg(expected);
        for (_, value) in record_to_fields(record) {
            invocation.arg(value);
        }
        invocation.arg(ttl_millis(record, Utc::now(), self.expiry_grace));

        let swapped: i64 = self.client.invoke(&invocation).await?;
        debug!(key = %key, swapped = swapped == 1, "OTP compare-and-swap");
        Ok(swapped == 1)
    }

    async fn increment_attempts(
        &self,
        key: &OtpKey,
        issuance_id: Uuid,
        max_attempts: u32,
    ) -> Result<AttemptOutcome, DomainError> {
        let mut invocation = self.increment_attempts.key(self.redis_key(key));
        invocation.arg(issuance_id.to_string()).arg(max_attempts);

        let reply: i64 = self.client.invoke(&invocation).await?;
        Ok(attempt_outcome(reply))
    }

    async fn mark_verified(
        &self,
        key: &OtpKey,
        issuance_id: Uuid,
        max_attempts: u32,
    ) -> Result<AttemptOutcome, DomainError> {
        let mut invocation = self.mark_verified.key(self.redis_key(key));
        invocation.arg(issuance_id.to_string()).arg(max_attempts);

        let reply: i64 = self.client.invoke(&invocation).await?;
        Ok(attempt_outcome(reply))
    }

    async fn delete(&self, key: &OtpKey) -> Result<bool, DomainError> {
        Ok(self.client.delete(&self.redis_key(key)).await?)
    }

    async fn delete_issuance(&self, key: &OtpKey, issuance_id: Uuid) -> Result<bool, DomainError> {
        let mut invocation = self.delete_issuance.key(self.redis_key(key));
        invocation.arg(issuance_id.to_string());

        let deleted: i64 = self.client.invoke(&invocation).await?;
        Ok(deleted > 0)
    }

    /// Redis drops records once their TTL (lifetime plus grace) runs out;
    /// nothing to sweep
    async fn purge_expired(&self, _now: DateTime<Utc>) -> Result<u64, DomainError> {
        Ok(0)
    }
}
