use chrono::{Duration, TimeZone, Utc};
use std::collections::HashMap;

use bh_core::domain::entities::otp_record::{OtpKey, OtpPurpose, OtpRecord};

use bh_core::repositories::AttemptOutcome;

use crate::cache::otp_store::{
    attempt_outcome, record_from_fields, record_key, record_to_fields, ttl_millis,
};
use crate::InfrastructureError;

fn fields_of(record: &OtpRecord) -> HashMap<String, String> {
    record_to_fields(record)
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

#[test]
fn test_record_key_layout() {
    let key = OtpKey::new("a@x.com", OtpPurpose::ResetPassword);
    assert_eq!(record_key(&key), "otp:reset_password:a@x.com");
}

#[test]
fn test_fields_restore_record() {
    // Millisecond precision is what the hash keeps
    let now = Utc.timestamp_millis_opt(1_760_000_000_123).unwrap();
    let mut record = OtpRecord::issue("a@x.com", OtpPurpose::Register, "482913", now, Duration::minutes(5));
    record.attempts = 3;
    record.verified = true;

    let restored = record_from_fields(&fields_of(&record)).unwrap().unwrap();
    assert_eq!(restored, record);
}

#[test]
fn test_empty_hash_is_absent() {
    assert!(record_from_fields(&HashMap::new()).unwrap().is_none());
}

#[test]
fn test_missing_field_is_corrupt() {
    let record = OtpRecord::issue("a@x.com", OtpPurpose::Register, "482913", Utc::now(), Duration::minutes(5));
    let mut fields = fields_of(&record);
    fields.remove("code");

    assert!(matches!(
        record_from_fields(&fields),
        Err(InfrastructureError::Corrupt(_))
    ));
}

#[test]
fn test_unknown_purpose_is_corrupt() {
    let record = OtpRecord::issue("a@x.com", OtpPurpose::Register, "482913", Utc::now(), Duration::minutes(5));
    let mut fields = fields_of(&record);
    fields.insert("purpose".to_string(), "login".to_string());

    assert!(record_from_fields(&fields).is_err());
}

#[test]
fn test_ttl_outlives_expiry_by_grace() {
    let now = Utc::now();
    let record = OtpRecord::issue("a@x.com", OtpPurpose::Register, "482913", now, Duration::minutes(5));
    let grace = Duration::minutes(2);

    assert_eq!(ttl_millis(&record, now, grace), 420_000);
    // Just past expiry the record is still kept for the rest of the grace
    assert_eq!(ttl_millis(&record, now + Duration::minutes(6), grace), 60_000);
    assert_eq!(ttl_millis(&record, now + Duration::minutes(10), grace), 1);
}

#[test]
fn test_attempt_script_replies() {
    assert_eq!(attempt_outcome(3), AttemptOutcome::Applied(3));
    assert_eq!(attempt_outcome(0), AttemptOutcome::Applied(0));
    assert_eq!(attempt_outcome(-1), AttemptOutcome::Stale);
    assert_eq!(attempt_outcome(-2), AttemptOutcome::Exhausted);
}
