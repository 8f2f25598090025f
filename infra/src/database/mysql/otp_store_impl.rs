//! MySQL implementation of the OtpRecordStore trait.
//!
//! `(identity, purpose)` is the primary key, so a key holds one row at most.
//! Conditional writes carry `issuance_id` in their `WHERE` clause and read
//! `rows_affected` to learn whether they applied; InnoDB's row lock makes
//! each statement atomic per key.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

use bh_core::domain::entities::otp_record::{OtpKey, OtpRecord};
use bh_core::errors::DomainError;
use bh_core::repositories::{AttemptOutcome, OtpRecordStore};

use super::{db_error, is_unique_violation};
use crate::InfrastructureError;

const SELECT_COLUMNS: &str = r#"
    SELECT identity, purpose, issuance_id, code, issued_at, expires_at, attempts, verified
    FROM otp_records
"#;

/// MySQL implementation of OtpRecordStore
pub struct MySqlOtpStore {
    pool: MySqlPool,
}

impl MySqlOtpStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Tell apart why a guarded attempt write matched no row. Locks the row
    /// so the answer holds until the transaction ends.
    async fn refused_outcome(
        tx: &mut sqlx::Transaction<'_, sqlx::MySql>,
        key: &OtpKey,
        issuance_id: Uuid,
        max_attempts: u32,
    ) -> Result<AttemptOutcome, DomainError> {
        let row: Option<(u32, bool)> = sqlx::query_as(
            r#"
            SELECT attempts, verified FROM otp_records
            WHERE identity = ? AND purpose = ? AND issuance_id = ?
            FOR UPDATE
            "#,
        )
        .bind(&key.identity)
        .bind(key.purpose.as_str())
        .bind(issuance_id.to_string())
        .fetch_optional(&mut **tx)
        .await
        .map_err(db_error)?;

        Ok(match row {
            Some((attempts, false)) if attempts >= max_attempts => AttemptOutcome::Exhausted,
            _ => AttemptOutcome::Stale,
        })
    }

    fn row_to_record(row: &sqlx::mysql::MySqlRow) -> Result<OtpRecord, DomainError> {
        let corrupt = |e: sqlx::Error| -> DomainError {
            InfrastructureError::Corrupt(format!("otp_records row: {}", e)).into()
        };

        let issuance_id: String = row.try_get("issuance_id").map_err(corrupt)?;
        let purpose: String = row.try_get("purpose").map_err(corrupt)?;

        Ok(OtpRecord {
            issuance_id: Uuid::parse_str(&issuance_id).map_err(|e| {
                DomainError::from(InfrastructureError::Corrupt(format!("Invalid issuance id: {}", e)))
            })?,
            identity: row.try_get("identity").map_err(corrupt)?,
            purpose: purpose
                .parse()
                .map_err(|e: String| DomainError::from(InfrastructureError::Corrupt(e)))?,
            code: row.try_get("code").map_err(corrupt)?,
            issued_at: row.try_get::<DateTime<Utc>, _>("issued_at").map_err(corrupt)?,
            expires_at: row.try_get::<DateTime<Utc>, _>("expires_at").map_err(corrupt)?,
            attempts: row.try_get::<u32, _>("attempts").map_err(corrupt)?,
            verified: row.try_get::<bool, _>("verified").map_err(corrupt)?,
        })
    }
}

#[async_trait]
impl OtpRecordStore for MySqlOtpStore {
    async fn get(&self, key: &OtpKey) -> Result<Option<OtpRecord>, DomainError> {
        let query = format!("{} WHERE identity = ? AND purpose = ? LIMIT 1", SELECT_COLUMNS);

        let row = sqlx::query(&query)
            .bind(&key.identity)
            .bind(key.purpose.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn upsert(&self, record: &OtpRecord) -> Result<(), DomainError> {
        let query = r#"
            INSERT INTO otp_records
                (identity, purpose, issuance_id, code, issued_at, expires_at, attempts, verified)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                issuance_id = VALUES(issuance_id),
                code = VALUES(code),
                issued_at = VALUES(issued_at),
                expires_at = VALUES(expires_at),
                attempts = VALUES(attempts),
                verified = VALUES(verified)
        "#;

        sqlx::query(query)
            .bind(&record.identity)
            .bind(record.purpose.as_str())
            .bind(record.issuance_id.to_string())
            .bind(&record.code)
            .bind(record.issued_at)
            .bind(record.expires_at)
            .bind(record.attempts)
            .bind(record.verified)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(())
    }

    async fn compare_and_swap(
        &self,
        record: &OtpRecord,
        expected: Option<Uuid>,
    ) -> Result<bool, DomainError> {
        let Some(expected) = expected else {
            let query = r#"
                INSERT INTO otp_records
                    (identity, purpose, issuance_id, code, issued_at, expires_at, attempts, verified)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#;

            let result = sqlx::query(query)
                .bind(&record.identity)
                .bind(record.purpose.as_str())
                .bind(record.issuance_id.to_string())
                .bind(&record.code)
                .bind(record.issued_at)
                .bind(record.expires_at)
                .bind(record.attempts)
                .bind(record.verified)
                .execute(&self.pool)
                .await;

            return match result {
                Ok(_) => Ok(true),
                Err(e) if is_unique_violation(&e) => Ok(false),
                Err(e) => Err(db_error(e)),
            };
        };

        let query = r#"
            UPDATE otp_records
            SET issuance_id = ?, code = ?, issued_at = ?, expires_at = ?, attempts = ?, verified = ?
            WHERE identity = ? AND purpose = ? AND issuance_id = ?
        "#;

        let result = sqlx::query(query)
            .bind(record.issuance_id.to_string())
            .bind(&record.code)
            .bind(record.issued_at)
            .bind(record.expires_at)
            .bind(record.attempts)
            .bind(record.verified)
            .bind(&record.identity)
            .bind(record.purpose.as_str())
            .bind(expected.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn increment_attempts(
        &self,
        key: &OtpKey,
        issuance_id: Uuid,
        max_attempts: u32,
    ) -> Result<AttemptOutcome, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let updated = sqlx::query(
            r#"
            UPDATE otp_records
            SET attempts = attempts + 1
            WHERE identity = ? AND purpose = ? AND issuance_id = ?
                AND verified = FALSE AND attempts < ?
            "#,
        )
        .bind(&key.identity)
        .bind(key.purpose.as_str())
        .bind(issuance_id.to_string())
        .bind(max_attempts)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        if updated.rows_affected() == 0 {
            let outcome = Self::refused_outcome(&mut tx, key, issuance_id, max_attempts).await?;
            tx.rollback().await.map_err(db_error)?;
            return Ok(outcome);
        }

        // Same transaction holds the row lock taken by the UPDATE
        let attempts: u32 = sqlx::query_scalar(
            "SELECT attempts FROM otp_records WHERE identity = ? AND purpose = ?",
        )
        .bind(&key.identity)
        .bind(key.purpose.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        Ok(AttemptOutcome::Applied(attempts))
    }

    async fn mark_verified(
        &self,
        key: &OtpKey,
        issuance_id: Uuid,
        max_attempts: u32,
    ) -> Result<AttemptOutcome, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let updated = sqlx::query(
            r#"
            UPDATE otp_records
            SET verified = TRUE
            WHERE identity = ? AND purpose = ? AND issuance_id = ?
                AND verified = FALSE AND attempts < ?
            "#,
        )
        .bind(&key.identity)
        .bind(key.purpose.as_str())
        .bind(issuance_id.to_string())
        .bind(max_attempts)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        if updated.rows_affected() == 0 {
            let outcome = Self::refused_outcome(&mut tx, key, issuance_id, max_attempts).await?;
            tx.rollback().await.map_err(db_error)?;
            return Ok(outcome);
        }

        let attempts: u32 = sqlx::query_scalar(
            "SELECT attempts FROM otp_records WHERE identity = ? AND purpose = ?",
        )
        .bind(&key.identity)
        .bind(key.purpose.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        Ok(AttemptOutcome::Applied(attempts))
    }

    async fn delete(&self, key: &OtpKey) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM otp_records WHERE identity = ? AND purpose = ?")
            .bind(&key.identity)
            .bind(key.purpose.as_str())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_issuance(&self, key: &OtpKey, issuance_id: Uuid) -> Result<bool, DomainError> {
        let result = sqlx::query(
            "DELETE FROM otp_records WHERE identity = ? AND purpose = ? AND issuance_id = ?",
        )
        .bind(&key.identity)
        .bind(key.purpose.as_str())
        .bind(issuance_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM otp_records WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected())
    }
}
