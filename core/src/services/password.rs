//! Password policy and bcrypt hashing
//!
//! Hashing runs on the blocking pool: a cost-12 bcrypt round takes a few
//! hundred milliseconds and would otherwise stall the async workers.

use bh_shared::config::PasswordConfig;

use crate::errors::{AuthError, DomainError};

/// bcrypt ignores everything past this many bytes of input
pub const BCRYPT_MAX_BYTES: usize = 72;

/// Applies the password policy and hashes with bcrypt
#[derive(Debug, Clone)]
pub struct PasswordService {
    config: PasswordConfig,
}

impl PasswordService {
    pub fn new(config: PasswordConfig) -> Self {
        Self { config }
    }

    /// Reject passwords outside the configured length bounds, and any
    /// password bcrypt would silently truncate
    pub fn check_policy(&self, password: &str) -> Result<(), AuthError> {
        let max = self.config.max_length.min(BCRYPT_MAX_BYTES);
        let length = password.chars().count();
        if length < self.config.min_length || length > max || password.len() > BCRYPT_MAX_BYTES {
            return Err(AuthError::WeakPassword {
                min: self.config.min_length,
                max,
            });
        }
        Ok(())
    }

    /// Check the policy, then hash
    pub async fn hash(&self, password: &str) -> Result<String, DomainError> {
        self.check_policy(password)?;

        let password = password.to_string();
        let cost = self.config.bcrypt_cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| DomainError::Internal {
                message: format!("Password hashing task failed: {}", e),
            })?
            .map_err(|_| DomainError::Auth(AuthError::PasswordHashingFailed))
    }

    pub async fn verify(&self, password: &str, hash: &str) -> Result<bool, DomainError> {
        let password = password.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| DomainError::Internal {
                message: format!("Password verification task failed: {}", e),
            })?
            .map_err(|_| DomainError::Auth(AuthError::PasswordHashingFailed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> PasswordService {
        PasswordService::new(PasswordConfig {
            bcrypt_cost: 4,
            ..Default::default()
        })
    }

    #[test]
    fn test_policy_bounds() {
        let service = service();
        assert!(service.check_policy("short").is_err());
        assert!(service.check_policy("longenough").is_ok());
        assert!(service.check_policy(&"x".repeat(72)).is_ok());
        assert!(service.check_policy(&"x".repeat(73)).is_err());
        assert_eq!(
            service.check_policy("1234567"),
            Err(AuthError::WeakPassword { min: 8, max: 72 })
        );
    }

    #[test]
    fn test_policy_refuses_input_bcrypt_would_truncate() {
        // A looser configured limit does not lift the bcrypt cap
        let service = PasswordService::new(PasswordConfig {
            bcrypt_cost: 4,
            min_length: 8,
            max_length: 128,
        });
        assert!(service.check_policy(&"x".repeat(100)).is_err());

        // 40 characters but 80 bytes
        let multibyte = "é".repeat(40);
        assert_eq!(
            service.check_policy(&multibyte),
            Err(AuthError::WeakPassword { min: 8, max: 72 })
        );
    }

    #[tokio::test]
    async fn test_overlong_password_is_not_hashed() {
        let service = service();
        assert!(service.hash(&"p".repeat(72)).await.is_ok());

        let result = service.hash(&format!("{}tail", "p".repeat(72))).await;
        assert!(matches!(result, Err(DomainError::Auth(AuthError::WeakPassword { .. }))));
    }

    #[tokio::test]
    async fn test_hash_and_verify() {
        let service = service();
        let hash = service.hash("correct horse").await.unwrap();

        assert_ne!(hash, "correct horse");
        assert!(service.verify("correct horse", &hash).await.unwrap());
        assert!(!service.verify("wrong horse", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_hash_rejects_weak_password() {
        let result = service().hash("abc").await;
        assert!(matches!(result, Err(DomainError::Auth(AuthError::WeakPassword { .. }))));
    }
}
