//! User repository trait defining the interface for account persistence.
//!
//! Accounts are unique per `(email, role)`: the same address may hold a
//! tenant account and an owner account. Emails passed in are expected to be
//! normalized already.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::user::{User, UserRole};
use crate::errors::DomainError;

/// Repository trait for User entity persistence operations
///
/// # Example Implementation
/// ```no_run
/// use async_trait::async_trait;
/// use uuid::Uuid;
/// use bh_core::repositories::UserRepository;
/// use bh_core::domain::entities::user::{User, UserRole};
/// use bh_core::errors::DomainError;
///
/// struct PostgresUserRepository;
///
/// #[async_trait]
/// impl UserRepository for PostgresUserRepository {
///     async fn find_by_email(&self, email: &str, role: UserRole) -> Result<Option<User>, DomainError> {
///         Ok(None)
///     }
///     async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
///         Ok(None)
///     }
///     async fn create(&self, user: User) -> Result<User, DomainError> {
///         Ok(user)
///     }
///     async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, DomainError> {
///         Ok(false)
///     }
/// }
/// ```
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find the account registered with `email` under `role`
    ///
    /// # Returns
    /// * `Ok(Some(User))` - Account found
    /// * `Ok(None)` - No account for this email and role
    /// * `Err(DomainError)` - Storage failure
    async fn find_by_email(&self, email: &str, role: UserRole) -> Result<Option<User>, DomainError>;

    /// Find a user by their unique identifier
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError>;

    /// Persist a new account
    ///
    /// Fails with `AuthError::UserAlreadyExists` when an account already
    /// exists for the same email and role.
    async fn create(&self, user: User) -> Result<User, DomainError>;

    /// Replace the stored password hash; returns whether an account was updated
    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, DomainError>;

    /// Check whether an account exists for `email` under `role`
    async fn exists_by_email(&self, email: &str, role: UserRole) -> Result<bool, DomainError> {
        Ok(self.find_by_email(email, role).await?.is_some())
    }
}
