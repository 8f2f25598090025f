//! MySQL implementation of the UserRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

use bh_core::domain::entities::user::{User, UserRole};
use bh_core::errors::{AuthError, DomainError};
use bh_core::repositories::UserRepository;

use super::{db_error, is_unique_violation};
use crate::InfrastructureError;

/// MySQL implementation of UserRepository
pub struct MySqlUserRepository {
    pool: MySqlPool,
}

impl MySqlUserRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Convert database row to User entity
    fn row_to_user(row: &sqlx::mysql::MySqlRow) -> Result<User, DomainError> {
        let corrupt = |e: sqlx::Error| -> DomainError {
            InfrastructureError::Corrupt(format!("users row: {}", e)).into()
        };

        let id: String = row.try_get("id").map_err(corrupt)?;
        let role: String = row.try_get("role").map_err(corrupt)?;

        Ok(User {
            id: Uuid::parse_str(&id).map_err(|e| {
                DomainError::from(InfrastructureError::Corrupt(format!("Invalid UUID: {}", e)))
            })?,
            email: row.try_get("email").map_err(corrupt)?,
            password_hash: row.try_get("password_hash").map_err(corrupt)?,
            full_name: row.try_get("full_name").map_err(corrupt)?,
            role: role
                .parse::<UserRole>()
                .map_err(|e| DomainError::from(InfrastructureError::Corrupt(e)))?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(corrupt)?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at").map_err(corrupt)?,
        })
    }
}

#[async_trait]
impl UserRepository for MySqlUserRepository {
    async fn find_by_email(&self, email: &str, role: UserRole) -> Result<Option<User>, DomainError> {
        let query = r#"
            SELECT id, email, password_hash, full_name, role, created_at, updated_at
            FROM users
            WHERE email = ? AND role = ?
            LIMIT 1
        "#;

        let row = sqlx::query(query)
            .bind(email)
            .bind(role.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        let query = r#"
            SELECT id, email, password_hash, full_name, role, created_at, updated_at
            FROM users
            WHERE id = ?
        "#;

        let row = sqlx::query(query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        let query = r#"
            INSERT INTO users (id, email, password_hash, full_name, role, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
        "#;

        let result = sqlx::query(query)
            .bind(user.id.to_string())
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.full_name)
            .bind(user.role.as_str())
            .bind(user.created_at)
            .bind(user.updated_at)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(user),
            Err(e) if is_unique_violation(&e) => Err(AuthError::UserAlreadyExists.into()),
            Err(e) => Err(db_error(e)),
        }
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, DomainError> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?",
        )
        .bind(password_hash)
        .bind(Utc::now())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn exists_by_email(&self, email: &str, role: UserRole) -> Result<bool, DomainError> {
        let exists: i64 = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = ? AND role = ?)",
        )
        .bind(email)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(exists > 0)
    }
}
