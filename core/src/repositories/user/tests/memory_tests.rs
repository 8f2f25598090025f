use uuid::Uuid;

use crate::domain::entities::user::{User, UserRole};
use crate::errors::{AuthError, DomainError};
use crate::repositories::user::{InMemoryUserRepository, UserRepository};

fn tenant(email: &str) -> User {
    User::new(
        email.to_string(),
        "$2b$04$hash".to_string(),
        "Test Tenant".to_string(),
        UserRole::Tenant,
    )
}

#[tokio::test]
async fn test_create_and_find_by_email() {
    let repo = InMemoryUserRepository::new();
    let created = repo.create(tenant("a@x.com")).await.unwrap();

    let found = repo.find_by_email("a@x.com", UserRole::Tenant).await.unwrap();
    assert_eq!(found.map(|u| u.id), Some(created.id));
    assert!(repo.find_by_id(created.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_accounts_are_scoped_by_role() {
    let repo = InMemoryUserRepository::new();
    repo.create(tenant("a@x.com")).await.unwrap();

    assert!(repo.exists_by_email("a@x.com", UserRole::Tenant).await.unwrap());
    assert!(!repo.exists_by_email("a@x.com", UserRole::Owner).await.unwrap());

    let owner = User::new(
        "a@x.com".to_string(),
        "$2b$04$hash".to_string(),
        "Test Owner".to_string(),
        UserRole::Owner,
    );
    repo.create(owner).await.unwrap();
    assert_eq!(repo.count().await, 2);
}

#[tokio::test]
async fn test_duplicate_email_and_role_is_rejected() {
    let repo = InMemoryUserRepository::new();
    repo.create(tenant("a@x.com")).await.unwrap();

    let result = repo.create(tenant("a@x.com")).await;
    assert!(matches!(
        result,
        Err(DomainError::Auth(AuthError::UserAlreadyExists))
    ));
}

#[tokio::test]
async fn test_update_password() {
    let repo = InMemoryUserRepository::new();
    let user = repo.create(tenant("a@x.com")).await.unwrap();

    assert!(repo.update_password(user.id, "$2b$04$other").await.unwrap());
    let stored = repo.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.password_hash, "$2b$04$other");

    assert!(!repo.update_password(Uuid::new_v4(), "x").await.unwrap());
}
