//! User service unit tests.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::predicate::eq;
use uuid::Uuid;

use event_hub::domain::{Actor, User, UserChanges, UserRole};
use event_hub::errors::{AppError, AppResult};
use event_hub::infra::{
    EventRepository, MockEventRepository, MockRegistrationRepository, MockUserRepository,
    RegistrationRepository, TransactionContext, TxFuture, UnitOfWork, UserRepository,
};
use event_hub::services::{UserManager, UserService};
use event_hub::types::PaginationParams;

fn create_test_user(id: Uuid, role: UserRole) -> User {
    let mut user = User::new(
        "test@example.com".to_string(),
        "hashed".to_string(),
        "Test User".to_string(),
        role,
    );
    user.id = id;
    user
}

fn admin() -> Actor {
    Actor::new(Uuid::new_v4(), "admin@example.com", UserRole::Admin)
}

fn visitor(id: Uuid) -> Actor {
    Actor::new(id, "test@example.com", UserRole::Visitor)
}

/// Test double for UnitOfWork that wraps a MockUserRepository
struct TestUnitOfWork {
    user_repo: Arc<MockUserRepository>,
}

impl TestUnitOfWork {
    fn new(user_repo: MockUserRepository) -> Self {
        Self {
            user_repo: Arc::new(user_repo),
        }
    }
}

#[async_trait]
impl UnitOfWork for TestUnitOfWork {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.user_repo.clone()
    }

    fn events(&self) -> Arc<dyn EventRepository> {
        Arc::new(MockEventRepository::new())
    }

    fn registrations(&self) -> Arc<dyn RegistrationRepository> {
        Arc::new(MockRegistrationRepository::new())
    }

    async fn transaction<F, T>(&self, _f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(&'a dyn TransactionContext) -> TxFuture<'a, T> + Send,
        T: Send,
    {
        Err(AppError::internal("user management runs without transactions"))
    }
}

fn service(repo: MockUserRepository) -> UserManager<TestUnitOfWork> {
    UserManager::new(Arc::new(TestUnitOfWork::new(repo)))
}

#[tokio::test]
async fn test_get_own_profile() {
    let user_id = Uuid::new_v4();

    let mut repo = MockUserRepository::new();
    repo.expect_find_by_id()
        .with(eq(user_id))
        .returning(|id| Ok(Some(create_test_user(id, UserRole::Visitor))));

    let result = service(repo).get_user(&visitor(user_id), user_id).await;

    assert_eq!(result.unwrap().id, user_id);
}

#[tokio::test]
async fn test_get_user_not_found() {
    let mut repo = MockUserRepository::new();
    repo.expect_find_by_id().returning(|_| Ok(None));

    let result = service(repo).get_user(&admin(), Uuid::new_v4()).await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_get_other_profile_forbidden() {
    let mut repo = MockUserRepository::new();
    repo.expect_find_by_id().never();

    let result = service(repo)
        .get_user(&visitor(Uuid::new_v4()), Uuid::new_v4())
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn test_list_users_requires_admin() {
    let mut repo = MockUserRepository::new();
    repo.expect_list_paginated().returning(|_| {
        Ok((
            vec![
                create_test_user(Uuid::new_v4(), UserRole::Visitor),
                create_test_user(Uuid::new_v4(), UserRole::Organizer),
            ],
            12,
        ))
    });
    let service = service(repo);
    let params = PaginationParams {
        page: 2,
        per_page: 2,
    };

    let page = service.list_users(&admin(), &params).await.unwrap();
    assert_eq!(page.data.len(), 2);
    assert_eq!(page.meta.total, 12);
    assert_eq!(page.meta.total_pages, 6);

    let denied = service.list_users(&visitor(Uuid::new_v4()), &params).await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn test_self_update_trims_name() {
    let user_id = Uuid::new_v4();

    let mut repo = MockUserRepository::new();
    repo.expect_update()
        .withf(move |id, changes| *id == user_id && changes.name.as_deref() == Some("Ada"))
        .times(1)
        .returning(|id, changes| {
            let mut user = create_test_user(id, UserRole::Visitor);
            user.name = changes.name.unwrap_or_default();
            Ok(user)
        });

    let changes = UserChanges {
        name: Some("  Ada ".to_string()),
        ..Default::default()
    };
    let user = service(repo)
        .update_user(&visitor(user_id), user_id, changes)
        .await
        .unwrap();

    assert_eq!(user.name, "Ada");
}

#[tokio::test]
async fn test_self_role_change_forbidden() {
    let user_id = Uuid::new_v4();
    let mut repo = MockUserRepository::new();
    repo.expect_update().never();

    let changes = UserChanges {
        role: Some(UserRole::Admin),
        ..Default::default()
    };
    let result = service(repo)
        .update_user(&visitor(user_id), user_id, changes)
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn test_blank_name_rejected() {
    let user_id = Uuid::new_v4();
    let mut repo = MockUserRepository::new();
    repo.expect_update().never();

    let changes = UserChanges {
        name: Some("   ".to_string()),
        ..Default::default()
    };
    let result = service(repo)
        .update_user(&visitor(user_id), user_id, changes)
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_admin_cannot_deactivate_self() {
    let admin = admin();
    let mut repo = MockUserRepository::new();
    repo.expect_update().never();

    let changes = UserChanges {
        is_active: Some(false),
        ..Default::default()
    };
    let result = service(repo).update_user(&admin, admin.id, changes).await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_delete_user_success() {
    let user_id = Uuid::new_v4();

    let mut repo = MockUserRepository::new();
    repo.expect_delete()
        .with(eq(user_id))
        .times(1)
        .returning(|_| Ok(()));

    let result = service(repo).delete_user(&admin(), user_id).await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_delete_owner_of_events_is_conflict() {
    let mut repo = MockUserRepository::new();
    repo.expect_delete()
        .returning(|_| Err(AppError::conflict("user still owns events or registrations")));

    let result = service(repo).delete_user(&admin(), Uuid::new_v4()).await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn test_delete_requires_admin_and_not_self() {
    let admin = admin();
    let mut repo = MockUserRepository::new();
    repo.expect_delete().never();
    let service = service(repo);

    let own = service.delete_user(&admin, admin.id).await;
    assert!(matches!(own, Err(AppError::Validation(_))));

    let id = Uuid::new_v4();
    let by_visitor = service.delete_user(&visitor(id), id).await;
    assert!(matches!(by_visitor, Err(AppError::Forbidden(_))));
}
