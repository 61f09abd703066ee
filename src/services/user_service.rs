//! User service - profile reads and account administration.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{Actor, User, UserChanges};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;
use crate::types::{Paginated, PaginationParams};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User service trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserService: Send + Sync {
    /// Get a user; callers may read themselves, admins anyone
    async fn get_user(&self, actor: &Actor, id: Uuid) -> AppResult<User>;

    /// List users page by page (admin only)
    async fn list_users(
        &self,
        actor: &Actor,
        params: &PaginationParams,
    ) -> AppResult<Paginated<User>>;

    /// Update a user. Role and active flag are admin-only.
    async fn update_user(&self, actor: &Actor, id: Uuid, changes: UserChanges) -> AppResult<User>;

    /// Permanently delete a user (admin only)
    async fn delete_user(&self, actor: &Actor, id: Uuid) -> AppResult<()>;
}

/// Concrete implementation of UserService using Unit of Work.
pub struct UserManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> UserManager<U> {
    /// Create new user service instance with Unit of Work
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

fn require_admin(actor: &Actor) -> AppResult<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(AppError::forbidden("admin role required"))
    }
}

#[async_trait]
impl<U: UnitOfWork> UserService for UserManager<U> {
    async fn get_user(&self, actor: &Actor, id: Uuid) -> AppResult<User> {
        if !actor.is_self_or_admin(id) {
            return Err(AppError::forbidden("cannot view another user's profile"));
        }

        self.uow.users().find_by_id(id).await?.ok_or_not_found("user")
    }

    async fn list_users(
        &self,
        actor: &Actor,
        params: &PaginationParams,
    ) -> AppResult<Paginated<User>> {
        require_admin(actor)?;

        let (users, total) = self.uow.users().list_paginated(params).await?;
        Ok(Paginated::from_params(users, params, total))
    }

    async fn update_user(
        &self,
        actor: &Actor,
        id: Uuid,
        mut changes: UserChanges,
    ) -> AppResult<User> {
        if !actor.is_self_or_admin(id) {
            return Err(AppError::forbidden("cannot update another user's profile"));
        }
        if changes.touches_privileges() {
            require_admin(actor)?;
        }
        if actor.id == id && changes.is_active == Some(false) {
            return Err(AppError::validation("cannot deactivate your own account"));
        }

        if let Some(name) = changes.name.take() {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(AppError::validation("name cannot be empty"));
            }
            changes.name = Some(name);
        }

        let user = self.uow.users().update(id, changes).await?;
        tracing::info!(user_id = %id, actor_id = %actor.id, "User updated");
        Ok(user)
    }

    async fn delete_user(&self, actor: &Actor, id: Uuid) -> AppResult<()> {
        require_admin(actor)?;
        if actor.id == id {
            return Err(AppError::validation("cannot delete your own account"));
        }

        self.uow.users().delete(id).await?;
        tracing::info!(user_id = %id, actor_id = %actor.id, "User deleted");
        Ok(())
    }
}
