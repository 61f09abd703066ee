//! Registration repository implementation.

use async_trait::async_trait;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::entities::registration::{self, ActiveModel, Entity as RegistrationEntity};
use super::{map_constraint_error, DbHandle};
use crate::config::STATUS_CANCELLED;
use crate::domain::Registration;
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Registration repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait RegistrationRepository: Send + Sync {
    /// Find registration by ID
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Registration>>;

    /// The visitor's non-cancelled registration for an event, if any
    async fn find_active(&self, visitor_id: Uuid, event_id: Uuid)
        -> AppResult<Option<Registration>>;

    /// Insert a registration. A second active row for the same pair is a conflict.
    async fn create(&self, registration: Registration) -> AppResult<Registration>;

    /// Move a registration to CANCELLED. `false` means it already was.
    async fn mark_cancelled(&self, id: Uuid) -> AppResult<bool>;

    /// All registrations of a visitor, newest first
    async fn list_by_visitor(&self, visitor_id: Uuid) -> AppResult<Vec<Registration>>;

    /// All registrations of an event, oldest first
    async fn list_by_event(&self, event_id: Uuid) -> AppResult<Vec<Registration>>;

    /// Remove every registration of an event, returning how many went
    async fn delete_by_event(&self, event_id: Uuid) -> AppResult<u64>;
}

/// SeaORM implementation of RegistrationRepository
pub struct RegistrationStore<H: DbHandle> {
    db: H,
}

impl<H: DbHandle> RegistrationStore<H> {
    /// Create new repository instance
    pub fn new(db: H) -> Self {
        Self { db }
    }
}

#[async_trait]
impl<H: DbHandle> RegistrationRepository for RegistrationStore<H> {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Registration>> {
        let result = RegistrationEntity::find_by_id(id)
            .one(self.db.conn())
            .await?;

        Ok(result.map(Registration::from))
    }

    async fn find_active(
        &self,
        visitor_id: Uuid,
        event_id: Uuid,
    ) -> AppResult<Option<Registration>> {
        let result = RegistrationEntity::find()
            .filter(registration::Column::VisitorId.eq(visitor_id))
            .filter(registration::Column::EventId.eq(event_id))
            .filter(registration::Column::Status.ne(STATUS_CANCELLED))
            .one(self.db.conn())
            .await?;

        Ok(result.map(Registration::from))
    }

    async fn create(&self, registration: Registration) -> AppResult<Registration> {
        let active_model = ActiveModel {
            id: Set(registration.id),
            event_id: Set(registration.event_id),
            visitor_id: Set(registration.visitor_id),
            status: Set(registration.status.as_str().to_string()),
            registered_at: Set(registration.registered_at),
            phone: Set(registration.phone),
            notes: Set(registration.notes),
            updated_at: Set(registration.updated_at),
        };

        let model = active_model.insert(self.db.conn()).await.map_err(|e| {
            map_constraint_error(
                e,
                || AppError::conflict("already registered"),
                || AppError::not_found("event or visitor"),
            )
        })?;

        Ok(Registration::from(model))
    }

    async fn mark_cancelled(&self, id: Uuid) -> AppResult<bool> {
        let result = RegistrationEntity::update_many()
            .col_expr(registration::Column::Status, Expr::value(STATUS_CANCELLED))
            .col_expr(
                registration::Column::UpdatedAt,
                Expr::value(Some(chrono::Utc::now())),
            )
            .filter(registration::Column::Id.eq(id))
            .filter(registration::Column::Status.ne(STATUS_CANCELLED))
            .exec(self.db.conn())
            .await?;

        Ok(result.rows_affected == 1)
    }

    async fn list_by_visitor(&self, visitor_id: Uuid) -> AppResult<Vec<Registration>> {
        let models = RegistrationEntity::find()
            .filter(registration::Column::VisitorId.eq(visitor_id))
            .order_by_desc(registration::Column::RegisteredAt)
            .all(self.db.conn())
            .await?;

        Ok(models.into_iter().map(Registration::from).collect())
    }

    async fn list_by_event(&self, event_id: Uuid) -> AppResult<Vec<Registration>> {
        let models = RegistrationEntity::find()
            .filter(registration::Column::EventId.eq(event_id))
            .order_by_asc(registration::Column::RegisteredAt)
            .all(self.db.conn())
            .await?;

        Ok(models.into_iter().map(Registration::from).collect())
    }

    async fn delete_by_event(&self, event_id: Uuid) -> AppResult<u64> {
        let result = RegistrationEntity::delete_many()
            .filter(registration::Column::EventId.eq(event_id))
            .exec(self.db.conn())
            .await?;

        Ok(result.rows_affected)
    }
}
