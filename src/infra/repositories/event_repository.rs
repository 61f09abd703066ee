//! Event repository implementation.
//!
//! The attendee counter is only changed by [`EventRepository::try_reserve_seat`]
//! and [`EventRepository::release_seat`], both single conditional `UPDATE`
//! statements. `update` never writes the counter or the owner.

use async_trait::async_trait;
use sea_orm::{
    sea_query::{Expr, Func},
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use uuid::Uuid;

use super::entities::event::{self, ActiveModel, Entity as EventEntity};
use super::{map_constraint_error, DbHandle};
use crate::domain::{Event, EventFilter};
use crate::errors::{AppError, AppResult};
use crate::types::PaginationParams;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Event repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Find event by ID
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Event>>;

    /// Find event by ID and lock the row until the surrounding transaction ends
    async fn find_by_id_for_update(&self, id: Uuid) -> AppResult<Option<Event>>;

    /// Page of events ordered by start date
    async fn list(
        &self,
        filter: &EventFilter,
        params: &PaginationParams,
    ) -> AppResult<(Vec<Event>, u64)>;

    /// Page of events owned by one organizer, including inactive ones
    async fn list_by_organizer(
        &self,
        organizer_id: Uuid,
        params: &PaginationParams,
    ) -> AppResult<(Vec<Event>, u64)>;

    /// Insert a new event
    async fn create(&self, event: Event) -> AppResult<Event>;

    /// Persist descriptive fields of an existing event
    async fn update(&self, event: Event) -> AppResult<Event>;

    /// Delete an event. Registrations must be removed first.
    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// Take one seat if the event has room. `false` means it was full.
    async fn try_reserve_seat(&self, id: Uuid) -> AppResult<bool>;

    /// Give one seat back. `false` means the counter was already zero.
    async fn release_seat(&self, id: Uuid) -> AppResult<bool>;
}

/// SeaORM implementation of EventRepository
pub struct EventStore<H: DbHandle> {
    db: H,
}

impl<H: DbHandle> EventStore<H> {
    /// Create new repository instance
    pub fn new(db: H) -> Self {
        Self { db }
    }

    async fn fetch_page(
        &self,
        query: Select<EventEntity>,
        params: &PaginationParams,
    ) -> AppResult<(Vec<Event>, u64)> {
        let paginator = query
            .order_by_asc(event::Column::StartsAt)
            .paginate(self.db.conn(), params.limit());

        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(params.page.saturating_sub(1)).await?;

        Ok((models.into_iter().map(Event::from).collect(), total))
    }
}

fn lower_eq(column: event::Column, value: &str) -> sea_orm::sea_query::SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column))).eq(value.trim().to_lowercase())
}

#[async_trait]
impl<H: DbHandle> EventRepository for EventStore<H> {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Event>> {
        let result = EventEntity::find_by_id(id).one(self.db.conn()).await?;
        Ok(result.map(Event::from))
    }

    async fn find_by_id_for_update(&self, id: Uuid) -> AppResult<Option<Event>> {
        let result = EventEntity::find_by_id(id)
            .lock_exclusive()
            .one(self.db.conn())
            .await?;

        Ok(result.map(Event::from))
    }

    async fn list(
        &self,
        filter: &EventFilter,
        params: &PaginationParams,
    ) -> AppResult<(Vec<Event>, u64)> {
        let mut query = EventEntity::find();

        if !filter.include_inactive {
            query = query.filter(event::Column::IsActive.eq(true));
        }
        if let Some(category) = filter.category.as_deref().filter(|c| !c.trim().is_empty()) {
            query = query.filter(lower_eq(event::Column::Category, category));
        }
        if let Some(city) = filter.city.as_deref().filter(|c| !c.trim().is_empty()) {
            query = query.filter(lower_eq(event::Column::City, city));
        }

        self.fetch_page(query, params).await
    }

    async fn list_by_organizer(
        &self,
        organizer_id: Uuid,
        params: &PaginationParams,
    ) -> AppResult<(Vec<Event>, u64)> {
        let query = EventEntity::find().filter(event::Column::OrganizerId.eq(organizer_id));
        self.fetch_page(query, params).await
    }

    async fn create(&self, event: Event) -> AppResult<Event> {
        let active_model = ActiveModel {
            id: Set(event.id),
            organizer_id: Set(event.organizer_id),
            title: Set(event.title),
            description: Set(event.description),
            starts_at: Set(event.starts_at),
            location: Set(event.location),
            address: Set(event.address),
            city: Set(event.city),
            category: Set(event.category),
            image_url: Set(event.image_url),
            max_attendees: Set(event.max_attendees),
            current_attendees: Set(event.current_attendees),
            is_active: Set(event.is_active),
            event_type: Set(event.event_type.as_str().to_string()),
            private_code: Set(event.private_code),
            created_at: Set(event.created_at),
            updated_at: Set(event.updated_at),
        };

        let model = active_model.insert(self.db.conn()).await.map_err(|e| {
            map_constraint_error(
                e,
                || AppError::conflict("event already exists"),
                || AppError::not_found("organizer"),
            )
        })?;

        Ok(Event::from(model))
    }

    async fn update(&self, event: Event) -> AppResult<Event> {
        let active_model = ActiveModel {
            id: Set(event.id),
            organizer_id: NotSet,
            title: Set(event.title),
            description: Set(event.description),
            starts_at: Set(event.starts_at),
            location: Set(event.location),
            address: Set(event.address),
            city: Set(event.city),
            category: Set(event.category),
            image_url: Set(event.image_url),
            max_attendees: Set(event.max_attendees),
            current_attendees: NotSet,
            is_active: Set(event.is_active),
            event_type: Set(event.event_type.as_str().to_string()),
            private_code: Set(event.private_code),
            created_at: NotSet,
            updated_at: Set(event.updated_at),
        };

        match active_model.update(self.db.conn()).await {
            Ok(model) => Ok(Event::from(model)),
            Err(DbErr::RecordNotUpdated) => Err(AppError::not_found("event")),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = EventEntity::delete_by_id(id)
            .exec(self.db.conn())
            .await
            .map_err(|e| {
                map_constraint_error(
                    e,
                    || AppError::internal("unexpected unique violation on event delete"),
                    || AppError::internal("event still has registrations"),
                )
            })?;

        if result.rows_affected == 0 {
            return Err(AppError::not_found("event"));
        }

        Ok(())
    }

    async fn try_reserve_seat(&self, id: Uuid) -> AppResult<bool> {
        let has_room = Condition::any()
            .add(event::Column::MaxAttendees.is_null())
            .add(
                Expr::col(event::Column::CurrentAttendees)
                    .lt(Expr::col(event::Column::MaxAttendees)),
            );

        let result = EventEntity::update_many()
            .col_expr(
                event::Column::CurrentAttendees,
                Expr::col(event::Column::CurrentAttendees).add(1),
            )
            .col_expr(event::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
            .filter(event::Column::Id.eq(id))
            .filter(has_room)
            .exec(self.db.conn())
            .await?;

        Ok(result.rows_affected == 1)
    }

    async fn release_seat(&self, id: Uuid) -> AppResult<bool> {
        let result = EventEntity::update_many()
            .col_expr(
                event::Column::CurrentAttendees,
                Expr::col(event::Column::CurrentAttendees).sub(1),
            )
            .col_expr(event::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
            .filter(event::Column::Id.eq(id))
            .filter(event::Column::CurrentAttendees.gt(0))
            .exec(self.db.conn())
            .await?;

        Ok(result.rows_affected == 1)
    }
}
