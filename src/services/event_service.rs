//! Event service - organizer-owned event lifecycle.
//!
//! Check order on every mutating call: existence, then ownership, then
//! field validation.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{Actor, Event, EventChanges, EventDraft, EventFilter};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;
use crate::types::{Paginated, PaginationParams};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Event service trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait EventService: Send + Sync {
    /// Create an event owned by the calling organizer
    async fn create_event(&self, actor: &Actor, draft: EventDraft) -> AppResult<Event>;

    /// Update an event the caller owns
    async fn update_event(&self, actor: &Actor, id: Uuid, changes: EventChanges)
        -> AppResult<Event>;

    /// Delete an event and all of its registrations
    async fn delete_event(&self, actor: &Actor, id: Uuid) -> AppResult<()>;

    /// Get one event. Inactive events are only visible to their managers.
    async fn get_event(&self, actor: &Actor, id: Uuid) -> AppResult<Event>;

    /// Browse events
    async fn list_events(
        &self,
        actor: &Actor,
        filter: EventFilter,
        params: &PaginationParams,
    ) -> AppResult<Paginated<Event>>;

    /// The calling organizer's own events
    async fn list_my_events(
        &self,
        actor: &Actor,
        params: &PaginationParams,
    ) -> AppResult<Paginated<Event>>;
}

/// Concrete implementation of EventService using Unit of Work.
pub struct EventManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> EventManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

fn require_owner(actor: &Actor, event: &Event) -> AppResult<()> {
    if actor.is_organizer() && event.is_owned_by(actor.id) {
        Ok(())
    } else {
        Err(AppError::forbidden("only the owning organizer can modify this event"))
    }
}

#[async_trait]
impl<U: UnitOfWork> EventService for EventManager<U> {
    async fn create_event(&self, actor: &Actor, draft: EventDraft) -> AppResult<Event> {
        if !actor.is_organizer() {
            return Err(AppError::forbidden("only organizers can create events"));
        }
        draft.validate(Utc::now())?;

        let event = self
            .uow
            .events()
            .create(Event::new(actor.id, draft))
            .await?;

        tracing::info!(event_id = %event.id, organizer_id = %actor.id, "Event created");
        Ok(event)
    }

    async fn update_event(
        &self,
        actor: &Actor,
        id: Uuid,
        changes: EventChanges,
    ) -> AppResult<Event> {
        let actor = actor.clone();

        let event = self
            .uow
            .transaction(move |tx| {
                Box::pin(async move {
                    // Row lock keeps seat reservations out until commit
                    let mut event = tx
                        .events()
                        .find_by_id_for_update(id)
                        .await?
                        .ok_or_not_found("event")?;

                    require_owner(&actor, &event)?;
                    changes.validate(Utc::now())?;

                    event.apply(changes);
                    event.validate_invariants()?;

                    tx.events().update(event).await
                })
            })
            .await?;

        tracing::info!(event_id = %event.id, "Event updated");
        Ok(event)
    }

    async fn delete_event(&self, actor: &Actor, id: Uuid) -> AppResult<()> {
        let actor = actor.clone();

        let removed = self
            .uow
            .transaction(move |tx| {
                Box::pin(async move {
                    let event = tx
                        .events()
                        .find_by_id_for_update(id)
                        .await?
                        .ok_or_not_found("event")?;

                    if !actor.is_admin() {
                        require_owner(&actor, &event)?;
                    }

                    let removed = tx.registrations().delete_by_event(event.id).await?;
                    tx.events().delete(event.id).await?;
                    Ok::<_, AppError>(removed)
                })
            })
            .await
            .map_err(|e| match e {
                AppError::Database(db) => {
                    AppError::internal(format!("failed to delete event: {}", db))
                }
                other => other,
            })?;

        tracing::info!(event_id = %id, registrations = removed, "Event deleted");
        Ok(())
    }

    async fn get_event(&self, actor: &Actor, id: Uuid) -> AppResult<Event> {
        let event = self
            .uow
            .events()
            .find_by_id(id)
            .await?
            .ok_or_not_found("event")?;

        if !event.is_active && !event.is_managed_by(actor) {
            return Err(AppError::not_found("event"));
        }

        Ok(event)
    }

    async fn list_events(
        &self,
        actor: &Actor,
        mut filter: EventFilter,
        params: &PaginationParams,
    ) -> AppResult<Paginated<Event>> {
        filter.include_inactive = filter.include_inactive && actor.is_admin();

        let (events, total) = self.uow.events().list(&filter, params).await?;
        Ok(Paginated::from_params(events, params, total))
    }

    async fn list_my_events(
        &self,
        actor: &Actor,
        params: &PaginationParams,
    ) -> AppResult<Paginated<Event>> {
        if !actor.is_organizer() {
            return Err(AppError::forbidden("only organizers own events"));
        }

        let (events, total) = self
            .uow
            .events()
            .list_by_organizer(actor.id, params)
            .await?;
        Ok(Paginated::from_params(events, params, total))
    }
}
