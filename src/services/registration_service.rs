//! Registration workflow: register for an event, cancel, and the queries
//! around registrations.
//!
//! Register and cancel each run in one transaction. The seat counter moves
//! only through the event repository's conditional updates, so concurrent
//! requests can never push it past `max_attendees` or below zero.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use super::ticket_service::{Ticket, TicketIssuer};
use crate::domain::{Actor, RegisterForEvent, Registration, UserRole};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

const MSG_ALREADY_REGISTERED: &str = "already registered";
const MSG_CAPACITY_REACHED: &str = "maximum attendees reached";
const MSG_ALREADY_CANCELLED: &str = "already cancelled";
const MSG_NOT_A_VISITOR: &str = "only visitors can be registered for events";

/// Registration service trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait RegistrationService: Send + Sync {
    /// Register a visitor for an event
    async fn register_for_event(&self, request: RegisterForEvent) -> AppResult<Registration>;

    /// Cancel a registration on behalf of its visitor (or an admin)
    async fn cancel_registration(&self, actor: &Actor, registration_id: Uuid) -> AppResult<()>;

    /// The caller's own registrations
    async fn list_my_registrations(&self, actor: &Actor) -> AppResult<Vec<Registration>>;

    /// One registration, visible to its visitor, the event owner and admins
    async fn get_registration(&self, actor: &Actor, id: Uuid) -> AppResult<Registration>;

    /// Attendee list of an event, for its owner and admins
    async fn list_event_registrations(
        &self,
        actor: &Actor,
        event_id: Uuid,
    ) -> AppResult<Vec<Registration>>;
}

/// The registration workflow
pub struct RegistrationManager<U: UnitOfWork> {
    uow: Arc<U>,
    tickets: Arc<dyn TicketIssuer>,
}

impl<U: UnitOfWork> RegistrationManager<U> {
    pub fn new(uow: Arc<U>, tickets: Arc<dyn TicketIssuer>) -> Self {
        Self { uow, tickets }
    }

    /// Hand the ticket to the issuer in the background; the registration is
    /// already committed and stands whatever the issuer reports.
    fn issue_ticket(&self, ticket: Ticket) {
        let tickets = Arc::clone(&self.tickets);
        tokio::spawn(async move {
            let registration_id = ticket.registration_id;
            if let Err(e) = tickets.issue(ticket).await {
                tracing::warn!(
                    registration_id = %registration_id,
                    error = %e,
                    "Ticket issuing failed; registration kept"
                );
            }
        });
    }
}

#[async_trait]
impl<U: UnitOfWork> RegistrationService for RegistrationManager<U> {
    async fn register_for_event(&self, request: RegisterForEvent) -> AppResult<Registration> {
        let (registration, ticket) = self
            .uow
            .transaction(move |tx| {
                Box::pin(async move {
                    let visitor = tx
                        .users()
                        .find_by_id(request.visitor_id)
                        .await?
                        .ok_or_not_found("visitor")?;

                    if visitor.role != UserRole::Visitor {
                        return Err(AppError::validation(MSG_NOT_A_VISITOR));
                    }

                    let event = tx
                        .events()
                        .find_by_id(request.event_id)
                        .await?
                        .ok_or_not_found("event")?;

                    event.ensure_active()?;
                    event.verify_access_code(request.private_code.as_deref())?;

                    if tx
                        .registrations()
                        .find_active(visitor.id, event.id)
                        .await?
                        .is_some()
                    {
                        return Err(AppError::conflict(MSG_ALREADY_REGISTERED));
                    }

                    if !event.has_capacity() {
                        return Err(AppError::conflict(MSG_CAPACITY_REACHED));
                    }

                    // Authoritative check; also locks the event row until commit
                    if !tx.events().try_reserve_seat(event.id).await? {
                        return Err(AppError::conflict(MSG_CAPACITY_REACHED));
                    }

                    let registration = tx
                        .registrations()
                        .create(Registration::confirmed(
                            event.id,
                            visitor.id,
                            request.phone,
                            request.notes,
                        ))
                        .await?;

                    let ticket = Ticket::new(&registration, &event, &visitor);
                    Ok((registration, ticket))
                })
            })
            .await?;

        tracing::info!(
            registration_id = %registration.id,
            event_id = %registration.event_id,
            visitor_id = %registration.visitor_id,
            "Registration confirmed"
        );

        self.issue_ticket(ticket);
        Ok(registration)
    }

    async fn cancel_registration(&self, actor: &Actor, registration_id: Uuid) -> AppResult<()> {
        let actor = actor.clone();

        let registration = self
            .uow
            .transaction(move |tx| {
                Box::pin(async move {
                    let registration = tx
                        .registrations()
                        .find_by_id(registration_id)
                        .await?
                        .ok_or_not_found("registration")?;

                    if !actor.is_self_or_admin(registration.visitor_id) {
                        return Err(AppError::forbidden(
                            "cannot cancel another visitor's registration",
                        ));
                    }

                    if !registration.is_active() {
                        return Err(AppError::conflict(MSG_ALREADY_CANCELLED));
                    }

                    // Conditional on the current status, so a racing cancel loses here
                    if !tx.registrations().mark_cancelled(registration.id).await? {
                        return Err(AppError::conflict(MSG_ALREADY_CANCELLED));
                    }

                    if !tx.events().release_seat(registration.event_id).await? {
                        tracing::warn!(
                            event_id = %registration.event_id,
                            "Attendee counter already at zero on cancel"
                        );
                    }

                    Ok(registration)
                })
            })
            .await?;

        tracing::info!(
            registration_id = %registration.id,
            event_id = %registration.event_id,
            "Registration cancelled"
        );
        Ok(())
    }

    async fn list_my_registrations(&self, actor: &Actor) -> AppResult<Vec<Registration>> {
        self.uow.registrations().list_by_visitor(actor.id).await
    }

    async fn get_registration(&self, actor: &Actor, id: Uuid) -> AppResult<Registration> {
        let registration = self
            .uow
            .registrations()
            .find_by_id(id)
            .await?
            .ok_or_not_found("registration")?;

        if actor.is_self_or_admin(registration.visitor_id) {
            return Ok(registration);
        }

        let event = self.uow.events().find_by_id(registration.event_id).await?;
        match event {
            Some(event) if event.is_owned_by(actor.id) => Ok(registration),
            _ => Err(AppError::forbidden("cannot view this registration")),
        }
    }

    async fn list_event_registrations(
        &self,
        actor: &Actor,
        event_id: Uuid,
    ) -> AppResult<Vec<Registration>> {
        let event = self
            .uow
            .events()
            .find_by_id(event_id)
            .await?
            .ok_or_not_found("event")?;

        if !event.is_managed_by(actor) {
            return Err(AppError::forbidden("only the event owner can list attendees"));
        }

        self.uow.registrations().list_by_event(event_id).await
    }
}
