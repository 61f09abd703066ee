//! Ticket issuing, run after a registration has committed.
//!
//! Issuing is best-effort: callers log failures and move on.

use async_trait::async_trait;
use apalis::prelude::Storage;
use apalis_sql::postgres::PostgresStorage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{TICKET_CODE_LENGTH, TICKET_CODE_PREFIX};
use crate::domain::{Event, Registration, User};
use crate::errors::{AppError, AppResult};
use crate::jobs::EmailJob;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Human-facing ticket code derived from the registration id,
/// e.g. `TKT-3F2A9C01B7D4`.
pub fn ticket_code(registration_id: Uuid) -> String {
    let hex = registration_id.simple().to_string();
    format!(
        "{}{}",
        TICKET_CODE_PREFIX,
        hex[..TICKET_CODE_LENGTH].to_uppercase()
    )
}

/// Everything needed to render a ticket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub code: String,
    pub registration_id: Uuid,
    pub event_id: Uuid,
    pub event_title: String,
    pub starts_at: DateTime<Utc>,
    pub location: String,
    pub visitor_name: String,
    pub visitor_email: String,
}

impl Ticket {
    pub fn new(registration: &Registration, event: &Event, visitor: &User) -> Self {
        Self {
            code: ticket_code(registration.id),
            registration_id: registration.id,
            event_id: event.id,
            event_title: event.title.clone(),
            starts_at: event.starts_at,
            location: event.location.clone(),
            visitor_name: visitor.name.clone(),
            visitor_email: visitor.email.clone(),
        }
    }

    /// The confirmation e-mail carrying this ticket
    pub fn to_email(&self) -> EmailJob {
        let subject = format!("Your ticket for {}", self.event_title);
        let body = format!(
            "Hello {},\n\n\
             You are registered for \"{}\".\n\
             When: {}\n\
             Where: {}\n\n\
             Ticket code: {}\n",
            self.visitor_name,
            self.event_title,
            self.starts_at.format("%Y-%m-%d %H:%M UTC"),
            self.location,
            self.code,
        );
        EmailJob::new(self.visitor_email.clone(), subject, body)
    }
}

/// Ticket delivery seam
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait TicketIssuer: Send + Sync {
    async fn issue(&self, ticket: Ticket) -> AppResult<()>;
}

/// Queues the ticket e-mail on the background job storage
pub struct QueuedTicketIssuer {
    storage: PostgresStorage<EmailJob>,
}

impl QueuedTicketIssuer {
    pub fn new(storage: PostgresStorage<EmailJob>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl TicketIssuer for QueuedTicketIssuer {
    async fn issue(&self, ticket: Ticket) -> AppResult<()> {
        let mut storage = self.storage.clone();
        storage
            .push(ticket.to_email())
            .await
            .map_err(|e| AppError::internal(format!("Failed to queue ticket e-mail: {}", e)))?;

        tracing::debug!(ticket = %ticket.code, "Ticket e-mail queued");
        Ok(())
    }
}

/// Used when the job queue is disabled or unreachable
pub struct LogTicketIssuer;

#[async_trait]
impl TicketIssuer for LogTicketIssuer {
    async fn issue(&self, ticket: Ticket) -> AppResult<()> {
        tracing::info!(
            ticket = %ticket.code,
            registration_id = %ticket.registration_id,
            visitor = %ticket.visitor_email,
            "Ticket issued (delivery disabled)"
        );
        Ok(())
    }
}
