//! Registration: the join between a visitor and an event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::Actor;
use crate::config::{STATUS_CANCELLED, STATUS_CONFIRMED};
use crate::errors::{AppError, AppResult};

/// Registration lifecycle: `Confirmed -> Cancelled`. A cancelled row is
/// never revived; registering again creates a new row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum RegistrationStatus {
    Confirmed,
    Cancelled,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Confirmed => STATUS_CONFIRMED,
            RegistrationStatus::Cancelled => STATUS_CANCELLED,
        }
    }
}

impl From<&str> for RegistrationStatus {
    fn from(s: &str) -> Self {
        if s.eq_ignore_ascii_case(STATUS_CANCELLED) {
            RegistrationStatus::Cancelled
        } else {
            RegistrationStatus::Confirmed
        }
    }
}

impl std::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registration domain entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub id: Uuid,
    pub event_id: Uuid,
    pub visitor_id: Uuid,
    pub status: RegistrationStatus,
    pub registered_at: DateTime<Utc>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Registration {
    /// A fresh confirmed registration
    pub fn confirmed(
        event_id: Uuid,
        visitor_id: Uuid,
        phone: Option<String>,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id,
            visitor_id,
            status: RegistrationStatus::Confirmed,
            registered_at: Utc::now(),
            phone: non_blank(phone),
            notes: non_blank(notes),
            updated_at: None,
        }
    }

    /// Active means anything but cancelled
    pub fn is_active(&self) -> bool {
        self.status != RegistrationStatus::Cancelled
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Input of the register workflow. The visitor is already resolved from
/// the caller's identity.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterForEvent {
    pub visitor_id: Uuid,
    pub event_id: Uuid,
    pub private_code: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

/// Decide whom a registration request is for.
///
/// Visitors always register themselves; admins register a named visitor on
/// their behalf; organizers cannot register.
pub fn resolve_visitor(actor: &Actor, requested: Option<Uuid>) -> AppResult<Uuid> {
    if actor.is_visitor() {
        return match requested {
            Some(id) if id != actor.id => Err(AppError::forbidden(
                "visitors can only register themselves",
            )),
            _ => Ok(actor.id),
        };
    }
    if actor.is_admin() {
        return requested.ok_or_else(|| AppError::validation("visitorId is required"));
    }
    Err(AppError::forbidden("only visitors can register for events"))
}

/// Registration response
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub id: Uuid,
    pub event_id: Uuid,
    pub visitor_id: Uuid,
    pub status: RegistrationStatus,
    pub registered_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl From<Registration> for RegistrationResponse {
    fn from(registration: Registration) -> Self {
        Self {
            id: registration.id,
            event_id: registration.event_id,
            visitor_id: registration.visitor_id,
            status: registration.status,
            registered_at: registration.registered_at,
            phone: registration.phone,
            notes: registration.notes,
        }
    }
}
