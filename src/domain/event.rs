//! Event domain entity: ownership, access mode and capacity rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::Actor;
use crate::config::{EVENT_TYPE_PRIVATE, EVENT_TYPE_PUBLIC};
use crate::errors::{AppError, AppResult};

/// Access mode of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
    Public,
    Private,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Public => EVENT_TYPE_PUBLIC,
            EventType::Private => EVENT_TYPE_PRIVATE,
        }
    }
}

impl From<&str> for EventType {
    fn from(s: &str) -> Self {
        if s.eq_ignore_ascii_case(EVENT_TYPE_PRIVATE) {
            EventType::Private
        } else {
            EventType::Public
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event domain entity.
///
/// Invariant: `0 <= current_attendees <= max_attendees` whenever
/// `max_attendees` is set. The counter only moves through the repository's
/// conditional reserve/release updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub organizer_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub location: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub max_attendees: Option<i32>,
    pub current_attendees: i32,
    pub is_active: bool,
    pub event_type: EventType,
    pub private_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Build a new event owned by `organizer_id`. The draft must already
    /// have passed [`EventDraft::validate`].
    pub fn new(organizer_id: Uuid, draft: EventDraft) -> Self {
        let now = Utc::now();
        let private_code = match draft.event_type {
            EventType::Private => draft.private_code.map(|c| c.trim().to_string()),
            EventType::Public => None,
        };

        Self {
            id: Uuid::new_v4(),
            organizer_id,
            title: draft.title.trim().to_string(),
            description: draft.description,
            starts_at: draft.starts_at,
            location: draft.location.trim().to_string(),
            address: draft.address,
            city: draft.city,
            category: draft.category,
            image_url: draft.image_url,
            max_attendees: draft.max_attendees,
            current_attendees: 0,
            is_active: draft.is_active.unwrap_or(true),
            event_type: draft.event_type,
            private_code,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_private(&self) -> bool {
        self.event_type == EventType::Private
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.organizer_id == user_id
    }

    /// Owner or admin: may see the private code, inactive state and attendee list
    pub fn is_managed_by(&self, actor: &Actor) -> bool {
        actor.is_admin() || self.is_owned_by(actor.id)
    }

    /// Whether one more attendee fits. Unbounded events always have room.
    pub fn has_capacity(&self) -> bool {
        match self.max_attendees {
            Some(max) => self.current_attendees < max,
            None => true,
        }
    }

    /// Seats left, or `None` when the event is unbounded
    pub fn remaining_seats(&self) -> Option<i32> {
        self.max_attendees
            .map(|max| (max - self.current_attendees).max(0))
    }

    /// Reject registrations for deactivated events.
    pub fn ensure_active(&self) -> AppResult<()> {
        if self.is_active {
            Ok(())
        } else {
            Err(AppError::conflict("event no longer active"))
        }
    }

    /// Check a supplied access code against a private event's stored code.
    ///
    /// Both sides are trimmed; the comparison is exact and case-sensitive.
    /// Public events accept anything.
    pub fn verify_access_code(&self, supplied: Option<&str>) -> AppResult<()> {
        if !self.is_private() {
            return Ok(());
        }

        let supplied = supplied.map(str::trim).unwrap_or_default();
        if supplied.is_empty() {
            return Err(AppError::validation("private code is required"));
        }

        match self.private_code.as_deref().map(str::trim) {
            Some(stored) if !stored.is_empty() && stored == supplied => Ok(()),
            _ => Err(AppError::forbidden("invalid private code")),
        }
    }

    /// Apply validated changes. The attendee counter and owner never change here.
    pub fn apply(&mut self, changes: EventChanges) {
        if let Some(title) = changes.title {
            self.title = title.trim().to_string();
        }
        if let Some(description) = changes.description {
            self.description = Some(description);
        }
        if let Some(starts_at) = changes.starts_at {
            self.starts_at = starts_at;
        }
        if let Some(location) = changes.location {
            self.location = location.trim().to_string();
        }
        if let Some(address) = changes.address {
            self.address = Some(address);
        }
        if let Some(city) = changes.city {
            self.city = Some(city);
        }
        if let Some(category) = changes.category {
            self.category = Some(category);
        }
        if let Some(image_url) = changes.image_url {
            self.image_url = Some(image_url);
        }
        if let Some(max_attendees) = changes.max_attendees {
            self.max_attendees = Some(max_attendees);
        }
        if let Some(is_active) = changes.is_active {
            self.is_active = is_active;
        }
        if let Some(event_type) = changes.event_type {
            self.event_type = event_type;
        }
        if let Some(code) = changes.private_code {
            self.private_code = Some(code.trim().to_string());
        }
        if self.event_type == EventType::Public {
            self.private_code = None;
        }
        self.updated_at = Utc::now();
    }

    /// Validate the event after changes have been applied.
    pub fn validate_invariants(&self) -> AppResult<()> {
        if let Some(max) = self.max_attendees {
            if max < 1 {
                return Err(AppError::validation("maxAttendees must be at least 1"));
            }
            if max < self.current_attendees {
                return Err(AppError::validation(format!(
                    "maxAttendees cannot be lower than the {} attendees already registered",
                    self.current_attendees
                )));
            }
        }
        if self.is_private() && !has_text(self.private_code.as_deref()) {
            return Err(AppError::validation("private events require a private code"));
        }
        Ok(())
    }
}

/// Input for creating an event
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub title: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub location: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub max_attendees: Option<i32>,
    pub is_active: Option<bool>,
    pub event_type: EventType,
    pub private_code: Option<String>,
}

impl EventDraft {
    /// Validate the draft relative to `now`.
    pub fn validate(&self, now: DateTime<Utc>) -> AppResult<()> {
        ensure_not_past(self.starts_at, now)?;
        if self.title.trim().is_empty() {
            return Err(AppError::validation("title is required"));
        }
        if self.location.trim().is_empty() {
            return Err(AppError::validation("location is required"));
        }
        if matches!(self.max_attendees, Some(max) if max < 1) {
            return Err(AppError::validation("maxAttendees must be at least 1"));
        }
        if self.event_type == EventType::Private && !has_text(self.private_code.as_deref()) {
            return Err(AppError::validation("private events require a private code"));
        }
        Ok(())
    }
}

/// Partial update of an event
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub max_attendees: Option<i32>,
    pub is_active: Option<bool>,
    pub event_type: Option<EventType>,
    pub private_code: Option<String>,
}

impl EventChanges {
    /// Checks that do not depend on the stored event.
    pub fn validate(&self, now: DateTime<Utc>) -> AppResult<()> {
        if let Some(starts_at) = self.starts_at {
            ensure_not_past(starts_at, now)?;
        }
        if matches!(self.title.as_deref(), Some(t) if t.trim().is_empty()) {
            return Err(AppError::validation("title cannot be empty"));
        }
        if matches!(self.location.as_deref(), Some(l) if l.trim().is_empty()) {
            return Err(AppError::validation("location cannot be empty"));
        }
        Ok(())
    }
}

/// Listing filter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    pub category: Option<String>,
    pub city: Option<String>,
    pub include_inactive: bool,
}

fn ensure_not_past(starts_at: DateTime<Utc>, now: DateTime<Utc>) -> AppResult<()> {
    if starts_at < now {
        Err(AppError::validation("event date cannot be in the past"))
    } else {
        Ok(())
    }
}

fn has_text(value: Option<&str>) -> bool {
    value.map(|v| !v.trim().is_empty()).unwrap_or(false)
}

/// Event response
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub id: Uuid,
    pub organizer_id: Uuid,
    #[schema(example = "RustConf Meetup")]
    pub title: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    #[schema(example = "Main Hall")]
    pub location: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub max_attendees: Option<i32>,
    pub current_attendees: i32,
    pub remaining_seats: Option<i32>,
    pub is_active: bool,
    pub event_type: EventType,
    /// Only present for the owning organizer or an admin
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventResponse {
    /// Response including the private code, for the owner or an admin
    pub fn with_code(event: Event) -> Self {
        let remaining_seats = event.remaining_seats();
        Self {
            id: event.id,
            organizer_id: event.organizer_id,
            title: event.title,
            description: event.description,
            starts_at: event.starts_at,
            location: event.location,
            address: event.address,
            city: event.city,
            category: event.category,
            image_url: event.image_url,
            max_attendees: event.max_attendees,
            current_attendees: event.current_attendees,
            remaining_seats,
            is_active: event.is_active,
            event_type: event.event_type,
            private_code: event.private_code,
            created_at: event.created_at,
            updated_at: event.updated_at,
        }
    }
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        Self {
            private_code: None,
            ..Self::with_code(event)
        }
    }
}
