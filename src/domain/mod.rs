//! Domain layer - Core business entities and rules
//!
//! Pure types and invariants for users, events and registrations. Nothing
//! here touches the database.

pub mod event;
pub mod password;
pub mod registration;
pub mod user;

pub use event::{Event, EventChanges, EventDraft, EventFilter, EventResponse, EventType};
pub use password::Password;
pub use registration::{
    resolve_visitor, RegisterForEvent, Registration, RegistrationResponse, RegistrationStatus,
};
pub use user::{normalize_email, Actor, User, UserChanges, UserResponse, UserRole};
