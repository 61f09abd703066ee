//! Application services layer - Use cases and business logic.
//!
//! Services orchestrate domain rules and repositories through the Unit of
//! Work. Every call that depends on who is asking takes the caller's
//! [`Actor`](crate::domain::Actor) explicitly.

mod auth_service;
pub mod container;
mod event_service;
mod registration_service;
mod ticket_service;
mod user_service;

// Service Container
pub use container::{ServiceContainer, Services};

// Service traits and implementations
pub use auth_service::{AuthService, Authenticator, Claims, SignUp, TokenResponse};
pub use event_service::{EventManager, EventService};
pub use registration_service::{RegistrationManager, RegistrationService};
pub use ticket_service::{ticket_code, LogTicketIssuer, QueuedTicketIssuer, Ticket, TicketIssuer};
pub use user_service::{UserManager, UserService};

#[cfg(any(test, feature = "test-utils"))]
pub use auth_service::MockAuthService;
#[cfg(any(test, feature = "test-utils"))]
pub use container::MockServiceContainer;
#[cfg(any(test, feature = "test-utils"))]
pub use event_service::MockEventService;
#[cfg(any(test, feature = "test-utils"))]
pub use registration_service::MockRegistrationService;
#[cfg(any(test, feature = "test-utils"))]
pub use ticket_service::MockTicketIssuer;
#[cfg(any(test, feature = "test-utils"))]
pub use user_service::MockUserService;
