//! Repository layer - Data access abstraction
//!
//! Each repository trait has one store implementation that is generic over
//! the connection it runs on, so the same code serves the pool and an open
//! transaction.

pub(crate) mod entities;
mod event_repository;
mod handle;
mod registration_repository;
mod user_repository;

pub use event_repository::{EventRepository, EventStore};
pub use handle::DbHandle;
pub use registration_repository::{RegistrationRepository, RegistrationStore};
pub use user_repository::{UserRepository, UserStore};

// Export mocks for tests (both unit and integration)
#[cfg(any(test, feature = "test-utils"))]
pub use event_repository::MockEventRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use registration_repository::MockRegistrationRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;

use sea_orm::{DbErr, SqlErr};

use crate::errors::AppError;

/// Translate constraint violations into domain errors; anything else stays
/// a database error.
pub(crate) fn map_constraint_error(
    err: DbErr,
    on_unique: impl FnOnce() -> AppError,
    on_foreign_key: impl FnOnce() -> AppError,
) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            tracing::debug!(%detail, "Unique constraint violated");
            on_unique()
        }
        Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
            tracing::debug!(%detail, "Foreign key constraint violated");
            on_foreign_key()
        }
        _ => AppError::Database(err),
    }
}
