//! Service Container - Centralized service access.
//!
//! Builds every service over one shared Unit of Work and hands them out as
//! trait objects.

use std::sync::Arc;

use super::{
    AuthService, Authenticator, EventManager, EventService, RegistrationManager,
    RegistrationService, TicketIssuer, UserManager, UserService,
};
use crate::config::Config;
use crate::infra::Persistence;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Service container trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait ServiceContainer: Send + Sync {
    /// Get authentication service
    fn auth(&self) -> Arc<dyn AuthService>;

    /// Get user service
    fn users(&self) -> Arc<dyn UserService>;

    /// Get event service
    fn events(&self) -> Arc<dyn EventService>;

    /// Get registration service
    fn registrations(&self) -> Arc<dyn RegistrationService>;
}

/// Concrete implementation of ServiceContainer
#[derive(Clone)]
pub struct Services {
    auth_service: Arc<dyn AuthService>,
    user_service: Arc<dyn UserService>,
    event_service: Arc<dyn EventService>,
    registration_service: Arc<dyn RegistrationService>,
}

impl Services {
    /// Assemble a container from already-built services
    pub fn new(
        auth_service: Arc<dyn AuthService>,
        user_service: Arc<dyn UserService>,
        event_service: Arc<dyn EventService>,
        registration_service: Arc<dyn RegistrationService>,
    ) -> Self {
        Self {
            auth_service,
            user_service,
            event_service,
            registration_service,
        }
    }

    /// Wire all services over a database connection
    pub fn from_connection(
        db: sea_orm::DatabaseConnection,
        config: Config,
        tickets: Arc<dyn TicketIssuer>,
    ) -> Self {
        let uow = Arc::new(Persistence::new(db));

        Self {
            auth_service: Arc::new(Authenticator::new(uow.clone(), config)),
            user_service: Arc::new(UserManager::new(uow.clone())),
            event_service: Arc::new(EventManager::new(uow.clone())),
            registration_service: Arc::new(RegistrationManager::new(uow, tickets)),
        }
    }
}

impl ServiceContainer for Services {
    fn auth(&self) -> Arc<dyn AuthService> {
        self.auth_service.clone()
    }

    fn users(&self) -> Arc<dyn UserService> {
        self.user_service.clone()
    }

    fn events(&self) -> Arc<dyn EventService> {
        self.event_service.clone()
    }

    fn registrations(&self) -> Arc<dyn RegistrationService> {
        self.registration_service.clone()
    }
}
