//! Unit of Work pattern implementation.
//!
//! Centralizes repository access and runs multi-step workflows inside one
//! database transaction: commit when the closure returns `Ok`, roll back
//! when it returns `Err`.

use async_trait::async_trait;
use sea_orm::{
    AccessMode, DatabaseConnection, DatabaseTransaction, IsolationLevel, TransactionTrait,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use super::repositories::{
    EventRepository, EventStore, RegistrationRepository, RegistrationStore, UserRepository,
    UserStore,
};
use crate::errors::{AppError, AppResult};

/// Boxed future returned by transaction closures
pub type TxFuture<'a, T> = Pin<Box<dyn Future<Output = AppResult<T>> + Send + 'a>>;

/// Repository access inside an open transaction.
///
/// Every call made through the context belongs to the same transaction.
pub trait TransactionContext: Send + Sync {
    fn users(&self) -> &dyn UserRepository;

    fn events(&self) -> &dyn EventRepository;

    fn registrations(&self) -> &dyn RegistrationRepository;
}

/// Unit of Work trait for dependency injection.
///
/// Not mockable directly because of the generic `transaction` method; tests
/// provide their own in-memory implementation.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// User repository on the shared pool
    fn users(&self) -> Arc<dyn UserRepository>;

    /// Event repository on the shared pool
    fn events(&self) -> Arc<dyn EventRepository>;

    /// Registration repository on the shared pool
    fn registrations(&self) -> Arc<dyn RegistrationRepository>;

    /// Execute a closure within a READ COMMITTED transaction.
    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(&'a dyn TransactionContext) -> TxFuture<'a, T> + Send,
        T: Send;
}

/// Repositories bound to one borrowed transaction
struct TxScope<'a> {
    users: UserStore<&'a DatabaseTransaction>,
    events: EventStore<&'a DatabaseTransaction>,
    registrations: RegistrationStore<&'a DatabaseTransaction>,
}

impl<'a> TxScope<'a> {
    fn new(txn: &'a DatabaseTransaction) -> Self {
        Self {
            users: UserStore::new(txn),
            events: EventStore::new(txn),
            registrations: RegistrationStore::new(txn),
        }
    }
}

impl<'a> TransactionContext for TxScope<'a> {
    fn users(&self) -> &dyn UserRepository {
        &self.users
    }

    fn events(&self) -> &dyn EventRepository {
        &self.events
    }

    fn registrations(&self) -> &dyn RegistrationRepository {
        &self.registrations
    }
}

/// Concrete implementation of UnitOfWork
pub struct Persistence {
    db: DatabaseConnection,
    user_repo: Arc<UserStore<DatabaseConnection>>,
    event_repo: Arc<EventStore<DatabaseConnection>>,
    registration_repo: Arc<RegistrationStore<DatabaseConnection>>,
}

impl Persistence {
    /// Create new UnitOfWork instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            user_repo: Arc::new(UserStore::new(db.clone())),
            event_repo: Arc::new(EventStore::new(db.clone())),
            registration_repo: Arc::new(RegistrationStore::new(db.clone())),
            db,
        }
    }
}

#[async_trait]
impl UnitOfWork for Persistence {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.user_repo.clone()
    }

    fn events(&self) -> Arc<dyn EventRepository> {
        self.event_repo.clone()
    }

    fn registrations(&self) -> Arc<dyn RegistrationRepository> {
        self.registration_repo.clone()
    }

    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(&'a dyn TransactionContext) -> TxFuture<'a, T> + Send,
        T: Send,
    {
        let txn = self
            .db
            .begin_with_config(
                Some(IsolationLevel::ReadCommitted),
                Some(AccessMode::ReadWrite),
            )
            .await
            .map_err(AppError::from)?;

        let outcome = {
            let scope = TxScope::new(&txn);
            f(&scope).await
        };

        match outcome {
            Ok(result) => {
                txn.commit().await.map_err(AppError::from)?;
                Ok(result)
            }
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::error!(error = %rollback_err, "Transaction rollback failed");
                }
                Err(e)
            }
        }
    }
}
