//! Connection handle shared by the repository stores.

use sea_orm::{ConnectionTrait, DatabaseConnection, DatabaseTransaction};

/// Anything a store can run queries on: the pooled connection or a borrowed
/// transaction.
pub trait DbHandle: Send + Sync {
    type Conn: ConnectionTrait;

    fn conn(&self) -> &Self::Conn;
}

impl DbHandle for DatabaseConnection {
    type Conn = DatabaseConnection;

    fn conn(&self) -> &Self::Conn {
        self
    }
}

impl<'a> DbHandle for &'a DatabaseTransaction {
    type Conn = DatabaseTransaction;

    fn conn(&self) -> &Self::Conn {
        self
    }
}
