//! Postgres-backed job storage shared by the server and the worker.

use apalis_sql::postgres::PostgresStorage;
use apalis_sql::sqlx::postgres::PgPoolOptions;

use super::EmailJob;
use crate::config::{Config, JOB_POOL_MAX_CONNECTIONS};
use crate::errors::{AppError, AppResult};

/// Connect to the job database and create the apalis tables if needed.
pub async fn connect_email_queue(config: &Config) -> AppResult<PostgresStorage<EmailJob>> {
    let pool = PgPoolOptions::new()
        .max_connections(JOB_POOL_MAX_CONNECTIONS)
        .connect(&config.database_url)
        .await
        .map_err(|e| AppError::internal(format!("Failed to connect job pool: {}", e)))?;

    PostgresStorage::setup(&pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to set up job storage: {}", e)))?;

    Ok(PostgresStorage::new(pool))
}
