//! Jobs command - Ticket e-mail queue management.
//!
//! - `work`: run the worker until Ctrl+C
//! - `list`: job counts per status
//! - `clear`: drop failed jobs
//!
//! ```bash
//! event-hub jobs work
//! event-hub jobs list
//! ```

use apalis::prelude::*;
use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection, Statement};

use crate::cli::args::{JobsAction, JobsArgs};
use crate::config::{Config, JOB_WORKER_TICKET_MAIL};
use crate::errors::{AppError, AppResult};
use crate::infra::Database;
use crate::jobs::{connect_email_queue, email_job_handler};

const JOB_STATUSES: [&str; 4] = ["Pending", "Running", "Failed", "Done"];

/// Execute the jobs command
pub async fn execute(args: JobsArgs, config: Config) -> AppResult<()> {
    match args.action {
        JobsAction::Work => run_worker(&config).await,
        JobsAction::List => list_jobs(&config).await,
        JobsAction::Clear => clear_failed_jobs(&config).await,
    }
}

/// Process queued ticket e-mails until interrupted
async fn run_worker(config: &Config) -> AppResult<()> {
    let storage = connect_email_queue(config).await?;

    let worker = WorkerBuilder::new(JOB_WORKER_TICKET_MAIL)
        .backend(storage)
        .build_fn(email_job_handler);

    tracing::info!(worker = JOB_WORKER_TICKET_MAIL, "Job worker started. Press Ctrl+C to stop.");

    tokio::select! {
        result = Monitor::new().register(worker).run() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Worker error");
                return Err(AppError::internal(format!("Worker failed: {}", e)));
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal, stopping worker...");
        }
    }

    tracing::info!("Job worker stopped");
    Ok(())
}

/// Connect to the queue database; `None` when the apalis schema was never created
async fn queue_connection(config: &Config) -> AppResult<Option<DatabaseConnection>> {
    let db = Database::connect_without_migrations(config)
        .await
        .map_err(|e| AppError::internal(format!("Database connection failed: {}", e)))?
        .get_connection();

    let row = db
        .query_one(Statement::from_string(
            DatabaseBackend::Postgres,
            "SELECT EXISTS(SELECT 1 FROM information_schema.schemata WHERE schema_name = 'apalis') AS exists",
        ))
        .await?;

    let initialized = row
        .and_then(|r| r.try_get::<bool>("", "exists").ok())
        .unwrap_or(false);

    Ok(initialized.then_some(db))
}

async fn list_jobs(config: &Config) -> AppResult<()> {
    let Some(db) = queue_connection(config).await? else {
        println!("Job queue not initialized. Run `jobs work` or `serve` first.");
        return Ok(());
    };

    let rows = db
        .query_all(Statement::from_string(
            DatabaseBackend::Postgres,
            "SELECT status::text AS status, COUNT(*)::bigint AS count FROM apalis.jobs GROUP BY status",
        ))
        .await?;

    let counts: Vec<(String, i64)> = rows
        .iter()
        .filter_map(|row| {
            Some((
                row.try_get::<String>("", "status").ok()?,
                row.try_get::<i64>("", "count").ok()?,
            ))
        })
        .collect();

    println!("\n=== Ticket Mail Queue ===");
    for status in JOB_STATUSES {
        let count = counts
            .iter()
            .find(|(s, _)| s == status)
            .map(|(_, c)| *c)
            .unwrap_or(0);
        println!("{:<9} {}", format!("{}:", status), count);
    }
    println!("=========================\n");

    Ok(())
}

async fn clear_failed_jobs(config: &Config) -> AppResult<()> {
    let Some(db) = queue_connection(config).await? else {
        println!("Job queue not initialized. Nothing to clear.");
        return Ok(());
    };

    let result = db
        .execute(Statement::from_string(
            DatabaseBackend::Postgres,
            "DELETE FROM apalis.jobs WHERE status = 'Failed'",
        ))
        .await?;

    let cleared = result.rows_affected();
    tracing::info!(cleared, "Failed jobs removed");
    println!("Cleared {} failed job(s) from the queue.", cleared);

    Ok(())
}
