//! Serve command - Starts the HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::api::{create_router, AppState};
use crate::cli::args::ServeArgs;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::{Cache, Database};
use crate::jobs::connect_email_queue;
use crate::services::{LogTicketIssuer, QueuedTicketIssuer, TicketIssuer};

/// Execute the serve command
pub async fn execute(args: ServeArgs, mut config: Config) -> AppResult<()> {
    if let Some(host) = args.host {
        config.server_host = host;
    }
    if let Some(port) = args.port {
        config.server_port = port;
    }

    tracing::info!("Starting server...");

    let db = Database::connect(&config)
        .await
        .map_err(|e| AppError::internal(format!("Database connection failed: {}", e)))?;
    tracing::info!("Database connected");

    let cache = Cache::connect(&config)
        .await
        .map_err(|e| AppError::internal(format!("Redis connection failed: {}", e)))?;
    tracing::info!("Redis cache connected");

    let tickets = ticket_issuer(&config).await;
    let addr = config.server_addr();

    let app_state = AppState::from_config(Arc::new(db), Arc::new(cache), config, tickets);
    let app = create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind to {}: {}", addr, e)))?;

    tracing::info!("Server running on http://{}", addr);

    // Client addresses feed the rate limiter when no proxy header is present
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Queue ticket e-mails when enabled and reachable, otherwise only log tickets.
async fn ticket_issuer(config: &Config) -> Arc<dyn TicketIssuer> {
    if !config.ticket_emails_enabled {
        tracing::info!("Ticket e-mails disabled");
        return Arc::new(LogTicketIssuer);
    }

    match connect_email_queue(config).await {
        Ok(storage) => {
            tracing::info!("Ticket e-mail queue ready");
            Arc::new(QueuedTicketIssuer::new(storage))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Job queue unavailable; tickets will only be logged");
            Arc::new(LogTicketIssuer)
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
