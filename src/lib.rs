//! Event Hub - event publishing and registration API
//!
//! Organizers publish events, visitors register for them (private events
//! behind an access code, capacity enforced under concurrency) and receive
//! a ticket by e-mail.
//!
//! # Architecture Layers
//!
//! - **cli**: Command-line interface
//! - **commands**: CLI command implementations
//! - **config**: Application configuration and constants
//! - **domain**: Users, events, registrations and their rules
//! - **services**: Use cases, including the registration workflow
//! - **infra**: Database, repositories, Unit of Work, Redis
//! - **api**: HTTP handlers, middleware, and routes
//! - **jobs**: Background ticket e-mails
//! - **types**: Shared types (pagination)
//! - **errors**: Centralized error handling
//!
//! # CLI Usage
//!
//! ```bash
//! # Start the server
//! event-hub serve
//!
//! # Run migrations
//! event-hub migrate up
//!
//! # Start the ticket e-mail worker
//! event-hub jobs work
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod jobs;
pub mod services;
pub mod types;

// Re-export commonly used types at crate root
pub use api::AppState;
pub use config::Config;
pub use domain::{Actor, Event, Registration, User, UserRole};
pub use errors::{AppError, AppResult};
pub use infra::Cache;
