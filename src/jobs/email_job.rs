//! E-mail background job.
//!
//! Ticket confirmations are queued as `EmailJob`s. Without SMTP settings the
//! worker logs the message instead of sending it.

use serde::{Deserialize, Serialize};
use std::env;

use crate::errors::{AppError, AppResult};

/// Email job payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailJob {
    /// Recipient email address
    pub to: String,
    /// Email subject line
    pub subject: String,
    /// Plain-text body
    pub body: String,
    /// Optional sender override (defaults to SMTP_FROM)
    #[serde(default)]
    pub from: Option<String>,
}

impl EmailJob {
    /// Create a new email job
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
            from: None,
        }
    }

    /// Set custom sender address
    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    fn validate(&self) -> AppResult<()> {
        if !self.to.contains('@') {
            return Err(AppError::validation(format!(
                "invalid recipient address: {}",
                self.to
            )));
        }
        if self.subject.trim().is_empty() {
            return Err(AppError::validation("email subject is empty"));
        }
        Ok(())
    }
}

/// SMTP settings read from `SMTP_*` variables
#[derive(Debug)]
struct EmailConfig {
    smtp_host: Option<String>,
    smtp_port: u16,
    smtp_from: String,
}

impl EmailConfig {
    fn from_env() -> Self {
        Self {
            smtp_host: env::var("SMTP_HOST").ok().filter(|h| !h.trim().is_empty()),
            smtp_port: env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(587),
            smtp_from: env::var("SMTP_FROM")
                .unwrap_or_else(|_| "tickets@event-hub.local".to_string()),
        }
    }
}

/// Email job handler - processes queued e-mails
pub async fn email_job_handler(job: EmailJob) -> Result<(), AppError> {
    job.validate()?;

    let config = EmailConfig::from_env();
    let from = job.from.as_deref().unwrap_or(&config.smtp_from);

    tracing::info!(to = %job.to, from = %from, subject = %job.subject, "Processing email job");

    match config.smtp_host.as_deref() {
        None => {
            tracing::warn!("SMTP not configured - logging email instead of sending");
            tracing::info!(
                "=== EMAIL (not sent) ===\nFrom: {}\nTo: {}\nSubject: {}\n\n{}\n========================",
                from,
                job.to,
                job.subject,
                job.body
            );
        }
        Some(host) => {
            // TODO: send through lettre's SmtpTransport once lettre joins the dependency set
            tracing::warn!(
                smtp_host = %host,
                smtp_port = config.smtp_port,
                to = %job.to,
                "No SMTP transport available; email logged only"
            );
        }
    }

    Ok(())
}
