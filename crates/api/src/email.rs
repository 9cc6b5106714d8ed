//! Outbound email.
//!
//! [`SmtpMailer`] wraps the `lettre` async SMTP transport. When `SMTP_HOST` is
//! not configured the service runs with [`LogMailer`], which only records the
//! message in the log.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send one HTML email.
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), EmailError>;
}

// ---------------------------------------------------------------------------
// SMTP
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
pub const DEFAULT_FROM_ADDRESS: &str = "noreply@passgate.local";

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
}

pub struct SmtpMailer {
    config: EmailConfig,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Build the transport once; connections are opened per send.
    pub fn new(config: EmailConfig) -> Result<Self, EmailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port);

        if let (Some(user), Some(pass)) = (&config.smtp_user, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            config,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(self.config.from_address.parse()?)
            .to(to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| EmailError::Build(e.to_string()))?;

        self.transport.send(email).await?;
        tracing::info!(to, subject, "Email sent");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Log-only
// ---------------------------------------------------------------------------

/// Writes emails to the log instead of sending them. For local development.
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), EmailError> {
        // Bodies carry live reset and magic-link tokens.
        tracing::info!(to, subject, "SMTP not configured, email not sent");
        tracing::debug!(to, body = html_body, "Unsent email body");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

pub fn password_reset_email(base_url: &str, token: &str) -> (String, String) {
    let link = format!("{}/reset-password?token={token}", base_url.trim_end_matches('/'));
    let body = format!(
        "<h1>Password Reset</h1>\n\
         <p>Click the link below to reset your password:</p>\n\
         <a href=\"{link}\">Reset Password</a>\n\
         <p>This link will expire in 15 minutes.</p>"
    );
    ("Password Reset".to_string(), body)
}

pub fn magic_link_email(base_url: &str, token: &str) -> (String, String) {
    let link = format!("{}/magic-login?token={token}", base_url.trim_end_matches('/'));
    let body = format!(
        "<h1>Magic Link Login</h1>\n\
         <p>Click the link below to log in:</p>\n\
         <a href=\"{link}\">Log In</a>\n\
         <p>This link will expire in 15 minutes.</p>"
    );
    ("Magic Link Login".to_string(), body)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
