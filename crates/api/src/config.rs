use std::str::FromStr;

use crate::auth::oauth::GoogleConfig;
use crate::email::{EmailConfig, DEFAULT_FROM_ADDRESS, DEFAULT_SMTP_PORT};

/// A configuration variable held a value that could not be parsed.
#[derive(Debug, thiserror::Error)]
#[error("Invalid value for {var}: {value:?}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
}

/// Token-bucket parameters applied per client IP.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Tokens added per second.
    pub per_second: u32,
    /// Bucket capacity.
    pub burst: u32,
    /// Key buckets by `X-Forwarded-For` / `X-Real-IP` instead of the peer
    /// address. Only safe behind a reverse proxy that overwrites those
    /// headers; otherwise a client picks its own bucket.
    pub trust_forwarded: bool,
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Public base URL used to build links in outgoing emails.
    pub base_url: String,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    pub rate_limit: RateLimitConfig,
    pub google: GoogleConfig,
    /// `None` when `SMTP_HOST` is unset; emails are then only logged.
    pub email: Option<EmailConfig>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                  |
    /// |------------------------|--------------------------|
    /// | `HOST`                 | `0.0.0.0`                |
    /// | `PORT`                 | `8080`                   |
    /// | `BASE_URL`             | `http://localhost:8080`  |
    /// | `CORS_ORIGINS`         | `http://localhost:3000`  |
    /// | `REQUEST_TIMEOUT_SECS` | `15`                     |
    /// | `RATE_LIMIT_PER_SEC`   | `1`                      |
    /// | `RATE_LIMIT_BURST`     | `5`                      |
    /// | `TRUST_FORWARDED_FOR`  | `true`                   |
    /// | `GOOGLE_CLIENT_ID`     | empty                    |
    /// | `GOOGLE_CLIENT_SECRET` | empty                    |
    /// | `GOOGLE_REDIRECT_URL`  | empty                    |
    /// | `SMTP_HOST`            | unset (log-only mailer)  |
    /// | `SMTP_PORT`            | `587`                    |
    /// | `SMTP_FROM`            | `noreply@passgate.local` |
    /// | `SMTP_USER`            | unset                    |
    /// | `SMTP_PASSWORD`        | unset                    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let string = |var: &str, default: &str| lookup(var).unwrap_or_else(|| default.into());

        let cors_origins = string("CORS_ORIGINS", "http://localhost:3000")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let email = match lookup("SMTP_HOST").filter(|h| !h.is_empty()) {
            Some(smtp_host) => Some(EmailConfig {
                smtp_host,
                smtp_port: parsed(&lookup, "SMTP_PORT", DEFAULT_SMTP_PORT)?,
                from_address: string("SMTP_FROM", DEFAULT_FROM_ADDRESS),
                smtp_user: lookup("SMTP_USER"),
                smtp_password: lookup("SMTP_PASSWORD"),
            }),
            None => None,
        };

        Ok(Self {
            host: string("HOST", "0.0.0.0"),
            port: parsed(&lookup, "PORT", 8080)?,
            base_url: string("BASE_URL", "http://localhost:8080"),
            cors_origins,
            request_timeout_secs: parsed(&lookup, "REQUEST_TIMEOUT_SECS", 15)?,
            rate_limit: RateLimitConfig {
                per_second: parsed(&lookup, "RATE_LIMIT_PER_SEC", 1)?,
                burst: parsed(&lookup, "RATE_LIMIT_BURST", 5)?,
                trust_forwarded: parsed(&lookup, "TRUST_FORWARDED_FOR", true)?,
            },
            google: GoogleConfig {
                client_id: string("GOOGLE_CLIENT_ID", ""),
                client_secret: string("GOOGLE_CLIENT_SECRET", ""),
                redirect_url: string("GOOGLE_REDIRECT_URL", ""),
            },
            email,
        })
    }
}

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError { var, value }),
    }
}
