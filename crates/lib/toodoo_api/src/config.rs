//! API server configuration.

use toodoo_core::auth::jwt::{DEFAULT_TOKEN_TTL_SECS, TokenSettings, resolve_jwt_secret};
use toodoo_core::notify::SmtpSettings;

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3100").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub pg_connection_url: String,
    /// Signing secret and lifetime of list access tokens.
    pub tokens: TokenSettings,
    /// Base URL of the web client, used in invitation links.
    pub frontend_url: String,
    /// Outbound mail relay. Mails are only logged when unset.
    pub smtp: Option<SmtpSettings>,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable           | Default                                     |
    /// |--------------------|---------------------------------------------|
    /// | `BIND_ADDR`        | `127.0.0.1:3100`                            |
    /// | `DATABASE_URL`     | `postgres://localhost:5432/toodoo`          |
    /// | `JWT_SECRET` / `AUTH_SECRET` | generated & persisted to file     |
    /// | `TOKEN_TTL_SECS`   | `3600`                                      |
    /// | `FRONTEND_URL`     | `http://localhost:4200`                     |
    /// | `SMTP_HOST`        | unset (mail is logged only)                 |
    /// | `SMTP_PORT`        | `587`                                       |
    /// | `SMTP_USERNAME` / `SMTP_PASSWORD` | unset                        |
    /// | `MAIL_FROM`        | `Toodoo <noreply@toodoo.local>`             |
    pub fn from_env() -> Self {
        let ttl_secs = std::env::var("TOKEN_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TOKEN_TTL_SECS);

        let smtp = std::env::var("SMTP_HOST").ok().map(|host| SmtpSettings {
            host,
            port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(587),
            username: std::env::var("SMTP_USERNAME").ok(),
            password: std::env::var("SMTP_PASSWORD").ok(),
            from: std::env::var("MAIL_FROM")
                .unwrap_or_else(|_| "Toodoo <noreply@toodoo.local>".into()),
        });

        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3100".into()),
            pg_connection_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/toodoo".into()),
            tokens: TokenSettings {
                secret: resolve_jwt_secret(),
                ttl_secs,
            },
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:4200".into()),
            smtp,
        }
    }
}
