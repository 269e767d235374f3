//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;

use quill_infra::{DatabaseConfig, JwtConfig};

const DEFAULT_SESSION_SECRET: &str = "change-me-in-production";

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Absent when `DATABASE_URL` is unset; posts are then kept in memory.
    pub database: Option<DatabaseConfig>,
    pub session: JwtConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any variable source.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let database = var("DATABASE_URL").map(|url| DatabaseConfig {
            url,
            max_connections: parsed(&var, "DB_MAX_CONNECTIONS").unwrap_or(100),
            min_connections: parsed(&var, "DB_MIN_CONNECTIONS").unwrap_or(10),
        });

        let secret = var("SESSION_SECRET").unwrap_or_else(|| {
            let production = var("RUST_ENV").is_some_and(|v| v == "production" || v == "prod");
            if production {
                tracing::error!(
                    "SECURITY: Using default session secret in production! Set SESSION_SECRET."
                );
            } else {
                tracing::warn!("Using default session secret. Set SESSION_SECRET for production use.");
            }
            DEFAULT_SESSION_SECRET.to_string()
        });

        let session = JwtConfig {
            secret,
            expiration_hours: parsed(&var, "SESSION_EXPIRATION_HOURS").unwrap_or(24),
            issuer: var("SESSION_ISSUER").unwrap_or_else(|| "quill-identity".to_string()),
        };

        Self {
            host: var("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parsed(&var, "PORT").unwrap_or(8080),
            database,
            session,
        }
    }
}

fn parsed<T: FromStr>(var: &dyn Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    var(key).and_then(|value| value.trim().parse().ok())
}
