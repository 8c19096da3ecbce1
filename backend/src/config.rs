//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults.

use crate::query::PaginationDefaults;
use std::env;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database configuration
    pub database: DatabaseConfig,
    /// Pagination defaults applied by the query builders
    pub pagination: PaginationDefaults,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file (or a `sqlite:` URL)
    pub path: String,
    /// Maximum number of pooled connections
    pub max_connections: u32,
    /// How long a call waits for a pooled connection (in seconds)
    pub acquire_timeout_secs: u64,
}

impl DatabaseConfig {
    /// Create a configuration for the given database path with default pool settings
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            max_connections: 5,
            acquire_timeout_secs: 30,
        }
    }

    /// Acquire timeout as a `Duration`
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let defaults = PaginationDefaults::default();

        Self {
            database: DatabaseConfig {
                path: env::var("DATABASE_PATH").unwrap_or_else(|_| {
                    // Default to ~/.claims-service or current directory
                    if let Some(home) = env::var_os("HOME") {
                        format!("{}/.claims-service/claims.db", home.to_string_lossy())
                    } else {
                        ".claims-service/claims.db".to_string()
                    }
                }),
                max_connections: parse_env("DATABASE_MAX_CONNECTIONS").unwrap_or(5),
                acquire_timeout_secs: parse_env("DATABASE_ACQUIRE_TIMEOUT_SECS").unwrap_or(30),
            },
            pagination: PaginationDefaults {
                page: parse_env("DEFAULT_PAGE")
                    .filter(|p| *p > 0)
                    .unwrap_or(defaults.page),
                limit: parse_env("DEFAULT_PAGE_LIMIT")
                    .filter(|l| *l > 0)
                    .unwrap_or(defaults.limit),
                max_limit: parse_env("MAX_PAGE_LIMIT")
                    .filter(|l| *l > 0)
                    .unwrap_or(defaults.max_limit),
            },
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
