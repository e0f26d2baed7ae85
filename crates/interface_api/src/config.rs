//! API configuration

use serde::Deserialize;
use std::time::Duration;

use domain_treasury::RetryPolicy;
use infra_db::DatabaseConfig;

/// API configuration
///
/// Every field can be set through an `API_`-prefixed environment variable,
/// e.g. `API_PORT=9090` or `API_MAX_COMMIT_ATTEMPTS=5`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database URL
    pub database_url: String,
    /// Maximum pooled database connections
    pub max_connections: u32,
    /// Log level
    pub log_level: String,
    /// Attempts of the payment unit before giving up on write conflicts
    pub max_commit_attempts: u32,
    /// Base delay between payment unit attempts
    pub retry_backoff_ms: u64,
    /// Projection horizon when the request does not give one
    pub default_months_ahead: u32,
    /// Capacity of the bill-paid notification queue
    pub notification_buffer: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: "postgres://localhost/treasury".to_string(),
            max_connections: 10,
            log_level: "info".to_string(),
            max_commit_attempts: 3,
            retry_backoff_ms: 50,
            default_months_ahead: 6,
            notification_buffer: 256,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment, falling back to defaults per field
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("API"))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Retry schedule for the payment unit
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_commit_attempts,
            Duration::from_millis(self.retry_backoff_ms),
        )
    }

    /// Pool settings for the configured database
    pub fn database(&self) -> DatabaseConfig {
        DatabaseConfig::new(&self.database_url).max_connections(self.max_connections)
    }
}
