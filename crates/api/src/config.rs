use std::time::Duration;

use arcus_core::process::ProcessCatalog;
use arcus_lifecycle::{LifecycleConfig, RetryPolicy};

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Base URL of the compute backend's HTTP API.
    pub backend_api_url: String,
    /// Supported process-catalog API versions, comma-separated.
    pub supported_api_versions: Vec<String>,
    /// Unit tag attached to cost estimates.
    pub cost_unit: String,
    /// Deletion retry: total attempts before giving up.
    pub delete_retry_max_attempts: u32,
    /// Deletion retry: delay before the second attempt, in milliseconds.
    pub delete_retry_initial_ms: u64,
    /// Deletion retry: cap on the backoff delay, in milliseconds.
    pub delete_retry_max_ms: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                   |
    /// |-----------------------------|---------------------------|
    /// | `HOST`                      | `0.0.0.0`                 |
    /// | `PORT`                      | `3000`                    |
    /// | `CORS_ORIGINS`              | `http://localhost:5173`   |
    /// | `REQUEST_TIMEOUT_SECS`      | `30`                      |
    /// | `BACKEND_API_URL`           | `http://localhost:8080`   |
    /// | `SUPPORTED_API_VERSIONS`    | `1.0.0,1.1.0,1.2.0`       |
    /// | `COST_UNIT`                 | `credits`                 |
    /// | `DELETE_RETRY_MAX_ATTEMPTS` | `5`                       |
    /// | `DELETE_RETRY_INITIAL_MS`   | `250`                     |
    /// | `DELETE_RETRY_MAX_MS`       | `10000`                   |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let backend_api_url =
            std::env::var("BACKEND_API_URL").unwrap_or_else(|_| "http://localhost:8080".into());

        let supported_api_versions: Vec<String> = std::env::var("SUPPORTED_API_VERSIONS")
            .unwrap_or_else(|_| "1.0.0,1.1.0,1.2.0".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let cost_unit = std::env::var("COST_UNIT").unwrap_or_else(|_| "credits".into());

        let delete_retry_max_attempts: u32 = std::env::var("DELETE_RETRY_MAX_ATTEMPTS")
            .unwrap_or_else(|_| "5".into())
            .parse()
            .expect("DELETE_RETRY_MAX_ATTEMPTS must be a valid u32");

        let delete_retry_initial_ms: u64 = std::env::var("DELETE_RETRY_INITIAL_MS")
            .unwrap_or_else(|_| "250".into())
            .parse()
            .expect("DELETE_RETRY_INITIAL_MS must be a valid u64");

        let delete_retry_max_ms: u64 = std::env::var("DELETE_RETRY_MAX_MS")
            .unwrap_or_else(|_| "10000".into())
            .parse()
            .expect("DELETE_RETRY_MAX_MS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            backend_api_url,
            supported_api_versions,
            cost_unit,
            delete_retry_max_attempts,
            delete_retry_initial_ms,
            delete_retry_max_ms,
        }
    }

    /// Build the lifecycle controller configuration from this server
    /// configuration.
    pub fn lifecycle_config(&self) -> LifecycleConfig {
        LifecycleConfig {
            catalog: ProcessCatalog::new(self.supported_api_versions.iter().cloned()),
            retry: RetryPolicy {
                initial_delay: Duration::from_millis(self.delete_retry_initial_ms),
                max_delay: Duration::from_millis(self.delete_retry_max_ms),
                max_attempts: self.delete_retry_max_attempts,
                ..Default::default()
            },
            cost_unit: self.cost_unit.clone(),
            ..Default::default()
        }
    }
}
