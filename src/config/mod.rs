use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::directory::DirectoryMode;

/// Shipping rate service configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "ecuship")]
#[command(about = "Route-based shipping rate service for Ecuadorian cities")]
pub struct Config {
    /// HTTP server listen address
    #[arg(long, default_value = "0.0.0.0:8080", env = "ECUSHIP_LISTEN_ADDR")]
    pub listen_addr: String,

    /// PostgreSQL connection URL (optional, uses in-memory storage if not set)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Minimum pooled database connections
    #[arg(long, default_value = "1", env = "ECUSHIP_DB_MIN_CONNECTIONS")]
    pub db_min_connections: u32,

    /// Maximum pooled database connections
    #[arg(long, default_value = "10", env = "ECUSHIP_DB_MAX_CONNECTIONS")]
    pub db_max_connections: u32,

    /// Path to a YAML seed file with routes and cities (optional)
    #[arg(long, env = "ECUSHIP_SEED_PATH")]
    pub seed_path: Option<PathBuf>,

    /// Directory caching policy
    #[arg(long, value_enum, default_value = "per-request", env = "ECUSHIP_DIRECTORY_MODE")]
    pub directory_mode: DirectoryMode,

    /// Timeout in milliseconds for loading the city directory
    #[arg(long, default_value = "500", env = "ECUSHIP_DIRECTORY_TIMEOUT_MS")]
    pub directory_timeout_ms: u64,

    /// Currency code reported on quotes
    #[arg(long, default_value = "USD", env = "ECUSHIP_CURRENCY")]
    pub currency: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long, env = "ECUSHIP_LOG_JSON")]
    pub log_json: bool,

    /// Maximum number of requests served concurrently
    #[arg(long, default_value = "1024", env = "ECUSHIP_MAX_CONCURRENT_REQUESTS")]
    pub max_concurrent_requests: usize,

    /// Enable graceful shutdown
    #[arg(long, default_value = "true", env = "ECUSHIP_GRACEFUL_SHUTDOWN")]
    pub graceful_shutdown: bool,
}

impl Config {
    /// Get directory load timeout as Duration.
    pub fn directory_timeout(&self) -> Duration {
        Duration::from_millis(self.directory_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listen_addr: "0.0.0.0:8080".to_string(),
            database_url: None,
            db_min_connections: 1,
            db_max_connections: 10,
            seed_path: None,
            directory_mode: DirectoryMode::PerRequest,
            directory_timeout_ms: 500,
            currency: "USD".to_string(),
            log_level: "info".to_string(),
            log_json: false,
            max_concurrent_requests: 1024,
            graceful_shutdown: true,
        }
    }
}
