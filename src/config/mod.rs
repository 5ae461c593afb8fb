use crate::core::{AppError, Result};
use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub mod database;
pub mod server;

pub use database::DatabaseConfig;
pub use server::ServerConfig;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub toyyibpay: ToyyibPayConfig,
    pub pipeline: PipelineConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub log_level: String,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

/// Gateway endpoints shared by every business; per-business keys come from
/// the credential provider.
#[derive(Debug, Clone, Deserialize)]
pub struct ToyyibPayConfig {
    pub base_url: String,
    pub return_url: String,
    pub callback_url: String,
    pub timeout_secs: u64,
}

impl ToyyibPayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Pacing and retry policy for the issuance pipeline
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Pause between items of one batch
    pub batch_item_delay_ms: u64,
    /// Fixed wait before each retry attempt
    pub retry_backoff_secs: u64,
    /// Attempt number after which a failure is dead-lettered
    pub max_retry_attempts: u32,
    /// Buffered messages per queue channel
    pub queue_capacity: usize,
}

impl PipelineConfig {
    pub fn batch_item_delay(&self) -> Duration {
        Duration::from_millis(self.batch_item_delay_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_secs(self.retry_backoff_secs)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_item_delay_ms: 1500,
            retry_backoff_secs: 60,
            max_retry_attempts: 5,
            queue_capacity: 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub rate_limit_per_minute: u32,
}

/// Read an optional numeric variable, falling back to `default`
pub(crate) fn parse_env<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Configuration(format!("Invalid {}", key))),
        Err(_) => Ok(default),
    }
}

fn require_env(key: &str) -> Result<String> {
    env::var(key).map_err(|_| AppError::Configuration(format!("{} not set", key)))
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let defaults = PipelineConfig::default();

        let config = Config {
            app: AppConfig {
                env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            },
            database: DatabaseConfig::from_env()?,
            server: ServerConfig::from_env()?,
            toyyibpay: ToyyibPayConfig {
                base_url: env::var("TOYYIBPAY_BASE_URL")
                    .unwrap_or_else(|_| "https://dev.toyyibpay.com".to_string()),
                return_url: require_env("PAYMENT_RETURN_URL")?,
                callback_url: require_env("PAYMENT_CALLBACK_URL")?,
                timeout_secs: parse_env("TOYYIBPAY_TIMEOUT_SECS", 30)?,
            },
            pipeline: PipelineConfig {
                batch_item_delay_ms: parse_env(
                    "BATCH_ITEM_DELAY_MS",
                    defaults.batch_item_delay_ms,
                )?,
                retry_backoff_secs: parse_env("RETRY_BACKOFF_SECS", defaults.retry_backoff_secs)?,
                max_retry_attempts: parse_env("RETRY_MAX_ATTEMPTS", defaults.max_retry_attempts)?,
                queue_capacity: parse_env("QUEUE_CAPACITY", defaults.queue_capacity)?,
            },
            security: SecurityConfig {
                rate_limit_per_minute: parse_env("RATE_LIMIT_PER_MINUTE", 1000)?,
            },
        };

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.pipeline.max_retry_attempts == 0 {
            return Err(AppError::Configuration(
                "Retry max attempts must be greater than 0".to_string(),
            ));
        }

        if self.pipeline.queue_capacity == 0 {
            return Err(AppError::Configuration(
                "Queue capacity must be greater than 0".to_string(),
            ));
        }

        if self.security.rate_limit_per_minute == 0 {
            return Err(AppError::Configuration(
                "Rate limit must be greater than 0".to_string(),
            ));
        }

        if self.toyyibpay.callback_url.trim().is_empty() {
            return Err(AppError::Configuration(
                "Payment callback URL cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}
