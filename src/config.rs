use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_HISTORY_WINDOW_DAYS: u32 = 180;
const DEFAULT_HORIZON_DAYS: u32 = 30;
const DEFAULT_LEAD_TIME_DAYS: u32 = 7;
const DEFAULT_SERVICE_LEVEL: f64 = 0.95;
const DEFAULT_FORECAST_VALIDITY_HOURS: i64 = 24;
const DEFAULT_ENHANCEMENT_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_ENHANCEMENT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_ENHANCEMENT_TIMEOUT_SECS: u64 = 10;

/// Forecasting defaults applied when a request does not say otherwise
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ForecastingConfig {
    /// Trailing window of order history, in days
    #[serde(default = "default_history_window_days")]
    #[validate(range(min = 1, max = 3650))]
    pub history_window_days: u32,

    /// Horizon used when a request omits one
    #[serde(default = "default_horizon_days")]
    #[validate(range(min = 1, max = 3650))]
    pub default_horizon_days: u32,

    /// Lead time for products without one on their inventory row
    #[serde(default = "default_lead_time_days")]
    pub default_lead_time_days: u32,

    /// Target probability of not stocking out during lead time
    #[serde(default = "default_service_level")]
    #[validate(custom = "validate_service_level")]
    pub service_level: f64,

    /// How long a persisted forecast is served
    #[serde(default = "default_forecast_validity_hours")]
    #[validate(range(min = 1, max = 8760))]
    pub forecast_validity_hours: i64,
}

impl Default for ForecastingConfig {
    fn default() -> Self {
        Self {
            history_window_days: default_history_window_days(),
            default_horizon_days: default_horizon_days(),
            default_lead_time_days: default_lead_time_days(),
            service_level: default_service_level(),
            forecast_validity_hours: default_forecast_validity_hours(),
        }
    }
}

/// Optional LLM-backed adjustment of single-product forecasts
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnhancementConfig {
    #[serde(default)]
    pub enabled: bool,

    /// OpenAI-compatible chat completions endpoint
    #[serde(default = "default_enhancement_url")]
    pub api_url: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_enhancement_model")]
    pub model: String,

    #[serde(default = "default_enhancement_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EnhancementConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_url: default_enhancement_url(),
            api_key: None,
            model: default_enhancement_model(),
            timeout_secs: default_enhancement_timeout_secs(),
        }
    }
}

impl EnhancementConfig {
    /// Enabled and carrying a non-empty API key.
    pub fn is_active(&self) -> bool {
        self.enabled
            && self
                .api_key
                .as_deref()
                .map(|key| !key.trim().is_empty())
                .unwrap_or(false)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// CORS: comma-separated list of allowed origins; any origin when unset
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB timeouts (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    #[serde(default)]
    #[validate]
    pub forecasting: ForecastingConfig,

    #[serde(default)]
    pub enhancement: EnhancementConfig,
}

impl AppConfig {
    /// Creates a configuration with defaults for everything but the essentials
    pub fn new(database_url: String, host: String, port: u16, environment: String) -> Self {
        Self {
            database_url,
            host,
            port,
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            cors_allowed_origins: None,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            forecasting: ForecastingConfig::default(),
            enhancement: EnhancementConfig::default(),
        }
    }

    /// Gets log level reference
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Explicitly configured CORS origins, if any
    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Default value functions
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_db_max_connections() -> u32 {
    16
}
fn default_db_min_connections() -> u32 {
    2
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_db_idle_timeout_secs() -> u64 {
    600
}
fn default_db_acquire_timeout_secs() -> u64 {
    8
}

fn default_history_window_days() -> u32 {
    DEFAULT_HISTORY_WINDOW_DAYS
}
fn default_horizon_days() -> u32 {
    DEFAULT_HORIZON_DAYS
}
fn default_lead_time_days() -> u32 {
    DEFAULT_LEAD_TIME_DAYS
}
fn default_service_level() -> f64 {
    DEFAULT_SERVICE_LEVEL
}
fn default_forecast_validity_hours() -> i64 {
    DEFAULT_FORECAST_VALIDITY_HOURS
}

fn default_enhancement_url() -> String {
    DEFAULT_ENHANCEMENT_URL.to_string()
}
fn default_enhancement_model() -> String {
    DEFAULT_ENHANCEMENT_MODEL.to_string()
}
fn default_enhancement_timeout_secs() -> u64 {
    DEFAULT_ENHANCEMENT_TIMEOUT_SECS
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

fn validate_service_level(level: f64) -> Result<(), ValidationError> {
    if !level.is_finite() || !(0.0..=1.0).contains(&level) {
        let mut err = ValidationError::new("service_level");
        err.message = Some("service_level must be a finite value between 0.0 and 1.0".into());
        return Err(err);
    }
    Ok(())
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("predictive_inventory={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .json()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let config = Config::builder()
        .set_default("database_url", "sqlite://predictive_inventory.db?mode=rwc")?
        .set_default("host", "0.0.0.0")?
        .set_default("port", DEFAULT_PORT as i64)?
        .set_default("environment", run_env.as_str())?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig::new(
            "sqlite::memory:".into(),
            "127.0.0.1".into(),
            8080,
            "test".into(),
        )
    }

    #[test]
    fn defaults_match_documented_values() {
        let cfg = base_config();
        assert_eq!(cfg.forecasting.history_window_days, 180);
        assert_eq!(cfg.forecasting.default_horizon_days, 30);
        assert_eq!(cfg.forecasting.default_lead_time_days, 7);
        assert_eq!(cfg.forecasting.service_level, 0.95);
        assert_eq!(cfg.forecasting.forecast_validity_hours, 24);
        assert!(!cfg.enhancement.is_active());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn service_level_outside_unit_interval_is_rejected() {
        let mut cfg = base_config();
        cfg.forecasting.service_level = 1.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_history_window_is_rejected() {
        let mut cfg = base_config();
        cfg.forecasting.history_window_days = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn service_level_bounds_are_inclusive() {
        let mut cfg = base_config();
        cfg.forecasting.service_level = 1.0;
        assert!(cfg.validate().is_ok());
        cfg.forecasting.service_level = f64::NAN;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn oversized_windows_are_rejected() {
        let mut cfg = base_config();
        cfg.forecasting.forecast_validity_hours = i64::MAX;
        assert!(cfg.validate().is_err());

        let mut cfg = base_config();
        cfg.forecasting.default_horizon_days = 3651;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn enhancement_requires_key_to_be_active() {
        let mut cfg = base_config();
        cfg.enhancement.enabled = true;
        assert!(!cfg.enhancement.is_active());
        cfg.enhancement.api_key = Some("  ".into());
        assert!(!cfg.enhancement.is_active());
        cfg.enhancement.api_key = Some("sk-test".into());
        assert!(cfg.enhancement.is_active());
    }

    #[test]
    fn cors_origins_are_trimmed_and_filtered() {
        let mut cfg = base_config();
        assert!(cfg.cors_origins().is_empty());
        cfg.cors_allowed_origins = Some(" https://a.example , ,https://b.example".into());
        assert_eq!(
            cfg.cors_origins(),
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
    }
}
