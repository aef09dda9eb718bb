//! Configuration management for `surfcast`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::SurfcastError;
use crate::providers::{CredentialSet, openweathermap, stormglass, surfline, windy};
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SurfcastConfig {
    /// Provider endpoints and HTTP behaviour
    #[serde(default)]
    pub providers: ProviderConfig,
    /// API keys, one per provider
    #[serde(default)]
    pub credentials: CredentialSet,
    /// Response cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

/// Provider API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_stormglass_url")]
    pub stormglass_url: String,
    /// Stormglass data source selector
    #[serde(default = "default_stormglass_source")]
    pub stormglass_source: String,
    #[serde(default = "default_openweathermap_url")]
    pub openweathermap_url: String,
    #[serde(default = "default_windy_url")]
    pub windy_url: String,
    /// Windy forecast model
    #[serde(default = "default_windy_model")]
    pub windy_model: String,
    #[serde(default = "default_true")]
    pub enable_windy: bool,
    #[serde(default = "default_surfline_url")]
    pub surfline_url: String,
    #[serde(default = "default_true")]
    pub enable_surfline: bool,
    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Deadline for one provider call including retries, 0 disables it
    #[serde(default = "default_deadline")]
    pub deadline_seconds: u32,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Cache TTL in hours
    #[serde(default = "default_cache_ttl")]
    pub ttl_hours: u32,
    /// Cache directory location
    #[serde(default = "default_cache_location")]
    pub location: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

// Default value functions
fn default_stormglass_url() -> String {
    stormglass::DEFAULT_BASE_URL.to_string()
}

fn default_stormglass_source() -> String {
    stormglass::DEFAULT_SOURCE.to_string()
}

fn default_openweathermap_url() -> String {
    openweathermap::DEFAULT_BASE_URL.to_string()
}

fn default_windy_url() -> String {
    windy::DEFAULT_BASE_URL.to_string()
}

fn default_windy_model() -> String {
    windy::DEFAULT_MODEL.to_string()
}

fn default_surfline_url() -> String {
    surfline::DEFAULT_BASE_URL.to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout() -> u32 {
    15
}

fn default_max_retries() -> u32 {
    2
}

fn default_deadline() -> u32 {
    30
}

fn default_cache_ttl() -> u32 {
    1
}

fn default_cache_location() -> String {
    dirs::cache_dir()
        .map(|dir| dir.join("surfcast").to_string_lossy().into_owned())
        .unwrap_or_else(|| ".surfcast-cache".to_string())
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            stormglass_url: default_stormglass_url(),
            stormglass_source: default_stormglass_source(),
            openweathermap_url: default_openweathermap_url(),
            windy_url: default_windy_url(),
            windy_model: default_windy_model(),
            enable_windy: true,
            surfline_url: default_surfline_url(),
            enable_surfline: true,
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
            deadline_seconds: default_deadline(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ttl_hours: default_cache_ttl(),
            location: default_cache_location(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ProviderConfig {
    /// Per-provider deadline, `None` when disabled
    #[must_use]
    pub fn deadline(&self) -> Option<Duration> {
        (self.deadline_seconds > 0).then(|| Duration::from_secs(self.deadline_seconds.into()))
    }
}

impl CacheConfig {
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(u64::from(self.ttl_hours) * 3600)
    }
}

impl SurfcastConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // SURFCAST_PROVIDERS__TIMEOUT_SECONDS=10, SURFCAST_CREDENTIALS__STORMGLASS=...
        builder = builder.add_source(
            Environment::with_prefix("SURFCAST")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: SurfcastConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("surfcast").join("config.toml"))
    }

    /// Apply default values to blank configuration fields
    pub fn apply_defaults(&mut self) {
        let providers = &mut self.providers;
        if providers.stormglass_url.is_empty() {
            providers.stormglass_url = default_stormglass_url();
        }
        if providers.stormglass_source.is_empty() {
            providers.stormglass_source = default_stormglass_source();
        }
        if providers.openweathermap_url.is_empty() {
            providers.openweathermap_url = default_openweathermap_url();
        }
        if providers.windy_url.is_empty() {
            providers.windy_url = default_windy_url();
        }
        if providers.windy_model.is_empty() {
            providers.windy_model = default_windy_model();
        }
        if providers.surfline_url.is_empty() {
            providers.surfline_url = default_surfline_url();
        }
        if providers.timeout_seconds == 0 {
            providers.timeout_seconds = default_timeout();
        }
        if self.cache.ttl_hours == 0 {
            self.cache.ttl_hours = default_cache_ttl();
        }
        if self.cache.location.is_empty() {
            self.cache.location = default_cache_location();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.providers.timeout_seconds > 300 {
            return Err(SurfcastError::config("Provider timeout cannot exceed 300 seconds").into());
        }

        if self.providers.max_retries > 10 {
            return Err(SurfcastError::config("Provider max retries cannot exceed 10").into());
        }

        if self.providers.deadline_seconds > 600 {
            return Err(SurfcastError::config("Provider deadline cannot exceed 600 seconds").into());
        }

        if self.cache.ttl_hours > 48 {
            return Err(SurfcastError::config(
                "Cache TTL cannot exceed 48 hours; forecasts go stale",
            )
            .into());
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(SurfcastError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(SurfcastError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let urls = [
            ("stormglass_url", &self.providers.stormglass_url),
            ("openweathermap_url", &self.providers.openweathermap_url),
            ("windy_url", &self.providers.windy_url),
            ("surfline_url", &self.providers.surfline_url),
        ];
        for (name, url) in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(SurfcastError::config(format!(
                    "Provider setting '{name}' must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = SurfcastConfig::default();
        assert_eq!(config.providers.stormglass_url, "https://api.stormglass.io/v2");
        assert_eq!(config.providers.stormglass_source, "noaa");
        assert_eq!(config.providers.windy_model, "gfs");
        assert_eq!(config.providers.timeout_seconds, 15);
        assert_eq!(config.providers.deadline(), Some(Duration::from_secs(30)));
        assert!(!config.cache.enabled);
        assert_eq!(config.logging.level, "info");
        assert!(config.credentials.stormglass.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = SurfcastConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = SurfcastConfig::default();
        config.providers.timeout_seconds = 500;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timeout cannot exceed"));
    }

    #[test]
    fn test_config_validation_rejects_bad_url() {
        let mut config = SurfcastConfig::default();
        config.providers.windy_url = "ftp://windy".to_string();
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("windy_url"));
    }

    #[test]
    fn test_deadline_can_be_disabled() {
        let mut config = SurfcastConfig::default();
        config.providers.deadline_seconds = 0;
        assert_eq!(config.providers.deadline(), None);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[providers]
timeout_seconds = 5
enable_windy = false

[credentials]
stormglass = "sg-file-key"

[logging]
format = "json"
"#
        )
        .unwrap();

        let config = SurfcastConfig::load_from_path(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.providers.timeout_seconds, 5);
        assert!(!config.providers.enable_windy);
        assert_eq!(config.credentials.stormglass.as_deref(), Some("sg-file-key"));
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = SurfcastConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("surfcast"));
            assert!(path.to_string_lossy().contains("config.toml"));
        }
    }
}
