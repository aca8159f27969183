use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Environment variable that overrides `assistant.default_location`.
pub const LOCATION_ENV: &str = "WEATHER_BUDDY_LOCATION";

const APP_DIR: &str = "weather-buddy";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a one-line message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding config.toml and the weather cache
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,

    /// Conversation behaviour
    #[serde(default)]
    pub assistant: AssistantConfig,

    /// Weather data source settings
    #[serde(default)]
    pub weather: WeatherConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Location assumed when a weather question names no place.
    /// Empty means "ask the user instead".
    #[serde(default = "default_location")]
    pub default_location: String,

    /// Width of the forecast window in hours
    #[serde(default = "default_window_hours")]
    pub window_hours: u32,

    /// Number of chat turns kept for follow-up questions
    #[serde(default = "default_history_turns")]
    pub history_turns: usize,
}

fn default_location() -> String {
    "Newark, CA".to_string()
}

fn default_window_hours() -> u32 {
    2
}

fn default_history_turns() -> usize {
    20
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            default_location: default_location(),
            window_hours: default_window_hours(),
            history_turns: default_history_turns(),
        }
    }
}

impl AssistantConfig {
    /// The configured default location, if any.
    pub fn default_location(&self) -> Option<&str> {
        let trimmed = self.default_location.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

/// Temperature unit preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Auto,
    Celsius,
    Fahrenheit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Temperature unit used in replies
    #[serde(default)]
    pub temperature_unit: TemperatureUnit,

    /// Base URL of the Open-Meteo geocoding API
    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,

    /// Base URL of the Open-Meteo forecast API
    #[serde(default = "default_forecast_url")]
    pub forecast_url: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// How long a fetched forecast window stays fresh, in minutes
    #[serde(default = "default_cache_minutes")]
    pub cache_minutes: u32,

    /// Retries for transient network failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_geocoding_url() -> String {
    "https://geocoding-api.open-meteo.com".to_string()
}

fn default_forecast_url() -> String {
    "https://api.open-meteo.com".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_cache_minutes() -> u32 {
    15
}

fn default_max_retries() -> u32 {
    3
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            temperature_unit: TemperatureUnit::Auto,
            geocoding_url: default_geocoding_url(),
            forecast_url: default_forecast_url(),
            timeout_secs: default_timeout_secs(),
            cache_minutes: default_cache_minutes(),
            max_retries: default_max_retries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            assistant: AssistantConfig::default(),
            weather: WeatherConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

impl Config {
    /// Load configuration from the default location, creating it if it doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from `path`, writing defaults there on first use.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("Failed to read config file")?;
            toml::from_str::<Config>(&contents)
                .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?
        } else {
            let mut config = Self::default();
            if let Some(parent) = path.parent() {
                config.config_dir = parent.to_path_buf();
            }
            config.save_to(path)?;
            tracing::info!("Wrote default configuration to {}", path.display());
            config
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from `path`, or from the default location when `None`.
    pub fn load_at(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from(p),
            None => Self::load(),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(location) = std::env::var(LOCATION_ENV) {
            tracing::debug!("Default location overridden by {}", LOCATION_ENV);
            self.assistant.default_location = location;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.weather.geocoding_url, "weather.geocoding_url", &mut result);
        self.validate_url(&self.weather.forecast_url, "weather.forecast_url", &mut result);

        if self.weather.timeout_secs == 0 {
            result.add_error("weather.timeout_secs", "Timeout must be greater than 0");
        } else if self.weather.timeout_secs > 120 {
            result.add_warning(
                "weather.timeout_secs",
                "Timeout is unusually long (>120 seconds)",
            );
        }

        if self.weather.cache_minutes == 0 {
            result.add_warning("weather.cache_minutes", "Forecast caching disabled (0 minutes)");
        }

        if self.weather.max_retries > 10 {
            result.add_warning("weather.max_retries", "More than 10 retries is unusual");
        }

        if self.assistant.window_hours == 0 || self.assistant.window_hours > 24 {
            result.add_error(
                "assistant.window_hours",
                "Forecast window must be between 1 and 24 hours",
            );
        }

        if self.assistant.default_location().is_none() {
            result.add_warning(
                "assistant.default_location",
                "No default location - questions without a place will ask for one",
            );
        }

        if self.assistant.history_turns == 0 {
            result.add_warning(
                "assistant.history_turns",
                "Conversation history disabled - follow-up questions won't remember places",
            );
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = self.to_toml()?;
        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// The configuration as it would be written to disk
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Path of the default configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join(APP_DIR);

        Ok(config_dir.join("config.toml"))
    }

    /// Path of the persistent weather cache
    pub fn cache_path(&self) -> PathBuf {
        self.config_dir.join("weather_cache.json")
    }
}
