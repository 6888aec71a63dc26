//! Configuration management for the trip planner
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::TripError;
use crate::http::RetryPolicy;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure for the trip planner
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TripPlannerConfig {
    /// Outbound HTTP and retry settings
    #[serde(default)]
    pub http: HttpConfig,
    /// Geocoding provider settings
    #[serde(default)]
    pub geocoding: GeocodingConfig,
    /// Weather provider settings
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Points-of-interest provider settings
    #[serde(default)]
    pub places: PlacesConfig,
    /// Web adapter settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Outbound HTTP settings shared by every provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub timeout_seconds: u32,
    /// Total attempts for a request failing with transport or 5xx errors
    #[serde(default = "default_http_max_retries")]
    pub max_retries: u32,
    /// Delay before the first retry, doubled for every further retry
    #[serde(default = "default_http_base_delay")]
    pub base_delay_ms: u64,
    /// User agent sent with every request (Nominatim rejects anonymous clients)
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Geocoding provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    /// Base URL for the Nominatim API
    #[serde(default = "default_geocoding_base_url")]
    pub base_url: String,
    /// Number of candidates requested per query
    #[serde(default = "default_geocoding_limit")]
    pub candidate_limit: u32,
    /// Lowest acceptable place rank (inclusive)
    #[serde(default = "default_min_rank")]
    pub min_rank: u32,
    /// Highest acceptable place rank (inclusive)
    #[serde(default = "default_max_rank")]
    pub max_rank: u32,
}

/// Weather provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Base URL for the Open-Meteo API
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// Number of forecast days requested
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u32,
}

/// Points-of-interest provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacesConfig {
    /// Base URL for the Overpass API
    #[serde(default = "default_places_base_url")]
    pub base_url: String,
    /// Search radius in meters
    #[serde(default = "default_places_radius")]
    pub radius_meters: u32,
    /// Maximum number of attractions to return
    #[serde(default = "default_places_limit")]
    pub limit: usize,
}

/// Web adapter settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port the web adapter listens on
    #[serde(default = "default_server_port")]
    pub port: u16,
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
    /// OTLP/HTTP endpoint for span export, disabled when unset
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

// Default value functions
fn default_http_timeout() -> u32 {
    30
}

fn default_http_max_retries() -> u32 {
    3
}

fn default_http_base_delay() -> u64 {
    1000
}

fn default_user_agent() -> String {
    format!("TripPlanner/{}", crate::VERSION)
}

fn default_geocoding_base_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_geocoding_limit() -> u32 {
    5
}

fn default_min_rank() -> u32 {
    1
}

fn default_max_rank() -> u32 {
    20
}

fn default_weather_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_forecast_days() -> u32 {
    3
}

fn default_places_base_url() -> String {
    "https://overpass-api.de/api".to_string()
}

fn default_places_radius() -> u32 {
    5000
}

fn default_places_limit() -> usize {
    5
}

fn default_server_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_http_timeout(),
            max_retries: default_http_max_retries(),
            base_delay_ms: default_http_base_delay(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoding_base_url(),
            candidate_limit: default_geocoding_limit(),
            min_rank: default_min_rank(),
            max_rank: default_max_rank(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
            forecast_days: default_forecast_days(),
        }
    }
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            base_url: default_places_base_url(),
            radius_meters: default_places_radius(),
            limit: default_places_limit(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            otlp_endpoint: None,
        }
    }
}

impl HttpConfig {
    /// Retry policy described by this section
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.base_delay_ms))
    }
}

impl TripPlannerConfig {
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

        // TRIPPLANNER_GEOCODING__MAX_RANK=18 and friends
        builder = builder.add_source(
            Environment::with_prefix("TRIPPLANNER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: TripPlannerConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tripplanner").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.http.timeout_seconds == 0 {
            self.http.timeout_seconds = default_http_timeout();
        }
        if self.http.max_retries == 0 {
            self.http.max_retries = default_http_max_retries();
        }
        if self.http.user_agent.is_empty() {
            self.http.user_agent = default_user_agent();
        }
        if self.geocoding.base_url.is_empty() {
            self.geocoding.base_url = default_geocoding_base_url();
        }
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.places.base_url.is_empty() {
            self.places.base_url = default_places_base_url();
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

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.http.timeout_seconds > 300 {
            return Err(TripError::config("HTTP timeout cannot exceed 300 seconds").into());
        }

        if self.http.max_retries > 10 {
            return Err(TripError::config("HTTP max retries cannot exceed 10").into());
        }

        if self.http.base_delay_ms > 60_000 {
            return Err(TripError::config("HTTP base delay cannot exceed 60000 ms").into());
        }

        if self.geocoding.candidate_limit == 0 || self.geocoding.candidate_limit > 50 {
            return Err(
                TripError::config("Geocoding candidate limit must be between 1 and 50").into(),
            );
        }

        if self.geocoding.min_rank > self.geocoding.max_rank {
            return Err(TripError::config(format!(
                "Geocoding rank band is empty: min_rank {} is above max_rank {}",
                self.geocoding.min_rank, self.geocoding.max_rank
            ))
            .into());
        }

        if self.weather.forecast_days == 0 || self.weather.forecast_days > 16 {
            return Err(TripError::config("Forecast days must be between 1 and 16").into());
        }

        if self.places.radius_meters == 0 || self.places.radius_meters > 50_000 {
            return Err(
                TripError::config("Places radius must be between 1 and 50000 meters").into(),
            );
        }

        if self.places.limit == 0 || self.places.limit > 100 {
            return Err(TripError::config("Places limit must be between 1 and 100").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(TripError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(TripError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("Geocoding", &self.geocoding.base_url),
            ("Weather", &self.weather.base_url),
            ("Places", &self.places.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(TripError::config(format!(
                    "{name} API base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}
