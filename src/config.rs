//! Application configuration management.
//!
//! Settings are layered, later layers winning:
//!
//! 1. Built-in defaults
//! 2. A TOML file (`--config`, or `config.toml` in the platform config dir)
//! 3. `GQ_*` environment variables (e.g. `GQ_METRO_RADIUS_KM=10`)
//! 4. CLI flags, via [`Config::merge_cli`]
//!
//! # Example
//!
//! ```toml
//! search_interval_secs = 120
//! metro_radius_km = 10.0
//! image_extension = "jpeg"
//! geocoder = "nominatim"
//! geocode_url = "https://nominatim.openstreetmap.org/reverse"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;

use chrono::Duration;
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::geocode::nominatim::{DEFAULT_NOMINATIM_URL, DEFAULT_TIMEOUT};
use crate::geocode::{
    Enricher, GeocodeCache, GeocodeError, GeocodeProvider, NominatimGeocoder, OfflineGeocoder,
};
use crate::index::DEFAULT_METRO_RADIUS_KM;
use crate::resolver::DEFAULT_SEARCH_INTERVAL;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "GQ_";

/// Errors loading configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The layered sources could not be merged or deserialized.
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),

    /// A config file named explicitly does not exist.
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// A value parsed but is out of range.
    #[error("Invalid configuration value for {key}: {message}")]
    Value {
        /// Offending key
        key: &'static str,
        /// What is wrong with it
        message: String,
    },
}

/// Reverse-geocoding backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeocoderKind {
    /// Embedded city database, no network
    #[default]
    Offline,
    /// Nominatim-compatible HTTP endpoint
    Nominatim,
    /// Enrichment disabled
    None,
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Nearest-match tolerance, in seconds.
    pub search_interval_secs: u64,
    /// Radius for location queries, in kilometres.
    pub metro_radius_km: f64,
    /// Image file extension to correlate, matched case-insensitively.
    pub image_extension: String,
    /// Reverse-geocoding backend.
    pub geocoder: GeocoderKind,
    /// Base URL for the HTTP geocoder.
    pub geocode_url: String,
    /// API key for the HTTP geocoder, if it needs one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geocode_api_key: Option<String>,
    /// Per-request timeout for the HTTP geocoder, in seconds.
    pub geocode_timeout_secs: u64,
    /// Console prompt.
    pub prompt: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search_interval_secs: DEFAULT_SEARCH_INTERVAL.num_seconds().unsigned_abs(),
            metro_radius_km: DEFAULT_METRO_RADIUS_KM,
            image_extension: "jpg".to_string(),
            geocoder: GeocoderKind::Offline,
            geocode_url: DEFAULT_NOMINATIM_URL.to_string(),
            geocode_api_key: None,
            geocode_timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            prompt: crate::console::DEFAULT_PROMPT.to_string(),
        }
    }
}

impl Config {
    /// Load from `path`, or from the platform config file when `None`.
    ///
    /// A missing platform file is not an error; defaults and environment
    /// still apply. A missing explicit `path` is.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a source is malformed or a value is out of
    /// range.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) if !path.is_file() => Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => Self::load_from_path(path),
            None => match Self::config_path() {
                Some(path) => Self::load_from_path(&path),
                None => {
                    log::debug!("No platform config directory, using defaults");
                    Self::load_layers(Figment::from(Serialized::defaults(Self::default())))
                }
            },
        }
    }

    /// Load from a specific TOML file.
    ///
    /// # Errors
    ///
    /// See [`Config::load`].
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            log::debug!("Loading configuration from {}", path.display());
        } else {
            log::debug!("Config file {} not found, skipping", path.display());
        }
        Self::load_layers(
            Figment::from(Serialized::defaults(Self::default())).merge(Toml::file(path)),
        )
    }

    fn load_layers(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// The default platform-specific configuration path.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "geoquery", "gq").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.metro_radius_km.is_finite() || self.metro_radius_km < 0.0 {
            return Err(ConfigError::Value {
                key: "metro_radius_km",
                message: format!("{} is not a non-negative distance", self.metro_radius_km),
            });
        }
        if self.image_extension.trim_start_matches('.').is_empty() {
            return Err(ConfigError::Value {
                key: "image_extension",
                message: "must not be empty".to_string(),
            });
        }
        if i64::try_from(self.search_interval_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .is_none()
        {
            return Err(ConfigError::Value {
                key: "search_interval_secs",
                message: format!("{} is too large", self.search_interval_secs),
            });
        }
        Ok(())
    }

    /// Apply CLI overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Value`] if an override is out of range.
    pub fn merge_cli(&mut self, cli: &Cli) -> Result<(), ConfigError> {
        if let Some(tolerance) = cli.tolerance {
            self.search_interval_secs = tolerance;
        }
        self.validate()
    }

    /// Nearest-match tolerance as a duration.
    #[must_use]
    pub fn search_interval(&self) -> Duration {
        i64::try_from(self.search_interval_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(DEFAULT_SEARCH_INTERVAL)
    }

    /// Build the enricher for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the HTTP client cannot be built.
    pub fn build_enricher(&self) -> Result<Enricher, GeocodeError> {
        let provider: Box<dyn GeocodeProvider> = match self.geocoder {
            GeocoderKind::None => return Ok(Enricher::unsupported()),
            GeocoderKind::Offline => Box::new(OfflineGeocoder::new()),
            GeocoderKind::Nominatim => Box::new(
                NominatimGeocoder::new(
                    &self.geocode_url,
                    StdDuration::from_secs(self.geocode_timeout_secs),
                )?
                .with_api_key(self.geocode_api_key.clone()),
            ),
        };
        log::debug!("Using {} geocoder", provider.name());
        Ok(Enricher::new(GeocodeCache::new(provider)))
    }
}
