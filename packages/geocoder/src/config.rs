//! Geocoding service configuration.
//!
//! The default configuration is embedded at compile time from
//! `services/nominatim.toml`. Setting `HYDRAX_GEOCODER_CONFIG` to a TOML
//! file with the same keys replaces it at startup.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::GeocodeError;

const EMBEDDED_CONFIG: &str = include_str!("../services/nominatim.toml");

/// Environment variable naming a TOML file that overrides the embedded
/// configuration.
pub const CONFIG_ENV_VAR: &str = "HYDRAX_GEOCODER_CONFIG";

/// Connection and query settings for a Nominatim-compatible search
/// endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeocoderConfig {
    /// Search endpoint URL.
    pub base_url: String,
    /// City every query is constrained to.
    pub city: String,
    /// Comma-separated ISO 3166-1 alpha-2 codes.
    pub country_codes: String,
    /// Sent as `User-Agent`; Nominatim's usage policy requires one.
    pub user_agent: String,
    /// Whole-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Maximum results requested; only the first is used.
    #[serde(default = "default_limit")]
    pub limit: u32,
}

const fn default_timeout_secs() -> u64 {
    10
}

const fn default_limit() -> u32 {
    1
}

impl GeocoderConfig {
    /// The compiled-in configuration.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed (this is a compile-time
    /// guarantee since the config is embedded).
    #[must_use]
    pub fn embedded() -> Self {
        Self::parse(EMBEDDED_CONFIG)
            .unwrap_or_else(|e| panic!("Failed to parse embedded geocoder config: {e}"))
    }

    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Config`] if the TOML is invalid or missing
    /// required keys.
    pub fn parse(text: &str) -> Result<Self, GeocodeError> {
        toml::de::from_str(text).map_err(|e| GeocodeError::Config {
            message: e.to_string(),
        })
    }

    /// Reads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Config`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, GeocodeError> {
        let text = std::fs::read_to_string(path).map_err(|e| GeocodeError::Config {
            message: format!("{}: {e}", path.display()),
        })?;
        Self::parse(&text)
    }

    /// The file named by `HYDRAX_GEOCODER_CONFIG`, or the embedded default.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Config`] if the override file is unusable.
    pub fn from_env() -> Result<Self, GeocodeError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => {
                let config = Self::load(Path::new(&path))?;
                log::info!("Using geocoder config from {}", Path::new(&path).display());
                Ok(config)
            }
            None => Ok(Self::embedded()),
        }
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self::embedded()
    }
}
