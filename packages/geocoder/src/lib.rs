#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Address geocoding for HydraX.
//!
//! Resolves a free-form street address to WGS84 latitude/longitude through
//! a Nominatim-compatible search service configured in
//! `services/nominatim.toml`. The [`Geocode`] trait is the seam the request
//! pipeline depends on, so tests and offline tools can substitute their own
//! resolver.

pub mod config;
pub mod nominatim;

use async_trait::async_trait;
use thiserror::Error;

pub use config::GeocoderConfig;

/// A geocoding result.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedAddress {
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// The matched/canonical address returned by the geocoder.
    pub matched_address: Option<String>,
}

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed or the service returned an error status.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// The service configuration is unusable.
    #[error("Config error: {message}")]
    Config {
        /// Description of the configuration problem.
        message: String,
    },
}

/// Resolves addresses to coordinates.
#[async_trait]
pub trait Geocode: Send + Sync {
    /// Geocodes `address`, returning `None` when the service has no match.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the service cannot be reached or answers
    /// with something unusable.
    async fn geocode(&self, address: &str) -> Result<Option<GeocodedAddress>, GeocodeError>;
}

/// [`Geocode`] implementation backed by a Nominatim search endpoint.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: reqwest::Client,
    config: GeocoderConfig,
}

impl NominatimGeocoder {
    /// Creates a client with the configured user agent and timeout.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the HTTP client cannot be built.
    pub fn new(config: GeocoderConfig) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()?;
        Ok(Self { client, config })
    }

    /// Creates a client from `HYDRAX_GEOCODER_CONFIG` or the embedded
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the configuration is unusable or the
    /// HTTP client cannot be built.
    pub fn from_env() -> Result<Self, GeocodeError> {
        Self::new(GeocoderConfig::from_env()?)
    }

    #[must_use]
    pub const fn config(&self) -> &GeocoderConfig {
        &self.config
    }
}

#[async_trait]
impl Geocode for NominatimGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<GeocodedAddress>, GeocodeError> {
        log::debug!("Geocoding '{address}' via {}", self.config.base_url);
        nominatim::geocode_single(&self.client, &self.config, address).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_client_from_embedded_config() {
        let geocoder = NominatimGeocoder::new(GeocoderConfig::embedded()).unwrap();
        assert_eq!(geocoder.config().city, "London");
    }
}
