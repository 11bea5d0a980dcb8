//! Fixtures shared by the server's tests.

use async_trait::async_trait;
use hydrax_geocoder::{Geocode, GeocodeError, GeocodedAddress};
use hydrax_spatial::synthetic_footprint;
use hydrax_spatial_models::{BuildingFootprint, FootprintSource, GeoPoint};

/// A geocoder with a canned answer.
pub enum StubGeocoder {
    At { lat: f64, lon: f64 },
    Miss,
    Failing,
    Panicking,
}

impl StubGeocoder {
    pub const fn at((lat, lon): (f64, f64)) -> Self {
        Self::At { lat, lon }
    }

    pub const fn miss() -> Self {
        Self::Miss
    }

    pub const fn failing() -> Self {
        Self::Failing
    }

    /// Fails the test if the pipeline reaches the geocoder at all.
    pub const fn panicking() -> Self {
        Self::Panicking
    }
}

#[async_trait]
impl Geocode for StubGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<GeocodedAddress>, GeocodeError> {
        match self {
            Self::At { lat, lon } => Ok(Some(GeocodedAddress {
                latitude: *lat,
                longitude: *lon,
                matched_address: Some(address.to_string()),
            })),
            Self::Miss => Ok(None),
            Self::Failing => Err(GeocodeError::RateLimited),
            Self::Panicking => panic!("geocoder called for '{address}'"),
        }
    }
}

/// A 25 m dataset footprint centered on the canonical point `(x, y)`.
pub fn disk_footprint(x: f64, y: f64, id: i64) -> BuildingFootprint {
    BuildingFootprint {
        id,
        source: FootprintSource::Dataset,
        ..synthetic_footprint(GeoPoint::new(x, y))
    }
}
