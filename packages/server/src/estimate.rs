//! The estimate pipeline: geocode, find the roof, sample rainfall, model
//! the harvest, assess it.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use hydrax_geocoder::Geocode;
use hydrax_harvest::{assess, compute_harvest};
use hydrax_server_models::{ApiError, ApiEstimate};
use hydrax_spatial::SpatialError;
use hydrax_spatial::SpatialStore;
use hydrax_spatial::projection::lat_lon_to_canonical;
use thiserror::Error;

/// Why an estimate could not be produced.
#[derive(Debug, Error)]
pub enum EstimateError {
    /// No address, or only whitespace, was supplied.
    #[error("Missing 'address' query parameter")]
    MissingAddress,

    /// The geocoder had no match or could not be reached.
    #[error("Address not found by geocoder")]
    AddressNotFound,

    /// Buildings are loaded but none contains the geocoded point.
    #[error("No building footprint found at that location")]
    BuildingNotFound,

    /// The geocoded point could not be brought into the canonical CRS.
    #[error("Failed to project geocoded point: {0}")]
    Projection(#[from] SpatialError),
}

impl EstimateError {
    /// Message shown to API clients. Internal details stay in the log.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::Projection(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for EstimateError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingAddress => StatusCode::BAD_REQUEST,
            Self::AddressNotFound | Self::BuildingNotFound => StatusCode::NOT_FOUND,
            Self::Projection(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            log::error!("Estimate failed: {self}");
        }
        HttpResponse::build(self.status_code()).json(ApiError {
            error: self.client_message(),
        })
    }
}

/// Runs the full pipeline for one address.
///
/// # Errors
///
/// Returns [`EstimateError`] if the address is blank, cannot be geocoded,
/// lies outside every loaded footprint, or cannot be projected.
pub async fn estimate(
    store: &SpatialStore,
    geocoder: &dyn Geocode,
    address: Option<&str>,
) -> Result<ApiEstimate, EstimateError> {
    let input_address = address
        .filter(|a| !a.trim().is_empty())
        .ok_or(EstimateError::MissingAddress)?;

    let geocoded = match geocoder.geocode(input_address.trim()).await {
        Ok(Some(geocoded)) => geocoded,
        Ok(None) => {
            log::info!("No geocoder match for '{input_address}'");
            return Err(EstimateError::AddressNotFound);
        }
        Err(e) => {
            log::warn!("Geocoding '{input_address}' failed: {e}");
            return Err(EstimateError::AddressNotFound);
        }
    };

    let point = lat_lon_to_canonical(geocoded.latitude, geocoded.longitude)?;

    let footprint = store
        .resolve_footprint(point)
        .ok_or(EstimateError::BuildingNotFound)?;
    if footprint.is_synthetic() {
        log::debug!("No building dataset loaded; using a synthetic footprint");
    }

    let rainfall = store.sample_rainfall(point);
    let metrics = compute_harvest(footprint.area_m2, rainfall.value());
    let breakdown = metrics.savings_breakdown.rounded();
    let assessment = assess(
        metrics.yield_m3,
        metrics.runoff_reduction_pct,
        Some(metrics.yield_liters),
        Some(&breakdown),
    );

    Ok(ApiEstimate::new(
        input_address.to_string(),
        (geocoded.latitude, geocoded.longitude),
        &footprint,
        rainfall,
        &metrics,
        assessment,
    ))
}
