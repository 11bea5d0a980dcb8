#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the HydraX estimate server.
//!
//! These types are serialized to JSON for the REST API. They carry values
//! at reporting precision, separate from the full-precision model types, so
//! the API contract can evolve independently of the model.

use hydrax_harvest_models::{Assessment, HarvestMetrics, SavingsBreakdown, round_to};
use hydrax_spatial_models::{BuildingFootprint, FallbackReason, FootprintSource, RainfallSample};
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Always `"ok"` while the server is answering.
    pub status: String,
}

impl ApiHealth {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// Error body for every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable reason.
    pub error: String,
}

/// Query parameters for the estimate endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EstimateQueryParams {
    /// Free-form street address.
    pub address: Option<String>,
}

/// The matched roof.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiBuildingInfo {
    pub roof_area_m2: f64,
    pub building_id: i64,
    /// `dataset`, or `synthetic` when no building dataset is loaded.
    pub source: FootprintSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiRainfallData {
    pub annual_rainfall_mm: f64,
    /// Why the fallback rainfall was used, if it was.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<FallbackReason>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiWaterCollection {
    pub estimated_annual_yield_m3: f64,
    pub estimated_annual_yield_liters: f64,
    pub estimated_annual_yield_gallons: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvironmentalImpact {
    pub stormwater_runoff_reduction_percent: f64,
}

/// Successful response of `GET /api/estimate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEstimate {
    /// The address as submitted.
    pub input_address: String,
    pub geocoded_lat: f64,
    pub geocoded_lon: f64,
    pub building_info: ApiBuildingInfo,
    pub rainfall_data: ApiRainfallData,
    pub water_collection: ApiWaterCollection,
    pub water_savings: SavingsBreakdown,
    pub environmental_impact: ApiEnvironmentalImpact,
    pub hydrax_ai_assessment: Assessment,
}

impl ApiEstimate {
    /// Assembles the response, rounding model values to reporting
    /// precision. `assessment` is expected to be at reporting precision
    /// already.
    #[must_use]
    pub fn new(
        input_address: String,
        (geocoded_lat, geocoded_lon): (f64, f64),
        footprint: &BuildingFootprint,
        rainfall: RainfallSample,
        metrics: &HarvestMetrics,
        assessment: Assessment,
    ) -> Self {
        let fallback_reason = match rainfall {
            RainfallSample::Fallback { reason } => Some(reason),
            RainfallSample::Sampled { .. } => None,
        };

        Self {
            input_address,
            geocoded_lat,
            geocoded_lon,
            building_info: ApiBuildingInfo {
                roof_area_m2: round_to(metrics.roof_area_m2, 2),
                building_id: footprint.id,
                source: footprint.source,
            },
            rainfall_data: ApiRainfallData {
                annual_rainfall_mm: round_to(metrics.rainfall_mm, 1),
                fallback_reason,
            },
            water_collection: ApiWaterCollection {
                estimated_annual_yield_m3: round_to(metrics.yield_m3, 2),
                estimated_annual_yield_liters: round_to(metrics.yield_liters, 0),
                estimated_annual_yield_gallons: round_to(metrics.yield_gallons, 1),
            },
            water_savings: metrics.savings_breakdown.rounded(),
            environmental_impact: ApiEnvironmentalImpact {
                stormwater_runoff_reduction_percent: round_to(metrics.runoff_reduction_pct, 1),
            },
            hydrax_ai_assessment: assessment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hydrax_spatial_models::MultiPolygon;
    use hydrax_harvest_models::{CostSavings, EnvironmentalImpact, HarvestCategory};

    fn metrics() -> HarvestMetrics {
        HarvestMetrics {
            roof_area_m2: 1963.495_408,
            rainfall_mm: 612.345,
            yield_m3: 961.872_1,
            yield_liters: 961_872.1,
            yield_gallons: 254_099.76,
            runoff_reduction_pct: 84.210_526,
            savings_breakdown: SavingsBreakdown {
                monthly_yield_liters: 80_156.008,
                monthly_yield_gallons: 21_174.98,
                household_coverage_percent: 100.0,
                equivalent_showers_per_year: 14_798.03,
                equivalent_toilet_flushes_per_year: 160_312.02,
                annual_household_usage_liters: 131_400.0,
            },
        }
    }

    fn assessment() -> Assessment {
        Assessment {
            score: 1.0,
            category: HarvestCategory::Excellent,
            summary: String::new(),
            recommendations: Vec::new(),
            estimated_cost_savings: CostSavings {
                annual_savings_gbp: 1442.81,
                annual_savings_usd: 1832.37,
                system_cost_range_gbp: (2000, 5000),
                estimated_payback_years: Some(1.4),
            },
            environmental_impact: EnvironmentalImpact {
                co2_savings_kg_per_year: 330.88,
                stormwater_reduction_percent: 84.2,
            },
        }
    }

    #[test]
    fn rounds_to_reporting_precision() {
        let footprint = BuildingFootprint {
            id: 0,
            geometry: MultiPolygon(Vec::new()),
            area_m2: 1963.495_408,
            source: FootprintSource::Synthetic,
        };
        let estimate = ApiEstimate::new(
            "Big Ben, London".to_string(),
            (51.500_7, -0.124_6),
            &footprint,
            RainfallSample::Sampled { mm: 612.345 },
            &metrics(),
            assessment(),
        );

        assert!((estimate.building_info.roof_area_m2 - 1963.5).abs() < 1e-9);
        assert_eq!(estimate.building_info.building_id, 0);
        assert_eq!(estimate.building_info.source, FootprintSource::Synthetic);
        assert!((estimate.rainfall_data.annual_rainfall_mm - 612.3).abs() < 1e-9);
        assert_eq!(estimate.rainfall_data.fallback_reason, None);
        assert!((estimate.water_collection.estimated_annual_yield_m3 - 961.87).abs() < 1e-9);
        assert!((estimate.water_collection.estimated_annual_yield_liters - 961_872.0).abs() < 1e-9);
        assert!((estimate.water_collection.estimated_annual_yield_gallons - 254_099.8).abs() < 1e-6);
        assert!((estimate.water_savings.monthly_yield_liters - 80_156.0).abs() < 1e-9);
        assert!((estimate.water_savings.equivalent_showers_per_year - 14_798.0).abs() < 1e-9);
        assert!(
            (estimate.environmental_impact.stormwater_runoff_reduction_percent - 84.2).abs() < 1e-9
        );
        assert_eq!(estimate.hydrax_ai_assessment, assessment());
    }

    #[test]
    fn records_rainfall_fallback_reason() {
        let footprint = BuildingFootprint {
            id: 17,
            geometry: MultiPolygon(Vec::new()),
            area_m2: 250.5,
            source: FootprintSource::Dataset,
        };
        let estimate = ApiEstimate::new(
            "10 Downing Street".to_string(),
            (51.503_4, -0.127_6),
            &footprint,
            RainfallSample::Fallback {
                reason: FallbackReason::OutOfExtent,
            },
            &metrics(),
            assessment(),
        );
        assert_eq!(estimate.building_info.building_id, 17);
        assert_eq!(
            estimate.rainfall_data.fallback_reason,
            Some(FallbackReason::OutOfExtent)
        );
    }

    #[test]
    fn health_is_ok() {
        assert_eq!(ApiHealth::ok().status, "ok");
    }
}
