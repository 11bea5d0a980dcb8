#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Hydrology and assessment types for rainwater harvesting estimates.
//!
//! Holds the model parameters, the derived [`HarvestMetrics`] for a roof,
//! and the rule-based [`Assessment`] built from them. Serialized field names
//! match the JSON keys of the estimate API.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Fraction of rainfall realistically harvested from a roof.
pub const CAPTURE_FACTOR: f64 = 0.80;

/// Fraction of rainfall that becomes runoff from a roof with no harvesting.
pub const RUNOFF_COEFF: f64 = 0.95;

/// US gallons per cubic meter.
pub const US_GALLONS_PER_M3: f64 = 264.172;

/// Reference per-person daily water use (liters).
pub const LITERS_PER_PERSON_PER_DAY: f64 = 150.0;

/// Reference household size (people).
pub const HOUSEHOLD_SIZE: f64 = 2.4;

/// Days in the reference year.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Liters used by one shower.
pub const LITERS_PER_SHOWER: f64 = 65.0;

/// Liters used by one toilet flush.
pub const LITERS_PER_FLUSH: f64 = 6.0;

/// Annual yield (m³) at which the yield score saturates and the top tier
/// starts.
pub const YIELD_HIGH_M3: f64 = 200.0;

/// Annual yield (m³) for the `good` tier.
pub const YIELD_MEDIUM_M3: f64 = 80.0;

/// Annual yield (m³) for the `moderate` tier.
pub const YIELD_MODERATE_M3: f64 = 20.0;

/// Runoff reduction (%) at which the reduction score saturates and the top
/// tier starts.
pub const REDUCTION_HIGH_PCT: f64 = 70.0;

/// Runoff reduction (%) for the `good` tier.
pub const REDUCTION_MEDIUM_PCT: f64 = 40.0;

/// Weight of the yield component in the score.
pub const SCORE_YIELD_WEIGHT: f64 = 0.6;

/// Weight of the runoff reduction component in the score.
pub const SCORE_REDUCTION_WEIGHT: f64 = 0.4;

/// Mains water price (GBP per m³).
pub const WATER_COST_GBP_PER_M3: f64 = 1.50;

/// Exchange rate used for the USD savings figure.
pub const GBP_TO_USD: f64 = 1.27;

/// CO2 emitted treating and supplying one m³ of mains water (kg).
pub const CO2_KG_PER_M3: f64 = 0.344;

/// Payback period used when there are no savings to pay a system back.
pub const PAYBACK_UNBOUNDED_YEARS: f64 = 999.0;

/// Payback periods at or beyond this are reported as `null`.
pub const PAYBACK_REPORT_LIMIT_YEARS: f64 = 50.0;

/// Household coverage (%) that earns the "meet" recommendation.
pub const COVERAGE_MEET_PCT: f64 = 50.0;

/// Household coverage (%) that earns the "cover" recommendation.
pub const COVERAGE_COVER_PCT: f64 = 25.0;

/// Annual water use of the reference household (liters).
#[must_use]
pub const fn annual_household_usage_liters() -> f64 {
    LITERS_PER_PERSON_PER_DAY * HOUSEHOLD_SIZE * DAYS_PER_YEAR
}

/// Rounds `value` to `decimals` places, halves away from zero.
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Indicative installed system cost in GBP as `(low, high)`.
///
/// Tiers follow yield alone, so a roof can be priced as a large system
/// while landing in a lower category on runoff reduction.
#[must_use]
pub fn system_cost_range_gbp(yield_m3: f64) -> (u32, u32) {
    if yield_m3 >= YIELD_HIGH_M3 {
        (2000, 5000)
    } else if yield_m3 >= YIELD_MEDIUM_M3 {
        (1000, 3000)
    } else {
        (500, 1500)
    }
}

/// How harvested water compares to everyday household use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavingsBreakdown {
    pub monthly_yield_liters: f64,
    pub monthly_yield_gallons: f64,
    /// Share of the reference household's annual use, clamped to `[0, 100]`.
    pub household_coverage_percent: f64,
    pub equivalent_showers_per_year: f64,
    pub equivalent_toilet_flushes_per_year: f64,
    pub annual_household_usage_liters: f64,
}

impl SavingsBreakdown {
    /// The breakdown at reporting precision.
    #[must_use]
    pub fn rounded(&self) -> Self {
        Self {
            monthly_yield_liters: round_to(self.monthly_yield_liters, 1),
            monthly_yield_gallons: round_to(self.monthly_yield_gallons, 1),
            household_coverage_percent: round_to(self.household_coverage_percent, 1),
            equivalent_showers_per_year: round_to(self.equivalent_showers_per_year, 0),
            equivalent_toilet_flushes_per_year: round_to(
                self.equivalent_toilet_flushes_per_year,
                0,
            ),
            annual_household_usage_liters: round_to(self.annual_household_usage_liters, 0),
        }
    }
}

/// Hydrological estimate for one roof, at full precision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HarvestMetrics {
    pub roof_area_m2: f64,
    /// Annual rainfall used for the estimate (mm).
    pub rainfall_mm: f64,
    #[serde(rename = "estimated_annual_yield_m3")]
    pub yield_m3: f64,
    #[serde(rename = "estimated_annual_yield_liters")]
    pub yield_liters: f64,
    #[serde(rename = "estimated_annual_yield_gallons")]
    pub yield_gallons: f64,
    /// Harvested share of the runoff the roof would otherwise shed (%).
    #[serde(rename = "stormwater_runoff_reduction_percent")]
    pub runoff_reduction_pct: f64,
    #[serde(rename = "water_savings_breakdown")]
    pub savings_breakdown: SavingsBreakdown,
}

/// Harvesting potential tier, ordered from worst to best.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HarvestCategory {
    Low,
    Moderate,
    Good,
    Excellent,
}

/// Money side of an assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostSavings {
    pub annual_savings_gbp: f64,
    pub annual_savings_usd: f64,
    /// Indicative installed cost as `[low, high]`.
    pub system_cost_range_gbp: (u32, u32),
    /// Years to recover the low-end system cost; `None` when it would take
    /// [`PAYBACK_REPORT_LIMIT_YEARS`] or longer.
    pub estimated_payback_years: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalImpact {
    pub co2_savings_kg_per_year: f64,
    pub stormwater_reduction_percent: f64,
}

/// Rule-based harvesting assessment, at reporting precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    /// Weighted yield/reduction score in `[0, 1]`.
    pub score: f64,
    pub category: HarvestCategory,
    pub summary: String,
    /// Ordered advice, most specific first.
    pub recommendations: Vec<String>,
    pub estimated_cost_savings: CostSavings,
    pub environmental_impact: EnvironmentalImpact,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn household_usage_is_reference_value() {
        assert!((annual_household_usage_liters() - 131_400.0).abs() < 1e-6);
    }

    #[test]
    fn rounds_to_places() {
        assert!((round_to(84.210_526, 1) - 84.2).abs() < 1e-12);
        assert!((round_to(12_680.256, 1) - 12_680.3).abs() < 1e-9);
        assert!((round_to(738.46, 0) - 738.0).abs() < f64::EPSILON);
        assert!((round_to(0.0, 2)).abs() < f64::EPSILON);
    }

    #[test]
    fn categories_are_ordered_by_tier() {
        assert!(HarvestCategory::Low < HarvestCategory::Moderate);
        assert!(HarvestCategory::Good < HarvestCategory::Excellent);
        assert_eq!(HarvestCategory::Excellent.to_string(), "excellent");
        assert_eq!(
            "moderate".parse::<HarvestCategory>().unwrap(),
            HarvestCategory::Moderate
        );
    }

    #[test]
    fn cost_tiers_follow_yield() {
        assert_eq!(system_cost_range_gbp(250.0), (2000, 5000));
        assert_eq!(system_cost_range_gbp(80.0), (1000, 3000));
        assert_eq!(system_cost_range_gbp(79.9), (500, 1500));
    }

    #[test]
    fn rounded_breakdown_uses_reporting_precision() {
        let breakdown = SavingsBreakdown {
            monthly_yield_liters: 4000.04,
            monthly_yield_gallons: 1056.688,
            household_coverage_percent: 36.529_680,
            equivalent_showers_per_year: 738.461_5,
            equivalent_toilet_flushes_per_year: 8000.0,
            annual_household_usage_liters: 131_400.0,
        }
        .rounded();
        assert!((breakdown.monthly_yield_liters - 4000.0).abs() < 1e-9);
        assert!((breakdown.monthly_yield_gallons - 1056.7).abs() < 1e-9);
        assert!((breakdown.household_coverage_percent - 36.5).abs() < 1e-9);
        assert!((breakdown.equivalent_showers_per_year - 738.0).abs() < 1e-9);
    }
}
