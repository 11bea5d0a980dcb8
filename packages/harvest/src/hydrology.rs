//! Roof yield and runoff model.

use hydrax_harvest_models::{
    CAPTURE_FACTOR, HarvestMetrics, LITERS_PER_FLUSH, LITERS_PER_SHOWER, RUNOFF_COEFF,
    SavingsBreakdown, US_GALLONS_PER_M3, annual_household_usage_liters,
};

/// Estimates annual harvest for a roof of `area_m2` under `rainfall_mm` of
/// annual rain.
///
/// Negative or NaN inputs are treated as zero. Results are at full
/// precision; round with [`SavingsBreakdown::rounded`] for reporting.
#[must_use]
pub fn compute_harvest(area_m2: f64, rainfall_mm: f64) -> HarvestMetrics {
    let area_m2 = area_m2.max(0.0);
    let rainfall_mm = rainfall_mm.max(0.0);
    let rainfall_m = rainfall_mm / 1000.0;

    let yield_m3 = area_m2 * rainfall_m * CAPTURE_FACTOR;
    let yield_liters = yield_m3 * 1000.0;
    let yield_gallons = yield_m3 * US_GALLONS_PER_M3;

    let baseline_runoff_m3 = area_m2 * rainfall_m * RUNOFF_COEFF;
    let runoff_reduction_pct = if baseline_runoff_m3 > 0.0 {
        100.0 * yield_m3 / baseline_runoff_m3
    } else {
        0.0
    };

    let usage = annual_household_usage_liters();

    HarvestMetrics {
        roof_area_m2: area_m2,
        rainfall_mm,
        yield_m3,
        yield_liters,
        yield_gallons,
        runoff_reduction_pct,
        savings_breakdown: SavingsBreakdown {
            monthly_yield_liters: yield_liters / 12.0,
            monthly_yield_gallons: yield_gallons / 12.0,
            household_coverage_percent: (100.0 * yield_liters / usage).clamp(0.0, 100.0),
            equivalent_showers_per_year: yield_liters / LITERS_PER_SHOWER,
            equivalent_toilet_flushes_per_year: yield_liters / LITERS_PER_FLUSH,
            annual_household_usage_liters: usage,
        },
    }
}
