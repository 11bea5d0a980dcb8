//! Rule-based grading of a harvest estimate.
//!
//! The category table is evaluated top-down and the first matching row wins.
//! Every number in the result is already at reporting precision.

use hydrax_harvest_models::{
    Assessment, CO2_KG_PER_M3, COVERAGE_COVER_PCT, COVERAGE_MEET_PCT, CostSavings,
    EnvironmentalImpact, GBP_TO_USD, HarvestCategory, PAYBACK_REPORT_LIMIT_YEARS,
    PAYBACK_UNBOUNDED_YEARS, REDUCTION_HIGH_PCT, REDUCTION_MEDIUM_PCT, SCORE_REDUCTION_WEIGHT,
    SCORE_YIELD_WEIGHT, SavingsBreakdown, WATER_COST_GBP_PER_M3, YIELD_HIGH_M3, YIELD_MEDIUM_M3,
    YIELD_MODERATE_M3, round_to, system_cost_range_gbp,
};

/// Grades an annual yield and runoff reduction.
///
/// `yield_liters` only feeds the summary text and defaults to
/// `yield_m3 * 1000`. When `breakdown` is given, its household coverage may
/// add a leading recommendation.
#[must_use]
pub fn assess(
    yield_m3: f64,
    reduction_pct: f64,
    yield_liters: Option<f64>,
    breakdown: Option<&SavingsBreakdown>,
) -> Assessment {
    let score = SCORE_YIELD_WEIGHT
        .mul_add(
            (yield_m3 / YIELD_HIGH_M3).min(1.0),
            SCORE_REDUCTION_WEIGHT * (reduction_pct / REDUCTION_HIGH_PCT).min(1.0),
        )
        .clamp(0.0, 1.0);

    let category = categorize(yield_m3, reduction_pct);
    let liters = yield_liters
        .filter(|liters| liters.abs() > 0.0)
        .unwrap_or(yield_m3 * 1000.0);
    let summary = summary(category, yield_m3, liters, reduction_pct);

    let mut recommendations: Vec<String> = base_recommendations(category)
        .iter()
        .map(ToString::to_string)
        .collect();
    if let Some(advice) = breakdown.and_then(|b| coverage_recommendation(b.household_coverage_percent)) {
        recommendations.insert(0, advice);
    }

    Assessment {
        score: round_to(score, 2),
        category,
        summary,
        recommendations,
        estimated_cost_savings: cost_savings(yield_m3),
        environmental_impact: EnvironmentalImpact {
            co2_savings_kg_per_year: round_to(yield_m3 * CO2_KG_PER_M3, 2),
            stormwater_reduction_percent: round_to(reduction_pct, 1),
        },
    }
}

fn categorize(yield_m3: f64, reduction_pct: f64) -> HarvestCategory {
    if yield_m3 >= YIELD_HIGH_M3 && reduction_pct >= REDUCTION_HIGH_PCT {
        HarvestCategory::Excellent
    } else if yield_m3 >= YIELD_MEDIUM_M3 && reduction_pct >= REDUCTION_MEDIUM_PCT {
        HarvestCategory::Good
    } else if yield_m3 >= YIELD_MODERATE_M3 {
        HarvestCategory::Moderate
    } else {
        HarvestCategory::Low
    }
}

fn summary(category: HarvestCategory, yield_m3: f64, liters: f64, reduction_pct: f64) -> String {
    let liters_text = format!("{:.0} thousand liters", liters / 1000.0);
    match category {
        HarvestCategory::Excellent => format!(
            "This rooftop has excellent rainwater harvesting potential! \
             You could collect approximately {yield_m3:.1} cubic meters \
             ({liters_text}) of water annually, \
             reducing stormwater runoff by {reduction_pct:.1}%. \
             This represents significant water savings and environmental benefits."
        ),
        HarvestCategory::Good => format!(
            "This rooftop offers good potential for rainwater collection. \
             You could harvest approximately {yield_m3:.1} cubic meters \
             ({liters_text}) per year, \
             reducing runoff by {reduction_pct:.1}%. \
             A rainwater system here would provide meaningful water savings."
        ),
        HarvestCategory::Moderate => format!(
            "This rooftop provides moderate harvesting potential. \
             You could collect around {yield_m3:.1} cubic meters \
             ({liters_text}) annually. \
             While not ideal for full household use, it's great for specific applications."
        ),
        HarvestCategory::Low => format!(
            "This rooftop has limited rainwater harvesting potential. \
             Annual collection would be around {yield_m3:.1} cubic meters \
             ({liters_text}). \
             Small-scale collection systems could still provide some benefits."
        ),
    }
}

const fn base_recommendations(category: HarvestCategory) -> &'static [&'static str] {
    match category {
        HarvestCategory::Excellent => &[
            "Install a comprehensive rainwater harvesting system with storage tanks",
            "Consider connecting to toilet flushing and garden irrigation systems",
            "Explore potential for greywater recycling",
            "Look into local council grants or incentives for sustainable water systems",
        ],
        HarvestCategory::Good => &[
            "Install a medium-capacity rainwater harvesting system",
            "Use collected water for garden irrigation and outdoor cleaning",
            "Consider connecting to toilet flushing if feasible",
            "Start with a simple barrel system and expand if needed",
        ],
        HarvestCategory::Moderate => &[
            "Install a small to medium rainwater collection system",
            "Focus on garden irrigation and outdoor water use",
            "Consider a simple barrel or small tank system",
            "Use collected water to reduce mains water consumption for non-potable uses",
        ],
        HarvestCategory::Low => &[
            "Consider a simple rain barrel for garden use",
            "Focus on water-efficient landscaping to maximize impact",
            "Even small systems help reduce stormwater runoff",
            "Combine with other water-saving measures for best results",
        ],
    }
}

fn coverage_recommendation(coverage: f64) -> Option<String> {
    if coverage >= COVERAGE_MEET_PCT {
        Some(format!(
            "Your system could meet {coverage:.0}% of a typical household's water needs!"
        ))
    } else if coverage >= COVERAGE_COVER_PCT {
        Some(format!(
            "Your system could cover {coverage:.0}% of household water needs, \
             especially for non-potable uses like toilet flushing and gardening."
        ))
    } else {
        None
    }
}

fn cost_savings(yield_m3: f64) -> CostSavings {
    let annual_savings_gbp = yield_m3 * WATER_COST_GBP_PER_M3;
    let system_cost_range_gbp = system_cost_range_gbp(yield_m3);
    let payback_years = if annual_savings_gbp > 0.0 {
        f64::from(system_cost_range_gbp.0) / annual_savings_gbp
    } else {
        PAYBACK_UNBOUNDED_YEARS
    };

    CostSavings {
        annual_savings_gbp: round_to(annual_savings_gbp, 2),
        annual_savings_usd: round_to(annual_savings_gbp * GBP_TO_USD, 2),
        system_cost_range_gbp,
        estimated_payback_years: (payback_years < PAYBACK_REPORT_LIMIT_YEARS)
            .then(|| round_to(payback_years, 1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute_harvest;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn moderate_roof_under_fallback_rainfall() {
        let metrics = compute_harvest(100.0, 600.0);
        let breakdown = metrics.savings_breakdown.rounded();
        let assessment = assess(
            metrics.yield_m3,
            metrics.runoff_reduction_pct,
            Some(metrics.yield_liters),
            Some(&breakdown),
        );

        assert_eq!(assessment.category, HarvestCategory::Moderate);
        assert!(approx(assessment.score, 0.54));
        assert_eq!(
            assessment.summary,
            "This rooftop provides moderate harvesting potential. You could collect around \
             48.0 cubic meters (48 thousand liters) annually. While not ideal for full \
             household use, it's great for specific applications."
        );
        assert_eq!(assessment.recommendations.len(), 5);
        assert!(assessment.recommendations[0].starts_with("Your system could cover "));
        assert_eq!(
            assessment.recommendations[1],
            "Install a small to medium rainwater collection system"
        );

        let cost = &assessment.estimated_cost_savings;
        assert!(approx(cost.annual_savings_gbp, 72.0));
        assert!(approx(cost.annual_savings_usd, 91.44));
        assert_eq!(cost.system_cost_range_gbp, (500, 1500));
        assert_eq!(cost.estimated_payback_years, Some(6.9));

        assert!(approx(assessment.environmental_impact.co2_savings_kg_per_year, 16.51));
        assert!(approx(assessment.environmental_impact.stormwater_reduction_percent, 84.2));
    }

    #[test]
    fn excellent_summary_and_meet_recommendation() {
        let breakdown = SavingsBreakdown {
            monthly_yield_liters: 20_000.0,
            monthly_yield_gallons: 5283.4,
            household_coverage_percent: 100.0,
            equivalent_showers_per_year: 3692.0,
            equivalent_toilet_flushes_per_year: 40_000.0,
            annual_household_usage_liters: 131_400.0,
        };
        let assessment = assess(240.0, 84.2, Some(240_000.0), Some(&breakdown));

        assert_eq!(assessment.category, HarvestCategory::Excellent);
        assert!(approx(assessment.score, 1.0));
        assert_eq!(
            assessment.summary,
            "This rooftop has excellent rainwater harvesting potential! You could collect \
             approximately 240.0 cubic meters (240 thousand liters) of water annually, \
             reducing stormwater runoff by 84.2%. This represents significant water savings \
             and environmental benefits."
        );
        assert_eq!(
            assessment.recommendations[0],
            "Your system could meet 100% of a typical household's water needs!"
        );
        assert_eq!(assessment.estimated_cost_savings.system_cost_range_gbp, (2000, 5000));
        assert_eq!(assessment.estimated_cost_savings.estimated_payback_years, Some(5.6));
    }

    #[test]
    fn good_tier_requires_medium_reduction() {
        assert_eq!(categorize(120.0, 45.0), HarvestCategory::Good);
        assert_eq!(categorize(120.0, 39.9), HarvestCategory::Moderate);
        assert_eq!(categorize(250.0, 65.0), HarvestCategory::Good);
        assert_eq!(categorize(19.9, 90.0), HarvestCategory::Low);
    }

    #[test]
    fn low_coverage_adds_no_recommendation() {
        let breakdown = SavingsBreakdown {
            monthly_yield_liters: 833.3,
            monthly_yield_gallons: 220.1,
            household_coverage_percent: 7.6,
            equivalent_showers_per_year: 154.0,
            equivalent_toilet_flushes_per_year: 1667.0,
            annual_household_usage_liters: 131_400.0,
        };
        let assessment = assess(10.0, 84.2, None, Some(&breakdown));
        assert_eq!(assessment.category, HarvestCategory::Low);
        assert_eq!(assessment.recommendations.len(), 4);
        assert!(assessment.summary.contains("10.0 cubic meters (10 thousand liters)"));
    }

    #[test]
    fn long_payback_is_unreported() {
        // 500 GBP at 1.50/m3 needs 6.67 m3 a year to pay back within 50 years.
        let assessment = assess(6.0, 84.2, None, None);
        assert_eq!(assessment.estimated_cost_savings.estimated_payback_years, None);

        let assessment = assess(0.0, 0.0, None, None);
        assert_eq!(assessment.estimated_cost_savings.estimated_payback_years, None);
        assert!(assessment.score.abs() < f64::EPSILON);
        assert!(assessment.summary.contains("0.0 cubic meters (0 thousand liters)"));
    }

    #[test]
    fn score_and_tier_never_drop_as_yield_grows() {
        for reduction in [0.0, 30.0, 45.0, 84.2, 120.0] {
            let mut previous = assess(0.0, reduction, None, None);
            for step in 1..=200 {
                let current = assess(f64::from(step) * 2.5, reduction, None, None);
                assert!(current.score >= previous.score);
                assert!(current.category >= previous.category);
                assert!((0.0..=1.0).contains(&current.score));
                previous = current;
            }
        }
    }

    #[test]
    fn is_deterministic() {
        assert_eq!(assess(97.3, 84.2, None, None), assess(97.3, 84.2, None, None));
    }
}
