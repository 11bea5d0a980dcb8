//! End-to-end check against a running server.

use std::time::Duration;

use hydrax_server_models::{ApiEstimate, ApiHealth};

/// Well-known London addresses exercised by `hydrax smoke`.
pub const SAMPLE_ADDRESSES: &[&str] = &[
    "10 Downing Street, London",
    "Tower Bridge, London",
    "Buckingham Palace, London",
    "221B Baker Street, London",
];

/// Joins `base_url` and an absolute API path without doubling slashes.
fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{path}", base_url.trim_end_matches('/'))
}

/// Checks `/api/health`, then requests an estimate for every sample
/// address. Returns how many estimates succeeded.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built or the health check
/// fails.
pub async fn run(base_url: &str) -> Result<usize, Box<dyn std::error::Error>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;

    println!("Checking {}...", endpoint(base_url, "/api/health"));
    let health: ApiHealth = client
        .get(endpoint(base_url, "/api/health"))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    println!("  status: {}", health.status);

    let mut successes = 0;
    for address in SAMPLE_ADDRESSES {
        println!();
        println!("Estimating '{address}'...");
        let resp = match client
            .get(endpoint(base_url, "/api/estimate"))
            .query(&[("address", address)])
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                println!("  request failed: {e}");
                continue;
            }
        };

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            println!("  {status}: {}", body.trim());
            continue;
        }

        match resp.json::<ApiEstimate>().await {
            Ok(estimate) => {
                successes += 1;
                print_summary(&estimate);
            }
            Err(e) => println!("  unreadable response: {e}"),
        }
    }

    println!();
    println!(
        "Estimates completed: {successes}/{} successful",
        SAMPLE_ADDRESSES.len()
    );
    Ok(successes)
}

fn print_summary(estimate: &ApiEstimate) {
    let assessment = &estimate.hydrax_ai_assessment;
    println!(
        "  building {} ({}), roof {:.2} m2",
        estimate.building_info.building_id,
        estimate.building_info.source,
        estimate.building_info.roof_area_m2
    );
    println!(
        "  rainfall {:.1} mm, yield {:.0} liters/year",
        estimate.rainfall_data.annual_rainfall_mm,
        estimate.water_collection.estimated_annual_yield_liters
    );
    println!(
        "  {} (score {:.2}), saves GBP {:.2}/year",
        assessment.category, assessment.score, assessment.estimated_cost_savings.annual_savings_gbp
    );
}
