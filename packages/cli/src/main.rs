#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Operator CLI for the HydraX estimator.
//!
//! ```text
//! hydrax serve
//! hydrax estimate "10 Downing Street, London"
//! hydrax compute --area 100 --rainfall 600
//! hydrax sample --lat 51.5007 --lon -0.1246
//! hydrax datasets
//! hydrax smoke [--base-url http://127.0.0.1:5000]
//! ```
//!
//! Dataset and geocoder locations come from the same environment variables
//! as the server.

mod smoke;

use clap::{Parser, Subcommand};
use hydrax_geocoder::NominatimGeocoder;
use hydrax_harvest::{assess, compute_harvest};
use hydrax_server::estimate::estimate;
use hydrax_spatial::SpatialStore;
use hydrax_spatial::projection::lat_lon_to_canonical;
use hydrax_spatial_models::{CANONICAL_CRS, RAINFALL_FALLBACK_MM, RainfallSample};

#[derive(Parser)]
#[command(name = "hydrax", about = "Rainwater harvesting estimates for London rooftops")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve,
    /// Run the full estimate pipeline for one address and print the JSON
    Estimate {
        /// Street address, e.g. "10 Downing Street, London"
        address: String,
    },
    /// Run the yield model and assessment offline
    Compute {
        /// Roof area in square meters
        #[arg(long)]
        area: f64,
        /// Annual rainfall in millimeters
        #[arg(long)]
        rainfall: f64,
    },
    /// Sample rainfall and look up the building at a WGS84 location
    Sample {
        /// Latitude in degrees
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        /// Longitude in degrees
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
    },
    /// Show the configured datasets and what was loaded
    Datasets,
    /// Check a running server against sample London addresses
    Smoke {
        /// Server base URL
        #[arg(long, default_value = "http://127.0.0.1:5000")]
        base_url: String,
    },
}

/// Loads both datasets off the async runtime.
async fn load_store() -> Result<SpatialStore, tokio::task::JoinError> {
    tokio::task::spawn_blocking(|| {
        let store = SpatialStore::from_env();
        store.preload();
        store
    })
    .await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // The server sets up its own logger.
    if !matches!(cli.command, Commands::Serve) {
        pretty_env_logger::init();
    }

    match cli.command {
        Commands::Serve => {
            // actix-web needs its own system runtime; keep it off the tokio
            // worker threads.
            tokio::task::spawn_blocking(|| {
                actix_web::rt::System::new().block_on(hydrax_server::run_server())
            })
            .await??;
        }
        Commands::Estimate { address } => {
            let store = load_store().await?;
            let geocoder = NominatimGeocoder::from_env()?;
            match estimate(&store, &geocoder, Some(&address)).await {
                Ok(result) => println!("{}", serde_json::to_string_pretty(&result)?),
                Err(e) => {
                    log::debug!("Estimate failed: {e}");
                    eprintln!("{}", e.client_message());
                    std::process::exit(1);
                }
            }
        }
        Commands::Compute { area, rainfall } => {
            let metrics = compute_harvest(area, rainfall);
            let breakdown = metrics.savings_breakdown.rounded();
            let assessment = assess(
                metrics.yield_m3,
                metrics.runoff_reduction_pct,
                Some(metrics.yield_liters),
                Some(&breakdown),
            );
            let report = serde_json::json!({
                "harvest": metrics,
                "hydrax_ai_assessment": assessment,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Sample { lat, lon } => {
            let point = lat_lon_to_canonical(lat, lon)?;
            let store = load_store().await?;

            println!("Point: ({:.2}, {:.2}) {CANONICAL_CRS}", point.x, point.y);
            match store.sample_rainfall(point) {
                RainfallSample::Sampled { mm } => println!("Rainfall: {mm:.1} mm/year"),
                RainfallSample::Fallback { reason } => {
                    println!("Rainfall: {RAINFALL_FALLBACK_MM:.1} mm/year (fallback: {reason})");
                }
            }
            match store.resolve_footprint(point) {
                Some(footprint) => println!(
                    "Building: {} ({}), {:.2} m2",
                    footprint.id, footprint.source, footprint.area_m2
                ),
                None => println!("Building: no footprint contains this point"),
            }
        }
        Commands::Datasets => {
            let store = load_store().await?;
            let paths = store.paths();

            println!("Buildings: {}", paths.buildings.display());
            if store.is_mock_mode() {
                println!("  none loaded; estimates use synthetic footprints (mock mode)");
            } else {
                println!("  {} footprints", store.buildings().len());
            }

            println!("Rainfall: {}", paths.rainfall.display());
            match store.rainfall_field() {
                Some(field) => {
                    let (width, height) = field.dimensions();
                    let transform = field.transform();
                    println!("  {width}x{height} cells in {}", field.crs());
                    println!(
                        "  origin ({}, {}), cell {} x {}",
                        transform.origin_x,
                        transform.origin_y,
                        transform.pixel_width,
                        transform.pixel_height
                    );
                    match field.nodata() {
                        Some(nodata) => println!("  no-data value {nodata}"),
                        None => println!("  no no-data value"),
                    }
                }
                None => println!("  absent; every sample uses {RAINFALL_FALLBACK_MM:.1} mm/year"),
            }
        }
        Commands::Smoke { base_url } => {
            let successes = smoke::run(&base_url).await?;
            if successes < smoke::SAMPLE_ADDRESSES.len() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_negative_longitude() {
        let cli = Cli::try_parse_from(["hydrax", "sample", "--lat", "51.5007", "--lon", "-0.1246"])
            .unwrap();
        match cli.command {
            Commands::Sample { lat, lon } => {
                assert!((lat - 51.5007).abs() < 1e-12);
                assert!((lon + 0.1246).abs() < 1e-12);
            }
            _ => panic!("expected sample"),
        }
    }

    #[test]
    fn smoke_defaults_to_local_server() {
        let cli = Cli::try_parse_from(["hydrax", "smoke"]).unwrap();
        match cli.command {
            Commands::Smoke { base_url } => assert_eq!(base_url, "http://127.0.0.1:5000"),
            _ => panic!("expected smoke"),
        }
    }

    #[test]
    fn compute_requires_both_inputs() {
        assert!(Cli::try_parse_from(["hydrax", "compute", "--area", "100"]).is_err());
        assert!(
            Cli::try_parse_from(["hydrax", "compute", "--area", "100", "--rainfall", "600"])
                .is_ok()
        );
    }
}
