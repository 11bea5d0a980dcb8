#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Standalone HydraX API server.
//!
//! Configured through `BIND_ADDR`, `PORT`, `HYDRAX_DATA_DIR`,
//! `HYDRAX_BUILDINGS_PATH`, `HYDRAX_RAINFALL_PATH` and
//! `HYDRAX_GEOCODER_CONFIG`.

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    hydrax_server::run_server().await
}
