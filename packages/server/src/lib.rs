#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for HydraX rainwater harvesting estimates.
//!
//! Serves `GET /api/health` and `GET /api/estimate?address=...`. The
//! building and rainfall datasets are loaded once at startup into a shared
//! [`SpatialStore`]; each estimate request makes one geocoder call and
//! otherwise only reads that store.

pub mod estimate;
mod handlers;
#[cfg(test)]
mod test_support;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use hydrax_geocoder::{Geocode, NominatimGeocoder};
use hydrax_spatial::SpatialStore;

/// Port used when `PORT` is unset or invalid.
pub const DEFAULT_PORT: u16 = 5000;

/// Shared application state.
pub struct AppState {
    /// Building index and rainfall raster, read-only after startup.
    pub store: Arc<SpatialStore>,
    /// Address resolver.
    pub geocoder: Arc<dyn Geocode>,
}

/// Listen address, read from `BIND_ADDR` and `PORT`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        Self { bind_addr, port }
    }
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/estimate", web::get().to(handlers::estimate)),
    );
}

/// Starts the HydraX API server.
///
/// Initializes logging, loads both datasets from the configured paths,
/// builds the Nominatim client, and serves until shutdown. This is a
/// regular async function; the caller provides the runtime (e.g. via
/// `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the geocoder configuration is
/// unusable, or the HTTP server fails to bind or encounters a runtime
/// error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    log::info!("Loading spatial datasets...");
    let store = SpatialStore::from_env();
    store.preload();
    if store.is_mock_mode() {
        log::warn!("Building dataset is empty; serving synthetic footprints (mock mode)");
    }

    let geocoder = NominatimGeocoder::from_env().map_err(std::io::Error::other)?;
    log::info!("Geocoding via {}", geocoder.config().base_url);

    let state = AppState {
        store: Arc::new(store),
        geocoder: Arc::new(geocoder),
    };

    serve(state, &ServerConfig::from_env()).await
}

/// Serves the API over an already-built state.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn serve(state: AppState, config: &ServerConfig) -> std::io::Result<()> {
    let state = web::Data::new(state);

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((config.bind_addr.as_str(), config.port))?
    .run()
    .await
}
