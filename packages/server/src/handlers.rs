//! HTTP handler functions for the HydraX API.

use actix_web::{HttpResponse, web};
use hydrax_server_models::{ApiHealth, EstimateQueryParams};

use crate::AppState;
use crate::estimate::{self, EstimateError};

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth::ok())
}

/// `GET /api/estimate?address=...`
///
/// Geocodes the address and returns the harvesting estimate for the
/// building at that location.
pub async fn estimate(
    state: web::Data<AppState>,
    params: web::Query<EstimateQueryParams>,
) -> Result<HttpResponse, EstimateError> {
    let result = estimate::estimate(
        &state.store,
        state.geocoder.as_ref(),
        params.address.as_deref(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(result))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use hydrax_server_models::{ApiError, ApiEstimate};
    use hydrax_spatial::SpatialStore;
    use hydrax_spatial::projection::lat_lon_to_canonical;
    use hydrax_spatial_models::FootprintSource;

    use super::*;
    use crate::configure;
    use crate::test_support::{StubGeocoder, disk_footprint};

    const DOWNING_STREET: (f64, f64) = (51.503_363_5, -0.127_624_8);

    fn state(store: SpatialStore, geocoder: StubGeocoder) -> web::Data<AppState> {
        web::Data::new(AppState {
            store: Arc::new(store),
            geocoder: Arc::new(geocoder),
        })
    }

    #[actix_web::test]
    async fn health_reports_ok() {
        let app = test::init_service(
            App::new()
                .app_data(state(SpatialStore::from_parts(Vec::new(), None), StubGeocoder::miss()))
                .configure(configure),
        )
        .await;
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: ApiHealth = test::read_body_json(resp).await;
        assert_eq!(body, ApiHealth::ok());
    }

    #[actix_web::test]
    async fn missing_address_is_bad_request() {
        let app = test::init_service(
            App::new()
                .app_data(state(
                    SpatialStore::from_parts(Vec::new(), None),
                    StubGeocoder::panicking(),
                ))
                .configure(configure),
        )
        .await;
        for uri in ["/api/estimate", "/api/estimate?address=", "/api/estimate?address=%20%20"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
            let body: ApiError = test::read_body_json(resp).await;
            assert_eq!(body.error, "Missing 'address' query parameter");
        }
    }

    #[actix_web::test]
    async fn unknown_address_is_not_found() {
        let app = test::init_service(
            App::new()
                .app_data(state(SpatialStore::from_parts(Vec::new(), None), StubGeocoder::miss()))
                .configure(configure),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/api/estimate?address=Nowhere%20Lane")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: ApiError = test::read_body_json(resp).await;
        assert_eq!(body.error, "Address not found by geocoder");
    }

    #[actix_web::test]
    async fn mock_mode_returns_synthetic_building() {
        let app = test::init_service(
            App::new()
                .app_data(state(
                    SpatialStore::from_parts(Vec::new(), None),
                    StubGeocoder::at(DOWNING_STREET),
                ))
                .configure(configure),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/api/estimate?address=10%20Downing%20Street%2C%20London")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: ApiEstimate = test::read_body_json(resp).await;
        assert_eq!(body.input_address, "10 Downing Street, London");
        assert!((body.geocoded_lat - DOWNING_STREET.0).abs() < 1e-12);
        assert_eq!(body.building_info.building_id, 0);
        assert_eq!(body.building_info.source, FootprintSource::Synthetic);
        assert!((body.rainfall_data.annual_rainfall_mm - 600.0).abs() < 1e-9);
        assert!(body.rainfall_data.fallback_reason.is_some());
    }

    #[actix_web::test]
    async fn dataset_building_is_used_when_loaded() {
        let point = lat_lon_to_canonical(DOWNING_STREET.0, DOWNING_STREET.1).unwrap();
        let store = SpatialStore::from_parts(vec![disk_footprint(point.x, point.y, 42)], None);
        let app = test::init_service(
            App::new()
                .app_data(state(store, StubGeocoder::at(DOWNING_STREET)))
                .configure(configure),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/api/estimate?address=10%20Downing%20Street")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: ApiEstimate = test::read_body_json(resp).await;
        assert_eq!(body.building_info.building_id, 42);
        assert_eq!(body.building_info.source, FootprintSource::Dataset);
    }

    #[actix_web::test]
    async fn point_outside_dataset_is_not_found() {
        let store = SpatialStore::from_parts(vec![disk_footprint(0.0, 0.0, 1)], None);
        let app = test::init_service(
            App::new()
                .app_data(state(store, StubGeocoder::at(DOWNING_STREET)))
                .configure(configure),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/api/estimate?address=10%20Downing%20Street")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: ApiError = test::read_body_json(resp).await;
        assert_eq!(body.error, "No building footprint found at that location");
    }
}
