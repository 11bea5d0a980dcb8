//! Nominatim / OpenStreetMap search client.
//!
//! Free-form search constrained to the configured city and countries.
//! The public instance allows roughly one request per second; callers here
//! make one request per estimate and never retry.
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use crate::config::GeocoderConfig;
use crate::{GeocodeError, GeocodedAddress};

/// Builds the free-form query, appending the configured city unless one of
/// the address's comma-separated parts already names it.
///
/// Nominatim rejects `q` combined with structured parameters such as
/// `city`, so the city constraint travels inside the query text.
#[must_use]
pub fn query_text(address: &str, city: &str) -> String {
    let address = address.trim();
    let city = city.trim();
    if city.is_empty()
        || address
            .split(',')
            .any(|part| part.trim().eq_ignore_ascii_case(city))
    {
        address.to_string()
    } else {
        format!("{address}, {city}")
    }
}

/// Geocodes a single address.
///
/// # Errors
///
/// Returns [`GeocodeError`] if the HTTP request fails, the service answers
/// with an error status, or the response cannot be parsed.
pub async fn geocode_single(
    client: &reqwest::Client,
    config: &GeocoderConfig,
    address: &str,
) -> Result<Option<GeocodedAddress>, GeocodeError> {
    let query = query_text(address, &config.city);
    let limit = config.limit.to_string();

    let resp = client
        .get(&config.base_url)
        .query(&[
            ("q", query.as_str()),
            ("format", "json"),
            ("addressdetails", "1"),
            ("limit", limit.as_str()),
            ("countrycodes", config.country_codes.as_str()),
        ])
        .send()
        .await?;

    if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(GeocodeError::RateLimited);
    }

    let body: serde_json::Value = resp.error_for_status()?.json().await?;
    parse_response(&body)
}

/// Parses a Nominatim search response, taking the first result.
///
/// # Errors
///
/// Returns [`GeocodeError::Parse`] if the body is not a result array or the
/// first result has no usable coordinates.
pub fn parse_response(body: &serde_json::Value) -> Result<Option<GeocodedAddress>, GeocodeError> {
    let results = body.as_array().ok_or_else(|| GeocodeError::Parse {
        message: "Nominatim response is not an array".to_string(),
    })?;

    let Some(first) = results.first() else {
        return Ok(None);
    };

    let coordinate = |key: &str| {
        let value = &first[key];
        value
            .as_str()
            .and_then(|s| s.trim().parse::<f64>().ok())
            .or_else(|| value.as_f64())
            .filter(|v| v.is_finite())
            .ok_or_else(|| GeocodeError::Parse {
                message: format!("Missing {key} in Nominatim response"),
            })
    };

    Ok(Some(GeocodedAddress {
        latitude: coordinate("lat")?,
        longitude: coordinate("lon")?,
        matched_address: first["display_name"].as_str().map(String::from),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nominatim_result() {
        let body = serde_json::json!([{
            "lat": "51.5033635",
            "lon": "-0.1276248",
            "display_name": "10 Downing Street, Westminster, London, SW1A 2AA, United Kingdom"
        }]);
        let result = parse_response(&body).unwrap().unwrap();
        assert!((result.latitude - 51.503_363_5).abs() < 1e-9);
        assert!((result.longitude - -0.127_624_8).abs() < 1e-9);
        assert!(result.matched_address.unwrap().starts_with("10 Downing Street"));
    }

    #[test]
    fn accepts_numeric_coordinates() {
        let body = serde_json::json!([{ "lat": 51.5, "lon": -0.12 }]);
        let result = parse_response(&body).unwrap().unwrap();
        assert!((result.latitude - 51.5).abs() < f64::EPSILON);
        assert!(result.matched_address.is_none());
    }

    #[test]
    fn parses_nominatim_empty() {
        let body = serde_json::json!([]);
        assert!(parse_response(&body).unwrap().is_none());
    }

    #[test]
    fn rejects_malformed_responses() {
        assert!(parse_response(&serde_json::json!({"error": "bad"})).is_err());
        assert!(parse_response(&serde_json::json!([{ "lat": "north", "lon": "0" }])).is_err());
        assert!(parse_response(&serde_json::json!([{ "lat": "51.5" }])).is_err());
    }

    #[test]
    fn query_is_constrained_to_city() {
        assert_eq!(
            query_text("10 Downing Street", "London"),
            "10 Downing Street, London"
        );
        assert_eq!(
            query_text(" Buckingham Palace, london ", "London"),
            "Buckingham Palace, london"
        );
        assert_eq!(query_text("Tower Bridge", ""), "Tower Bridge");
    }

    #[test]
    fn city_must_be_a_whole_address_part() {
        assert_eq!(
            query_text("12 Londonderry Road", "London"),
            "12 Londonderry Road, London"
        );
        assert_eq!(
            query_text("Flat 2, London Road, Croydon", "London"),
            "Flat 2, London Road, Croydon, London"
        );
        assert_eq!(
            query_text("221B Baker Street,LONDON", "London"),
            "221B Baker Street,LONDON"
        );
    }
}
