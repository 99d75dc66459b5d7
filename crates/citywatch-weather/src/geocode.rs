//! Forward geocoding: convert a city name to coordinates.
//! Uses the Open-Meteo geocoding API - free, no API key required.

use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::error::WeatherError;
use crate::types::{Coordinate, Place};

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Option<Vec<GeocodingResult>>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    latitude: f64,
    longitude: f64,
    country_code: Option<String>,
    name: Option<String>,
    admin1: Option<String>,
}

impl From<GeocodingResult> for Place {
    fn from(r: GeocodingResult) -> Self {
        Place {
            coordinate: Coordinate::new(r.latitude, r.longitude),
            country_code: r.country_code,
            name: r.name,
            admin1: r.admin1,
        }
    }
}

/// Resolves city names through the geocoding provider. Nothing is cached.
#[derive(Debug, Clone)]
pub struct Geocoder {
    client: Client,
    base_url: String,
}

impl Geocoder {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }

    /// Resolve a city name to the provider's best match.
    ///
    /// Returns `NotFound` when the provider has no match; transport and
    /// payload problems are `Upstream`.
    #[instrument(skip(self), level = "debug")]
    pub async fn resolve(&self, city_name: &str) -> Result<Place, WeatherError> {
        let name = city_name.trim();
        if name.is_empty() {
            return Err(WeatherError::InvalidInput(
                "city name must not be empty".to_string(),
            ));
        }

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("name", name), ("count", "1")])
            .send()
            .await?
            .error_for_status()?;

        let body = response.bytes().await?;
        let parsed: GeocodingResponse = serde_json::from_slice(&body)?;

        let place = parsed
            .results
            .and_then(|results| results.into_iter().next())
            .map(Place::from)
            .ok_or_else(|| WeatherError::NotFound(name.to_string()))?;

        tracing::debug!(
            "Geocoded {} to {} ({})",
            name,
            place.coordinate,
            place.country_code.as_deref().unwrap_or("??")
        );
        Ok(place)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use citywatch_core::NetworkError;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn geocoder(server: &MockServer) -> Geocoder {
        Geocoder::new(Client::new(), &server.uri())
    }

    #[tokio::test]
    async fn test_resolve_first_match() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("name", "Paris"))
            .and(query_param("count", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [
                    {
                        "name": "Paris",
                        "latitude": 48.85341,
                        "longitude": 2.3488,
                        "country_code": "FR",
                        "admin1": "Île-de-France"
                    }
                ]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let place = geocoder(&mock_server).resolve("Paris").await.unwrap();

        assert_eq!(place.coordinate, Coordinate::new(48.85341, 2.3488));
        assert_eq!(place.country_code.as_deref(), Some("FR"));
        assert_eq!(place.admin1.as_deref(), Some("Île-de-France"));
    }

    #[tokio::test]
    async fn test_resolve_trims_name() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("name", "Oslo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{"latitude": 59.91, "longitude": 10.75}]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let place = geocoder(&mock_server).resolve("  Oslo ").await.unwrap();
        assert_eq!(place.country_code, None);
    }

    #[tokio::test]
    async fn test_zero_matches_is_not_found() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"generationtime_ms": 0.3})),
            )
            .mount(&mock_server)
            .await;

        let result = geocoder(&mock_server).resolve("Zzyzxville").await;
        assert!(matches!(result, Err(WeatherError::NotFound(ref n)) if n == "Zzyzxville"));
    }

    #[tokio::test]
    async fn test_empty_results_array_is_not_found() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"results": []})),
            )
            .mount(&mock_server)
            .await;

        let result = geocoder(&mock_server).resolve("Atlantis").await;
        assert!(matches!(result, Err(WeatherError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_blank_name_fails_before_network() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let result = geocoder(&mock_server).resolve("   ").await;
        assert!(matches!(result, Err(WeatherError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_server_error_is_upstream() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let result = geocoder(&mock_server).resolve("Paris").await;
        assert!(matches!(
            result,
            Err(WeatherError::Upstream(NetworkError::ServerError { status: 503, .. }))
        ));
    }

    #[tokio::test]
    async fn test_missing_fields_is_upstream() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{"name": "Paris", "longitude": 2.35}]
            })))
            .mount(&mock_server)
            .await;

        let result = geocoder(&mock_server).resolve("Paris").await;
        assert!(matches!(
            result,
            Err(WeatherError::Upstream(NetworkError::InvalidResponse(_)))
        ));
    }
}
