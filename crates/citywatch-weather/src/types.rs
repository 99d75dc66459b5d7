use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::WeatherError;

/// Geographic coordinate.
///
/// Cache identity is the exact float pair, so two coordinates share a cache
/// entry only when both components compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check that both components are finite and within geographic bounds.
    pub fn validate(&self) -> Result<(), WeatherError> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(WeatherError::InvalidInput(format!(
                "coordinate must be finite, got ({}, {})",
                self.latitude, self.longitude
            )));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(WeatherError::InvalidInput(format!(
                "latitude {} out of range",
                self.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(WeatherError::InvalidInput(format!(
                "longitude {} out of range",
                self.longitude
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

/// Result of resolving a city name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    #[serde(flatten)]
    pub coordinate: Coordinate,
    pub country_code: Option<String>,
    pub name: Option<String>,
    /// First-level administrative region (state, province)
    pub admin1: Option<String>,
}

/// Normalized current conditions for one coordinate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub wind_direction_deg: f64,
    pub visibility_meters: f64,
    pub description: String,
    pub icon: String,
}

const COMPASS_POINTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

impl WeatherSnapshot {
    /// 8-point compass label for the wind direction (e.g. "SW")
    pub fn compass_direction(&self) -> &'static str {
        let sector = (self.wind_direction_deg / 45.0).round().rem_euclid(8.0) as usize;
        COMPASS_POINTS[sector % COMPASS_POINTS.len()]
    }
}

/// One day of a daily forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastDay {
    /// UTC midnight of the forecast date, in seconds
    pub timestamp_seconds: i64,
    pub temp_max: f64,
    pub temp_min: f64,
    pub description: String,
    pub icon: String,
}

/// Forecast for a city looked up by name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityForecast {
    pub place: Place,
    pub forecast: Vec<ForecastDay>,
}

/// One city in a batch request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityQuery {
    /// Opaque correlation token, echoed back unchanged
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

impl CityQuery {
    /// Coordinates supplied by the caller, if both are usable.
    ///
    /// Zero and NaN count as missing, so such queries go through geocoding.
    pub fn known_coordinate(&self) -> Option<Coordinate> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) if is_set(lat) && is_set(lon) => Some(Coordinate::new(lat, lon)),
            _ => None,
        }
    }
}

fn is_set(value: f64) -> bool {
    value != 0.0 && !value.is_nan()
}

/// Per-city outcome inside the batch enricher
#[derive(Debug)]
pub enum CityOutcome {
    Ok(Arc<WeatherSnapshot>),
    Failed(WeatherError),
}

impl CityOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, CityOutcome::Ok(_))
    }

    pub fn snapshot(&self) -> Option<&WeatherSnapshot> {
        match self {
            CityOutcome::Ok(snapshot) => Some(snapshot),
            CityOutcome::Failed(_) => None,
        }
    }
}

impl From<Result<Arc<WeatherSnapshot>, WeatherError>> for CityOutcome {
    fn from(result: Result<Arc<WeatherSnapshot>, WeatherError>) -> Self {
        match result {
            Ok(snapshot) => CityOutcome::Ok(snapshot),
            Err(e) => CityOutcome::Failed(e),
        }
    }
}

/// Batch result for one query, with failure detail kept
#[derive(Debug)]
pub struct BatchItem {
    pub id: String,
    pub outcome: CityOutcome,
}

/// Batch result as exposed to callers: `data` is null when the city failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityWeatherResult {
    pub id: String,
    pub data: Option<WeatherSnapshot>,
}

impl From<BatchItem> for CityWeatherResult {
    fn from(item: BatchItem) -> Self {
        let data = match item.outcome {
            CityOutcome::Ok(snapshot) => Some(Arc::unwrap_or_clone(snapshot)),
            CityOutcome::Failed(_) => None,
        };
        Self { id: item.id, data }
    }
}
