//! Open-Meteo weather provider: current conditions and daily forecasts.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use citywatch_core::MAX_FORECAST_DAYS;
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::cache::{Clock, SnapshotCache};
use crate::codes;
use crate::error::WeatherError;
use crate::types::{Coordinate, ForecastDay, WeatherSnapshot};

const HOURLY_FIELDS: &str = "relativehumidity_2m,apparent_temperature,visibility";
const DAILY_FIELDS: &str = "temperature_2m_max,temperature_2m_min,weathercode";
const DEFAULT_VISIBILITY_METERS: f64 = 10_000.0;

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    current_weather: Option<CurrentWeatherRaw>,
    #[serde(default)]
    hourly: Option<HourlyRaw>,
    #[serde(default)]
    utc_offset_seconds: i64,
}

#[derive(Debug, Deserialize)]
struct CurrentWeatherRaw {
    temperature: f64,
    windspeed: f64,
    winddirection: f64,
    weathercode: i32,
}

#[derive(Debug, Default, Deserialize)]
struct HourlyRaw {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    relativehumidity_2m: Vec<Option<f64>>,
    #[serde(default)]
    apparent_temperature: Vec<Option<f64>>,
    #[serde(default)]
    visibility: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    daily: DailyRaw,
}

#[derive(Debug, Deserialize)]
struct DailyRaw {
    time: Vec<String>,
    temperature_2m_max: Vec<f64>,
    temperature_2m_min: Vec<f64>,
    weathercode: Vec<i32>,
}

/// Index of the hourly entry for the current local hour, or 0 if none matches.
///
/// Timestamps are the provider's local ISO times (`2024-06-01T13:00`).
/// Entries that fail to parse never match.
pub fn current_hour_index(now_local: NaiveDateTime, hourly_times: &[String]) -> usize {
    hourly_times
        .iter()
        .position(|t| {
            parse_hour(t).is_some_and(|dt| {
                dt.date() == now_local.date() && dt.hour() == now_local.hour()
            })
        })
        .unwrap_or(0)
}

fn parse_hour(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

/// Wall-clock time at the location, given the provider's UTC offset
fn local_now(now_millis: i64, utc_offset_seconds: i64) -> Option<NaiveDateTime> {
    DateTime::<Utc>::from_timestamp_millis(now_millis)?
        .naive_utc()
        .checked_add_signed(Duration::try_seconds(utc_offset_seconds)?)
}

fn value_at(values: &[Option<f64>], idx: usize) -> Option<f64> {
    values.get(idx).copied().flatten()
}

fn day_start_seconds(date: &str) -> Result<i64, WeatherError> {
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|e| WeatherError::invalid_response(format!("bad forecast date {date}: {e}")))?;
    let midnight = day
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| WeatherError::invalid_response(format!("bad forecast date {date}")))?;
    Ok(Utc.from_utc_datetime(&midnight).timestamp())
}

/// Fetches current conditions (through the cache) and daily forecasts
#[derive(Clone)]
pub struct WeatherProvider {
    client: Client,
    base_url: String,
    cache: Arc<dyn SnapshotCache>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for WeatherProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherProvider")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl WeatherProvider {
    pub fn new(
        client: Client,
        base_url: &str,
        cache: Arc<dyn SnapshotCache>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            cache,
            clock,
        }
    }

    /// Current conditions for a coordinate.
    ///
    /// Served from cache while fresh; otherwise fetched, normalized and
    /// cached before returning.
    #[instrument(skip(self), level = "debug")]
    pub async fn current(&self, coord: Coordinate) -> Result<Arc<WeatherSnapshot>, WeatherError> {
        coord.validate()?;

        if let Some(snapshot) = self.cache.get(&coord) {
            tracing::debug!("Weather cache hit for {}", coord);
            return Ok(snapshot);
        }

        tracing::info!("Fetching current weather for {}", coord);
        let params = [
            ("latitude", coord.latitude.to_string()),
            ("longitude", coord.longitude.to_string()),
            ("current_weather", "true".to_string()),
            ("hourly", HOURLY_FIELDS.to_string()),
            ("timezone", "auto".to_string()),
            ("forecast_days", "1".to_string()),
        ];
        let body = self.get_json(&params).await?;
        let parsed: CurrentResponse = serde_json::from_slice(&body)?;

        let snapshot = Arc::new(self.normalize_current(parsed)?);
        self.cache.put(&coord, Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Daily forecast for `days` days, one entry per date the provider returns.
    #[instrument(skip(self), level = "debug")]
    pub async fn forecast(
        &self,
        coord: Coordinate,
        days: u32,
    ) -> Result<Vec<ForecastDay>, WeatherError> {
        coord.validate()?;
        if days == 0 || days > MAX_FORECAST_DAYS {
            return Err(WeatherError::InvalidInput(format!(
                "forecast days must be between 1 and {MAX_FORECAST_DAYS}, got {days}"
            )));
        }

        tracing::info!("Fetching {}-day forecast for {}", days, coord);
        let params = [
            ("latitude", coord.latitude.to_string()),
            ("longitude", coord.longitude.to_string()),
            ("daily", DAILY_FIELDS.to_string()),
            ("timezone", "auto".to_string()),
            ("forecast_days", days.to_string()),
        ];
        let body = self.get_json(&params).await?;
        let parsed: ForecastResponse = serde_json::from_slice(&body)?;

        normalize_forecast(parsed.daily)
    }

    async fn get_json(&self, params: &[(&str, String)]) -> Result<Vec<u8>, WeatherError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(params)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.bytes().await?.to_vec())
    }

    fn normalize_current(&self, raw: CurrentResponse) -> Result<WeatherSnapshot, WeatherError> {
        let current = raw
            .current_weather
            .ok_or_else(|| WeatherError::invalid_response("missing current_weather"))?;

        // An absent or null hourly block degrades to the fallbacks below.
        let hourly = raw.hourly.unwrap_or_default();
        let idx = local_now(self.clock.now_millis(), raw.utc_offset_seconds)
            .map(|now| current_hour_index(now, &hourly.time))
            .unwrap_or(0);

        Ok(WeatherSnapshot {
            temperature: current.temperature,
            feels_like: value_at(&hourly.apparent_temperature, idx)
                .unwrap_or(current.temperature),
            humidity: value_at(&hourly.relativehumidity_2m, idx).unwrap_or(0.0),
            wind_speed: current.windspeed,
            wind_direction_deg: current.winddirection,
            visibility_meters: value_at(&hourly.visibility, idx)
                .unwrap_or(DEFAULT_VISIBILITY_METERS),
            description: codes::describe(current.weathercode).to_string(),
            icon: codes::icon(current.weathercode).to_string(),
        })
    }
}

fn normalize_forecast(daily: DailyRaw) -> Result<Vec<ForecastDay>, WeatherError> {
    let expected = daily.time.len();
    if daily.temperature_2m_max.len() < expected
        || daily.temperature_2m_min.len() < expected
        || daily.weathercode.len() < expected
    {
        return Err(WeatherError::invalid_response(
            "daily arrays shorter than daily.time",
        ));
    }

    daily
        .time
        .iter()
        .enumerate()
        .map(|(i, date)| -> Result<ForecastDay, WeatherError> {
            let code = daily.weathercode[i];
            Ok(ForecastDay {
                timestamp_seconds: day_start_seconds(date)?,
                temp_max: daily.temperature_2m_max[i],
                temp_min: daily.temperature_2m_min[i],
                description: codes::describe(code).to_string(),
                icon: codes::icon(code).to_string(),
            })
        })
        .collect()
}
