//! Weather service facade: the operations the rest of the application calls.

use std::sync::Arc;
use std::time::Duration;

use citywatch_core::WeatherConfig;
use reqwest::Client;
use tracing::instrument;

use crate::cache::{Clock, MemoryCache, SystemClock};
use crate::enrich::BatchEnricher;
use crate::error::WeatherError;
use crate::geocode::Geocoder;
use crate::provider::WeatherProvider;
use crate::types::{
    BatchItem, CityForecast, CityQuery, CityWeatherResult, Coordinate, ForecastDay, Place,
    WeatherSnapshot,
};

const USER_AGENT: &str = concat!("CityWatch/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct WeatherService {
    geocoder: Geocoder,
    provider: WeatherProvider,
    enricher: BatchEnricher,
    cache: Arc<MemoryCache>,
    forecast_days: u32,
}

impl WeatherService {
    /// Build the service against the configured upstream endpoints.
    pub fn new(config: &WeatherConfig) -> Result<Self, WeatherError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Build the service with an explicit time source.
    pub fn with_clock(config: &WeatherConfig, clock: Arc<dyn Clock>) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        let cache = Arc::new(MemoryCache::new(config.cache_ttl_millis(), clock.clone()));
        let geocoder = Geocoder::new(client.clone(), &config.geocoding_url);
        let provider = WeatherProvider::new(client, &config.forecast_url, cache.clone(), clock);
        let enricher = BatchEnricher::new(
            geocoder.clone(),
            provider.clone(),
            config.max_concurrency,
        );

        Ok(Self {
            geocoder,
            provider,
            enricher,
            cache,
            forecast_days: config.forecast_days,
        })
    }

    pub async fn resolve(&self, city_name: &str) -> Result<Place, WeatherError> {
        self.geocoder.resolve(city_name).await
    }

    pub async fn current_weather(
        &self,
        coord: Coordinate,
    ) -> Result<Arc<WeatherSnapshot>, WeatherError> {
        self.provider.current(coord).await
    }

    pub async fn forecast(
        &self,
        coord: Coordinate,
        days: u32,
    ) -> Result<Vec<ForecastDay>, WeatherError> {
        self.provider.forecast(coord, days).await
    }

    /// Forecast over the configured default horizon
    pub async fn default_forecast(
        &self,
        coord: Coordinate,
    ) -> Result<Vec<ForecastDay>, WeatherError> {
        self.provider.forecast(coord, self.forecast_days).await
    }

    /// Resolve a city by name, then fetch its forecast.
    ///
    /// `days` defaults to the configured horizon.
    #[instrument(skip(self), level = "info")]
    pub async fn forecast_for_city(
        &self,
        city_name: &str,
        days: Option<u32>,
    ) -> Result<CityForecast, WeatherError> {
        let place = self.geocoder.resolve(city_name).await?;
        let forecast = self
            .provider
            .forecast(place.coordinate, days.unwrap_or(self.forecast_days))
            .await?;
        Ok(CityForecast { place, forecast })
    }

    /// Batch enrichment keeping the failure reason per city
    pub async fn enrich(&self, queries: Vec<CityQuery>) -> Vec<BatchItem> {
        self.enricher.enrich(queries).await
    }

    /// Batch enrichment as exposed to callers: failed cities carry `data: null`.
    /// Never fails as a whole.
    pub async fn enrich_batch(&self, queries: Vec<CityQuery>) -> Vec<CityWeatherResult> {
        self.enricher
            .enrich(queries)
            .await
            .into_iter()
            .map(CityWeatherResult::from)
            .collect()
    }

    /// Number of coordinates currently held in the weather cache
    pub fn cached_locations(&self) -> usize {
        self.cache.len()
    }
}
