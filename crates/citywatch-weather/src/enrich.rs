//! Batch enrichment: current weather for many cities at once, with failures
//! isolated per city.

use std::sync::Arc;

use futures::stream::{self, StreamExt};

use crate::error::WeatherError;
use crate::geocode::Geocoder;
use crate::provider::WeatherProvider;
use crate::types::{BatchItem, CityOutcome, CityQuery, WeatherSnapshot};

#[derive(Debug, Clone)]
pub struct BatchEnricher {
    geocoder: Geocoder,
    provider: WeatherProvider,
    max_concurrency: usize,
}

impl BatchEnricher {
    pub fn new(geocoder: Geocoder, provider: WeatherProvider, max_concurrency: usize) -> Self {
        Self {
            geocoder,
            provider,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Enrich every query with current weather.
    ///
    /// Returns exactly one item per query, in completion order. Waits for
    /// all queries; a failing city only affects its own item.
    pub async fn enrich(&self, queries: Vec<CityQuery>) -> Vec<BatchItem> {
        let total = queries.len();
        let items: Vec<BatchItem> = stream::iter(queries)
            .map(|query| self.enrich_one(query))
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        let failed = items.iter().filter(|item| !item.outcome.is_ok()).count();
        tracing::info!("Enriched {} cities ({} failed)", total, failed);
        items
    }

    async fn enrich_one(&self, query: CityQuery) -> BatchItem {
        let outcome = CityOutcome::from(self.weather_for(&query).await);
        if let CityOutcome::Failed(e) = &outcome {
            tracing::warn!("Weather unavailable for city {} ({}): {}", query.id, query.name, e);
        }
        BatchItem {
            id: query.id,
            outcome,
        }
    }

    async fn weather_for(&self, query: &CityQuery) -> Result<Arc<WeatherSnapshot>, WeatherError> {
        let coord = match query.known_coordinate() {
            Some(coord) => coord,
            None => self.geocoder.resolve(&query.name).await?.coordinate,
        };
        self.provider.current(coord).await
    }
}
