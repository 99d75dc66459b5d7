//! Weather aggregation for CityWatch
//!
//! Resolves city names to coordinates, fetches current conditions and daily
//! forecasts from Open-Meteo, caches current conditions per coordinate, and
//! enriches batches of cities with per-city failure isolation.

pub mod cache;
pub mod codes;
pub mod enrich;
pub mod error;
pub mod geocode;
pub mod provider;
pub mod service;
pub mod types;

pub use cache::{Clock, ManualClock, MemoryCache, SnapshotCache, SystemClock};
pub use codes::{describe, icon, IconCategory};
pub use enrich::BatchEnricher;
pub use error::WeatherError;
pub use geocode::Geocoder;
pub use provider::{current_hour_index, WeatherProvider};
pub use service::WeatherService;
pub use types::*;
