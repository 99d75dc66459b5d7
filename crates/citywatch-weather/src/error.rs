//! Weather-layer error types.

use citywatch_core::error::{NetworkError, ReqwestErrorExt};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WeatherError {
    /// Geocoding returned no match for the name
    #[error("Location not found: {0}")]
    NotFound(String),

    #[error("Upstream error: {0}")]
    Upstream(#[from] NetworkError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl WeatherError {
    /// Upstream payload did not have the expected shape.
    pub(crate) fn invalid_response(message: impl Into<String>) -> Self {
        WeatherError::Upstream(NetworkError::InvalidResponse(message.into()))
    }

    /// User-friendly error message for display.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "Location not found. Check the city name and try again.",
            Self::Upstream(e) => e.user_message(),
            Self::InvalidInput(_) => "Invalid request. Check the city name or coordinates.",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        WeatherError::Upstream(err.into_network_error())
    }
}

impl From<serde_json::Error> for WeatherError {
    fn from(err: serde_json::Error) -> Self {
        WeatherError::invalid_response(err.to_string())
    }
}
