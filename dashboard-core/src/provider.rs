use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc, time::Duration};

use crate::{
    Config,
    error::Result,
    model::{CitySuggestion, Coordinates, WeatherBundle},
    provider::openweather::OpenWeatherClient,
};

pub mod openweather;

/// Upper bound on suggestions returned by a city search.
pub const MAX_SUGGESTIONS: usize = 5;

/// The upstream weather and geocoding collaborator.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    /// Current conditions plus the 3-hourly forecast for `city`.
    async fn fetch_weather(&self, city: &str) -> Result<WeatherBundle>;

    /// Name of the city at `coordinates`.
    async fn fetch_city_from_coordinates(&self, coordinates: Coordinates) -> Result<String>;

    /// Up to [`MAX_SUGGESTIONS`] cities matching `query`.
    async fn search_cities(&self, query: &str) -> Result<Vec<CitySuggestion>>;
}

/// Construct the OpenWeather-backed source from config.
pub fn source_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherSource>> {
    let api_key = config.resolved_api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured.\n\
                 Hint: run `weather-dash configure` or set WEATHER_API_KEY."
        )
    })?;

    let client = OpenWeatherClient::builder(api_key)
        .base_url(&config.base_url)
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()?;

    Ok(Arc::new(client))
}
