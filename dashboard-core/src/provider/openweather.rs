use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::{
    error::{Result, WeatherError},
    model::{CitySuggestion, Coordinates, WeatherBundle},
};

use super::{MAX_SUGGESTIONS, WeatherSource};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    http: Client,
}

#[derive(Debug)]
pub struct OpenWeatherClientBuilder {
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl OpenWeatherClientBuilder {
    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> anyhow::Result<OpenWeatherClient> {
        let http = Client::builder()
            .timeout(self.timeout)
            .build()
            .context("Failed to build HTTP client for OpenWeather")?;

        Ok(OpenWeatherClient {
            api_key: self.api_key,
            base_url: self.base_url,
            http,
        })
    }
}

impl OpenWeatherClient {
    pub fn builder(api_key: impl Into<String>) -> OpenWeatherClientBuilder {
        OpenWeatherClientBuilder {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    /// GET `path` and return the body of a 2xx response. A 404 maps to
    /// `NotFound(subject)`.
    async fn get_text(&self, path: &str, query: &[(&str, &str)], subject: &str) -> Result<String> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, ?query, "OpenWeather request");

        let res = self
            .http
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| WeatherError::upstream(format!("request to {path} failed: {e}")))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| WeatherError::upstream(format!("reading {path} body failed: {e}")))?;

        if status == StatusCode::NOT_FOUND {
            return Err(WeatherError::NotFound(subject.to_string()));
        }

        if !status.is_success() {
            return Err(WeatherError::upstream(format!(
                "{path} failed with status {status}: {}",
                truncate_body(&body),
            )));
        }

        Ok(body)
    }

    async fn fetch_current(&self, city: &str) -> Result<String> {
        self.get_text("/data/2.5/weather", &[("q", city), ("units", "metric")], city)
            .await
    }

    async fn fetch_forecast(&self, city: &str) -> Result<String> {
        self.get_text("/data/2.5/forecast", &[("q", city), ("units", "metric")], city)
            .await
    }
}

#[derive(Debug, Deserialize)]
struct OwGeoPlace {
    name: String,
}

fn require_city(city: &str) -> Result<&str> {
    let city = city.trim();
    if city.is_empty() {
        Err(WeatherError::input("Please enter a city name."))
    } else {
        Ok(city)
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    async fn fetch_weather(&self, city: &str) -> Result<WeatherBundle> {
        let city = require_city(city)?;

        let (current, forecast) =
            tokio::try_join!(self.fetch_current(city), self.fetch_forecast(city))?;

        WeatherBundle::from_parts(&current, &forecast)
    }

    async fn fetch_city_from_coordinates(&self, coordinates: Coordinates) -> Result<String> {
        coordinates.validate()?;

        let subject = format!("{}, {}", coordinates.lat, coordinates.lon);
        let lat = coordinates.lat.to_string();
        let lon = coordinates.lon.to_string();

        let body = self
            .get_text(
                "/geo/1.0/reverse",
                &[("lat", lat.as_str()), ("lon", lon.as_str()), ("limit", "1")],
                &subject,
            )
            .await?;

        let places: Vec<OwGeoPlace> = serde_json::from_str(&body)?;
        places
            .into_iter()
            .next()
            .map(|p| p.name)
            .ok_or(WeatherError::NotFound(subject))
    }

    async fn search_cities(&self, query: &str) -> Result<Vec<CitySuggestion>> {
        let query = require_city(query)?;
        let limit = MAX_SUGGESTIONS.to_string();

        let body = self
            .get_text("/geo/1.0/direct", &[("q", query), ("limit", limit.as_str())], query)
            .await?;

        let mut matches: Vec<CitySuggestion> = serde_json::from_str(&body)?;
        matches.truncate(MAX_SUGGESTIONS);
        Ok(matches)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
