use serde::{Deserialize, Serialize};

use crate::error::{Result, WeatherError};

/// Snapshot of the live conditions for a city. Replaced wholesale on every
/// successful fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub location_name: String,
    pub country_code: String,
    pub observed_at: i64,
    pub temperature_c: f64,
    pub humidity_pct: u8,
    pub wind_speed_ms: f64,
    pub condition_main: String,
    pub condition_description: String,
    pub icon_code: String,
    pub precipitation_1h_mm: f64,
    pub sunrise: i64,
    pub sunset: i64,
}

impl CurrentWeather {
    /// Strictly between sunrise and sunset; the boundaries themselves count as night.
    pub fn is_daytime(&self) -> bool {
        self.observed_at > self.sunrise && self.observed_at < self.sunset
    }

    pub fn display_location(&self) -> String {
        format!("{}, {}", self.location_name, self.country_code)
    }
}

/// One 3-hour forecast interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSample {
    pub timestamp: i64,
    /// Provider-local "YYYY-MM-DD HH:MM:SS" text.
    pub date_text: String,
    pub temperature_c: f64,
    pub temperature_min_c: f64,
    pub temperature_max_c: f64,
    pub condition_main: String,
    pub icon_code: String,
}

impl ForecastSample {
    /// Date portion of `date_text`, taken verbatim with no timezone handling.
    pub fn date_key(&self) -> &str {
        self.date_text
            .split_once(' ')
            .map_or(self.date_text.as_str(), |(date, _)| date)
    }

    /// Time portion of `date_text`, if present.
    pub fn time_text(&self) -> Option<&str> {
        self.date_text.split_once(' ').map(|(_, time)| time)
    }
}

/// Everything a single successful fetch produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherBundle {
    pub current: CurrentWeather,
    pub forecast: Vec<ForecastSample>,
}

impl WeatherBundle {
    /// Parse the separate current-weather and forecast bodies returned by the provider.
    pub fn from_parts(current_body: &str, forecast_body: &str) -> Result<Self> {
        let current: OwCurrentResponse = serde_json::from_str(current_body)?;
        let forecast: OwForecastResponse = serde_json::from_str(forecast_body)?;
        Self::from_upstream(current, forecast)
    }

    /// Parse the combined `{ "current": .., "forecast": { "list": [..] } }` payload.
    pub fn from_payload(body: &str) -> Result<Self> {
        let payload: OwCombinedPayload = serde_json::from_str(body)?;
        match (payload.current, payload.forecast) {
            (Some(current), Some(forecast)) => Self::from_upstream(current, forecast),
            _ => Err(WeatherError::malformed(
                "payload is missing `current` or `forecast`",
            )),
        }
    }

    fn from_upstream(current: OwCurrentResponse, forecast: OwForecastResponse) -> Result<Self> {
        let current = CurrentWeather::try_from(current)?;
        let forecast = forecast
            .list
            .into_iter()
            .map(ForecastSample::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { current, forecast })
    }
}

/// One geocoding match offered while the user is typing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitySuggestion {
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
    pub country: String,
}

impl CitySuggestion {
    pub fn label(&self) -> String {
        match &self.state {
            Some(state) => format!("{}, {}, {}", self.name, state, self.country),
            None => format!("{}, {}", self.name, self.country),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn validate(&self) -> Result<()> {
        let lat_ok = self.lat.is_finite() && (-90.0..=90.0).contains(&self.lat);
        let lon_ok = self.lon.is_finite() && (-180.0..=180.0).contains(&self.lon);
        if lat_ok && lon_ok {
            Ok(())
        } else {
            Err(WeatherError::input("Latitude and longitude are required."))
        }
    }
}

// Upstream wire format.

#[derive(Debug, Deserialize)]
struct OwCombinedPayload {
    current: Option<OwCurrentResponse>,
    forecast: Option<OwForecastResponse>,
}

#[derive(Debug, Deserialize)]
struct OwCondition {
    main: String,
    #[serde(default)]
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentMain {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: String,
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwRain {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    main: OwCurrentMain,
    wind: OwWind,
    sys: OwSys,
    weather: Vec<OwCondition>,
    rain: Option<OwRain>,
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp: f64,
    temp_min: f64,
    temp_max: f64,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    dt_txt: String,
    main: OwForecastMain,
    weather: Vec<OwCondition>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

fn ensure_finite(value: f64, field: &str) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(WeatherError::malformed(format!("non-finite value in `{field}`")))
    }
}

impl TryFrom<OwCurrentResponse> for CurrentWeather {
    type Error = WeatherError;

    fn try_from(raw: OwCurrentResponse) -> Result<Self> {
        let condition = raw
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::malformed("current weather has no condition entry"))?;

        Ok(Self {
            location_name: raw.name,
            country_code: raw.sys.country,
            observed_at: raw.dt,
            temperature_c: ensure_finite(raw.main.temp, "main.temp")?,
            humidity_pct: raw.main.humidity,
            wind_speed_ms: ensure_finite(raw.wind.speed, "wind.speed")?,
            condition_main: condition.main,
            condition_description: condition.description,
            icon_code: condition.icon,
            precipitation_1h_mm: raw.rain.and_then(|r| r.one_hour).unwrap_or(0.0),
            sunrise: raw.sys.sunrise,
            sunset: raw.sys.sunset,
        })
    }
}

impl TryFrom<OwForecastEntry> for ForecastSample {
    type Error = WeatherError;

    fn try_from(raw: OwForecastEntry) -> Result<Self> {
        let condition = raw.weather.into_iter().next().ok_or_else(|| {
            WeatherError::malformed(format!("forecast entry {} has no condition", raw.dt_txt))
        })?;

        Ok(Self {
            timestamp: raw.dt,
            date_text: raw.dt_txt,
            temperature_c: ensure_finite(raw.main.temp, "main.temp")?,
            temperature_min_c: ensure_finite(raw.main.temp_min, "main.temp_min")?,
            temperature_max_c: ensure_finite(raw.main.temp_max, "main.temp_max")?,
            condition_main: condition.main,
            icon_code: condition.icon,
        })
    }
}
