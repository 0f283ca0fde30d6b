//! Mapping of upstream condition vocabulary to theme and icon identifiers.

use serde::Serialize;
use std::fmt;

const ICON_BASE_URL: &str = "https://basmilius.github.io/weather-icons/production/fill/all";

/// Coarse theme bucket driving background styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PresentationCategory {
    ClearDay,
    ClearNight,
    Cloudy,
    Rainy,
    Snowy,
    Misty,
    Unstyled,
}

impl PresentationCategory {
    /// Rainy themes also get the falling-drops animation.
    pub fn has_precipitation_animation(&self) -> bool {
        matches!(self, Self::Rainy)
    }

    /// Theme class name, `None` for conditions that leave the theme untouched.
    pub fn css_class(&self) -> Option<&'static str> {
        match self {
            Self::ClearDay => Some("weather-clear-day"),
            Self::ClearNight => Some("weather-clear-night"),
            Self::Cloudy => Some("weather-clouds"),
            Self::Rainy => Some("weather-rain"),
            Self::Snowy => Some("weather-snow"),
            Self::Misty => Some("weather-mist"),
            Self::Unstyled => None,
        }
    }
}

/// Case-sensitive on the provider's `main` condition names.
pub fn classify(condition_main: &str, is_daytime: bool) -> PresentationCategory {
    match condition_main {
        "Clear" if is_daytime => PresentationCategory::ClearDay,
        "Clear" => PresentationCategory::ClearNight,
        "Clouds" => PresentationCategory::Cloudy,
        "Rain" | "Drizzle" | "Thunderstorm" => PresentationCategory::Rainy,
        "Snow" => PresentationCategory::Snowy,
        "Mist" | "Fog" | "Haze" => PresentationCategory::Misty,
        _ => PresentationCategory::Unstyled,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IconName {
    ClearDay,
    ClearNight,
    PartlyCloudyDay,
    PartlyCloudyNight,
    Cloudy,
    Overcast,
    Drizzle,
    Rain,
    Thunderstorms,
    Snow,
    Mist,
}

impl IconName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClearDay => "clear-day",
            Self::ClearNight => "clear-night",
            Self::PartlyCloudyDay => "partly-cloudy-day",
            Self::PartlyCloudyNight => "partly-cloudy-night",
            Self::Cloudy => "cloudy",
            Self::Overcast => "overcast",
            Self::Drizzle => "drizzle",
            Self::Rain => "rain",
            Self::Thunderstorms => "thunderstorms",
            Self::Snow => "snow",
            Self::Mist => "mist",
        }
    }

    pub fn url(&self) -> String {
        format!("{ICON_BASE_URL}/{}.svg", self.as_str())
    }

    /// Only the first hyphen becomes a space ("partly cloudy-day").
    pub fn alt_text(&self) -> String {
        self.as_str().replacen('-', " ", 1)
    }
}

impl fmt::Display for IconName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a provider icon code such as `"09d"`. Unknown codes fall back to cloudy.
pub fn classify_icon(icon_code: &str) -> IconName {
    match icon_code {
        "01d" => IconName::ClearDay,
        "01n" => IconName::ClearNight,
        "02d" => IconName::PartlyCloudyDay,
        "02n" => IconName::PartlyCloudyNight,
        "03d" | "03n" => IconName::Cloudy,
        "04d" | "04n" => IconName::Overcast,
        "09d" | "09n" => IconName::Drizzle,
        "10d" | "10n" => IconName::Rain,
        "11d" | "11n" => IconName::Thunderstorms,
        "13d" | "13n" => IconName::Snow,
        "50d" | "50n" => IconName::Mist,
        _ => IconName::Cloudy,
    }
}
