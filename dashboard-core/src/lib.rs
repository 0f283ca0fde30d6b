//! Core library for the weather dashboard.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather client behind the `WeatherSource` trait
//! - Forecast grouping, per-day summaries and condition theming
//! - `WeatherViewModel`, the stateful controller a front end renders from
//!
//! It is used by `dashboard-cli`, but can also be reused by other front ends.

pub mod condition;
pub mod config;
pub mod debounce;
pub mod error;
pub mod grouping;
pub mod model;
pub mod provider;
pub mod summary;
pub mod units;
pub mod view;
pub mod view_model;

pub use condition::{IconName, PresentationCategory, classify, classify_icon};
pub use config::{Config, FailurePolicy};
pub use error::{LocationError, WeatherError};
pub use grouping::{DayGroup, DayGroups, group_by_day};
pub use model::{CitySuggestion, Coordinates, CurrentWeather, ForecastSample, WeatherBundle};
pub use provider::{WeatherSource, openweather::OpenWeatherClient, source_from_config};
pub use summary::{DaySummary, summarize};
pub use units::{Unit, to_display_temperature, to_display_wind_speed};
pub use view::DashboardView;
pub use view_model::{FALLBACK_CITY, LoadOutcome, Phase, ViewEvent, ViewState, WeatherViewModel};
