//! Renderable display data derived from the loaded weather and the unit.
//!
//! Everything here is recomputed from scratch on each render, so switching
//! units back and forth reproduces the same strings exactly.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use crate::{
    condition::{IconName, PresentationCategory, classify, classify_icon},
    error::Result,
    grouping::{DayGroup, DayGroups},
    model::CurrentWeather,
    summary::DaySummary,
    units::{Unit, format_temperature, to_display_wind_speed},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IconView {
    pub name: IconName,
    pub url: String,
    pub alt: String,
}

impl IconView {
    pub fn for_code(icon_code: &str) -> Self {
        let name = classify_icon(icon_code);
        Self {
            name,
            url: name.url(),
            alt: name.alt_text(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentView {
    pub location: String,
    pub temperature: String,
    pub description: String,
    pub humidity: String,
    pub wind: String,
    pub precipitation: String,
    pub icon: IconView,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayCard {
    pub date: String,
    pub weekday: String,
    pub temperature_range: String,
    pub icon: IconView,
    pub condition_main: String,
    pub is_daytime_icon: bool,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyItem {
    pub time: String,
    pub temperature: String,
    pub icon: IconView,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyView {
    pub date: String,
    pub title: String,
    pub items: Vec<HourlyItem>,
}

/// Where the background theme currently comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "date", rename_all = "lowercase")]
pub enum ThemeSource {
    Current,
    Day(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Theme {
    pub category: PresentationCategory,
    pub source: ThemeSource,
    pub has_precipitation_animation: bool,
}

impl Theme {
    pub fn new(category: PresentationCategory, source: ThemeSource) -> Self {
        Self {
            category,
            source,
            has_precipitation_animation: category.has_precipitation_animation(),
        }
    }

    pub fn for_current(current: &CurrentWeather) -> Self {
        Self::new(
            classify(&current.condition_main, current.is_daytime()),
            ThemeSource::Current,
        )
    }

    pub fn for_day(summary: &DaySummary) -> Self {
        Self::new(
            classify(&summary.condition_main, summary.is_daytime_icon),
            ThemeSource::Day(summary.date.clone()),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub unit: Unit,
    pub current: CurrentView,
    pub days: Vec<DayCard>,
    pub hourly: Option<HourlyView>,
    pub theme: Theme,
}

pub fn current_view(current: &CurrentWeather, unit: Unit) -> CurrentView {
    CurrentView {
        location: current.display_location(),
        temperature: format_temperature(current.temperature_c, unit),
        description: current.condition_description.clone(),
        humidity: format!("Humidity: {}%", current.humidity_pct),
        wind: format!("Wind: {}", to_display_wind_speed(current.wind_speed_ms, unit)),
        precipitation: format!("Precipitation (1h): {} mm", current.precipitation_1h_mm),
        icon: IconView::for_code(&current.icon_code),
    }
}

pub fn day_card(summary: &DaySummary, unit: Unit, selected: bool) -> DayCard {
    DayCard {
        date: summary.date.clone(),
        weekday: weekday_label(&summary.date),
        temperature_range: format!(
            "{} / {}",
            format_temperature(summary.max_temp_c, unit),
            format_temperature(summary.min_temp_c, unit)
        ),
        icon: IconView::for_code(&summary.representative.icon_code),
        condition_main: summary.condition_main.clone(),
        is_daytime_icon: summary.is_daytime_icon,
        selected,
    }
}

pub fn day_cards(days: &DayGroups, selected: Option<&str>, unit: Unit) -> Result<Vec<DayCard>> {
    days.iter()
        .map(|group| {
            let summary = DaySummary::try_from(group)?;
            let is_selected = selected == Some(group.date.as_str());
            Ok(day_card(&summary, unit, is_selected))
        })
        .collect()
}

pub fn hourly_view(group: &DayGroup, unit: Unit) -> HourlyView {
    HourlyView {
        date: group.date.clone(),
        title: format!("Hourly Forecast for {}", month_day_label(&group.date)),
        items: group
            .samples
            .iter()
            .map(|sample| HourlyItem {
                time: sample
                    .time_text()
                    .map_or_else(String::new, time_label),
                temperature: format_temperature(sample.temperature_c, unit),
                icon: IconView::for_code(&sample.icon_code),
            })
            .collect(),
    }
}

fn parse_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

/// `"Wed"`; unparseable keys are shown as-is.
pub fn weekday_label(date: &str) -> String {
    parse_date(date).map_or_else(|| date.to_string(), |d| d.format("%a").to_string())
}

/// `"June 5"`; unparseable keys are shown as-is.
pub fn month_day_label(date: &str) -> String {
    parse_date(date).map_or_else(|| date.to_string(), |d| d.format("%B %-d").to_string())
}

/// `"03:00 PM"` from `"15:00:00"`.
pub fn time_label(time: &str) -> String {
    NaiveTime::parse_from_str(time, "%H:%M:%S")
        .map(|t| t.format("%I:%M %p").to_string())
        .unwrap_or_else(|_| time.to_string())
}
