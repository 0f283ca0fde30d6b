//! Temperature and wind-speed display conversion.
//!
//! The unit is global: choosing fahrenheit also switches wind speed to mph.
//! Wind units are not selectable on their own.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::WeatherError;

const MS_TO_MPH: f64 = 2.237;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Celsius => "celsius",
            Unit::Fahrenheit => "fahrenheit",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Unit {
    type Error = WeatherError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "celsius" | "c" | "metric" => Ok(Unit::Celsius),
            "fahrenheit" | "f" | "imperial" => Ok(Unit::Fahrenheit),
            _ => Err(WeatherError::input(format!(
                "Unknown unit '{value}'. Supported units: celsius, fahrenheit."
            ))),
        }
    }
}

/// Rounds half toward positive infinity, so -2.5 becomes -2 and 2.5 becomes 3.
fn round_half_up(value: f64) -> f64 {
    let floor = value.floor();
    let rounded = if value - floor >= 0.5 { floor + 1.0 } else { floor };
    // -0.0 would print as "-0".
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// One decimal place, exact ties rounded away from zero.
///
/// `{:.1}` alone breaks ties toward the even digit. An `f64` can only sit
/// exactly on a tenths tie when it is an odd number of quarters.
fn format_tenths(value: f64) -> String {
    let quarters = value * 4.0;
    let is_tie = quarters.fract() == 0.0 && quarters % 2.0 != 0.0;
    if is_tie {
        format!("{:.1}", (value * 10.0).round() / 10.0)
    } else {
        format!("{value:.1}")
    }
}

/// Whole-degree temperature in the requested unit.
///
/// Non-finite input yields `None`; callers treat that as bad data rather
/// than displaying it.
pub fn to_display_temperature(temp_c: f64, unit: Unit) -> Option<i64> {
    if !temp_c.is_finite() {
        return None;
    }

    let value = match unit {
        Unit::Celsius => temp_c,
        Unit::Fahrenheit => temp_c * 9.0 / 5.0 + 32.0,
    };

    Some(round_half_up(value) as i64)
}

pub fn to_display_wind_speed(speed_ms: f64, unit: Unit) -> String {
    match unit {
        Unit::Celsius => format!("{} m/s", format_tenths(speed_ms)),
        Unit::Fahrenheit => format!("{} mph", format_tenths(speed_ms * MS_TO_MPH)),
    }
}

/// `"31°"`, or `"--°"` when the reading is unusable.
pub fn format_temperature(temp_c: f64, unit: Unit) -> String {
    match to_display_temperature(temp_c, unit) {
        Some(value) => format!("{value}°"),
        None => "--°".to_string(),
    }
}
