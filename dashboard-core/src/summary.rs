use crate::{
    error::{Result, WeatherError},
    grouping::DayGroup,
    model::ForecastSample,
};

/// Per-day digest used for the forecast cards.
#[derive(Debug, Clone, PartialEq)]
pub struct DaySummary {
    pub date: String,
    /// Middle sample of the day (index `len / 2`), not a true solar-noon pick.
    pub representative: ForecastSample,
    pub max_temp_c: f64,
    pub min_temp_c: f64,
    pub condition_main: String,
    pub is_daytime_icon: bool,
}

/// Icon codes ending in `d` are daytime variants.
pub fn is_day_icon(icon_code: &str) -> bool {
    icon_code.ends_with('d')
}

/// Summarize one day group. Extremes come from the per-sample min/max fields.
pub fn summarize(date: &str, samples: &[ForecastSample]) -> Result<DaySummary> {
    let representative = samples
        .get(samples.len() / 2)
        .ok_or_else(|| WeatherError::EmptyDayGroup(date.to_string()))?;

    let max_temp_c = samples
        .iter()
        .map(|s| s.temperature_max_c)
        .fold(f64::NEG_INFINITY, f64::max);
    let min_temp_c = samples
        .iter()
        .map(|s| s.temperature_min_c)
        .fold(f64::INFINITY, f64::min);

    Ok(DaySummary {
        date: date.to_string(),
        representative: representative.clone(),
        max_temp_c,
        min_temp_c,
        condition_main: representative.condition_main.clone(),
        is_daytime_icon: is_day_icon(&representative.icon_code),
    })
}

impl TryFrom<&DayGroup> for DaySummary {
    type Error = WeatherError;

    fn try_from(group: &DayGroup) -> Result<Self> {
        summarize(&group.date, &group.samples)
    }
}
