use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use dashboard_core::{
    Config, Coordinates, FALLBACK_CITY, LocationError, Phase, Unit, ViewEvent, WeatherViewModel,
    source_from_config,
};
use inquire::{Select, Text};
use std::sync::Arc;

use crate::render;

fn parse_unit(value: &str) -> Result<Unit, String> {
    Unit::try_from(value).map_err(|e| e.to_string())
}

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-dash", version, about = "Weather dashboard for the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and preferred unit.
    Configure,

    /// Show current conditions and the 5-day forecast for a city.
    Show {
        /// City name; defaults to the fallback city.
        city: Option<String>,

        /// celsius or fahrenheit; overrides the configured unit.
        #[arg(long, value_parser = parse_unit)]
        unit: Option<Unit>,

        /// Forecast day to expand (1-5); the first day when absent.
        #[arg(long)]
        day: Option<usize>,
    },

    /// Show weather for coordinates, falling back to the default city without them.
    Locate {
        #[arg(long, allow_hyphen_values = true, requires = "lon")]
        lat: Option<f64>,

        #[arg(long, allow_hyphen_values = true, requires = "lat")]
        lon: Option<f64>,

        #[arg(long, value_parser = parse_unit)]
        unit: Option<Unit>,
    },

    /// List cities matching a partial name.
    Search {
        query: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, unit, day } => {
                let vm = view_model(unit)?;
                let city = city.unwrap_or_else(|| FALLBACK_CITY.to_string());
                vm.load_city(&city)
                    .await
                    .map_err(|e| anyhow!(e.user_message()))?;

                if let Some(day) = day {
                    let keys = vm.day_keys();
                    let date = day
                        .checked_sub(1)
                        .and_then(|i| keys.get(i))
                        .ok_or_else(|| anyhow!("Day must be between 1 and {}", keys.len()))?;
                    vm.select_day(date)?;
                }

                print_dashboard(&vm)
            }
            Command::Locate { lat, lon, unit } => {
                let vm = view_model(unit)?;
                let location = match (lat, lon) {
                    (Some(lat), Some(lon)) => Ok(Coordinates::new(lat, lon)),
                    _ => Err(LocationError::Unavailable("no coordinates given".into())),
                };
                vm.load_from_location(location)
                    .await
                    .map_err(|e| anyhow!(e.user_message()))?;

                print_dashboard(&vm)
            }
            Command::Search { query } => {
                let vm = view_model(None)?;
                match vm.city_suggestions(&query).await {
                    Ok(Some(matches)) => print!("{}", render::suggestions(&matches)),
                    Ok(None) => {}
                    Err(e) => return Err(anyhow!(e.user_message())),
                }
                Ok(())
            }
        }
    }
}

fn view_model(unit: Option<Unit>) -> anyhow::Result<Arc<WeatherViewModel>> {
    let mut config = Config::load()?;
    if let Some(unit) = unit {
        config.unit = unit;
    }

    let source = source_from_config(&config)?;
    let vm = Arc::new(WeatherViewModel::new(source, &config));

    let mut events = vm.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                ViewEvent::Notice { message } => eprintln!("{message}"),
                other => tracing::debug!(?other, "view event"),
            }
        }
    });

    Ok(vm)
}

fn print_dashboard(vm: &WeatherViewModel) -> anyhow::Result<()> {
    if let Phase::Failed { message } = vm.phase() {
        return Err(anyhow!(message));
    }

    let view = vm
        .render()?
        .ok_or_else(|| anyhow!("No weather data loaded"))?;
    print!("{}", render::dashboard(&view));
    Ok(())
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Text::new("OpenWeather API key:")
        .prompt()
        .context("Failed to read API key")?;
    config.set_api_key(api_key);

    let unit = Select::new("Temperature unit:", vec![Unit::Celsius, Unit::Fahrenheit])
        .prompt()
        .context("Failed to read unit")?;
    config.unit = unit;

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}
