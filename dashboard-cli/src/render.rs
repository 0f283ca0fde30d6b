use dashboard_core::{CitySuggestion, DashboardView};
use std::fmt::Write;

pub fn dashboard(view: &DashboardView) -> String {
    let mut out = String::new();
    let current = &view.current;

    let _ = writeln!(
        out,
        "{}  {}  {} [{}]",
        current.location, current.temperature, current.description, current.icon.name
    );
    let _ = writeln!(
        out,
        "{}   {}   {}",
        current.humidity, current.wind, current.precipitation
    );

    let animation = if view.theme.has_precipitation_animation {
        " (animated)"
    } else {
        ""
    };
    let theme = view.theme.category.css_class().unwrap_or("default");
    let _ = writeln!(out, "Theme: {theme}{animation}");
    out.push('\n');

    for card in &view.days {
        let marker = if card.selected { '>' } else { ' ' };
        let _ = writeln!(
            out,
            "{marker} {}  {:<10}  {}",
            card.weekday, card.temperature_range, card.icon.alt
        );
    }

    if let Some(hourly) = &view.hourly {
        let _ = writeln!(out, "\n{}", hourly.title);
        for item in &hourly.items {
            let _ = writeln!(out, "  {}  {:>4}  {}", item.time, item.temperature, item.icon.alt);
        }
    }

    out
}

pub fn suggestions(matches: &[CitySuggestion]) -> String {
    if matches.is_empty() {
        return "No matching cities.\n".to_string();
    }

    matches.iter().fold(String::new(), |mut out, city| {
        let _ = writeln!(out, "{}", city.label());
        out
    })
}
