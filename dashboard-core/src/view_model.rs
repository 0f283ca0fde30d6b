//! The stateful controller behind the dashboard.
//!
//! Holds the loaded weather, the selected day and the display unit. All
//! mutation goes through its methods; presentation layers render on demand
//! with [`WeatherViewModel::render`] and learn about changes through
//! [`WeatherViewModel::subscribe`].
//!
//! Each load takes a request token. A response is only applied when its
//! token is still the latest one issued, so a slow response for an older
//! request can never overwrite a newer one.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::{
    config::{Config, FailurePolicy},
    debounce::Debouncer,
    error::{LocationError, Result, WeatherError},
    grouping::{DayGroups, MAX_SURFACED_DAYS, group_by_day},
    model::{CitySuggestion, Coordinates, WeatherBundle},
    provider::WeatherSource,
    summary::DaySummary,
    units::Unit,
    view::{DashboardView, Theme, ThemeSource, current_view, day_cards, hourly_view},
};

/// City loaded when the device location cannot be used.
pub const FALLBACK_CITY: &str = "Dhaka";

const LOCATION_LOOKUP_FAILED: &str = "Could not determine city from your location.";
const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Empty,
    Loading,
    Ready,
    /// Non-terminal; the next successful load returns to `Ready`.
    Failed { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// A newer request was issued while this one was in flight; its result was dropped.
    Superseded,
    /// The requested city is already on screen.
    Unchanged,
}

/// Notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Loading { query: String },
    Ready { location: String },
    Failed { message: String },
    DaySelected { date: String },
    CurrentSelected,
    UnitChanged { unit: Unit },
    /// Informational message that does not change the phase.
    Notice { message: String },
}

/// Point-in-time copy of the controller state.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub phase: Phase,
    pub unit: Unit,
    pub selected_date: Option<String>,
    pub data: Option<WeatherBundle>,
}

#[derive(Debug)]
struct Loaded {
    bundle: WeatherBundle,
    days: DayGroups,
}

#[derive(Debug)]
struct Inner {
    phase: Phase,
    unit: Unit,
    loaded: Option<Loaded>,
    selected_date: Option<String>,
    theme_source: ThemeSource,
    latest_request: u64,
}

impl Inner {
    fn theme(&self) -> Result<Option<Theme>> {
        let Some(loaded) = &self.loaded else {
            return Ok(None);
        };

        let theme = match &self.theme_source {
            ThemeSource::Current => Theme::for_current(&loaded.bundle.current),
            ThemeSource::Day(date) => {
                let group = loaded
                    .days
                    .get(date)
                    .ok_or_else(|| WeatherError::UnknownDay(date.clone()))?;
                Theme::for_day(&DaySummary::try_from(group)?)
            }
        };

        Ok(Some(theme))
    }

    fn first_date(&self) -> Option<String> {
        self.loaded
            .as_ref()
            .and_then(|l| l.days.first())
            .map(|g| g.date.clone())
    }
}

#[derive(Debug)]
pub struct WeatherViewModel {
    source: Arc<dyn WeatherSource>,
    failure_policy: FailurePolicy,
    inner: Mutex<Inner>,
    suggestions: Debouncer,
    events: broadcast::Sender<ViewEvent>,
}

impl WeatherViewModel {
    pub fn new(source: Arc<dyn WeatherSource>, config: &Config) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            source,
            failure_policy: config.failure_policy,
            inner: Mutex::new(Inner {
                phase: Phase::Empty,
                unit: config.unit,
                loaded: None,
                selected_date: None,
                theme_source: ThemeSource::Current,
                latest_request: 0,
            }),
            suggestions: Debouncer::new(config.suggestion_debounce()),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ViewEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: ViewEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    pub fn state(&self) -> ViewState {
        let inner = self.inner.lock();
        ViewState {
            phase: inner.phase.clone(),
            unit: inner.unit,
            selected_date: inner.selected_date.clone(),
            data: inner.loaded.as_ref().map(|l| l.bundle.clone()),
        }
    }

    pub fn phase(&self) -> Phase {
        self.inner.lock().phase.clone()
    }

    pub fn unit(&self) -> Unit {
        self.inner.lock().unit
    }

    pub fn selected_date(&self) -> Option<String> {
        self.inner.lock().selected_date.clone()
    }

    /// Surfaced day keys, in forecast order.
    pub fn day_keys(&self) -> Vec<String> {
        self.inner
            .lock()
            .loaded
            .as_ref()
            .map(|l| l.days.dates().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn theme(&self) -> Result<Option<Theme>> {
        self.inner.lock().theme()
    }

    /// Display data for the current state, `None` until something is loaded.
    pub fn render(&self) -> Result<Option<DashboardView>> {
        let inner = self.inner.lock();
        let Some(loaded) = &inner.loaded else {
            return Ok(None);
        };

        let unit = inner.unit;
        let selected = inner.selected_date.as_deref();
        let hourly = selected
            .and_then(|date| loaded.days.get(date))
            .map(|group| hourly_view(group, unit));

        let theme = match inner.theme()? {
            Some(theme) => theme,
            None => return Ok(None),
        };

        Ok(Some(DashboardView {
            unit,
            current: current_view(&loaded.bundle.current, unit),
            days: day_cards(&loaded.days, selected, unit)?,
            hourly,
            theme,
        }))
    }

    fn begin_request(&self, query: &str) -> u64 {
        let token = {
            let mut inner = self.inner.lock();
            inner.latest_request += 1;
            inner.phase = Phase::Loading;
            inner.latest_request
        };

        debug!(token, query, "request issued");
        self.emit(ViewEvent::Loading {
            query: query.to_string(),
        });
        token
    }

    /// Moves to `Failed` showing `message`, applying the failure policy.
    fn record_failure(&self, inner: &mut Inner, err: &WeatherError, message: String) {
        if err.is_user_correctable() {
            info!(error = %err, "load rejected");
        } else {
            error!(error = %err, "weather load failed");
        }

        if self.failure_policy == FailurePolicy::Clear {
            inner.loaded = None;
            inner.selected_date = None;
            inner.theme_source = ThemeSource::Current;
        }
        inner.phase = Phase::Failed { message };
    }

    fn complete_load(&self, token: u64, result: Result<WeatherBundle>) -> Result<LoadOutcome> {
        let mut inner = self.inner.lock();

        if token != inner.latest_request {
            drop(inner);
            warn!(token, "discarding response for superseded request");
            return Ok(LoadOutcome::Superseded);
        }

        match result {
            Ok(bundle) => {
                let days = group_by_day(&bundle.forecast).truncated(MAX_SURFACED_DAYS);
                let location = bundle.current.display_location();

                inner.selected_date = days.first().map(|g| g.date.clone());
                inner.theme_source = ThemeSource::Current;
                inner.loaded = Some(Loaded { bundle, days });
                inner.phase = Phase::Ready;
                drop(inner);

                info!(%location, "weather loaded");
                self.emit(ViewEvent::Ready { location });
                Ok(LoadOutcome::Applied)
            }
            Err(err) => {
                let message = err.user_message();
                self.record_failure(&mut inner, &err, message.clone());
                drop(inner);

                self.emit(ViewEvent::Failed { message });
                Err(err)
            }
        }
    }

    /// Fetch and display `city`, replacing whatever was loaded.
    ///
    /// Blank input is rejected before any request and leaves the phase alone.
    pub async fn load_city(&self, city: &str) -> Result<LoadOutcome> {
        let city = city.trim();
        if city.is_empty() {
            return Err(WeatherError::input("Please enter a city name."));
        }

        let token = self.begin_request(city);
        let result = self.source.fetch_weather(city).await;
        self.complete_load(token, result)
    }

    /// Search-box submission: skips the fetch when `query` is already loaded.
    pub async fn submit_search(&self, query: &str) -> Result<LoadOutcome> {
        let query = query.trim();
        if query.is_empty() {
            return Err(WeatherError::input("Please enter a city name."));
        }
        self.suggestions.cancel();

        let already_loaded = self
            .inner
            .lock()
            .loaded
            .as_ref()
            .is_some_and(|l| l.bundle.current.location_name.to_lowercase() == query.to_lowercase());
        if already_loaded {
            debug!(query, "city already loaded");
            return Ok(LoadOutcome::Unchanged);
        }

        self.load_city(query).await
    }

    /// Load weather for the device location, or for [`FALLBACK_CITY`] when
    /// the location is unavailable.
    pub async fn load_from_location(
        &self,
        location: std::result::Result<Coordinates, LocationError>,
    ) -> Result<LoadOutcome> {
        let coordinates = match location {
            Ok(coordinates) => coordinates,
            Err(reason) => {
                warn!(error = %reason, fallback = FALLBACK_CITY, "location unavailable");
                self.emit(ViewEvent::Notice {
                    message: format!("{reason} Showing {FALLBACK_CITY} instead."),
                });
                return self.load_city(FALLBACK_CITY).await;
            }
        };

        coordinates.validate()?;
        let token = self.begin_request(&format!("{}, {}", coordinates.lat, coordinates.lon));

        match self.source.fetch_city_from_coordinates(coordinates).await {
            Ok(city) => {
                let stale = token != self.inner.lock().latest_request;
                if stale {
                    warn!(token, "discarding location lookup for superseded request");
                    return Ok(LoadOutcome::Superseded);
                }
                // Same request as the lookup: no second Loading event.
                debug!(token, %city, "location resolved");
                let result = self.source.fetch_weather(&city).await;
                self.complete_load(token, result)
            }
            Err(err) => {
                let mut inner = self.inner.lock();
                if token != inner.latest_request {
                    return Ok(LoadOutcome::Superseded);
                }
                self.record_failure(&mut inner, &err, LOCATION_LOOKUP_FAILED.to_string());
                drop(inner);

                self.emit(ViewEvent::Failed {
                    message: LOCATION_LOOKUP_FAILED.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Show the hourly forecast and theme for `date`, which must be one of
    /// the surfaced day keys. The current-conditions panel is unaffected.
    pub fn select_day(&self, date: &str) -> Result<()> {
        {
            let mut inner = self.inner.lock();
            let known = inner.loaded.as_ref().is_some_and(|l| l.days.contains(date));
            if !known {
                return Err(WeatherError::UnknownDay(date.to_string()));
            }

            inner.selected_date = Some(date.to_string());
            inner.theme_source = ThemeSource::Day(date.to_string());
        }

        self.emit(ViewEvent::DaySelected {
            date: date.to_string(),
        });
        Ok(())
    }

    /// Return the theme to live conditions and re-select the first day.
    /// Returns `false` when nothing is loaded.
    pub fn select_current(&self) -> bool {
        {
            let mut inner = self.inner.lock();
            if inner.loaded.is_none() {
                return false;
            }

            inner.selected_date = inner.first_date();
            inner.theme_source = ThemeSource::Current;
        }

        self.emit(ViewEvent::CurrentSelected);
        true
    }

    /// Returns `false` when `unit` was already active.
    pub fn set_unit(&self, unit: Unit) -> bool {
        {
            let mut inner = self.inner.lock();
            if inner.unit == unit {
                return false;
            }
            inner.unit = unit;
        }

        self.emit(ViewEvent::UnitChanged { unit });
        true
    }

    /// Debounced city search.
    ///
    /// Returns `Ok(None)` when a later keystroke superseded this query. A
    /// blank query cancels any pending search and yields no suggestions
    /// without contacting the provider.
    pub async fn city_suggestions(&self, query: &str) -> Result<Option<Vec<CitySuggestion>>> {
        let query = query.trim();
        if query.is_empty() {
            self.suggestions.cancel();
            return Ok(Some(Vec::new()));
        }

        if !self.suggestions.settle().await {
            debug!(query, "suggestion query superseded");
            return Ok(None);
        }

        match self.source.search_cities(query).await {
            Ok(matches) => Ok(Some(matches)),
            Err(err) => {
                warn!(error = %err, query, "city search failed");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::PresentationCategory;
    use crate::model::fixtures::{current_json, entry_json, forecast_json};
    use async_trait::async_trait;
    use serde_json::json;
    use std::{
        collections::HashMap,
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };
    use tokio::sync::oneshot;

    fn dhaka() -> WeatherBundle {
        let body = json!({
            "current": current_json("Dhaka", 30.4, "Clouds", "03d"),
            "forecast": forecast_json(),
        });
        WeatherBundle::from_payload(&body.to_string()).unwrap()
    }

    fn city(name: &str, temp: f64) -> WeatherBundle {
        let body = json!({
            "current": current_json(name, temp, "Clear", "01d"),
            "forecast": { "list": [entry_json("2024-06-05 12:00:00", temp, "Clear", "01d")] },
        });
        WeatherBundle::from_payload(&body.to_string()).unwrap()
    }

    fn six_days() -> WeatherBundle {
        let list: Vec<_> = (0..6)
            .map(|d| entry_json(&format!("2024-06-{:02} 12:00:00", 5 + d), 20.0, "Snow", "13d"))
            .collect();
        let body = json!({
            "current": current_json("Oslo", -1.0, "Snow", "13d"),
            "forecast": { "list": list },
        });
        WeatherBundle::from_payload(&body.to_string()).unwrap()
    }

    #[derive(Debug, Default)]
    struct FakeSource {
        bundles: Mutex<HashMap<String, Result<WeatherBundle>>>,
        gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
        city_at_location: Option<String>,
        suggestions: Vec<CitySuggestion>,
        fetch_calls: AtomicUsize,
        search_calls: AtomicUsize,
    }

    impl FakeSource {
        fn with(mut self, name: &str, result: Result<WeatherBundle>) -> Self {
            self.bundles.get_mut().insert(name.to_string(), result);
            self
        }

        /// Hold the response for `name` until the returned sender fires.
        fn gate(&self, name: &str) -> oneshot::Sender<()> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().insert(name.to_string(), rx);
            tx
        }
    }

    #[async_trait]
    impl WeatherSource for FakeSource {
        async fn fetch_weather(&self, city: &str) -> Result<WeatherBundle> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            let gate = self.gates.lock().remove(city);
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            self.bundles
                .lock()
                .get(city)
                .cloned()
                .unwrap_or_else(|| Err(WeatherError::NotFound(city.to_string())))
        }

        async fn fetch_city_from_coordinates(&self, coordinates: Coordinates) -> Result<String> {
            self.city_at_location
                .clone()
                .ok_or_else(|| WeatherError::NotFound(format!("{}, {}", coordinates.lat, coordinates.lon)))
        }

        async fn search_cities(&self, _query: &str) -> Result<Vec<CitySuggestion>> {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.suggestions.clone())
        }
    }

    fn view_model(source: FakeSource, policy: FailurePolicy) -> (Arc<FakeSource>, WeatherViewModel) {
        let source = Arc::new(source);
        let config = Config {
            failure_policy: policy,
            ..Config::default()
        };
        let vm = WeatherViewModel::new(source.clone(), &config);
        (source, vm)
    }

    #[tokio::test]
    async fn loading_dhaka_then_selecting_third_day() {
        let (_, vm) = view_model(FakeSource::default().with("Dhaka", Ok(dhaka())), FailurePolicy::Retain);

        assert_eq!(vm.phase(), Phase::Empty);
        assert_eq!(vm.load_city("Dhaka").await.unwrap(), LoadOutcome::Applied);
        assert_eq!(vm.phase(), Phase::Ready);
        assert_eq!(vm.selected_date().as_deref(), Some("2024-06-05"));

        let before = vm.render().unwrap().unwrap();
        assert_eq!(before.current.temperature, "30°");
        assert_eq!(before.days.len(), 5);
        assert!(before.days[0].selected);
        assert_eq!(before.theme.category, PresentationCategory::Cloudy);

        let third = vm.day_keys()[2].clone();
        assert_eq!(third, "2024-06-07");
        vm.select_day(&third).unwrap();

        let after = vm.render().unwrap().unwrap();
        let hourly = after.hourly.as_ref().unwrap();
        assert_eq!(hourly.date, "2024-06-07");
        assert_eq!(hourly.items.len(), 8);
        assert_eq!(hourly.items[0].time, "12:00 AM");
        assert_eq!(hourly.items[7].temperature, "33°");
        assert!(after.days[2].selected && !after.days[0].selected);
        assert_eq!(after.current, before.current);

        // Middle sample of each fixture day is a daytime rain slot.
        assert_eq!(after.theme.category, PresentationCategory::Rainy);
        assert!(after.theme.has_precipitation_animation);
        assert_eq!(after.theme.source, ThemeSource::Day("2024-06-07".into()));
    }

    #[tokio::test]
    async fn unknown_city_fails_with_city_in_message() {
        let (_, vm) = view_model(FakeSource::default().with("Dhaka", Ok(dhaka())), FailurePolicy::Retain);

        let err = vm.load_city("Nowhere123").await.unwrap_err();
        assert!(matches!(err, WeatherError::NotFound(_)));

        match vm.phase() {
            Phase::Failed { message } => assert!(message.contains("Nowhere123")),
            other => panic!("expected Failed, got {other:?}"),
        }
        assert!(matches!(vm.phase(), Phase::Failed { .. }));

        vm.load_city("Dhaka").await.unwrap();
        assert_eq!(vm.phase(), Phase::Ready);
    }

    #[tokio::test]
    async fn unit_round_trip_restores_strings() {
        let (_, vm) = view_model(FakeSource::default().with("Dhaka", Ok(dhaka())), FailurePolicy::Retain);
        vm.load_city("Dhaka").await.unwrap();

        let celsius = vm.render().unwrap().unwrap();

        assert!(vm.set_unit(Unit::Fahrenheit));
        assert!(!vm.set_unit(Unit::Fahrenheit));
        let fahrenheit = vm.render().unwrap().unwrap();
        assert_eq!(fahrenheit.current.temperature, "87°");
        assert!(fahrenheit.current.wind.ends_with("mph"));

        assert!(vm.set_unit(Unit::Celsius));
        assert_eq!(vm.render().unwrap().unwrap(), celsius);
    }

    #[tokio::test]
    async fn stale_success_is_discarded() {
        let source = FakeSource::default()
            .with("Paris", Ok(city("Paris", 18.0)))
            .with("Dhaka", Ok(dhaka()));
        let (source, vm) = view_model(source, FailurePolicy::Retain);
        let vm = Arc::new(vm);
        let release_paris = source.gate("Paris");

        let slow = tokio::spawn({
            let vm = Arc::clone(&vm);
            async move { vm.load_city("Paris").await }
        });
        tokio::task::yield_now().await;

        assert_eq!(vm.load_city("Dhaka").await.unwrap(), LoadOutcome::Applied);
        release_paris.send(()).unwrap();

        assert_eq!(slow.await.unwrap().unwrap(), LoadOutcome::Superseded);
        let state = vm.state();
        assert_eq!(state.phase, Phase::Ready);
        assert_eq!(state.data.unwrap().current.location_name, "Dhaka");
    }

    #[tokio::test]
    async fn stale_failure_does_not_fail_the_view() {
        let source = FakeSource::default().with("Dhaka", Ok(dhaka()));
        let (source, vm) = view_model(source, FailurePolicy::Clear);
        let vm = Arc::new(vm);
        let release = source.gate("Nowhere");

        let slow = tokio::spawn({
            let vm = Arc::clone(&vm);
            async move { vm.load_city("Nowhere").await }
        });
        tokio::task::yield_now().await;

        vm.load_city("Dhaka").await.unwrap();
        release.send(()).unwrap();

        assert_eq!(slow.await.unwrap().unwrap(), LoadOutcome::Superseded);
        assert_eq!(vm.phase(), Phase::Ready);
        assert!(vm.state().data.is_some());
    }

    #[tokio::test]
    async fn retain_policy_keeps_previous_data() {
        let (_, vm) = view_model(FakeSource::default().with("Dhaka", Ok(dhaka())), FailurePolicy::Retain);
        vm.load_city("Dhaka").await.unwrap();
        let _ = vm.load_city("Nowhere").await;

        assert!(matches!(vm.phase(), Phase::Failed { .. }));
        assert!(vm.state().data.is_some());
        assert!(vm.render().unwrap().is_some());
    }

    #[tokio::test]
    async fn clear_policy_drops_previous_data() {
        let (_, vm) = view_model(FakeSource::default().with("Dhaka", Ok(dhaka())), FailurePolicy::Clear);
        vm.load_city("Dhaka").await.unwrap();
        let _ = vm.load_city("Nowhere").await;

        let state = vm.state();
        assert!(matches!(state.phase, Phase::Failed { .. }));
        assert!(state.data.is_none());
        assert!(state.selected_date.is_none());
        assert!(vm.render().unwrap().is_none());
    }

    #[tokio::test]
    async fn upstream_failure_shows_generic_message() {
        let source = FakeSource::default().with(
            "Dhaka",
            Err(WeatherError::upstream("status 503 Service Unavailable")),
        );
        let (_, vm) = view_model(source, FailurePolicy::Retain);

        let _ = vm.load_city("Dhaka").await;
        match vm.phase() {
            Phase::Failed { message } => assert!(!message.contains("503")),
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn blank_city_is_rejected_without_fetching() {
        let (source, vm) = view_model(FakeSource::default(), FailurePolicy::Retain);

        let err = vm.load_city("   ").await.unwrap_err();
        assert!(matches!(err, WeatherError::Input(_)));
        assert_eq!(vm.phase(), Phase::Empty);
        assert_eq!(source.fetch_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn select_day_requires_surfaced_key() {
        let (_, vm) = view_model(FakeSource::default().with("Oslo", Ok(six_days())), FailurePolicy::Retain);
        assert!(matches!(vm.select_day("2024-06-05"), Err(WeatherError::UnknownDay(_))));

        vm.load_city("Oslo").await.unwrap();
        assert_eq!(vm.day_keys().len(), 5);
        assert!(vm.select_day("2024-06-09").is_ok());
        assert_eq!(
            vm.select_day("2024-06-10").unwrap_err(),
            WeatherError::UnknownDay("2024-06-10".into())
        );
        assert_eq!(vm.selected_date().as_deref(), Some("2024-06-09"));
    }

    #[tokio::test]
    async fn select_current_restores_live_theme() {
        let (_, vm) = view_model(FakeSource::default().with("Dhaka", Ok(dhaka())), FailurePolicy::Retain);
        assert!(!vm.select_current());

        vm.load_city("Dhaka").await.unwrap();
        vm.select_day("2024-06-08").unwrap();
        assert_eq!(vm.theme().unwrap().unwrap().category, PresentationCategory::Rainy);

        assert!(vm.select_current());
        let theme = vm.theme().unwrap().unwrap();
        assert_eq!(theme.source, ThemeSource::Current);
        assert_eq!(theme.category, PresentationCategory::Cloudy);
        assert_eq!(vm.selected_date().as_deref(), Some("2024-06-05"));
    }

    #[tokio::test]
    async fn submit_skips_city_already_loaded() {
        let (source, vm) = view_model(FakeSource::default().with("Dhaka", Ok(dhaka())), FailurePolicy::Retain);
        vm.load_city("Dhaka").await.unwrap();

        assert_eq!(vm.submit_search("  dhaka ").await.unwrap(), LoadOutcome::Unchanged);
        assert_eq!(source.fetch_calls.load(Ordering::SeqCst), 1);
        assert!(matches!(vm.submit_search("").await, Err(WeatherError::Input(_))));
    }

    #[tokio::test]
    async fn events_follow_load_lifecycle() {
        let (_, vm) = view_model(FakeSource::default().with("Dhaka", Ok(dhaka())), FailurePolicy::Retain);
        let mut rx = vm.subscribe();

        vm.load_city("Dhaka").await.unwrap();
        vm.set_unit(Unit::Fahrenheit);

        assert_eq!(rx.recv().await.unwrap(), ViewEvent::Loading { query: "Dhaka".into() });
        assert_eq!(rx.recv().await.unwrap(), ViewEvent::Ready { location: "Dhaka, BD".into() });
        assert_eq!(rx.recv().await.unwrap(), ViewEvent::UnitChanged { unit: Unit::Fahrenheit });
    }

    #[tokio::test]
    async fn denied_location_falls_back_to_default_city() {
        let (_, vm) = view_model(
            FakeSource::default().with(FALLBACK_CITY, Ok(dhaka())),
            FailurePolicy::Retain,
        );
        let mut rx = vm.subscribe();

        let outcome = vm.load_from_location(Err(LocationError::PermissionDenied)).await;
        assert_eq!(outcome.unwrap(), LoadOutcome::Applied);
        assert_eq!(vm.state().data.unwrap().current.location_name, FALLBACK_CITY);
        assert!(matches!(rx.recv().await.unwrap(), ViewEvent::Notice { .. }));
    }

    #[tokio::test]
    async fn resolved_location_is_loaded() {
        let source = FakeSource {
            city_at_location: Some("Paris".into()),
            ..FakeSource::default()
        }
        .with("Paris", Ok(city("Paris", 18.0)));
        let (_, vm) = view_model(source, FailurePolicy::Retain);

        vm.load_from_location(Ok(Coordinates::new(48.85, 2.35))).await.unwrap();
        assert_eq!(vm.state().data.unwrap().current.location_name, "Paris");
    }

    #[tokio::test]
    async fn resolved_location_announces_one_load() {
        let source = FakeSource {
            city_at_location: Some("Paris".into()),
            ..FakeSource::default()
        }
        .with("Paris", Ok(city("Paris", 18.0)));
        let (source, vm) = view_model(source, FailurePolicy::Retain);
        let mut rx = vm.subscribe();

        let outcome = vm.load_from_location(Ok(Coordinates::new(48.85, 2.35))).await;
        assert_eq!(outcome.unwrap(), LoadOutcome::Applied);
        assert_eq!(source.fetch_calls.load(Ordering::SeqCst), 1);

        assert!(matches!(rx.recv().await.unwrap(), ViewEvent::Loading { .. }));
        assert!(matches!(rx.recv().await.unwrap(), ViewEvent::Ready { .. }));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unresolvable_location_fails() {
        let (_, vm) = view_model(FakeSource::default(), FailurePolicy::Retain);

        let err = vm
            .load_from_location(Ok(Coordinates::new(0.0, 0.0)))
            .await
            .unwrap_err();
        assert!(matches!(err, WeatherError::NotFound(_)));
        assert_eq!(
            vm.phase(),
            Phase::Failed { message: LOCATION_LOOKUP_FAILED.to_string() }
        );
    }

    #[tokio::test]
    async fn invalid_coordinates_are_input_errors() {
        let (_, vm) = view_model(FakeSource::default(), FailurePolicy::Retain);
        let err = vm
            .load_from_location(Ok(Coordinates::new(f64::NAN, 0.0)))
            .await
            .unwrap_err();
        assert!(matches!(err, WeatherError::Input(_)));
        assert_eq!(vm.phase(), Phase::Empty);
    }

    #[tokio::test]
    async fn blank_suggestion_query_skips_provider() {
        let (source, vm) = view_model(FakeSource::default(), FailurePolicy::Retain);
        assert_eq!(vm.city_suggestions("   ").await.unwrap(), Some(Vec::new()));
        assert_eq!(source.search_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn suggestions_only_fire_for_last_keystroke() {
        let source = FakeSource {
            suggestions: vec![CitySuggestion {
                name: "Dhaka".into(),
                state: None,
                country: "BD".into(),
            }],
            ..FakeSource::default()
        };
        let (source, vm) = view_model(source, FailurePolicy::Retain);
        let vm = Arc::new(vm);

        let mut pending = Vec::new();
        for query in ["D", "Dh", "Dha"] {
            pending.push(tokio::spawn({
                let vm = Arc::clone(&vm);
                async move { vm.city_suggestions(query).await }
            }));
            tokio::task::yield_now().await;
            tokio::time::advance(Duration::from_millis(100)).await;
        }
        tokio::time::advance(Duration::from_millis(300)).await;

        let mut results = Vec::new();
        for handle in pending {
            results.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(results[0], None);
        assert_eq!(results[1], None);
        assert_eq!(results[2].as_ref().unwrap()[0].name, "Dhaka");
        assert_eq!(source.search_calls.load(Ordering::SeqCst), 1);
    }
}
