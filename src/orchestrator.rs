//! Query to plan: interpret, resolve, dispatch, aggregate

use crate::config::TripPlannerConfig;
use crate::geocoding::{Geocoder, NominatimGeocoder};
use crate::http::HttpClient;
use crate::interpreter::interpret;
use crate::models::{
    AggregatedResult, Attraction, Intent, ResolutionSource, ResolvedLocation, WeatherReport,
};
use crate::places::{OverpassPlaces, PlacesSource};
use crate::weather::{OpenMeteoWeather, WeatherSource};
use crate::{Result, TripError};
use chrono::{DateTime, Utc};
use futures::future::join;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Source of the `generated_at` timestamp
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Stages of one planning cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanState {
    Idle,
    Interpreting,
    Resolving,
    ResolvingFallback,
    Dispatching,
    Aggregating,
    Done,
    Failed,
}

impl fmt::Display for PlanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlanState::Idle => "idle",
            PlanState::Interpreting => "interpreting",
            PlanState::Resolving => "resolving",
            PlanState::ResolvingFallback => "resolving_fallback",
            PlanState::Dispatching => "dispatching",
            PlanState::Aggregating => "aggregating",
            PlanState::Done => "done",
            PlanState::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// Search parameters handed to the places lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacesSearch {
    pub radius_meters: u32,
    pub limit: usize,
}

impl Default for PlacesSearch {
    fn default() -> Self {
        Self {
            radius_meters: 5000,
            limit: 5,
        }
    }
}

/// Drives a query through the providers. Shared behind `Arc` by the adapters.
pub struct Orchestrator {
    geocoder: Arc<dyn Geocoder>,
    weather: Arc<dyn WeatherSource>,
    places: Arc<dyn PlacesSource>,
    search: PlacesSearch,
    clock: Arc<dyn Clock>,
}

impl Orchestrator {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        weather: Arc<dyn WeatherSource>,
        places: Arc<dyn PlacesSource>,
        search: PlacesSearch,
    ) -> Self {
        Self {
            geocoder,
            weather,
            places,
            search,
            clock: Arc::new(SystemClock),
        }
    }

    /// Production wiring: Nominatim, Open-Meteo and Overpass over one client
    pub fn from_config(config: &TripPlannerConfig) -> Result<Self> {
        let http = HttpClient::new(&config.http)?;
        Ok(Self::with_http(config, http))
    }

    /// Same wiring over a caller-provided client
    pub fn with_http(config: &TripPlannerConfig, http: HttpClient) -> Self {
        Self::new(
            Arc::new(NominatimGeocoder::new(http.clone(), config.geocoding.clone())),
            Arc::new(OpenMeteoWeather::new(http.clone(), config.weather.clone())),
            Arc::new(OverpassPlaces::new(http, config.places.clone())),
            PlacesSearch {
                radius_meters: config.places.radius_meters,
                limit: config.places.limit,
            },
        )
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Run one planning cycle. Only invalid input and an unresolvable place
    /// fail; provider trouble shows up inside the result.
    #[instrument(skip(self))]
    pub async fn plan(&self, input: &str) -> Result<AggregatedResult> {
        let mut state = PlanState::Idle;
        let outcome = self.run(input, &mut state).await;
        if let Err(e) = &outcome {
            transition(&mut state, PlanState::Failed);
            info!(code = e.code(), error = %e, "Planning failed");
        }
        outcome
    }

    async fn run(&self, input: &str, state: &mut PlanState) -> Result<AggregatedResult> {
        transition(state, PlanState::Interpreting);
        let query = input.trim();
        if query.is_empty() {
            return Err(TripError::invalid_input(
                "Please enter a destination or travel query.",
            ));
        }

        let interpretation = interpret(query);
        let place = interpretation.place;
        if place.chars().count() < 2 {
            return Err(TripError::invalid_input(
                "Please enter a valid place name (at least 2 characters).",
            ));
        }
        info!(place = %place, intent = %interpretation.intent, "Interpreted query");

        let location = self.resolve(&place, query, state).await?;
        info!(
            place = %location.display_name,
            coordinates = %location.format_coordinates(),
            source = ?location.source,
            "Resolved location"
        );

        transition(state, PlanState::Dispatching);
        let (weather, attractions) = self.dispatch(interpretation.intent, &location).await;

        transition(state, PlanState::Aggregating);
        match &weather {
            Some(report) if report.is_available() => debug!(
                temperature = ?report.format_temperature(),
                rain_chance = ?report.rain_chance_today(),
                "Weather attached"
            ),
            Some(_) => warn!(place = %location.display_name, "Weather unavailable for this plan"),
            None => {}
        }
        if attractions.as_ref().is_some_and(Vec::is_empty) {
            info!(place = %location.display_name, "No attractions found nearby");
        }

        let result = AggregatedResult {
            query: query.to_string(),
            intent: interpretation.intent,
            location,
            weather,
            attractions,
            generated_at: self.clock.now(),
        };
        transition(state, PlanState::Done);
        Ok(result)
    }

    async fn resolve(
        &self,
        place: &str,
        query: &str,
        state: &mut PlanState,
    ) -> Result<ResolvedLocation> {
        transition(state, PlanState::Resolving);
        if let Some(candidate) = self.geocoder.resolve(place).await {
            return Ok(ResolvedLocation::from_candidate(
                candidate,
                ResolutionSource::Extracted,
            ));
        }

        transition(state, PlanState::ResolvingFallback);
        debug!(place = %place, query = %query, "Retrying geocoding with the full query");
        match self.geocoder.resolve(query).await {
            Some(candidate) => Ok(ResolvedLocation::from_candidate(
                candidate,
                ResolutionSource::FullInput,
            )),
            None => Err(TripError::place_not_found(place)),
        }
    }

    async fn dispatch(
        &self,
        intent: Intent,
        location: &ResolvedLocation,
    ) -> (Option<WeatherReport>, Option<Vec<Attraction>>) {
        let (latitude, longitude) = (location.latitude, location.longitude);
        let PlacesSearch {
            radius_meters,
            limit,
        } = self.search;

        // a branch the intent does not ask for resolves to None without a call
        let weather = async {
            if intent.wants_weather() {
                Some(self.weather.fetch_weather(latitude, longitude).await)
            } else {
                None
            }
        };
        let places = async {
            if intent.wants_places() {
                Some(
                    self.places
                        .fetch_places(latitude, longitude, radius_meters, limit)
                        .await,
                )
            } else {
                None
            }
        };

        join(weather, places).await
    }
}

fn transition(state: &mut PlanState, next: PlanState) {
    debug!(from = %state, to = %next, "Planning state change");
    *state = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeGeocoder, FakePlaces, FakeWeather, FixedClock, candidate};

    struct Harness {
        geocoder: Arc<FakeGeocoder>,
        weather: Arc<FakeWeather>,
        places: Arc<FakePlaces>,
        orchestrator: Orchestrator,
    }

    fn harness(geocoder: FakeGeocoder, weather: FakeWeather) -> Harness {
        let geocoder = Arc::new(geocoder);
        let weather = Arc::new(weather);
        let places = Arc::new(FakePlaces::paris());
        let orchestrator = Orchestrator::new(
            geocoder.clone(),
            weather.clone(),
            places.clone(),
            PlacesSearch::default(),
        )
        .with_clock(Arc::new(FixedClock));
        Harness {
            geocoder,
            weather,
            places,
            orchestrator,
        }
    }

    fn paris_harness() -> Harness {
        harness(
            FakeGeocoder::knowing(&[("Paris", candidate("Paris, Ile-de-France, France"))]),
            FakeWeather::available(),
        )
    }

    #[tokio::test]
    async fn test_weather_intent_calls_only_weather() {
        let h = paris_harness();
        let result = h.orchestrator.plan("What's the weather in Paris?").await.unwrap();

        assert_eq!(result.intent, Intent::Weather);
        assert_eq!(result.location.display_name, "Paris");
        assert_eq!(result.location.source, ResolutionSource::Extracted);
        assert!(result.weather.is_some_and(|w| w.is_available()));
        assert!(result.attractions.is_none());
        assert_eq!(h.weather.calls(), 1);
        assert_eq!(h.places.calls(), 0);
    }

    #[tokio::test]
    async fn test_places_intent_calls_only_places() {
        let h = paris_harness();
        let result = h.orchestrator.plan("Show me places to visit in Paris").await.unwrap();

        assert_eq!(result.intent, Intent::Places);
        assert!(result.weather.is_none());
        assert_eq!(result.attractions.map(|a| a.len()), Some(2));
        assert_eq!(h.weather.calls(), 0);
        assert_eq!(h.places.calls(), 1);
        assert_eq!(h.places.last_search(), Some((5000, 5)));
    }

    #[tokio::test]
    async fn test_both_intent_calls_both_once() {
        let h = paris_harness();
        let result = h.orchestrator.plan("Paris weather and attractions").await.unwrap();

        assert_eq!(result.intent, Intent::Both);
        assert!(result.weather.is_some());
        assert!(result.attractions.is_some());
        assert_eq!(h.weather.calls(), 1);
        assert_eq!(h.places.calls(), 1);
    }

    #[tokio::test]
    async fn test_unresolvable_place_fails_without_lookups() {
        let h = harness(FakeGeocoder::knowing(&[]), FakeWeather::available());
        let err = h.orchestrator.plan("Trip to Atlantis").await.unwrap_err();

        assert!(matches!(&err, TripError::PlaceNotFound { place } if place == "Atlantis"));
        assert!(err.user_message().contains("Atlantis"));
        assert_eq!(h.geocoder.queries(), vec!["Atlantis", "Trip to Atlantis"]);
        assert_eq!(h.weather.calls(), 0);
        assert_eq!(h.places.calls(), 0);
    }

    #[tokio::test]
    async fn test_fallback_to_full_query() {
        let h = harness(
            FakeGeocoder::knowing(&[(
                "visit Springfield Gardens",
                candidate("Springfield Gardens, Queens, New York"),
            )]),
            FakeWeather::available(),
        );
        let result = h.orchestrator.plan("  visit Springfield Gardens ").await.unwrap();

        assert_eq!(result.location.source, ResolutionSource::FullInput);
        assert_eq!(result.location.display_name, "Springfield Gardens");
        assert_eq!(h.geocoder.queries().len(), 2);
    }

    #[tokio::test]
    async fn test_blank_input_is_invalid() {
        let h = paris_harness();
        let err = h.orchestrator.plan("   ").await.unwrap_err();
        assert!(matches!(err, TripError::InvalidInput { .. }));
        assert!(h.geocoder.queries().is_empty());
    }

    #[tokio::test]
    async fn test_one_letter_place_is_invalid() {
        let h = paris_harness();
        let err = h.orchestrator.plan("x").await.unwrap_err();
        assert!(matches!(err, TripError::InvalidInput { .. }));
        assert!(h.geocoder.queries().is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_weather_does_not_widen_intent() {
        let h = harness(
            FakeGeocoder::knowing(&[("Paris", candidate("Paris, France"))]),
            FakeWeather::unavailable(),
        );
        let result = h.orchestrator.plan("What's the weather in Paris?").await.unwrap();

        assert!(matches!(result.weather, Some(WeatherReport::Unavailable { .. })));
        assert!(result.attractions.is_none());
        assert_eq!(h.places.calls(), 0);
    }

    #[tokio::test]
    async fn test_repeated_plans_are_identical() {
        let h = paris_harness();
        let first = h.orchestrator.plan("Paris").await.unwrap();
        let second = h.orchestrator.plan("Paris").await.unwrap();
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_state_names() {
        assert_eq!(PlanState::ResolvingFallback.to_string(), "resolving_fallback");
        assert_eq!(PlanState::Done.to_string(), "done");
    }
}
