//! In-memory providers for orchestrator and api tests

use crate::geocoding::Geocoder;
use crate::models::{
    Attraction, CurrentConditions, PlaceCandidate, WeatherReport, WeatherUnits,
};
use crate::orchestrator::Clock;
use crate::places::PlacesSource;
use crate::weather::WeatherSource;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn candidate(display_name: &str) -> PlaceCandidate {
    PlaceCandidate::new(48.8566, 2.3522, 16, 0.9, display_name.to_string())
}

/// Answers only the exact names it was given
#[derive(Default)]
pub struct FakeGeocoder {
    known: HashMap<String, PlaceCandidate>,
    queries: Mutex<Vec<String>>,
}

impl FakeGeocoder {
    pub fn knowing(places: &[(&str, PlaceCandidate)]) -> Self {
        Self {
            known: places
                .iter()
                .map(|(name, candidate)| ((*name).to_string(), candidate.clone()))
                .collect(),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn resolve(&self, place_name: &str) -> Option<PlaceCandidate> {
        self.queries.lock().unwrap().push(place_name.to_string());
        self.known.get(place_name).cloned()
    }
}

pub struct FakeWeather {
    report: WeatherReport,
    calls: AtomicUsize,
}

impl FakeWeather {
    pub fn available() -> Self {
        Self {
            report: WeatherReport::Available {
                current: CurrentConditions {
                    time: "2026-10-14T14:00".to_string(),
                    temperature: 17.4,
                    apparent_temperature: Some(16.1),
                    humidity: Some(62.0),
                    wind_speed: Some(11.2),
                    weather_code: 2,
                    condition: "Partly cloudy".to_string(),
                    icon: "cloud-sun".to_string(),
                },
                daily: Vec::new(),
                units: WeatherUnits::default(),
            },
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            report: WeatherReport::unavailable("Network error: connection refused"),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherSource for FakeWeather {
    async fn fetch_weather(&self, _latitude: f64, _longitude: f64) -> WeatherReport {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.report.clone()
    }
}

pub struct FakePlaces {
    attractions: Vec<Attraction>,
    calls: AtomicUsize,
    last_search: Mutex<Option<(u32, usize)>>,
}

impl FakePlaces {
    pub fn paris() -> Self {
        let attraction = |name: &str, category: &str, distance_km: f64| Attraction {
            name: name.to_string(),
            category: category.to_string(),
            latitude: 48.86,
            longitude: 2.34,
            distance_km,
        };
        Self {
            attractions: vec![
                attraction("Louvre", "museum", 1.2),
                attraction("Eiffel Tower", "attraction", 4.1),
            ],
            calls: AtomicUsize::new(0),
            last_search: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Radius and limit of the most recent lookup
    pub fn last_search(&self) -> Option<(u32, usize)> {
        *self.last_search.lock().unwrap()
    }
}

#[async_trait]
impl PlacesSource for FakePlaces {
    async fn fetch_places(
        &self,
        _latitude: f64,
        _longitude: f64,
        radius_meters: u32,
        limit: usize,
    ) -> Vec<Attraction> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_search.lock().unwrap() = Some((radius_meters, limit));
        self.attractions.iter().take(limit).cloned().collect()
    }
}

pub struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 14, 12, 0, 0).unwrap()
    }
}
