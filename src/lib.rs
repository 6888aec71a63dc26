//! `TripPlanner` - weather and sightseeing plans from free-text travel queries
//!
//! A query such as "What's the weather in Paris?" is interpreted into a place
//! and an intent, the place is geocoded, and the requested lookups run
//! against Open-Meteo and Overpass. The outcome is one [`AggregatedResult`].

pub mod api;
pub mod config;
pub mod error;
pub mod geocoding;
pub mod http;
pub mod interpreter;
pub mod models;
pub mod orchestrator;
pub mod places;
pub mod telemetry;
pub mod weather;
pub mod web;

#[cfg(test)]
mod test_support;

// Re-export core types for public API
pub use config::TripPlannerConfig;
pub use error::TripError;
pub use geocoding::{Geocoder, NominatimGeocoder};
pub use http::{HttpClient, RetryPolicy};
pub use interpreter::{Interpretation, interpret};
pub use models::{AggregatedResult, Attraction, Intent, ResolvedLocation, WeatherReport};
pub use orchestrator::{Clock, Orchestrator, SystemClock};
pub use places::{OverpassPlaces, PlacesSource};
pub use weather::{OpenMeteoWeather, WeatherSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, TripError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
