//! Location models produced by geocoding

use haversine::{Location as HaversineLocation, Units, distance};
use serde::{Deserialize, Serialize};

/// A geocoding candidate that passed the selection policy
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlaceCandidate {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Provider place rank (lower is broader: countries, states, cities, ...)
    pub rank: u32,
    /// Provider importance score, 0 when the provider gave none
    pub importance: f64,
    /// Full provider display name ("Paris, Ile-de-France, France")
    pub display_name: String,
    /// Text before the first comma of the display name
    pub primary_name: String,
}

impl PlaceCandidate {
    /// Primary name is taken from the display name up to the first comma
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, rank: u32, importance: f64, display_name: String) -> Self {
        let primary_name = display_name
            .split(',')
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();
        Self {
            latitude,
            longitude,
            rank,
            importance,
            display_name,
            primary_name,
        }
    }
}

/// Uniform success/failure record for a place lookup
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlaceValidation {
    pub is_valid: bool,
    pub coordinates: Option<PlaceCandidate>,
    pub display_name: Option<String>,
    pub error_message: Option<String>,
}

impl PlaceValidation {
    #[must_use]
    pub fn found(candidate: PlaceCandidate) -> Self {
        Self {
            is_valid: true,
            display_name: Some(candidate.primary_name.clone()),
            coordinates: Some(candidate),
            error_message: None,
        }
    }

    #[must_use]
    pub fn not_found(place_name: &str) -> Self {
        Self {
            is_valid: false,
            coordinates: None,
            display_name: None,
            error_message: Some(format!(
                "Place \"{place_name}\" not found or not significant enough."
            )),
        }
    }
}

/// Which text produced the resolved location
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    /// The place name extracted from the query
    Extracted,
    /// The whole query, tried after the extracted name failed
    FullInput,
}

/// Location a plan is built around
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ResolvedLocation {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Short name shown to the user
    pub display_name: String,
    /// Full provider display name
    pub full_name: String,
    pub source: ResolutionSource,
}

impl ResolvedLocation {
    #[must_use]
    pub fn from_candidate(candidate: PlaceCandidate, source: ResolutionSource) -> Self {
        Self {
            latitude: candidate.latitude,
            longitude: candidate.longitude,
            display_name: candidate.primary_name,
            full_name: candidate.display_name,
            source,
        }
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Great-circle distance between two points in kilometers
#[must_use]
pub fn distance_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    distance(
        HaversineLocation {
            latitude: from.0,
            longitude: from.1,
        },
        HaversineLocation {
            latitude: to.0,
            longitude: to.1,
        },
        Units::Kilometers,
    )
}
