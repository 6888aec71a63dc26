//! Query intent and the aggregated planning result

use super::{Attraction, ResolvedLocation, WeatherReport};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the user asked for
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Weather,
    Places,
    #[default]
    Both,
}

impl Intent {
    #[must_use]
    pub fn wants_weather(self) -> bool {
        matches!(self, Intent::Weather | Intent::Both)
    }

    #[must_use]
    pub fn wants_places(self) -> bool {
        matches!(self, Intent::Places | Intent::Both)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Intent::Weather => "weather",
            Intent::Places => "places",
            Intent::Both => "both",
        };
        f.write_str(name)
    }
}

/// Outcome of one successful planning cycle
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AggregatedResult {
    /// Query as typed by the user, trimmed
    pub query: String,
    pub intent: Intent,
    pub location: ResolvedLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attractions: Option<Vec<Attraction>>,
    pub generated_at: DateTime<Utc>,
}
