//! Nearby attraction model

use serde::{Deserialize, Serialize};

/// A named tourism point near the resolved location
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Attraction {
    pub name: String,
    /// Value of the OSM `tourism` tag (museum, viewpoint, ...)
    pub category: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Distance from the resolved location in kilometers
    pub distance_km: f64,
}

impl Attraction {
    /// Format distance for display
    #[must_use]
    pub fn format_distance(&self) -> String {
        if self.distance_km < 1.0 {
            format!("{:.0} m", self.distance_km * 1000.0)
        } else {
            format!("{:.1} km", self.distance_km)
        }
    }
}
