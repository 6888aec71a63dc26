//! Nearby tourism points from the Overpass API

use crate::Result;
use crate::TripError;
use crate::config::PlacesConfig;
use crate::http::HttpClient;
use crate::models::{Attraction, distance_km};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument, warn};

/// Attraction lookup around a coordinate pair
#[async_trait]
pub trait PlacesSource: Send + Sync {
    /// At most `limit` named attractions within `radius_meters`.
    /// Provider problems yield an empty list.
    async fn fetch_places(
        &self,
        latitude: f64,
        longitude: f64,
        radius_meters: u32,
        limit: usize,
    ) -> Vec<Attraction>;
}

pub struct OverpassPlaces {
    http: HttpClient,
    config: PlacesConfig,
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    lat: Option<f64>,
    lon: Option<f64>,
    /// Ways only carry a center when queried with `out center`
    center: Option<OverpassCenter>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct OverpassCenter {
    lat: f64,
    lon: f64,
}

impl OverpassElement {
    fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lon, &self.center) {
            (Some(lat), Some(lon), _) => Some((lat, lon)),
            (_, _, Some(center)) => Some((center.lat, center.lon)),
            _ => None,
        }
    }
}

/// `tourism` tag values counted as attractions
pub const ATTRACTION_KINDS: [&str; 6] = [
    "attraction",
    "museum",
    "theme_park",
    "zoo",
    "viewpoint",
    "historical",
];

/// Overpass QL for attraction nodes and ways around a point
#[must_use]
pub fn build_query(latitude: f64, longitude: f64, radius_meters: u32, limit: usize) -> String {
    let filter = format!("[\"tourism\"~\"{}\"]", ATTRACTION_KINDS.join("|"));
    let around = format!("around:{radius_meters},{latitude},{longitude}");
    format!(
        "[out:json][timeout:25];(node{filter}({around});way{filter}({around}););out center {limit};"
    )
}

// Unnamed and coordinate-less elements are dropped, as are tourism values
// outside ATTRACTION_KINDS. Names are deduplicated keeping the first occurrence.
fn collect_attractions(
    elements: Vec<OverpassElement>,
    origin: (f64, f64),
    limit: usize,
) -> Vec<Attraction> {
    let mut seen = HashSet::new();
    elements
        .into_iter()
        .filter_map(|element| {
            let (latitude, longitude) = element.coordinates()?;
            let mut tags = element.tags;
            let name = tags.remove("name").filter(|name| !name.trim().is_empty())?;
            let category = tags
                .remove("tourism")
                .unwrap_or_else(|| "attraction".to_string());
            if !ATTRACTION_KINDS.contains(&category.as_str()) {
                return None;
            }
            Some(Attraction {
                distance_km: distance_km(origin, (latitude, longitude)),
                name,
                category,
                latitude,
                longitude,
            })
        })
        .filter(|attraction| seen.insert(attraction.name.clone()))
        .take(limit)
        .collect()
}

impl OverpassPlaces {
    #[must_use]
    pub fn new(http: HttpClient, config: PlacesConfig) -> Self {
        Self { http, config }
    }

    async fn query(
        &self,
        latitude: f64,
        longitude: f64,
        radius_meters: u32,
        limit: usize,
    ) -> Result<Vec<Attraction>> {
        let url = format!("{}/interpreter", self.config.base_url.trim_end_matches('/'));
        let query = build_query(latitude, longitude, radius_meters, limit);
        let request = self.http.post(&url).form(&[("data", query)]);

        let response = self.http.send(request).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TripError::data_unavailable(format!(
                "Places request returned HTTP {status}"
            )));
        }

        let body: OverpassResponse = response
            .json()
            .await
            .map_err(|e| TripError::data_unavailable(format!("Invalid places response: {e}")))?;

        debug!(elements = body.elements.len(), "Places response received");
        Ok(collect_attractions(body.elements, (latitude, longitude), limit))
    }
}

#[async_trait]
impl PlacesSource for OverpassPlaces {
    #[instrument(skip(self))]
    async fn fetch_places(
        &self,
        latitude: f64,
        longitude: f64,
        radius_meters: u32,
        limit: usize,
    ) -> Vec<Attraction> {
        if limit == 0 {
            return Vec::new();
        }
        match self.query(latitude, longitude, radius_meters, limit).await {
            Ok(attractions) => attractions,
            Err(e) => {
                warn!(error = %e, "Places lookup failed");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ORIGIN: (f64, f64) = (48.8566, 2.3522);

    fn elements(value: serde_json::Value) -> Vec<OverpassElement> {
        serde_json::from_value::<OverpassResponse>(value).unwrap().elements
    }

    #[test]
    fn test_build_query() {
        let query = build_query(48.8566, 2.3522, 5000, 5);
        assert!(query.starts_with("[out:json][timeout:25];"));
        assert!(query.contains(
            "node[\"tourism\"~\"attraction|museum|theme_park|zoo|viewpoint|historical\"](around:5000,48.8566,2.3522);"
        ));
        assert!(query.contains(
            "way[\"tourism\"~\"attraction|museum|theme_park|zoo|viewpoint|historical\"](around:5000,48.8566,2.3522);"
        ));
        assert!(!query.contains("relation"));
        assert!(query.ends_with("out center 5;"));
    }

    #[test]
    fn test_collect_filters_dedupes_and_limits() {
        let elements = elements(json!({
            "elements": [
                {"type": "node", "lat": 48.8606, "lon": 2.3376, "tags": {"name": "Louvre", "tourism": "museum"}},
                {"type": "node", "lat": 48.86, "lon": 2.33, "tags": {"tourism": "artwork"}},
                {"type": "way", "center": {"lat": 48.8584, "lon": 2.2945}, "tags": {"name": "Eiffel Tower", "tourism": "attraction"}},
                {"type": "node", "lat": 48.8607, "lon": 2.3377, "tags": {"name": "Louvre", "tourism": "museum"}},
                {"type": "relation", "tags": {"name": "No Coordinates"}},
                {"type": "node", "lat": 48.853, "lon": 2.3499, "tags": {"name": "Notre-Dame"}},
                {"type": "node", "lat": 48.8867, "lon": 2.3431, "tags": {"name": "Sacre-Coeur", "tourism": "viewpoint"}}
            ]
        }));

        let attractions = collect_attractions(elements, ORIGIN, 3);
        let names: Vec<&str> = attractions.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Louvre", "Eiffel Tower", "Notre-Dame"]);
        assert_eq!(attractions[1].latitude, 48.8584);
        assert_eq!(attractions[2].category, "attraction");
        assert!(attractions.iter().all(|a| a.distance_km < 10.0));
    }

    #[test]
    fn test_collect_drops_non_attraction_tourism_values() {
        let elements = elements(json!({
            "elements": [
                {"type": "node", "lat": 48.8524, "lon": 2.3266, "tags": {"name": "Hotel Lutetia", "tourism": "hotel"}},
                {"type": "node", "lat": 48.8606, "lon": 2.3376, "tags": {"name": "Info Point", "tourism": "information"}},
                {"type": "way", "center": {"lat": 48.8462, "lon": 2.3371}, "tags": {"name": "Jardin des Plantes Zoo", "tourism": "zoo"}}
            ]
        }));

        let attractions = collect_attractions(elements, ORIGIN, 5);
        let names: Vec<&str> = attractions.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Jardin des Plantes Zoo"]);
    }

    #[test]
    fn test_empty_response() {
        let elements = elements(json!({}));
        assert!(collect_attractions(elements, ORIGIN, 5).is_empty());
    }
}
