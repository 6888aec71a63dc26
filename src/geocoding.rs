//! Place name resolution via Nominatim
//!
//! Candidate selection prefers the most important result whose place rank
//! lies inside the configured band (cities, towns and similar by default).

use crate::Result;
use crate::TripError;
use crate::config::GeocodingConfig;
use crate::http::HttpClient;
use crate::interpreter::clean_place_name;
use crate::models::{PlaceCandidate, PlaceValidation};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

/// Resolves place names to coordinates
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Best acceptable candidate, or `None` when nothing qualifies or the
    /// provider could not be reached
    async fn resolve(&self, place_name: &str) -> Option<PlaceCandidate>;

    /// Same lookup wrapped in a uniform success/failure record
    async fn validate(&self, place_name: &str) -> PlaceValidation {
        match self.resolve(place_name).await {
            Some(candidate) => PlaceValidation::found(candidate),
            None => PlaceValidation::not_found(place_name),
        }
    }
}

/// Inclusive range of acceptable place ranks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankBand {
    pub min: u32,
    pub max: u32,
}

impl RankBand {
    #[must_use]
    pub fn contains(&self, rank: Option<i64>) -> bool {
        rank.is_some_and(|rank| rank >= i64::from(self.min) && rank <= i64::from(self.max))
    }
}

impl Default for RankBand {
    fn default() -> Self {
        Self { min: 1, max: 20 }
    }
}

/// One geocoding result with leniently parsed fields
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodingHit {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub display_name: String,
    /// 0 when the provider sent nothing usable
    pub importance: f64,
    pub rank: Option<i64>,
}

/// Pick the best hit: the first one, replaced by any later hit that is
/// strictly more important and inside the band. The winner must itself be
/// inside the band and carry coordinates.
#[must_use]
pub fn select_candidate(hits: &[GeocodingHit], band: RankBand) -> Option<PlaceCandidate> {
    let mut best = hits.first()?;
    for hit in hits {
        if hit.importance > best.importance && band.contains(hit.rank) {
            best = hit;
        }
    }

    if !band.contains(best.rank) {
        debug!(
            rank = ?best.rank,
            name = %best.display_name,
            "Best geocoding hit outside the accepted rank band"
        );
        return None;
    }

    let (Some(latitude), Some(longitude)) = (best.latitude, best.longitude) else {
        warn!(name = %best.display_name, "Best geocoding hit has no usable coordinates");
        return None;
    };

    let rank = u32::try_from(best.rank?).ok()?;
    Some(PlaceCandidate::new(
        latitude,
        longitude,
        rank,
        best.importance,
        best.display_name.clone(),
    ))
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    #[serde(default)]
    lat: Value,
    #[serde(default)]
    lon: Value,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    importance: Value,
    #[serde(default)]
    place_rank: Value,
}

// Nominatim sends coordinates as strings and scores as numbers, but either
// may show up in the other form.
fn lenient_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|number| number.is_finite())
}

impl From<NominatimPlace> for GeocodingHit {
    fn from(place: NominatimPlace) -> Self {
        Self {
            latitude: lenient_number(&place.lat),
            longitude: lenient_number(&place.lon),
            importance: lenient_number(&place.importance).unwrap_or(0.0),
            rank: lenient_number(&place.place_rank).map(|rank| rank.trunc() as i64),
            display_name: place.display_name,
        }
    }
}

/// Nominatim search client
pub struct NominatimGeocoder {
    http: HttpClient,
    config: GeocodingConfig,
}

impl NominatimGeocoder {
    #[must_use]
    pub fn new(http: HttpClient, config: GeocodingConfig) -> Self {
        Self { http, config }
    }

    fn band(&self) -> RankBand {
        RankBand {
            min: self.config.min_rank,
            max: self.config.max_rank,
        }
    }

    async fn search(&self, query: &str) -> Result<Vec<GeocodingHit>> {
        let url = format!(
            "{}/search?format=json&q={}&limit={}",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(query),
            self.config.candidate_limit
        );

        let response = self.http.send(self.http.get(&url)).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TripError::data_unavailable(format!(
                "Geocoding request returned HTTP {status}"
            )));
        }

        let places: Vec<NominatimPlace> = response.json().await.map_err(|e| {
            TripError::data_unavailable(format!("Invalid geocoding response: {e}"))
        })?;

        Ok(places.into_iter().map(GeocodingHit::from).collect())
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    #[instrument(skip(self))]
    async fn resolve(&self, place_name: &str) -> Option<PlaceCandidate> {
        let query = clean_place_name(place_name);
        if query.is_empty() {
            return None;
        }

        debug!(query = %query, "Geocoding place");
        let hits = match self.search(&query).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!(query = %query, error = %e, "Geocoding failed");
                return None;
            }
        };

        debug!(query = %query, count = hits.len(), "Geocoding results received");
        let selected = select_candidate(&hits, self.band());
        match &selected {
            Some(candidate) => info!(
                name = %candidate.display_name,
                rank = candidate.rank,
                "Selected place"
            ),
            None => info!(query = %query, "No acceptable geocoding result"),
        }
        selected
    }
}
