//! Data models for the trip planner
//!
//! This module contains the core domain models organized by concern:
//! - Location: geocoding candidates and the resolved location
//! - Weather: current conditions, forecast days and the weather code table
//! - Attraction: nearby points of interest
//! - Plan: query intent and the aggregated result

pub mod attraction;
pub mod location;
pub mod plan;
pub mod weather;

// Re-export all public types for convenient access
pub use attraction::Attraction;
pub use location::{distance_km, PlaceCandidate, PlaceValidation, ResolutionSource, ResolvedLocation};
pub use plan::{AggregatedResult, Intent};
pub use weather::{CurrentConditions, DailyForecast, WeatherCondition, WeatherReport, WeatherUnits};
