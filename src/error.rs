//! Error types and handling for the trip planner

use thiserror::Error;

/// Main error type for the trip planner
#[derive(Error, Debug)]
pub enum TripError {
    /// Transport failure or server errors that outlasted the retry budget
    #[error("Network error: {message}")]
    Network { message: String },

    /// The query did not contain a usable place name
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Geocoding found no acceptable candidate for the place
    #[error("Place not found: {place}")]
    PlaceNotFound { place: String },

    /// A dependent provider failed or answered with an unexpected shape
    #[error("Data unavailable: {message}")]
    DataUnavailable { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Socket errors while binding or serving the web adapter
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl TripError {
    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a new invalid input error
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a new place-not-found error
    pub fn place_not_found<S: Into<String>>(place: S) -> Self {
        Self::PlaceNotFound {
            place: place.into(),
        }
    }

    /// Create a new data unavailable error
    pub fn data_unavailable<S: Into<String>>(message: S) -> Self {
        Self::DataUnavailable {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Stable machine-readable identifier
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            TripError::Network { .. } => "network_error",
            TripError::InvalidInput { .. } => "invalid_input",
            TripError::PlaceNotFound { .. } => "place_not_found",
            TripError::DataUnavailable { .. } => "data_unavailable",
            TripError::Config { .. } => "config_error",
            TripError::Io { .. } => "io_error",
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            TripError::Network { .. } => {
                "Unable to reach the planning services. The service might be temporarily unavailable."
                    .to_string()
            }
            TripError::InvalidInput { message } => message.clone(),
            TripError::PlaceNotFound { place } => format!(
                "I'm sorry, I don't know if a place called {place} exists. Please try a different location."
            ),
            TripError::DataUnavailable { .. } => {
                "Some trip details are currently unavailable.".to_string()
            }
            TripError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            TripError::Io { .. } => {
                "Local I/O failed. Check that the port is free and accessible.".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for TripError {
    fn from(err: reqwest::Error) -> Self {
        TripError::network(err.to_string())
    }
}

impl From<reqwest_middleware::Error> for TripError {
    fn from(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(e) => e.into(),
            reqwest_middleware::Error::Middleware(e) => match e.downcast::<TripError>() {
                Ok(trip) => trip,
                Err(other) => TripError::network(other.to_string()),
            },
        }
    }
}
