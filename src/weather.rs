//! Current conditions and short forecast from Open-Meteo

use crate::Result;
use crate::TripError;
use crate::config::WeatherConfig;
use crate::http::HttpClient;
use crate::models::WeatherReport;
use async_trait::async_trait;
use tracing::{debug, instrument, warn};

const CURRENT_FIELDS: &str =
    "temperature_2m,apparent_temperature,relative_humidity_2m,wind_speed_10m,weather_code";
const DAILY_FIELDS: &str =
    "weather_code,temperature_2m_max,temperature_2m_min,precipitation_probability_max";

/// Weather lookup for a coordinate pair
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Never fails: provider problems come back as [`WeatherReport::Unavailable`]
    async fn fetch_weather(&self, latitude: f64, longitude: f64) -> WeatherReport;
}

pub struct OpenMeteoWeather {
    http: HttpClient,
    config: WeatherConfig,
}

impl OpenMeteoWeather {
    #[must_use]
    pub fn new(http: HttpClient, config: WeatherConfig) -> Self {
        Self { http, config }
    }

    fn forecast_url(&self, latitude: f64, longitude: f64) -> String {
        format!(
            "{}/forecast?latitude={}&longitude={}&current={}&daily={}&forecast_days={}&timezone=auto",
            self.config.base_url.trim_end_matches('/'),
            latitude,
            longitude,
            CURRENT_FIELDS,
            DAILY_FIELDS,
            self.config.forecast_days
        )
    }

    async fn try_fetch(&self, latitude: f64, longitude: f64) -> Result<WeatherReport> {
        let url = self.forecast_url(latitude, longitude);
        let response = self.http.send(self.http.get(&url)).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TripError::data_unavailable(format!(
                "Weather request returned HTTP {status}"
            )));
        }

        let forecast: openmeteo::ForecastResponse = response
            .json()
            .await
            .map_err(|e| TripError::data_unavailable(format!("Invalid weather response: {e}")))?;

        forecast.into_report()
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoWeather {
    #[instrument(skip(self))]
    async fn fetch_weather(&self, latitude: f64, longitude: f64) -> WeatherReport {
        match self.try_fetch(latitude, longitude).await {
            Ok(report) => {
                debug!("Weather report received");
                report
            }
            Err(e) => {
                warn!(error = %e, "Weather lookup failed");
                WeatherReport::unavailable(e.to_string())
            }
        }
    }
}

/// `OpenMeteo` API response structures and conversion
mod openmeteo {
    use crate::Result;
    use crate::TripError;
    use crate::models::{
        CurrentConditions, DailyForecast, WeatherCondition, WeatherReport, WeatherUnits,
    };
    use chrono::NaiveDate;
    use serde::Deserialize;
    use tracing::debug;

    #[derive(Debug, Deserialize)]
    pub struct ForecastResponse {
        pub current: Option<CurrentData>,
        pub current_units: Option<CurrentUnits>,
        pub daily: Option<DailyData>,
    }

    #[derive(Debug, Deserialize)]
    pub struct CurrentData {
        #[serde(default)]
        pub time: String,
        #[serde(rename = "temperature_2m")]
        pub temperature: f64,
        pub apparent_temperature: Option<f64>,
        #[serde(rename = "relative_humidity_2m")]
        pub humidity: Option<f64>,
        #[serde(rename = "wind_speed_10m")]
        pub wind_speed: Option<f64>,
        pub weather_code: u8,
    }

    #[derive(Debug, Deserialize)]
    pub struct CurrentUnits {
        #[serde(rename = "temperature_2m")]
        pub temperature: Option<String>,
        #[serde(rename = "wind_speed_10m")]
        pub wind_speed: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct DailyData {
        pub time: Vec<String>,
        pub weather_code: Option<Vec<Option<u8>>>,
        #[serde(rename = "temperature_2m_max")]
        pub temperature_max: Option<Vec<Option<f64>>>,
        #[serde(rename = "temperature_2m_min")]
        pub temperature_min: Option<Vec<Option<f64>>>,
        pub precipitation_probability_max: Option<Vec<Option<f64>>>,
    }

    fn value_at<T: Copy>(values: Option<&Vec<Option<T>>>, index: usize) -> Option<T> {
        values.and_then(|values| values.get(index).copied().flatten())
    }

    impl DailyData {
        fn into_days(self) -> Vec<DailyForecast> {
            self.time
                .iter()
                .enumerate()
                .filter_map(|(index, day)| {
                    let Ok(date) = NaiveDate::parse_from_str(day, "%Y-%m-%d") else {
                        debug!(day = %day, "Skipping forecast day with unparseable date");
                        return None;
                    };
                    let weather_code = value_at(self.weather_code.as_ref(), index);
                    let condition = WeatherCondition::from_wmo_code(weather_code.unwrap_or(u8::MAX));
                    Some(DailyForecast {
                        date,
                        temperature_max: value_at(self.temperature_max.as_ref(), index),
                        temperature_min: value_at(self.temperature_min.as_ref(), index),
                        precipitation_probability_max: value_at(
                            self.precipitation_probability_max.as_ref(),
                            index,
                        ),
                        weather_code,
                        condition: condition.name.to_string(),
                        icon: condition.icon.to_string(),
                    })
                })
                .collect()
        }
    }

    impl ForecastResponse {
        /// Both the current and daily blocks are required
        pub fn into_report(self) -> Result<WeatherReport> {
            let current = self
                .current
                .ok_or_else(|| TripError::data_unavailable("Weather response has no current conditions"))?;
            let daily = self
                .daily
                .ok_or_else(|| TripError::data_unavailable("Weather response has no daily forecast"))?;

            let defaults = WeatherUnits::default();
            let units = match self.current_units {
                Some(units) => WeatherUnits {
                    temperature: units.temperature.unwrap_or(defaults.temperature),
                    wind_speed: units.wind_speed.unwrap_or(defaults.wind_speed),
                },
                None => defaults,
            };

            let condition = WeatherCondition::from_wmo_code(current.weather_code);
            Ok(WeatherReport::Available {
                current: CurrentConditions {
                    time: current.time,
                    temperature: current.temperature,
                    apparent_temperature: current.apparent_temperature,
                    humidity: current.humidity,
                    wind_speed: current.wind_speed,
                    weather_code: current.weather_code,
                    condition: condition.name.to_string(),
                    icon: condition.icon.to_string(),
                },
                daily: daily.into_days(),
                units,
            })
        }
    }
}
