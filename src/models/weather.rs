//! Weather report model and WMO weather code table

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Human-readable condition and icon for a WMO weather code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeatherCondition {
    pub name: &'static str,
    pub icon: &'static str,
}

impl WeatherCondition {
    const fn new(name: &'static str, icon: &'static str) -> Self {
        Self { name, icon }
    }

    /// Map an Open-Meteo weather code to condition and icon.
    /// See: https://open-meteo.com/en/docs#weathervariables
    #[must_use]
    pub fn from_wmo_code(code: u8) -> Self {
        match code {
            0 => Self::new("Clear sky", "sun"),
            1 => Self::new("Mainly clear", "sun"),
            2 => Self::new("Partly cloudy", "cloud-sun"),
            3 => Self::new("Overcast", "cloud"),
            45 => Self::new("Fog", "cloud-fog"),
            48 => Self::new("Depositing rime fog", "cloud-fog"),
            51 => Self::new("Light drizzle", "cloud-drizzle"),
            53 => Self::new("Moderate drizzle", "cloud-drizzle"),
            55 => Self::new("Dense drizzle", "cloud-drizzle"),
            56 => Self::new("Light freezing drizzle", "cloud-drizzle"),
            57 => Self::new("Dense freezing drizzle", "cloud-drizzle"),
            61 => Self::new("Slight rain", "cloud-rain"),
            63 => Self::new("Moderate rain", "cloud-rain"),
            65 => Self::new("Heavy rain", "cloud-rain"),
            66 => Self::new("Light freezing rain", "cloud-rain"),
            67 => Self::new("Heavy freezing rain", "cloud-rain"),
            71 => Self::new("Slight snow fall", "cloud-snow"),
            73 => Self::new("Moderate snow fall", "cloud-snow"),
            75 => Self::new("Heavy snow fall", "cloud-snow"),
            77 => Self::new("Snow grains", "snowflake"),
            80 => Self::new("Slight rain showers", "cloud-rain-wind"),
            81 => Self::new("Moderate rain showers", "cloud-rain-wind"),
            82 => Self::new("Violent rain showers", "cloud-rain-wind"),
            85 => Self::new("Slight snow showers", "cloud-snow"),
            86 => Self::new("Heavy snow showers", "cloud-snow"),
            95 => Self::new("Thunderstorm", "cloud-lightning"),
            96 => Self::new("Thunderstorm with slight hail", "cloud-lightning"),
            99 => Self::new("Thunderstorm with heavy hail", "cloud-lightning"),
            _ => Self::new("Unknown", "thermometer"),
        }
    }
}

/// Current conditions at the resolved location
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CurrentConditions {
    /// Local observation time as reported by the provider
    pub time: String,
    pub temperature: f64,
    pub apparent_temperature: Option<f64>,
    /// Relative humidity in percent
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub weather_code: u8,
    pub condition: String,
    pub icon: String,
}

/// One forecast day
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub temperature_max: Option<f64>,
    pub temperature_min: Option<f64>,
    /// Highest precipitation probability of the day in percent
    pub precipitation_probability_max: Option<f64>,
    pub weather_code: Option<u8>,
    pub condition: String,
    pub icon: String,
}

/// Units the provider reported values in
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherUnits {
    pub temperature: String,
    pub wind_speed: String,
}

impl Default for WeatherUnits {
    fn default() -> Self {
        Self {
            temperature: "°C".to_string(),
            wind_speed: "km/h".to_string(),
        }
    }
}

/// Weather snapshot, present even when the lookup failed
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WeatherReport {
    Available {
        current: CurrentConditions,
        daily: Vec<DailyForecast>,
        units: WeatherUnits,
    },
    Unavailable {
        reason: String,
    },
}

impl WeatherReport {
    #[must_use]
    pub fn unavailable<S: Into<String>>(reason: S) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available { .. })
    }

    /// Today's precipitation probability, the figure the widget headlines
    #[must_use]
    pub fn rain_chance_today(&self) -> Option<f64> {
        match self {
            Self::Available { daily, .. } => {
                daily.first().and_then(|day| day.precipitation_probability_max)
            }
            Self::Unavailable { .. } => None,
        }
    }

    /// Format current temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> Option<String> {
        match self {
            Self::Available { current, units, .. } => {
                Some(format!("{:.1}{}", current.temperature, units.temperature))
            }
            Self::Unavailable { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, "Clear sky", "sun")]
    #[case(2, "Partly cloudy", "cloud-sun")]
    #[case(3, "Overcast", "cloud")]
    #[case(48, "Depositing rime fog", "cloud-fog")]
    #[case(55, "Dense drizzle", "cloud-drizzle")]
    #[case(65, "Heavy rain", "cloud-rain")]
    #[case(75, "Heavy snow fall", "cloud-snow")]
    #[case(81, "Moderate rain showers", "cloud-rain-wind")]
    #[case(99, "Thunderstorm with heavy hail", "cloud-lightning")]
    fn test_wmo_code_mapping(#[case] code: u8, #[case] name: &str, #[case] icon: &str) {
        let condition = WeatherCondition::from_wmo_code(code);
        assert_eq!(condition.name, name);
        assert_eq!(condition.icon, icon);
    }

    #[rstest]
    #[case(4)]
    #[case(50)]
    #[case(100)]
    #[case(255)]
    fn test_unmapped_code_is_unknown(#[case] code: u8) {
        let condition = WeatherCondition::from_wmo_code(code);
        assert_eq!(condition.name, "Unknown");
        assert_eq!(condition.icon, "thermometer");
    }

    #[test]
    fn test_unavailable_report_serializes_with_status() {
        let report = WeatherReport::unavailable("timeout");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "unavailable");
        assert_eq!(json["reason"], "timeout");
        assert!(!report.is_available());
        assert!(report.format_temperature().is_none());
    }

    #[test]
    fn test_rain_chance_today() {
        let report = WeatherReport::Available {
            current: CurrentConditions {
                time: "2026-10-14T12:00".to_string(),
                temperature: 18.3,
                apparent_temperature: None,
                humidity: None,
                wind_speed: None,
                weather_code: 1,
                condition: "Mainly clear".to_string(),
                icon: "sun".to_string(),
            },
            daily: vec![DailyForecast {
                date: NaiveDate::from_ymd_opt(2026, 10, 14).unwrap(),
                temperature_max: Some(20.0),
                temperature_min: Some(11.0),
                precipitation_probability_max: Some(35.0),
                weather_code: Some(1),
                condition: "Mainly clear".to_string(),
                icon: "sun".to_string(),
            }],
            units: WeatherUnits::default(),
        };
        assert_eq!(report.rain_chance_today(), Some(35.0));
        assert_eq!(report.format_temperature().as_deref(), Some("18.3°C"));
    }
}
