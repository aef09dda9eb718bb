//! Provider-neutral forecast timeline

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::providers::ProviderName;

/// One hour of marine and wind conditions
///
/// Every measurement is optional because providers cover different
/// subsets of the fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyObservation {
    pub timestamp: DateTime<Utc>,
    /// Significant wave height in meters
    pub wave_height: Option<f64>,
    /// Wave period in seconds
    pub wave_period: Option<f64>,
    /// Direction the waves come from, degrees
    pub wave_direction: Option<f64>,
    /// Wind speed in m/s
    pub wind_speed: Option<f64>,
    /// Direction the wind comes from, degrees
    pub wind_direction: Option<f64>,
}

impl HourlyObservation {
    /// Observation with no measurements at `timestamp`
    #[must_use]
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            wave_height: None,
            wave_period: None,
            wave_direction: None,
            wind_speed: None,
            wind_direction: None,
        }
    }
}

/// Temperature range for a day, degrees Celsius
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureRange {
    pub min: f64,
    pub max: f64,
}

/// Daily weather summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyObservation {
    pub date: NaiveDate,
    pub temperature: TemperatureRange,
    /// Weather category, e.g. "Clouds"
    pub weather: String,
    pub weather_description: String,
    /// Wind speed in m/s
    pub wind_speed: Option<f64>,
    /// Wind direction in degrees
    pub wind_direction: Option<f64>,
    /// Probability of precipitation (0.0-1.0)
    pub precipitation_probability: f64,
}

/// Normalized output of a single provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialForecast {
    pub provider: ProviderName,
    pub hourly: Vec<HourlyObservation>,
    pub daily: Vec<DailyObservation>,
}

impl PartialForecast {
    #[must_use]
    pub fn new(provider: ProviderName) -> Self {
        Self {
            provider,
            hourly: Vec::new(),
            daily: Vec::new(),
        }
    }
}

/// Merged forecast across all providers that answered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedForecast {
    /// Time-ascending, one entry per timestamp
    pub hourly: Vec<HourlyObservation>,
    /// Date-ascending, one entry per date
    pub daily: Vec<DailyObservation>,
    /// Providers whose data made it into the forecast, in priority order
    pub sources: Vec<ProviderName>,
    /// Providers that were attempted but failed
    pub unavailable: Vec<ProviderName>,
}

impl UnifiedForecast {
    /// Hourly observations falling on `date` (UTC)
    pub fn hours_on(&self, date: NaiveDate) -> impl Iterator<Item = &HourlyObservation> {
        self.hourly
            .iter()
            .filter(move |hour| hour.timestamp.date_naive() == date)
    }

    /// True when some provider failed and the forecast is best-effort
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.unavailable.is_empty()
    }
}
