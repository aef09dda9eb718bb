//! OpenWeatherMap One Call adapter

use async_trait::async_trait;
use chrono::DateTime;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use super::{
    CredentialSet, ForecastProvider, ForecastRequest, ProviderName, RawProviderResponse,
    send_json, unexpected,
};
use crate::error::ProviderError;
use crate::models::{DailyObservation, HourlyObservation, PartialForecast, TemperatureRange};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// `GET /onecall` response, requested with `units=metric`
#[derive(Debug, Clone, Deserialize)]
pub struct OneCallResponse {
    #[serde(default)]
    pub hourly: Vec<OneCallHour>,
    #[serde(default)]
    pub daily: Vec<OneCallDay>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OneCallHour {
    /// Unix seconds
    pub dt: i64,
    pub wind_speed: Option<f64>,
    pub wind_deg: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OneCallDay {
    /// Unix seconds
    pub dt: i64,
    pub temp: DayTemperature,
    #[serde(default)]
    pub weather: Vec<WeatherCondition>,
    pub wind_speed: Option<f64>,
    pub wind_deg: Option<f64>,
    /// Probability of precipitation
    #[serde(default)]
    pub pop: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DayTemperature {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherCondition {
    pub main: String,
    pub description: String,
}

pub struct OpenWeatherMapProvider {
    client: ClientWithMiddleware,
    base_url: String,
}

impl OpenWeatherMapProvider {
    pub fn new(client: ClientWithMiddleware, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ForecastProvider for OpenWeatherMapProvider {
    fn name(&self) -> ProviderName {
        ProviderName::OpenWeatherMap
    }

    fn is_available(&self, _request: &ForecastRequest, credentials: &CredentialSet) -> bool {
        credentials.get(ProviderName::OpenWeatherMap).is_some()
    }

    #[instrument(name = "openweathermap_fetch", skip(self, credentials), fields(lat = request.coordinate.latitude, lon = request.coordinate.longitude))]
    async fn fetch(
        &self,
        request: &ForecastRequest,
        credentials: &CredentialSet,
    ) -> Result<RawProviderResponse, ProviderError> {
        let api_key = credentials
            .get(ProviderName::OpenWeatherMap)
            .ok_or(ProviderError::MissingCredentials {
                provider: ProviderName::OpenWeatherMap,
            })?;

        let url = format!(
            "{}/onecall?lat={}&lon={}&exclude=minutely,alerts&units=metric&appid={}",
            self.base_url,
            request.coordinate.latitude,
            request.coordinate.longitude,
            urlencoding::encode(api_key)
        );

        let response: OneCallResponse =
            send_json(ProviderName::OpenWeatherMap, self.client.get(url)).await?;

        info!(
            "OpenWeatherMap returned {} hours and {} days",
            response.hourly.len(),
            response.daily.len()
        );
        Ok(RawProviderResponse::OpenWeatherMap(response))
    }

    fn normalize(&self, raw: RawProviderResponse) -> Result<PartialForecast, ProviderError> {
        let response = match raw {
            RawProviderResponse::OpenWeatherMap(response) => response,
            other => return Err(unexpected(ProviderName::OpenWeatherMap, &other)),
        };

        let mut partial = PartialForecast::new(ProviderName::OpenWeatherMap);

        for hour in response.hourly {
            let Some(timestamp) = DateTime::from_timestamp(hour.dt, 0) else {
                warn!("Skipping OpenWeatherMap hour with invalid timestamp {}", hour.dt);
                continue;
            };
            partial.hourly.push(HourlyObservation {
                wind_speed: hour.wind_speed,
                wind_direction: hour.wind_deg,
                ..HourlyObservation::empty(timestamp)
            });
        }

        for day in response.daily {
            let Some(timestamp) = DateTime::from_timestamp(day.dt, 0) else {
                warn!("Skipping OpenWeatherMap day with invalid timestamp {}", day.dt);
                continue;
            };
            let (weather, weather_description) = day
                .weather
                .into_iter()
                .next()
                .map(|condition| (condition.main, condition.description))
                .unwrap_or_else(|| ("Unknown".to_string(), String::new()));

            partial.daily.push(DailyObservation {
                date: timestamp.date_naive(),
                temperature: TemperatureRange {
                    min: day.temp.min,
                    max: day.temp.max,
                },
                weather,
                weather_description,
                wind_speed: day.wind_speed,
                wind_direction: day.wind_deg,
                precipitation_probability: day.pop.clamp(0.0, 1.0),
            });
        }

        Ok(partial)
    }
}
