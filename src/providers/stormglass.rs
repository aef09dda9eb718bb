//! Stormglass point forecast adapter

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{info, instrument};

use super::{
    CredentialSet, ForecastProvider, ForecastRequest, ProviderName, RawProviderResponse,
    send_json, unexpected,
};
use crate::error::ProviderError;
use crate::models::{HourlyObservation, PartialForecast};

pub const DEFAULT_BASE_URL: &str = "https://api.stormglass.io/v2";
pub const DEFAULT_SOURCE: &str = "noaa";
const PARAMS: &str = "waveHeight,wavePeriod,waveDirection,windSpeed,windDirection";

/// `GET /weather/point` response
#[derive(Debug, Clone, Deserialize)]
pub struct PointResponse {
    #[serde(default)]
    pub hours: Vec<PointHour>,
}

/// One hour; every parameter is a map of data source to value
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointHour {
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub wave_height: HashMap<String, Option<f64>>,
    #[serde(default)]
    pub wave_period: HashMap<String, Option<f64>>,
    #[serde(default)]
    pub wave_direction: HashMap<String, Option<f64>>,
    #[serde(default)]
    pub wind_speed: HashMap<String, Option<f64>>,
    #[serde(default)]
    pub wind_direction: HashMap<String, Option<f64>>,
}

pub struct StormglassProvider {
    client: ClientWithMiddleware,
    base_url: String,
    source: String,
}

impl StormglassProvider {
    pub fn new(client: ClientWithMiddleware, base_url: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            source: source.into(),
        }
    }
}

#[async_trait]
impl ForecastProvider for StormglassProvider {
    fn name(&self) -> ProviderName {
        ProviderName::Stormglass
    }

    fn is_available(&self, _request: &ForecastRequest, credentials: &CredentialSet) -> bool {
        credentials.get(ProviderName::Stormglass).is_some()
    }

    #[instrument(name = "stormglass_fetch", skip(self, credentials), fields(lat = request.coordinate.latitude, lng = request.coordinate.longitude))]
    async fn fetch(
        &self,
        request: &ForecastRequest,
        credentials: &CredentialSet,
    ) -> Result<RawProviderResponse, ProviderError> {
        let api_key = credentials
            .get(ProviderName::Stormglass)
            .ok_or(ProviderError::MissingCredentials {
                provider: ProviderName::Stormglass,
            })?;

        let url = format!(
            "{}/weather/point?lat={}&lng={}&params={}&source={}",
            self.base_url,
            request.coordinate.latitude,
            request.coordinate.longitude,
            PARAMS,
            urlencoding::encode(&self.source)
        );

        let response: PointResponse = send_json(
            ProviderName::Stormglass,
            self.client.get(url).header("Authorization", api_key),
        )
        .await?;

        info!("Stormglass returned {} hours", response.hours.len());
        Ok(RawProviderResponse::Stormglass(response))
    }

    fn normalize(&self, raw: RawProviderResponse) -> Result<PartialForecast, ProviderError> {
        let response = match raw {
            RawProviderResponse::Stormglass(response) => response,
            other => return Err(unexpected(ProviderName::Stormglass, &other)),
        };

        let source = self.source.as_str();
        let hourly = response
            .hours
            .into_iter()
            .map(|hour| HourlyObservation {
                timestamp: hour.time,
                wave_height: hour.wave_height.get(source).copied().flatten(),
                wave_period: hour.wave_period.get(source).copied().flatten(),
                wave_direction: hour.wave_direction.get(source).copied().flatten(),
                wind_speed: hour.wind_speed.get(source).copied().flatten(),
                wind_direction: hour.wind_direction.get(source).copied().flatten(),
            })
            .collect();

        Ok(PartialForecast {
            provider: ProviderName::Stormglass,
            hourly,
            daily: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest_middleware::ClientBuilder;

    fn provider() -> StormglassProvider {
        let client = ClientBuilder::new(reqwest::Client::new()).build();
        StormglassProvider::new(client, DEFAULT_BASE_URL, DEFAULT_SOURCE)
    }

    #[test]
    fn test_normalize_picks_configured_source() {
        let response: PointResponse = serde_json::from_str(
            r#"{
                "hours": [
                    {
                        "time": "2024-07-01T06:00:00+00:00",
                        "waveHeight": {"noaa": 1.1, "sg": 1.4},
                        "wavePeriod": {"noaa": 9.0},
                        "waveDirection": {"noaa": 240.0},
                        "windSpeed": {"sg": 3.0},
                        "windDirection": {"noaa": 45.0}
                    },
                    {
                        "time": "2024-07-01T07:00:00+00:00"
                    }
                ],
                "meta": {"cost": 1}
            }"#,
        )
        .unwrap();

        let partial = provider()
            .normalize(RawProviderResponse::Stormglass(response))
            .unwrap();

        assert_eq!(partial.provider, ProviderName::Stormglass);
        assert_eq!(partial.hourly.len(), 2);
        let first = &partial.hourly[0];
        assert_eq!(first.wave_height, Some(1.1));
        assert_eq!(first.wave_period, Some(9.0));
        assert_eq!(first.wind_speed, None);
        assert_eq!(first.wind_direction, Some(45.0));
        assert_eq!(partial.hourly[1], HourlyObservation::empty(partial.hourly[1].timestamp));
        assert!(partial.daily.is_empty());
    }

    #[test]
    fn test_null_source_value_only_drops_that_field() {
        let response: PointResponse = serde_json::from_str(
            r#"{
                "hours": [{
                    "time": "2024-07-01T06:00:00+00:00",
                    "waveHeight": {"noaa": null, "sg": 1.4},
                    "wavePeriod": {"noaa": 9.0},
                    "windSpeed": {"noaa": 2.5}
                }]
            }"#,
        )
        .unwrap();

        let partial = provider()
            .normalize(RawProviderResponse::Stormglass(response))
            .unwrap();

        let hour = &partial.hourly[0];
        assert_eq!(hour.wave_height, None);
        assert_eq!(hour.wave_period, Some(9.0));
        assert_eq!(hour.wind_speed, Some(2.5));
    }

    #[test]
    fn test_normalize_rejects_foreign_payload() {
        let raw = RawProviderResponse::Surfline(serde_json::from_str(r#"{"data":{"wave":[]}}"#).unwrap());
        let err = provider().normalize(raw).unwrap_err();
        assert!(matches!(
            err,
            ProviderError::UnexpectedPayload {
                found: ProviderName::Surfline,
                ..
            }
        ));
    }
}
