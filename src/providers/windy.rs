//! Windy point-forecast adapter

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
use crate::models::{HourlyObservation, PartialForecast};

pub const DEFAULT_BASE_URL: &str = "https://api.windy.com/api";
pub const DEFAULT_MODEL: &str = "gfs";

/// Column-oriented response; index `i` of every series belongs to `ts[i]`
#[derive(Debug, Clone, Deserialize)]
pub struct PointForecastResponse {
    /// Unix milliseconds
    #[serde(default)]
    pub ts: Vec<i64>,
    #[serde(rename = "wind_u-surface", default)]
    pub wind_u: Vec<Option<f64>>,
    #[serde(rename = "wind_v-surface", default)]
    pub wind_v: Vec<Option<f64>>,
    #[serde(rename = "waves_height-surface", default)]
    pub waves_height: Vec<Option<f64>>,
    #[serde(rename = "waves_period-surface", default)]
    pub waves_period: Vec<Option<f64>>,
    #[serde(rename = "waves_direction-surface", default)]
    pub waves_direction: Vec<Option<f64>>,
}

pub struct WindyProvider {
    client: ClientWithMiddleware,
    base_url: String,
    model: String,
}

impl WindyProvider {
    pub fn new(client: ClientWithMiddleware, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
        }
    }
}

/// Speed (m/s) and meteorological direction (degrees the wind blows from)
/// of a wind vector given by its eastward `u` and northward `v` components
#[must_use]
pub fn wind_from_components(u: f64, v: f64) -> (f64, f64) {
    let speed = u.hypot(v);
    let direction = (270.0 - v.atan2(u).to_degrees()).rem_euclid(360.0);
    (speed, direction)
}

fn column(series: &[Option<f64>], i: usize) -> Option<f64> {
    series.get(i).copied().flatten()
}

#[async_trait]
impl ForecastProvider for WindyProvider {
    fn name(&self) -> ProviderName {
        ProviderName::Windy
    }

    fn is_available(&self, _request: &ForecastRequest, credentials: &CredentialSet) -> bool {
        credentials.get(ProviderName::Windy).is_some()
    }

    #[instrument(name = "windy_fetch", skip(self, credentials), fields(lat = request.coordinate.latitude, lon = request.coordinate.longitude, model = %self.model))]
    async fn fetch(
        &self,
        request: &ForecastRequest,
        credentials: &CredentialSet,
    ) -> Result<RawProviderResponse, ProviderError> {
        let api_key = credentials
            .get(ProviderName::Windy)
            .ok_or(ProviderError::MissingCredentials {
                provider: ProviderName::Windy,
            })?;

        let url = format!(
            "{}/point-forecast/v2?lat={}&lon={}&model={}&parameters[]=wind&parameters[]=waves&key={}",
            self.base_url,
            request.coordinate.latitude,
            request.coordinate.longitude,
            urlencoding::encode(&self.model),
            urlencoding::encode(api_key)
        );

        let response: PointForecastResponse =
            send_json(ProviderName::Windy, self.client.get(url)).await?;

        info!("Windy returned {} time steps", response.ts.len());
        Ok(RawProviderResponse::Windy(response))
    }

    fn normalize(&self, raw: RawProviderResponse) -> Result<PartialForecast, ProviderError> {
        let response = match raw {
            RawProviderResponse::Windy(response) => response,
            other => return Err(unexpected(ProviderName::Windy, &other)),
        };

        let mut partial = PartialForecast::new(ProviderName::Windy);
        for (i, &millis) in response.ts.iter().enumerate() {
            let Some(timestamp) = DateTime::from_timestamp_millis(millis) else {
                warn!("Skipping Windy time step with invalid timestamp {}", millis);
                continue;
            };

            let (wind_speed, wind_direction) =
                match (column(&response.wind_u, i), column(&response.wind_v, i)) {
                    (Some(u), Some(v)) => {
                        let (speed, direction) = wind_from_components(u, v);
                        (Some(speed), Some(direction))
                    }
                    _ => (None, None),
                };

            partial.hourly.push(HourlyObservation {
                timestamp,
                wave_height: column(&response.waves_height, i),
                wave_period: column(&response.waves_period, i),
                wave_direction: column(&response.waves_direction, i),
                wind_speed,
                wind_direction,
            });
        }

        Ok(partial)
    }
}
