//! Surfline spot wave forecast adapter
//!
//! Surfline is keyed by spot identifier instead of coordinates and needs no
//! credentials. Only requests that carry a spot id are served.

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

pub const DEFAULT_BASE_URL: &str = "https://services.surfline.com/kbyg";
const FEET_TO_METERS: f64 = 0.3048;

#[derive(Debug, Clone, Deserialize)]
pub struct WaveResponse {
    #[serde(default)]
    pub associated: Option<Associated>,
    pub data: WaveData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Associated {
    #[serde(default)]
    pub units: Option<Units>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Units {
    /// "FT" or "M"
    pub wave_height: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WaveData {
    #[serde(default)]
    pub wave: Vec<WaveEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WaveEntry {
    /// Unix seconds
    pub timestamp: i64,
    pub surf: Option<SurfRange>,
    #[serde(default)]
    pub swells: Vec<Swell>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SurfRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Swell {
    pub height: f64,
    pub period: f64,
    pub direction: f64,
}

impl WaveResponse {
    fn height_factor(&self) -> f64 {
        let unit = self
            .associated
            .as_ref()
            .and_then(|a| a.units.as_ref())
            .and_then(|u| u.wave_height.as_deref());
        match unit {
            Some(unit) if unit.eq_ignore_ascii_case("m") => 1.0,
            _ => FEET_TO_METERS,
        }
    }
}

pub struct SurflineProvider {
    client: ClientWithMiddleware,
    base_url: String,
}

impl SurflineProvider {
    pub fn new(client: ClientWithMiddleware, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ForecastProvider for SurflineProvider {
    fn name(&self) -> ProviderName {
        ProviderName::Surfline
    }

    fn is_available(&self, request: &ForecastRequest, _credentials: &CredentialSet) -> bool {
        request.spot_id.is_some()
    }

    #[instrument(name = "surfline_fetch", skip(self, _credentials), fields(spot_id = request.spot_id.as_deref()))]
    async fn fetch(
        &self,
        request: &ForecastRequest,
        _credentials: &CredentialSet,
    ) -> Result<RawProviderResponse, ProviderError> {
        let spot_id = request.spot_id.as_deref().ok_or(ProviderError::MissingSpot {
            provider: ProviderName::Surfline,
        })?;

        let url = format!(
            "{}/spots/forecasts/wave?spotId={}",
            self.base_url,
            urlencoding::encode(spot_id)
        );

        let response: WaveResponse = send_json(ProviderName::Surfline, self.client.get(url)).await?;

        info!("Surfline returned {} wave entries", response.data.wave.len());
        Ok(RawProviderResponse::Surfline(response))
    }

    fn normalize(&self, raw: RawProviderResponse) -> Result<PartialForecast, ProviderError> {
        let response = match raw {
            RawProviderResponse::Surfline(response) => response,
            other => return Err(unexpected(ProviderName::Surfline, &other)),
        };

        let factor = response.height_factor();
        let mut partial = PartialForecast::new(ProviderName::Surfline);

        for entry in response.data.wave {
            let Some(timestamp) = DateTime::from_timestamp(entry.timestamp, 0) else {
                warn!("Skipping Surfline entry with invalid timestamp {}", entry.timestamp);
                continue;
            };

            let dominant = entry
                .swells
                .iter()
                .filter(|swell| swell.height > 0.0)
                .max_by(|a, b| a.height.total_cmp(&b.height));

            partial.hourly.push(HourlyObservation {
                wave_height: entry
                    .surf
                    .as_ref()
                    .map(|surf| (surf.min + surf.max) / 2.0 * factor),
                wave_period: dominant.map(|swell| swell.period),
                wave_direction: dominant.map(|swell| swell.direction),
                ..HourlyObservation::empty(timestamp)
            });
        }

        Ok(partial)
    }
}
