//! Forecast provider adapters
//!
//! Every external data source implements [`ForecastProvider`]: `fetch` performs
//! the single outbound request and returns the provider's typed payload,
//! `normalize` maps that payload into a [`PartialForecast`].

pub mod openweathermap;
pub mod stormglass;
pub mod surfline;
pub mod windy;

use std::fmt;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ProviderConfig;
use crate::error::{ProviderError, ValidationError};
use crate::models::{Coordinate, PartialForecast};

pub use openweathermap::OpenWeatherMapProvider;
pub use stormglass::StormglassProvider;
pub use surfline::SurflineProvider;
pub use windy::WindyProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderName {
    Stormglass,
    Surfline,
    Windy,
    OpenWeatherMap,
}

impl fmt::Display for ProviderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderName::Stormglass => write!(f, "stormglass"),
            ProviderName::Surfline => write!(f, "surfline"),
            ProviderName::Windy => write!(f, "windy"),
            ProviderName::OpenWeatherMap => write!(f, "openweathermap"),
        }
    }
}

/// One opaque API key per provider, supplied by the caller
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CredentialSet {
    #[serde(default)]
    pub stormglass: Option<String>,
    #[serde(default)]
    pub open_weather_map: Option<String>,
    #[serde(default)]
    pub windy: Option<String>,
}

impl CredentialSet {
    /// Key for `provider`, ignoring blank values
    #[must_use]
    pub fn get(&self, provider: ProviderName) -> Option<&str> {
        let key = match provider {
            ProviderName::Stormglass => self.stormglass.as_deref(),
            ProviderName::OpenWeatherMap => self.open_weather_map.as_deref(),
            ProviderName::Windy => self.windy.as_deref(),
            ProviderName::Surfline => None,
        };
        key.filter(|k| !k.trim().is_empty())
    }
}

impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |key: &Option<String>| key.as_ref().map(|_| "<redacted>");
        f.debug_struct("CredentialSet")
            .field("stormglass", &redact(&self.stormglass))
            .field("open_weather_map", &redact(&self.open_weather_map))
            .field("windy", &redact(&self.windy))
            .finish()
    }
}

/// What a forecast is requested for
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRequest {
    pub coordinate: Coordinate,
    /// Identifier understood by spot-keyed providers
    pub spot_id: Option<String>,
}

impl ForecastRequest {
    #[must_use]
    pub fn point(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            spot_id: None,
        }
    }

    pub fn spot(coordinate: Coordinate, spot_id: impl Into<String>) -> Result<Self, ValidationError> {
        let spot_id = spot_id.into();
        if spot_id.trim().is_empty() {
            return Err(ValidationError::EmptySpotId);
        }
        Ok(Self {
            coordinate,
            spot_id: Some(spot_id),
        })
    }
}

/// Undecoded provider payload, tagged by provider
#[derive(Debug, Clone)]
pub enum RawProviderResponse {
    Stormglass(stormglass::PointResponse),
    Surfline(surfline::WaveResponse),
    Windy(windy::PointForecastResponse),
    OpenWeatherMap(openweathermap::OneCallResponse),
}

impl RawProviderResponse {
    #[must_use]
    pub fn provider(&self) -> ProviderName {
        match self {
            RawProviderResponse::Stormglass(_) => ProviderName::Stormglass,
            RawProviderResponse::Surfline(_) => ProviderName::Surfline,
            RawProviderResponse::Windy(_) => ProviderName::Windy,
            RawProviderResponse::OpenWeatherMap(_) => ProviderName::OpenWeatherMap,
        }
    }
}

#[async_trait]
pub trait ForecastProvider: Send + Sync {
    fn name(&self) -> ProviderName;

    /// Whether this provider can serve `request` with the given credentials.
    /// Unavailable providers are skipped rather than counted as failures.
    fn is_available(&self, request: &ForecastRequest, credentials: &CredentialSet) -> bool;

    async fn fetch(
        &self,
        request: &ForecastRequest,
        credentials: &CredentialSet,
    ) -> Result<RawProviderResponse, ProviderError>;

    fn normalize(&self, raw: RawProviderResponse) -> Result<PartialForecast, ProviderError>;
}

/// HTTP client shared by all adapters, retrying transient failures
pub fn build_client(config: &ProviderConfig) -> anyhow::Result<ClientWithMiddleware> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds.into()))
        .user_agent(concat!("surfcast/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to create HTTP client")?;

    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);

    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

/// Send `request` and decode a JSON body, mapping failures onto `provider`
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: ProviderName,
    request: RequestBuilder,
) -> Result<T, ProviderError> {
    let response = request.send().await.map_err(|e| ProviderError::Network {
        provider,
        message: e.to_string(),
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return match status.as_u16() {
            401 | 403 => Err(ProviderError::Authentication {
                provider,
                status: status.as_u16(),
            }),
            429 => Err(ProviderError::RateLimited { provider }),
            code => Err(ProviderError::Status {
                provider,
                status: code,
                body,
            }),
        };
    }

    let body = response.text().await.map_err(|e| ProviderError::Network {
        provider,
        message: e.to_string(),
    })?;
    debug!(%provider, bytes = body.len(), "Received provider response");

    serde_json::from_str(&body).map_err(|e| ProviderError::Parse {
        provider,
        message: e.to_string(),
    })
}

fn unexpected(provider: ProviderName, raw: &RawProviderResponse) -> ProviderError {
    ProviderError::UnexpectedPayload {
        provider,
        found: raw.provider(),
    }
}
