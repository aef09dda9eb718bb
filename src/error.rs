//! Error types and handling for `surfcast`

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::providers::ProviderName;

/// Input rejected before any network call is made
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("latitude {0} is outside -90..=90")]
    Latitude(f64),

    #[error("longitude {0} is outside -180..=180")]
    Longitude(f64),

    #[error("unknown skill level '{0}'")]
    UnknownSkillLevel(String),

    #[error("unknown board type '{0}'")]
    UnknownBoardType(String),

    #[error("board length {0} ft is not a positive length")]
    BoardLength(f64),

    #[error("wave height {0} m is not a non-negative height")]
    WaveHeight(f64),

    #[error("spot identifier cannot be empty")]
    EmptySpotId,

    /// Query string or body that could not be decoded
    #[error("{0}")]
    MalformedRequest(String),
}

/// Failure of a single provider adapter
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{provider}: request failed: {message}")]
    Network {
        provider: ProviderName,
        message: String,
    },

    #[error("{provider}: rejected credentials (HTTP {status})")]
    Authentication { provider: ProviderName, status: u16 },

    #[error("{provider}: rate limit exceeded")]
    RateLimited { provider: ProviderName },

    #[error("{provider}: HTTP {status}: {body}")]
    Status {
        provider: ProviderName,
        status: u16,
        body: String,
    },

    #[error("{provider}: malformed response: {message}")]
    Parse {
        provider: ProviderName,
        message: String,
    },

    #[error("{provider}: no response within {timeout:?}")]
    Timeout {
        provider: ProviderName,
        timeout: Duration,
    },

    #[error("{provider}: no credentials supplied")]
    MissingCredentials { provider: ProviderName },

    #[error("{provider}: request has no spot identifier")]
    MissingSpot { provider: ProviderName },

    #[error("{provider}: cannot normalize a {found} payload")]
    UnexpectedPayload {
        provider: ProviderName,
        found: ProviderName,
    },
}

impl ProviderError {
    /// Provider the failure belongs to
    #[must_use]
    pub fn provider(&self) -> ProviderName {
        match self {
            ProviderError::Network { provider, .. }
            | ProviderError::Authentication { provider, .. }
            | ProviderError::RateLimited { provider }
            | ProviderError::Status { provider, .. }
            | ProviderError::Parse { provider, .. }
            | ProviderError::Timeout { provider, .. }
            | ProviderError::MissingCredentials { provider }
            | ProviderError::MissingSpot { provider }
            | ProviderError::UnexpectedPayload { provider, .. } => *provider,
        }
    }
}

/// Every adapter failed, so no forecast can be produced
#[derive(Error, Debug)]
pub enum AggregationError {
    #[error("no forecast provider is available for this request")]
    NoProviders,

    #[error("all forecast providers failed: {}", FailureList(.0))]
    AllFailed(Vec<ProviderError>),
}

impl AggregationError {
    /// Per-provider causes, empty when no provider was attempted
    #[must_use]
    pub fn failures(&self) -> &[ProviderError] {
        match self {
            AggregationError::NoProviders => &[],
            AggregationError::AllFailed(failures) => failures,
        }
    }
}

struct FailureList<'a>(&'a [ProviderError]);

impl fmt::Display for FailureList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

/// Main error type for the `surfcast` crate
#[derive(Error, Debug)]
pub enum SurfcastError {
    /// Input validation errors
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// Forecast could not be assembled from any provider
    #[error("Forecast unavailable: {0}")]
    Aggregation(#[from] AggregationError),

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl SurfcastError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            SurfcastError::Validation(err) => format!("Invalid input: {err}"),
            SurfcastError::Aggregation(_) => {
                "Wave forecast is currently unavailable. Please try again later.".to_string()
            }
            SurfcastError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_carries_provider() {
        let err = ProviderError::Timeout {
            provider: ProviderName::Windy,
            timeout: Duration::from_secs(3),
        };
        assert_eq!(err.provider(), ProviderName::Windy);
        assert!(err.to_string().starts_with("windy"));
    }

    #[test]
    fn test_aggregation_error_lists_causes() {
        let err = AggregationError::AllFailed(vec![
            ProviderError::RateLimited {
                provider: ProviderName::Stormglass,
            },
            ProviderError::MissingCredentials {
                provider: ProviderName::OpenWeatherMap,
            },
        ]);
        let message = err.to_string();
        assert!(message.contains("stormglass: rate limit exceeded"));
        assert!(message.contains("; openweathermap: no credentials supplied"));
        assert_eq!(err.failures().len(), 2);
        assert!(AggregationError::NoProviders.failures().is_empty());
    }

    #[test]
    fn test_user_messages() {
        let validation: SurfcastError = ValidationError::Latitude(91.0).into();
        assert!(validation.user_message().contains("latitude 91"));

        let aggregation: SurfcastError = AggregationError::NoProviders.into();
        assert!(aggregation.user_message().contains("unavailable"));

        let config_err = SurfcastError::config("test");
        assert!(config_err.user_message().contains("Configuration error"));
    }
}
