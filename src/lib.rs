//! `surfcast` - Wave forecast aggregation and personalized surf scoring
//!
//! This library fetches marine and weather forecasts from several
//! providers, merges them into one timeline and scores each hour for a
//! surfer profile.

pub mod aggregator;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod providers;
pub mod ranking;
pub mod scoring;
pub mod web;

// Re-export core types for public API
pub use aggregator::ForecastAggregator;
pub use cache::PersistentCache;
pub use config::SurfcastConfig;
pub use error::{AggregationError, ProviderError, SurfcastError, ValidationError};
pub use models::{
    BoardType, Coordinate, HourlyObservation, Rating, SkillLevel, SurferProfile, UnifiedForecast,
};
pub use providers::{CredentialSet, ForecastProvider, ForecastRequest, ProviderName};
pub use scoring::{ScoringEngine, score_forecast};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
