//! Data models for surfcast
//!
//! This module contains the core domain models organized by concern:
//! - Location: validated coordinates
//! - Forecast: hourly/daily observations and the unified timeline
//! - Profile: surfer skill and board
//! - Score: ratings, scored hours and spot rankings

pub mod forecast;
pub mod location;
pub mod profile;
pub mod score;

// Re-export all public types for convenient access
pub use forecast::{
    DailyObservation, HourlyObservation, PartialForecast, TemperatureRange, UnifiedForecast,
};
pub use location::Coordinate;
pub use profile::{BoardType, SkillLevel, SurferProfile};
pub use score::{Rating, RankedSpotScore, ScoredObservation, SpotDifficulty, SpotScore};
