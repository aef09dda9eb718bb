//! Ratings and scored results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::HourlyObservation;

/// Five-level surf quality rating, ordered worst to best
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rating {
    #[serde(alias = "bad")]
    Bad,
    #[serde(alias = "poor")]
    Poor,
    #[serde(alias = "fair")]
    Fair,
    #[serde(alias = "good")]
    Good,
    #[serde(alias = "excellent")]
    Excellent,
}

impl Rating {
    /// Rating for a clamped 0-100 score
    #[must_use]
    pub fn from_score(score: u8) -> Self {
        match score {
            80.. => Rating::Excellent,
            60..=79 => Rating::Good,
            40..=59 => Rating::Fair,
            20..=39 => Rating::Poor,
            _ => Rating::Bad,
        }
    }

    /// Ordinal used for ranking (Bad = 1 ... Excellent = 5)
    #[must_use]
    pub fn ordinal(self) -> u8 {
        match self {
            Rating::Bad => 1,
            Rating::Poor => 2,
            Rating::Fair => 3,
            Rating::Good => 4,
            Rating::Excellent => 5,
        }
    }

    /// One level better, saturating at `Excellent`
    #[must_use]
    pub fn upgraded(self) -> Self {
        match self {
            Rating::Bad => Rating::Poor,
            Rating::Poor => Rating::Fair,
            Rating::Fair => Rating::Good,
            Rating::Good | Rating::Excellent => Rating::Excellent,
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rating::Excellent => write!(f, "Excellent"),
            Rating::Good => write!(f, "Good"),
            Rating::Fair => write!(f, "Fair"),
            Rating::Poor => write!(f, "Poor"),
            Rating::Bad => write!(f, "Bad"),
        }
    }
}

/// Hourly observation with its personalized score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredObservation {
    #[serde(flatten)]
    pub observation: HourlyObservation,
    /// 0-100
    pub score: u8,
    pub rating: Rating,
}

/// How demanding a spot is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpotDifficulty {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
    #[serde(other)]
    Unknown,
}

/// Precomputed rating of one spot at one forecast time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotScore {
    pub spot_id: String,
    pub forecast_time: DateTime<Utc>,
    pub rating: Rating,
    pub difficulty: SpotDifficulty,
    #[serde(default)]
    pub region_id: Option<i64>,
}

/// Spot score after the board-length adjustment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedSpotScore {
    pub spot_id: String,
    pub forecast_time: DateTime<Utc>,
    pub rating: Rating,
    pub adjusted_rating: Rating,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_covers_every_score() {
        let mut previous = Rating::Bad;
        for score in 0..=100u8 {
            let rating = Rating::from_score(score);
            assert!(rating >= previous, "rating decreased at {score}");
            previous = rating;
        }
        assert_eq!(Rating::from_score(19), Rating::Bad);
        assert_eq!(Rating::from_score(20), Rating::Poor);
        assert_eq!(Rating::from_score(40), Rating::Fair);
        assert_eq!(Rating::from_score(60), Rating::Good);
        assert_eq!(Rating::from_score(79), Rating::Good);
        assert_eq!(Rating::from_score(80), Rating::Excellent);
        assert_eq!(Rating::from_score(100), Rating::Excellent);
    }

    #[test]
    fn test_upgrade_saturates() {
        assert_eq!(Rating::Bad.upgraded(), Rating::Poor);
        assert_eq!(Rating::Good.upgraded(), Rating::Excellent);
        assert_eq!(Rating::Excellent.upgraded(), Rating::Excellent);
    }

    #[test]
    fn test_rating_uses_capitalized_labels() {
        assert_eq!(serde_json::to_string(&Rating::Excellent).unwrap(), r#""Excellent""#);
        let stored: Rating = serde_json::from_str(r#""Fair""#).unwrap();
        assert_eq!(stored, Rating::Fair);
        let lowercase: Rating = serde_json::from_str(r#""good""#).unwrap();
        assert_eq!(lowercase, Rating::Good);
    }

    #[test]
    fn test_unknown_difficulty_deserializes() {
        let difficulty: SpotDifficulty = serde_json::from_str(r#""reef-only""#).unwrap();
        assert_eq!(difficulty, SpotDifficulty::Unknown);
    }
}
