//! Personalized surf scoring
//!
//! Each hour runs through a fixed pipeline: base score from wave height,
//! skill adjustment, board adjustment, wind adjustment, then conversion to a
//! [`Rating`]. Every stage clamps into 0..=100 before the next one runs, so
//! the order matters.

use crate::models::{
    BoardType, HourlyObservation, Rating, ScoredObservation, SkillLevel, SurferProfile,
    UnifiedForecast,
};

const MAX_SCORE: i32 = 100;

/// Decides whether the wind at an hour blows offshore at the spot.
///
/// Answering needs the coastline orientation of the spot, which the
/// forecast itself does not carry; callers that know it plug in their own
/// predicate.
pub trait OffshorePredicate: Send + Sync {
    fn is_offshore(&self, hour: &HourlyObservation) -> bool;
}

/// No coastline data: wind is never treated as offshore
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCoastline;

impl OffshorePredicate for NoCoastline {
    fn is_offshore(&self, _hour: &HourlyObservation) -> bool {
        false
    }
}

impl<F> OffshorePredicate for F
where
    F: Fn(&HourlyObservation) -> bool + Send + Sync,
{
    fn is_offshore(&self, hour: &HourlyObservation) -> bool {
        self(hour)
    }
}

/// Scores forecasts for a surfer profile
pub struct ScoringEngine<P = NoCoastline> {
    offshore: P,
}

impl Default for ScoringEngine<NoCoastline> {
    fn default() -> Self {
        Self {
            offshore: NoCoastline,
        }
    }
}

impl<P: OffshorePredicate> ScoringEngine<P> {
    #[must_use]
    pub fn with_offshore(offshore: P) -> Self {
        Self { offshore }
    }

    /// Score every hour of `forecast` for `profile`
    #[must_use]
    pub fn score(&self, forecast: &UnifiedForecast, profile: &SurferProfile) -> Vec<ScoredObservation> {
        forecast
            .hourly
            .iter()
            .map(|hour| self.score_hour(hour, profile))
            .collect()
    }

    #[must_use]
    pub fn score_hour(&self, hour: &HourlyObservation, profile: &SurferProfile) -> ScoredObservation {
        let score = match hour.wave_height {
            Some(height) => {
                let score = base_score(height);
                let score = adjust_for_skill(score, height, profile.skill_level);
                let score = adjust_for_board(score, height, profile.board_type, profile.board_length);
                self.adjust_for_wind(score, hour)
            }
            None => 0,
        };

        ScoredObservation {
            observation: hour.clone(),
            score,
            rating: Rating::from_score(score),
        }
    }

    fn adjust_for_wind(&self, score: u8, hour: &HourlyObservation) -> u8 {
        let Some(speed) = hour.wind_speed else {
            return score;
        };

        if speed > 8.0 {
            apply(score, -30)
        } else if speed > 5.0 {
            apply(score, -15)
        } else if speed < 5.0 && self.offshore.is_offshore(hour) {
            apply(score, 20)
        } else {
            score
        }
    }
}

/// Score every hour of `forecast` with no coastline data
#[must_use]
pub fn score_forecast(forecast: &UnifiedForecast, profile: &SurferProfile) -> Vec<ScoredObservation> {
    ScoringEngine::default().score(forecast, profile)
}

fn apply(score: u8, delta: i32) -> u8 {
    // clamped to 0..=100, so the cast cannot truncate
    (i32::from(score) + delta).clamp(0, MAX_SCORE) as u8
}

/// Score for wave height alone, in meters
#[must_use]
pub fn base_score(height: f64) -> u8 {
    if height < 0.3 {
        20
    } else if (0.7..=1.5).contains(&height) {
        90
    } else if height > 1.5 && height <= 3.0 {
        70
    } else if height > 3.0 {
        30
    } else {
        50
    }
}

fn adjust_for_skill(score: u8, height: f64, skill: SkillLevel) -> u8 {
    let delta = match skill {
        SkillLevel::Beginner if height < 0.5 => 20,
        SkillLevel::Beginner if height > 1.0 => -30,
        SkillLevel::Intermediate if (0.5..=1.2).contains(&height) => 10,
        SkillLevel::Intermediate if height > 2.0 => -20,
        SkillLevel::Advanced if (0.7..=2.0).contains(&height) => 10,
        SkillLevel::Expert if (1.0..=3.0).contains(&height) => 20,
        _ => 0,
    };
    apply(score, delta)
}

/// Board type delta, then the length tie-break. Without a board type the
/// whole stage is skipped, length included.
fn adjust_for_board(score: u8, height: f64, board: Option<BoardType>, length: Option<f64>) -> u8 {
    let Some(board) = board else {
        return score;
    };
    let delta = match board {
        BoardType::Shortboard if (0.7..=2.5).contains(&height) => 15,
        BoardType::Shortboard if height < 0.5 => -20,
        BoardType::Longboard if (0.3..=1.2).contains(&height) => 15,
        BoardType::Longboard if height > 1.8 => -25,
        BoardType::Funboard if (0.4..=1.5).contains(&height) => 10,
        _ => 0,
    };
    let score = apply(score, delta);

    match length {
        Some(length) if length < 6.0 && height > 1.5 => apply(score, 5),
        Some(length) if length > 8.0 && height < 0.8 => apply(score, 5),
        _ => score,
    }
}

/// Coarse rating from wave height alone, used when precomputing per-spot
/// ratings without a full forecast. Expert surfers share the advanced scale.
#[must_use]
pub fn rating_for_wave_height(height: f64, skill: SkillLevel) -> Rating {
    match skill {
        SkillLevel::Beginner => match height {
            h if h < 0.5 => Rating::Good,
            h if h < 1.0 => Rating::Fair,
            h if h < 1.5 => Rating::Poor,
            _ => Rating::Bad,
        },
        SkillLevel::Intermediate => match height {
            h if h < 0.5 => Rating::Fair,
            h if h < 1.0 => Rating::Good,
            h if h < 1.5 => Rating::Excellent,
            h if h < 2.0 => Rating::Good,
            h if h < 2.5 => Rating::Fair,
            _ => Rating::Poor,
        },
        SkillLevel::Advanced | SkillLevel::Expert => match height {
            h if h < 0.5 => Rating::Poor,
            h if h < 1.0 => Rating::Fair,
            h if h < 1.5 => Rating::Good,
            h if h < 2.5 => Rating::Excellent,
            h if h < 3.5 => Rating::Good,
            _ => Rating::Fair,
        },
    }
}
