//! Cross-spot recommendation ranking

use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::models::{Rating, RankedSpotScore, SpotDifficulty, SpotScore, SurferProfile};

/// Rating after the board-length tie-break: short boards get a bump at
/// advanced spots, long boards at beginner spots
#[must_use]
pub fn adjusted_rating(rating: Rating, difficulty: SpotDifficulty, board_length: Option<f64>) -> Rating {
    match board_length {
        Some(length) if length <= 6.0 && difficulty == SpotDifficulty::Advanced => rating.upgraded(),
        Some(length) if length > 8.0 && difficulty == SpotDifficulty::Beginner => rating.upgraded(),
        _ => rating,
    }
}

/// Rank spot scores for `profile`, best first.
///
/// Scores whose forecast time lies before `now` are dropped. Equal adjusted
/// ratings keep their input order.
#[must_use]
pub fn rank(scores: Vec<SpotScore>, profile: &SurferProfile, now: DateTime<Utc>) -> Vec<RankedSpotScore> {
    let total = scores.len();
    let mut ranked: Vec<RankedSpotScore> = scores
        .into_iter()
        .filter(|score| score.forecast_time >= now)
        .map(|score| RankedSpotScore {
            adjusted_rating: adjusted_rating(score.rating, score.difficulty, profile.board_length),
            spot_id: score.spot_id,
            forecast_time: score.forecast_time,
            rating: score.rating,
        })
        .collect();

    // sort_by_key is stable
    ranked.sort_by_key(|score| Reverse(score.adjusted_rating.ordinal()));

    debug!("Ranked {} of {} spot scores", ranked.len(), total);
    ranked
}

/// [`rank`] restricted to spots in `region_id`
#[must_use]
pub fn rank_in_region(
    scores: Vec<SpotScore>,
    profile: &SurferProfile,
    region_id: i64,
    now: DateTime<Utc>,
) -> Vec<RankedSpotScore> {
    let in_region = scores
        .into_iter()
        .filter(|score| score.region_id == Some(region_id))
        .collect();
    rank(in_region, profile, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BoardType, SkillLevel};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 6, 0, 0).unwrap()
    }

    fn spot(id: &str, rating: Rating, difficulty: SpotDifficulty) -> SpotScore {
        SpotScore {
            spot_id: id.to_string(),
            forecast_time: now() + Duration::hours(3),
            rating,
            difficulty,
            region_id: Some(1),
        }
    }

    fn profile(board_length: Option<f64>) -> SurferProfile {
        SurferProfile {
            skill_level: SkillLevel::Intermediate,
            board_type: Some(BoardType::Shortboard),
            board_length,
        }
    }

    #[test]
    fn test_short_board_bumps_advanced_spot() {
        let scores = vec![
            spot("reef", Rating::Fair, SpotDifficulty::Advanced),
            spot("point", Rating::Excellent, SpotDifficulty::Intermediate),
            spot("beach", Rating::Good, SpotDifficulty::Intermediate),
        ];

        let ranked = rank(scores, &profile(Some(5.0)), now());

        let order: Vec<(&str, Rating)> = ranked
            .iter()
            .map(|r| (r.spot_id.as_str(), r.adjusted_rating))
            .collect();
        assert_eq!(
            order,
            vec![
                ("point", Rating::Excellent),
                ("reef", Rating::Good),
                ("beach", Rating::Good),
            ]
        );
        assert_eq!(ranked[1].rating, Rating::Fair);
    }

    #[test]
    fn test_adjustment_rules() {
        use SpotDifficulty::*;
        assert_eq!(adjusted_rating(Rating::Poor, Advanced, Some(6.0)), Rating::Fair);
        assert_eq!(adjusted_rating(Rating::Poor, Advanced, Some(6.5)), Rating::Poor);
        assert_eq!(adjusted_rating(Rating::Poor, Beginner, Some(9.0)), Rating::Fair);
        assert_eq!(adjusted_rating(Rating::Poor, Beginner, Some(8.0)), Rating::Poor);
        assert_eq!(adjusted_rating(Rating::Poor, Beginner, Some(5.0)), Rating::Poor);
        assert_eq!(adjusted_rating(Rating::Excellent, Advanced, Some(5.0)), Rating::Excellent);
        assert_eq!(adjusted_rating(Rating::Good, Advanced, None), Rating::Good);
    }

    #[test]
    fn test_past_forecasts_are_dropped() {
        let mut past = spot("yesterday", Rating::Excellent, SpotDifficulty::Intermediate);
        past.forecast_time = now() - Duration::seconds(1);
        let mut current = spot("now", Rating::Bad, SpotDifficulty::Intermediate);
        current.forecast_time = now();

        let ranked = rank(vec![past, current], &profile(None), now());
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].spot_id, "now");
    }

    #[test]
    fn test_rank_in_region() {
        let mut elsewhere = spot("elsewhere", Rating::Excellent, SpotDifficulty::Intermediate);
        elsewhere.region_id = Some(2);
        let mut unassigned = spot("unassigned", Rating::Excellent, SpotDifficulty::Intermediate);
        unassigned.region_id = None;
        let local = spot("local", Rating::Poor, SpotDifficulty::Beginner);

        let ranked = rank_in_region(vec![elsewhere, unassigned, local], &profile(Some(9.5)), 1, now());
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].spot_id, "local");
        assert_eq!(ranked[0].adjusted_rating, Rating::Fair);
    }
}
