use std::sync::Arc;

use axum::{
    Router,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{Span, field, instrument, warn};

use crate::{
    aggregator::ForecastAggregator,
    error::{AggregationError, SurfcastError, ValidationError},
    models::{
        Coordinate, Rating, RankedSpotScore, ScoredObservation, SkillLevel, SpotScore,
        SurferProfile, UnifiedForecast,
    },
    providers::{CredentialSet, ForecastRequest, ProviderName},
    ranking,
    scoring::{self, ScoringEngine},
};

pub struct AppState {
    pub aggregator: ForecastAggregator,
    pub credentials: CredentialSet,
    pub scoring: ScoringEngine,
}

impl AppState {
    #[must_use]
    pub fn new(aggregator: ForecastAggregator, credentials: CredentialSet) -> Self {
        Self {
            aggregator,
            credentials,
            scoring: ScoringEngine::default(),
        }
    }
}

#[derive(Deserialize)]
pub struct ForecastQuery {
    pub lat: f64,
    pub lng: f64,
    pub spot_id: Option<String>,
    /// Restrict the timeline to one UTC day
    pub date: Option<NaiveDate>,
}

#[derive(Deserialize)]
pub struct ScoreQuery {
    pub lat: f64,
    pub lng: f64,
    pub skill_level: String,
    pub board_type: Option<String>,
    pub board_length: Option<f64>,
    pub spot_id: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct ScoreResponse {
    pub sources: Vec<ProviderName>,
    pub unavailable: Vec<ProviderName>,
    pub hours: Vec<ScoredObservation>,
}

#[derive(Deserialize)]
pub struct RatingQuery {
    pub wave_height: f64,
    pub skill_level: String,
}

#[derive(Serialize, Deserialize)]
pub struct RatingResponse {
    pub wave_height: f64,
    pub skill_level: SkillLevel,
    pub rating: Rating,
}

#[derive(Deserialize)]
pub struct RankRequest {
    pub profile: SurferProfile,
    pub scores: Vec<SpotScore>,
    pub region_id: Option<i64>,
}

pub struct ApiError(SurfcastError);

impl From<SurfcastError> for ApiError {
    fn from(err: SurfcastError) -> Self {
        Self(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self(err.into())
    }
}

impl From<AggregationError> for ApiError {
    fn from(err: AggregationError) -> Self {
        Self(err.into())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ValidationError::MalformedRequest(rejection.body_text()).into()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ValidationError::MalformedRequest(rejection.body_text()).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SurfcastError::Validation(_) => StatusCode::BAD_REQUEST,
            SurfcastError::Aggregation(_) => StatusCode::SERVICE_UNAVAILABLE,
            SurfcastError::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status != StatusCode::BAD_REQUEST {
            warn!("Request failed: {}", self.0);
        }
        (status, Json(json!({ "error": self.0.user_message() }))).into_response()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/forecast", get(get_forecast))
        .route("/score", get(get_score))
        .route("/rating", get(get_rating))
        .route("/rank", post(rank_spots))
        .with_state(state)
}

fn forecast_request(
    lat: f64,
    lng: f64,
    spot_id: Option<String>,
) -> Result<ForecastRequest, ValidationError> {
    let coordinate = Coordinate::new(lat, lng)?;
    match spot_id {
        Some(spot_id) => ForecastRequest::spot(coordinate, spot_id),
        None => Ok(ForecastRequest::point(coordinate)),
    }
}

fn record_coordinate(lat: f64, lng: f64) {
    let span = Span::current();
    span.record("lat", lat);
    span.record("lng", lng);
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "version": crate::VERSION }))
}

#[instrument(name = "get_forecast", skip_all, fields(lat = field::Empty, lng = field::Empty))]
async fn get_forecast(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ForecastQuery>, QueryRejection>,
) -> Result<Json<UnifiedForecast>, ApiError> {
    let Query(query) = query?;
    record_coordinate(query.lat, query.lng);

    let request = forecast_request(query.lat, query.lng, query.spot_id)?;
    let mut forecast = state
        .aggregator
        .forecast(&request, &state.credentials)
        .await?;

    if let Some(date) = query.date {
        let hourly = forecast.hours_on(date).cloned().collect();
        forecast.hourly = hourly;
        forecast.daily.retain(|day| day.date == date);
    }
    Ok(Json(forecast))
}

#[instrument(name = "get_score", skip_all, fields(lat = field::Empty, lng = field::Empty))]
async fn get_score(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ScoreQuery>, QueryRejection>,
) -> Result<Json<ScoreResponse>, ApiError> {
    let Query(query) = query?;
    record_coordinate(query.lat, query.lng);

    let profile = SurferProfile::parse(
        &query.skill_level,
        query.board_type.as_deref(),
        query.board_length,
    )?;
    let request = forecast_request(query.lat, query.lng, query.spot_id)?;

    let forecast = state
        .aggregator
        .forecast(&request, &state.credentials)
        .await?;
    let hours = state.scoring.score(&forecast, &profile);

    Ok(Json(ScoreResponse {
        sources: forecast.sources,
        unavailable: forecast.unavailable,
        hours,
    }))
}

async fn get_rating(
    query: Result<Query<RatingQuery>, QueryRejection>,
) -> Result<Json<RatingResponse>, ApiError> {
    let Query(query) = query?;
    if !query.wave_height.is_finite() || query.wave_height < 0.0 {
        return Err(ValidationError::WaveHeight(query.wave_height).into());
    }
    let skill_level: SkillLevel = query.skill_level.parse()?;

    Ok(Json(RatingResponse {
        wave_height: query.wave_height,
        skill_level,
        rating: scoring::rating_for_wave_height(query.wave_height, skill_level),
    }))
}

#[instrument(name = "rank_spots", skip_all, fields(spots = field::Empty))]
async fn rank_spots(
    payload: Result<Json<RankRequest>, JsonRejection>,
) -> Result<Json<Vec<RankedSpotScore>>, ApiError> {
    let Json(payload) = payload?;
    Span::current().record("spots", payload.scores.len() as u64);

    payload.profile.validate()?;
    let now = Utc::now();
    let ranked = match payload.region_id {
        Some(region_id) => ranking::rank_in_region(payload.scores, &payload.profile, region_id, now),
        None => ranking::rank(payload.scores, &payload.profile, now),
    };
    Ok(Json(ranked))
}
