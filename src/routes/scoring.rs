use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::{
        hall_of_fame::HallOfFameEntryDto,
        scoring::{
            EligibilityRequest, EligibilityResponse, PerformanceRatingQuery,
            PerformanceRatingResponse, ScoringLeaderboardQuery, UserStatisticsResponse,
        },
    },
    error::AppError,
    services::{hall_of_fame_service, scoring},
    state::SharedState,
};

/// Routes exposing the scoring helpers and score-derived reads.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/scoring/performance-rating", get(performance_rating))
        .route("/api/scoring/leaderboard", get(leaderboard))
        .route("/api/scoring/statistics/{username}", get(user_statistics))
        .route(
            "/api/scoring/validate-hall-of-fame",
            post(validate_eligibility),
        )
}

/// Derive a qualitative performance rating for a finished session.
#[utoipa::path(
    get,
    path = "/api/scoring/performance-rating",
    tag = "scoring",
    params(
        ("score" = i64, Query, description = "Final session score"),
        ("accuracy" = f64, Query, description = "Session accuracy in percent"),
        ("maxMultiplier" = u32, Query, description = "Highest multiplier reached")
    ),
    responses(
        (status = 200, description = "Rating", body = PerformanceRatingResponse),
        (status = 400, description = "Inputs out of range")
    )
)]
pub async fn performance_rating(
    State(state): State<SharedState>,
    Query(query): Query<PerformanceRatingQuery>,
) -> Result<Json<PerformanceRatingResponse>, AppError> {
    let rating = scoring::performance_rating(
        query.score,
        query.accuracy,
        query.max_multiplier,
        state.config().multiplier_cap,
    )
    .map_err(AppError::from)?;

    Ok(Json(PerformanceRatingResponse {
        rating: rating.as_str().to_string(),
    }))
}

/// Leaderboard for a question set, addressed through the scoring family.
#[utoipa::path(
    get,
    path = "/api/scoring/leaderboard",
    tag = "scoring",
    params(
        ("questionSetId" = Uuid, Query, description = "Question set"),
        ("limit" = Option<usize>, Query, description = "Maximum entries to return")
    ),
    responses((status = 200, description = "Leaderboard", body = [HallOfFameEntryDto]))
)]
pub async fn leaderboard(
    State(state): State<SharedState>,
    Query(query): Query<ScoringLeaderboardQuery>,
) -> Result<Json<Vec<HallOfFameEntryDto>>, AppError> {
    let entries =
        hall_of_fame_service::leaderboard(&state, query.question_set_id, query.limit).await?;
    Ok(Json(entries))
}

/// Aggregate statistics across a user's recorded sessions.
#[utoipa::path(
    get,
    path = "/api/scoring/statistics/{username}",
    tag = "scoring",
    params(("username" = String, Path, description = "User")),
    responses(
        (status = 200, description = "Statistics", body = UserStatisticsResponse),
        (status = 404, description = "User has no recorded sessions")
    )
)]
pub async fn user_statistics(
    State(state): State<SharedState>,
    Path(username): Path<String>,
) -> Result<Json<UserStatisticsResponse>, AppError> {
    let stats = hall_of_fame_service::user_statistics(&state, &username).await?;
    Ok(Json(stats))
}

/// Check whether a session qualifies for hall-of-fame submission.
#[utoipa::path(
    post,
    path = "/api/scoring/validate-hall-of-fame",
    tag = "scoring",
    request_body = EligibilityRequest,
    responses(
        (status = 200, description = "Eligibility verdict", body = EligibilityResponse),
        (status = 400, description = "Impossible question counts")
    )
)]
pub async fn validate_eligibility(
    State(state): State<SharedState>,
    Json(payload): Json<EligibilityRequest>,
) -> Result<Json<EligibilityResponse>, AppError> {
    let verdict = hall_of_fame_service::validate_eligibility(&state, payload).await?;
    Ok(Json(verdict))
}
