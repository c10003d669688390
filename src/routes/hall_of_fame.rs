use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::{
        hall_of_fame::{HallOfFameEntryDto, LeaderboardQuery, RankResponse, SubmitEntryRequest},
        scoring::{EligibilityRequest, EligibilityResponse},
    },
    error::AppError,
    services::hall_of_fame_service,
    state::SharedState,
};

/// Routes exposing leaderboard submission and reads.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/hall-of-fame/submit", post(submit_entry))
        .route(
            "/api/hall-of-fame/validate-eligibility",
            post(validate_eligibility),
        )
        .route(
            "/api/hall-of-fame/leaderboard/{question_set_id}",
            get(leaderboard),
        )
        .route(
            "/api/hall-of-fame/sessions/{session_id}/{username}",
            get(entry_for_session),
        )
        .route(
            "/api/hall-of-fame/user/{username}/best-scores",
            get(user_best_scores),
        )
        .route(
            "/api/hall-of-fame/user/{username}/rank/{question_set_id}",
            get(user_rank),
        )
}

/// Submit a finished session's result to the hall of fame.
#[utoipa::path(
    post,
    path = "/api/hall-of-fame/submit",
    tag = "hall-of-fame",
    request_body = SubmitEntryRequest,
    responses(
        (status = 200, description = "Entry recorded", body = HallOfFameEntryDto),
        (status = 400, description = "Values out of range"),
        (status = 409, description = "Entry already exists for this session and user")
    )
)]
pub async fn submit_entry(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<SubmitEntryRequest>>,
) -> Result<Json<HallOfFameEntryDto>, AppError> {
    let entry = hall_of_fame_service::submit_entry(&state, payload).await?;
    Ok(Json(entry))
}

/// Check a session's completion rate against the eligibility threshold.
#[utoipa::path(
    post,
    path = "/api/hall-of-fame/validate-eligibility",
    tag = "hall-of-fame",
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

/// Top entries for a question set, best first.
#[utoipa::path(
    get,
    path = "/api/hall-of-fame/leaderboard/{question_set_id}",
    tag = "hall-of-fame",
    params(
        ("question_set_id" = Uuid, Path, description = "Question set"),
        ("limit" = Option<usize>, Query, description = "Maximum entries to return")
    ),
    responses((status = 200, description = "Leaderboard", body = [HallOfFameEntryDto]))
)]
pub async fn leaderboard(
    State(state): State<SharedState>,
    Path(question_set_id): Path<Uuid>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<HallOfFameEntryDto>>, AppError> {
    let entries = hall_of_fame_service::leaderboard(&state, question_set_id, query.limit).await?;
    Ok(Json(entries))
}

/// The entry a user submitted for one session.
#[utoipa::path(
    get,
    path = "/api/hall-of-fame/sessions/{session_id}/{username}",
    tag = "hall-of-fame",
    params(
        ("session_id" = Uuid, Path, description = "Session the entry belongs to"),
        ("username" = String, Path, description = "User who submitted it")
    ),
    responses(
        (status = 200, description = "Entry", body = HallOfFameEntryDto),
        (status = 404, description = "No entry for this session and user")
    )
)]
pub async fn entry_for_session(
    State(state): State<SharedState>,
    Path((session_id, username)): Path<(Uuid, String)>,
) -> Result<Json<HallOfFameEntryDto>, AppError> {
    let entry = hall_of_fame_service::entry_for_session(&state, session_id, &username).await?;
    Ok(Json(entry))
}

/// A user's best entry per question set.
#[utoipa::path(
    get,
    path = "/api/hall-of-fame/user/{username}/best-scores",
    tag = "hall-of-fame",
    params(("username" = String, Path, description = "User")),
    responses((status = 200, description = "Best entries", body = [HallOfFameEntryDto]))
)]
pub async fn user_best_scores(
    State(state): State<SharedState>,
    Path(username): Path<String>,
) -> Result<Json<Vec<HallOfFameEntryDto>>, AppError> {
    let entries = hall_of_fame_service::user_best_scores(&state, &username).await?;
    Ok(Json(entries))
}

/// A user's 1-based rank on a question set's leaderboard.
#[utoipa::path(
    get,
    path = "/api/hall-of-fame/user/{username}/rank/{question_set_id}",
    tag = "hall-of-fame",
    params(
        ("username" = String, Path, description = "User to rank"),
        ("question_set_id" = Uuid, Path, description = "Question set")
    ),
    responses(
        (status = 200, description = "Rank", body = RankResponse),
        (status = 404, description = "No entry for this user and set")
    )
)]
pub async fn user_rank(
    State(state): State<SharedState>,
    Path((username, question_set_id)): Path<(String, Uuid)>,
) -> Result<Json<RankResponse>, AppError> {
    let rank = hall_of_fame_service::user_rank(&state, question_set_id, &username).await?;
    Ok(Json(rank))
}
