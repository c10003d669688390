use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::game::{GameSessionSummary, GameStateSummary, SubmitAnswerRequest},
    error::AppError,
    routes::auth::AuthedUser,
    services::game_service,
    state::SharedState,
};

/// Routes exposing session records and the live game surface.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/games/{session_id}", get(get_session))
        .route("/api/lobbies/{code}/game", get(game_state))
        .route("/api/lobbies/{code}/answers", post(submit_answer))
}

/// Fetch a persisted session record.
#[utoipa::path(
    get,
    path = "/api/games/{session_id}",
    tag = "game",
    params(("session_id" = Uuid, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Session record", body = GameSessionSummary),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn get_session(
    State(state): State<SharedState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<GameSessionSummary>, AppError> {
    let summary = game_service::find_session(&state, session_id).await?;
    Ok(Json(summary))
}

/// Snapshot the runtime state of a lobby's active session.
#[utoipa::path(
    get,
    path = "/api/lobbies/{code}/game",
    tag = "game",
    params(("code" = String, Path, description = "Lobby code")),
    responses(
        (status = 200, description = "Runtime game state", body = GameStateSummary),
        (status = 404, description = "No active session for this lobby")
    )
)]
pub async fn game_state(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<GameStateSummary>, AppError> {
    let summary = game_service::current_game_state(&state, &code).await?;
    Ok(Json(summary))
}

/// Submit an answer for the live question over REST.
#[utoipa::path(
    post,
    path = "/api/lobbies/{code}/answers",
    tag = "game",
    params(("code" = String, Path, description = "Lobby code")),
    request_body = SubmitAnswerRequest,
    responses(
        (status = 204, description = "Answer recorded"),
        (status = 404, description = "No active session or not a participant"),
        (status = 409, description = "Already answered or window closed")
    )
)]
pub async fn submit_answer(
    State(state): State<SharedState>,
    user: AuthedUser,
    Path(code): Path<String>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<axum::http::StatusCode, AppError> {
    game_service::submit_answer(&state, &code, &user.username, payload.answer).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}
