use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::{
        game::GameSessionSummary,
        lobby::{
            CleanupResponse, CreateLobbyRequest, JoinLobbyRequest, ListLobbiesQuery,
            LobbySettingsInput, LobbyStatsResponse, LobbySummary, UpdatePlayerRequest,
        },
    },
    error::AppError,
    routes::auth::AuthedUser,
    services::lobby_service,
    state::SharedState,
};

/// Routes handling lobby lifecycle and membership.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/lobbies", post(create_lobby).get(list_lobbies))
        .route("/api/lobbies/join", post(join_lobby))
        .route("/api/lobbies/my", get(my_lobby))
        .route("/api/lobbies/stats", get(lobby_stats))
        .route("/api/lobbies/cleanup", delete(cleanup_expired))
        .route("/api/lobbies/{code}", get(get_lobby))
        .route("/api/lobbies/{code}/leave", delete(leave_lobby))
        .route("/api/lobbies/{code}/players/{player_id}", put(update_player))
        .route("/api/lobbies/{code}/settings", put(update_settings))
        .route("/api/lobbies/{code}/start", post(start_game))
}

/// Create a lobby with the caller as host.
#[utoipa::path(
    post,
    path = "/api/lobbies",
    tag = "lobby",
    request_body = CreateLobbyRequest,
    responses(
        (status = 200, description = "Lobby created", body = LobbySummary),
        (status = 400, description = "Settings out of bounds")
    )
)]
pub async fn create_lobby(
    State(state): State<SharedState>,
    user: AuthedUser,
    Json(payload): Json<CreateLobbyRequest>,
) -> Result<Json<LobbySummary>, AppError> {
    let summary =
        lobby_service::create_lobby(&state, user.user_id, user.username, payload).await?;
    Ok(Json(summary))
}

/// List lobbies, optionally filtered by status.
#[utoipa::path(
    get,
    path = "/api/lobbies",
    tag = "lobby",
    params(("status" = Option<String>, Query, description = "Filter by lobby status")),
    responses((status = 200, description = "Known lobbies", body = [LobbySummary]))
)]
pub async fn list_lobbies(
    State(state): State<SharedState>,
    Query(query): Query<ListLobbiesQuery>,
) -> Result<Json<Vec<LobbySummary>>, AppError> {
    let summaries = lobby_service::list_lobbies(&state, query.status.as_deref()).await?;
    Ok(Json(summaries))
}

/// Join a waiting lobby by code.
#[utoipa::path(
    post,
    path = "/api/lobbies/join",
    tag = "lobby",
    request_body = JoinLobbyRequest,
    responses(
        (status = 200, description = "Joined", body = LobbySummary),
        (status = 404, description = "No waiting lobby with this code"),
        (status = 409, description = "Already a member")
    )
)]
pub async fn join_lobby(
    State(state): State<SharedState>,
    user: AuthedUser,
    Valid(Json(payload)): Valid<Json<JoinLobbyRequest>>,
) -> Result<Json<LobbySummary>, AppError> {
    let summary = lobby_service::join_lobby(&state, user.user_id, user.username, payload).await?;
    Ok(Json(summary))
}

/// The lobby the caller is currently a member of.
#[utoipa::path(
    get,
    path = "/api/lobbies/my",
    tag = "lobby",
    responses(
        (status = 200, description = "Current lobby", body = LobbySummary),
        (status = 404, description = "Not in any lobby")
    )
)]
pub async fn my_lobby(
    State(state): State<SharedState>,
    user: AuthedUser,
) -> Result<Json<LobbySummary>, AppError> {
    let summary = lobby_service::my_lobby(&state, user.user_id)
        .await
        .ok_or_else(|| AppError::NotFound("not a member of any lobby".into()))?;
    Ok(Json(summary))
}

/// Aggregate lobby counts by status.
#[utoipa::path(
    get,
    path = "/api/lobbies/stats",
    tag = "lobby",
    responses((status = 200, description = "Lobby counts", body = LobbyStatsResponse))
)]
pub async fn lobby_stats(State(state): State<SharedState>) -> Json<LobbyStatsResponse> {
    Json(lobby_service::lobby_stats(&state).await)
}

/// Sweep lobbies that outlived their TTL without starting.
#[utoipa::path(
    delete,
    path = "/api/lobbies/cleanup",
    tag = "lobby",
    responses((status = 200, description = "Sweep result", body = CleanupResponse))
)]
pub async fn cleanup_expired(State(state): State<SharedState>) -> Json<CleanupResponse> {
    let removed = lobby_service::cleanup_expired(&state).await;
    Json(CleanupResponse { removed })
}

/// Fetch a lobby snapshot by code.
#[utoipa::path(
    get,
    path = "/api/lobbies/{code}",
    tag = "lobby",
    params(("code" = String, Path, description = "Lobby code")),
    responses(
        (status = 200, description = "Lobby snapshot", body = LobbySummary),
        (status = 404, description = "Unknown lobby")
    )
)]
pub async fn get_lobby(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<LobbySummary>, AppError> {
    let summary = lobby_service::get_lobby(&state, &code).await?;
    Ok(Json(summary))
}

/// Leave a lobby.
#[utoipa::path(
    delete,
    path = "/api/lobbies/{code}/leave",
    tag = "lobby",
    params(("code" = String, Path, description = "Lobby code")),
    responses(
        (status = 204, description = "Left the lobby"),
        (status = 404, description = "Unknown lobby or not a member")
    )
)]
pub async fn leave_lobby(
    State(state): State<SharedState>,
    user: AuthedUser,
    Path(code): Path<String>,
) -> Result<axum::http::StatusCode, AppError> {
    lobby_service::leave_lobby(&state, &code, user.user_id).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

/// Update a roster member (readiness, connection flag, character).
#[utoipa::path(
    put,
    path = "/api/lobbies/{code}/players/{player_id}",
    tag = "lobby",
    params(
        ("code" = String, Path, description = "Lobby code"),
        ("player_id" = Uuid, Path, description = "Roster member to update")
    ),
    request_body = UpdatePlayerRequest,
    responses(
        (status = 200, description = "Updated lobby snapshot", body = LobbySummary),
        (status = 403, description = "Only the host may update other players")
    )
)]
pub async fn update_player(
    State(state): State<SharedState>,
    user: AuthedUser,
    Path((code, player_id)): Path<(String, Uuid)>,
    Json(payload): Json<UpdatePlayerRequest>,
) -> Result<Json<LobbySummary>, AppError> {
    let summary =
        lobby_service::update_player(&state, &code, user.user_id, player_id, payload.into())
            .await?;
    Ok(Json(summary))
}

/// Update lobby settings. Host only, before the game starts.
#[utoipa::path(
    put,
    path = "/api/lobbies/{code}/settings",
    tag = "lobby",
    params(("code" = String, Path, description = "Lobby code")),
    request_body = LobbySettingsInput,
    responses(
        (status = 200, description = "Updated lobby snapshot", body = LobbySummary),
        (status = 400, description = "Settings out of bounds"),
        (status = 403, description = "Only the host may change settings")
    )
)]
pub async fn update_settings(
    State(state): State<SharedState>,
    user: AuthedUser,
    Path(code): Path<String>,
    Json(payload): Json<LobbySettingsInput>,
) -> Result<Json<LobbySummary>, AppError> {
    let summary =
        lobby_service::update_settings(&state, &code, user.user_id, payload.into()).await?;
    Ok(Json(summary))
}

/// Start the game. Host only; requires enough ready players.
#[utoipa::path(
    post,
    path = "/api/lobbies/{code}/start",
    tag = "lobby",
    params(("code" = String, Path, description = "Lobby code")),
    responses(
        (status = 200, description = "Session started", body = GameSessionSummary),
        (status = 400, description = "Roster not ready"),
        (status = 403, description = "Only the host may start"),
        (status = 409, description = "Game already started")
    )
)]
pub async fn start_game(
    State(state): State<SharedState>,
    user: AuthedUser,
    Path(code): Path<String>,
) -> Result<Json<GameSessionSummary>, AppError> {
    let summary = lobby_service::start_game(&state, &code, user.user_id).await?;
    Ok(Json(summary))
}
