use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Quiz Rally Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::lobby::create_lobby,
        crate::routes::lobby::list_lobbies,
        crate::routes::lobby::join_lobby,
        crate::routes::lobby::my_lobby,
        crate::routes::lobby::lobby_stats,
        crate::routes::lobby::cleanup_expired,
        crate::routes::lobby::get_lobby,
        crate::routes::lobby::leave_lobby,
        crate::routes::lobby::update_player,
        crate::routes::lobby::update_settings,
        crate::routes::lobby::start_game,
        crate::routes::game::get_session,
        crate::routes::game::game_state,
        crate::routes::game::submit_answer,
        crate::routes::scoring::performance_rating,
        crate::routes::scoring::leaderboard,
        crate::routes::scoring::user_statistics,
        crate::routes::scoring::validate_eligibility,
        crate::routes::hall_of_fame::submit_entry,
        crate::routes::hall_of_fame::validate_eligibility,
        crate::routes::hall_of_fame::leaderboard,
        crate::routes::hall_of_fame::entry_for_session,
        crate::routes::hall_of_fame::user_rank,
        crate::routes::hall_of_fame::user_best_scores,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::lobby::CreateLobbyRequest,
            crate::dto::lobby::LobbySettingsInput,
            crate::dto::lobby::JoinLobbyRequest,
            crate::dto::lobby::UpdatePlayerRequest,
            crate::dto::lobby::LobbySettingsDto,
            crate::dto::lobby::PlayerSummary,
            crate::dto::lobby::LobbySummary,
            crate::dto::lobby::LobbyStatsResponse,
            crate::dto::lobby::CleanupResponse,
            crate::dto::game::GameSessionSummary,
            crate::dto::game::GameStateSummary,
            crate::dto::game::PlayerStanding,
            crate::dto::game::QuestionPublic,
            crate::dto::game::SubmitAnswerRequest,
            crate::dto::scoring::PerformanceRatingResponse,
            crate::dto::scoring::EligibilityRequest,
            crate::dto::scoring::EligibilityResponse,
            crate::dto::scoring::UserStatisticsResponse,
            crate::dto::hall_of_fame::SubmitEntryRequest,
            crate::dto::hall_of_fame::HallOfFameEntryDto,
            crate::dto::hall_of_fame::RankResponse,
            crate::dto::ws::ClientMessage,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "lobby", description = "Lobby lifecycle and membership"),
        (name = "game", description = "Game sessions and answer intake"),
        (name = "scoring", description = "Scoring helpers"),
        (name = "hall-of-fame", description = "Leaderboards and user aggregates"),
    )
)]
pub struct ApiDoc;
