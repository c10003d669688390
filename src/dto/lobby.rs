use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{format_system_time, validation::validate_lobby_code},
    state::lobby::{Lobby, LobbySettings, Player, PlayerPatch, SettingsPatch},
};

/// Payload used to create a new lobby.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLobbyRequest {
    /// Cosmetic character for the host.
    #[serde(default)]
    pub character: Option<String>,
    /// Initial settings; omitted fields use the configured defaults.
    #[serde(default)]
    pub settings: Option<LobbySettingsInput>,
}

/// Partial settings supplied on lobby creation or settings update.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LobbySettingsInput {
    /// Number of questions per game.
    #[serde(default)]
    pub question_count: Option<u32>,
    /// Per-question answer window in seconds.
    #[serde(default)]
    pub time_limit_seconds: Option<u64>,
    /// Whether the lobby returns to waiting after a game.
    #[serde(default)]
    pub allow_replay: Option<bool>,
    /// Question sets to draw questions from.
    #[serde(default)]
    pub question_set_ids: Option<Vec<Uuid>>,
}

impl From<LobbySettingsInput> for SettingsPatch {
    fn from(input: LobbySettingsInput) -> Self {
        Self {
            question_count: input.question_count,
            time_limit_secs: input.time_limit_seconds,
            allow_replay: input.allow_replay,
            question_set_ids: input.question_set_ids,
        }
    }
}

/// Payload used to join an existing lobby by code.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct JoinLobbyRequest {
    /// Code of the lobby to join.
    #[validate(custom(function = validate_lobby_code))]
    pub lobby_code: String,
    /// Cosmetic character for the joining player.
    #[serde(default)]
    pub character: Option<String>,
}

/// Partial player update; only provided fields change.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlayerRequest {
    /// New readiness flag.
    #[serde(default)]
    pub is_ready: Option<bool>,
    /// New connection flag.
    #[serde(default)]
    pub is_connected: Option<bool>,
    /// New cosmetic character.
    #[serde(default)]
    pub character: Option<String>,
}

impl From<UpdatePlayerRequest> for PlayerPatch {
    fn from(request: UpdatePlayerRequest) -> Self {
        Self {
            is_ready: request.is_ready,
            is_connected: request.is_connected,
            character: request.character,
        }
    }
}

/// Query filter accepted by the lobby listing endpoint.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListLobbiesQuery {
    /// Only return lobbies with this status (wire name, e.g. `waiting`).
    #[serde(default)]
    pub status: Option<String>,
}

/// Public projection of lobby settings.
#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LobbySettingsDto {
    pub question_count: u32,
    pub time_limit_seconds: u64,
    pub allow_replay: bool,
    pub question_set_ids: Vec<Uuid>,
}

impl From<&LobbySettings> for LobbySettingsDto {
    fn from(settings: &LobbySettings) -> Self {
        Self {
            question_count: settings.question_count,
            time_limit_seconds: settings.time_limit_secs,
            allow_replay: settings.allow_replay,
            question_set_ids: settings.question_set_ids.clone(),
        }
    }
}

impl From<&crate::dao::models::SettingsEntity> for LobbySettingsDto {
    fn from(settings: &crate::dao::models::SettingsEntity) -> Self {
        Self {
            question_count: settings.question_count,
            time_limit_seconds: settings.time_limit_secs,
            allow_replay: settings.allow_replay,
            question_set_ids: settings.question_set_ids.clone(),
        }
    }
}

/// Public projection of a roster member.
#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub user_id: Uuid,
    pub username: String,
    pub character: Option<String>,
    pub is_ready: bool,
    pub is_connected: bool,
    pub score: i64,
    pub multiplier: u32,
    /// Derived: whether this player currently holds host privileges.
    pub is_host: bool,
}

impl PlayerSummary {
    fn from_player(player: &Player, host_id: Uuid) -> Self {
        Self {
            user_id: player.user_id,
            username: player.username.clone(),
            character: player.character.clone(),
            is_ready: player.is_ready,
            is_connected: player.is_connected,
            score: player.score,
            multiplier: player.multiplier,
            is_host: player.user_id == host_id,
        }
    }
}

/// Public projection of a lobby exposed to REST and realtime clients.
#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LobbySummary {
    pub code: String,
    pub host_id: Uuid,
    pub status: String,
    pub players: Vec<PlayerSummary>,
    pub settings: LobbySettingsDto,
    pub created_at: String,
    pub expires_at: String,
}

impl From<&Lobby> for LobbySummary {
    fn from(lobby: &Lobby) -> Self {
        Self {
            code: lobby.code.clone(),
            host_id: lobby.host_id,
            status: lobby.status.as_str().to_string(),
            players: lobby
                .players
                .values()
                .map(|player| PlayerSummary::from_player(player, lobby.host_id))
                .collect(),
            settings: (&lobby.settings).into(),
            created_at: format_system_time(lobby.created_at),
            expires_at: format_system_time(lobby.expires_at),
        }
    }
}

/// Aggregate counts returned by the lobby stats endpoint.
#[derive(Debug, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LobbyStatsResponse {
    pub waiting: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub expired: usize,
    pub total: usize,
}

/// Result of an expired-lobby sweep.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CleanupResponse {
    /// Number of lobbies removed by this sweep.
    pub removed: usize,
}
