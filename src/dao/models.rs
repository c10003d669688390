//! Plain entity structs exchanged with storage backends.
//!
//! The persistence layer is an external collaborator; these entities map onto
//! the `lobbies`, `game_sessions`, and `hall_of_fame_entries` tables of a
//! relational backend through parameterized queries. Conversions to and from
//! the runtime types live here so backends never touch domain state directly.

use std::time::SystemTime;

use uuid::Uuid;

use crate::state::{
    lobby::{Lobby, LobbySettings, Player},
    session::GameSession,
};

/// Persisted row for a lobby.
#[derive(Debug, Clone)]
pub struct LobbyEntity {
    /// Shareable lobby code; primary key.
    pub code: String,
    /// User holding host privileges.
    pub host_id: Uuid,
    /// Lifecycle status as its wire name.
    pub status: String,
    /// Roster in join order.
    pub players: Vec<PlayerEntity>,
    /// Current game settings.
    pub settings: SettingsEntity,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Expiry timestamp for never-started lobbies.
    pub expires_at: SystemTime,
}

/// Persisted roster member.
#[derive(Debug, Clone)]
pub struct PlayerEntity {
    pub user_id: Uuid,
    pub username: String,
    pub character: Option<String>,
    pub is_ready: bool,
    pub is_connected: bool,
    pub score: i64,
    pub multiplier: u32,
}

/// Persisted lobby settings.
#[derive(Debug, Clone)]
pub struct SettingsEntity {
    pub question_count: u32,
    pub time_limit_secs: u64,
    pub allow_replay: bool,
    pub question_set_ids: Vec<Uuid>,
}

/// Persisted row for a game session.
#[derive(Debug, Clone)]
pub struct GameSessionEntity {
    /// Primary key of the session.
    pub id: Uuid,
    /// Code of the lobby this session started from.
    pub lobby_code: String,
    /// Host at the moment the game started.
    pub host_id: Uuid,
    /// Question sets the sequence was drawn from.
    pub question_set_ids: Vec<Uuid>,
    /// Lifecycle status as its wire name.
    pub status: String,
    /// Moment the game started.
    pub started_at: SystemTime,
    /// Moment the game finished, if it has.
    pub completed_at: Option<SystemTime>,
    /// Settings snapshot at start time.
    pub settings: SettingsEntity,
    /// Number of questions served.
    pub total_questions: u32,
    /// Aggregate score across players, filled at completion.
    pub total_score: i64,
    /// Aggregate correct answers across players, filled at completion.
    pub correct_answers: u32,
}

/// Persisted leaderboard entry. At most one row per `(session_id, username)`.
#[derive(Debug, Clone)]
pub struct HallOfFameEntryEntity {
    pub session_id: Uuid,
    pub username: String,
    pub character_name: Option<String>,
    pub score: i64,
    pub accuracy: f64,
    pub max_multiplier: u32,
    pub question_set_id: Uuid,
    pub question_set_name: String,
    pub completed_at: SystemTime,
}

impl From<&Player> for PlayerEntity {
    fn from(player: &Player) -> Self {
        Self {
            user_id: player.user_id,
            username: player.username.clone(),
            character: player.character.clone(),
            is_ready: player.is_ready,
            is_connected: player.is_connected,
            score: player.score,
            multiplier: player.multiplier,
        }
    }
}

impl From<&LobbySettings> for SettingsEntity {
    fn from(settings: &LobbySettings) -> Self {
        Self {
            question_count: settings.question_count,
            time_limit_secs: settings.time_limit_secs,
            allow_replay: settings.allow_replay,
            question_set_ids: settings.question_set_ids.clone(),
        }
    }
}

impl From<&Lobby> for LobbyEntity {
    fn from(lobby: &Lobby) -> Self {
        Self {
            code: lobby.code.clone(),
            host_id: lobby.host_id,
            status: lobby.status.as_str().to_string(),
            players: lobby.players.values().map(PlayerEntity::from).collect(),
            settings: (&lobby.settings).into(),
            created_at: lobby.created_at,
            expires_at: lobby.expires_at,
        }
    }
}

impl From<&GameSession> for GameSessionEntity {
    fn from(session: &GameSession) -> Self {
        Self {
            id: session.id,
            lobby_code: session.lobby_code.clone(),
            host_id: session.host_id,
            question_set_ids: session.question_set_ids.clone(),
            status: session.status.as_str().to_string(),
            started_at: session.started_at,
            completed_at: session.completed_at,
            settings: (&session.settings).into(),
            total_questions: session.total_questions,
            total_score: session.total_score,
            correct_answers: session.correct_answers,
        }
    }
}
