//! Realtime message surface: intents accepted from WebSocket clients and the
//! typed events the server fans out over lobby hubs.
//!
//! Clients only ever send join/ready/answer/leave intents; the server is the
//! sole source of truth for game state, timers, and question transitions.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::{
    game::{GameSessionSummary, GameStateSummary, PlayerStanding, QuestionPublic},
    lobby::{LobbySummary, PlayerSummary},
};

/// Dispatched payload carried across lobby broadcast hubs and delivered to
/// WebSocket subscribers as `{"event": ..., "data": ...}`.
#[derive(Clone, Debug, Serialize)]
pub struct ServerEvent {
    /// Event name, e.g. `lobby:updated`.
    pub event: String,
    /// Serialized event payload.
    pub data: serde_json::Value,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the data field.
    pub fn json<T>(event: &str, payload: &T) -> serde_json::Result<Self>
    where
        T: Serialize,
    {
        Ok(Self {
            event: event.to_string(),
            data: serde_json::to_value(payload)?,
        })
    }
}

/// Intents accepted from WebSocket clients.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Attach this connection to a lobby, joining it if not yet a member.
    Join {
        /// Code of the lobby to attach to.
        #[serde(rename = "lobbyCode")]
        lobby_code: String,
        /// Authenticated user id.
        #[serde(rename = "userId")]
        user_id: Uuid,
        /// Authenticated display name.
        username: String,
        /// Cosmetic character, used when the join creates a roster entry.
        #[serde(default)]
        character: Option<String>,
    },
    /// Toggle the sender's readiness flag.
    Ready {
        #[serde(rename = "isReady")]
        is_ready: bool,
    },
    /// Submit an answer for the live question.
    Answer {
        /// Raw answer text or option index.
        answer: String,
        /// Client-measured elapsed milliseconds; display hint only, the
        /// server clock is authoritative for scoring and deadlines.
        #[serde(default, rename = "elapsedMs")]
        elapsed_ms: Option<u64>,
    },
    /// Leave the lobby and close the connection.
    Leave,
    #[serde(other)]
    Unknown,
}

impl ClientMessage {
    /// Parse a client message from its JSON text frame.
    pub fn from_json_str(payload: &str) -> serde_json::Result<Self> {
        serde_json::from_str(payload)
    }
}

/// Event emitted when a player joins the roster.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerJoinedEvent {
    pub player: PlayerSummary,
}

/// Event emitted when a player leaves the roster.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerLeftEvent {
    pub user_id: Uuid,
    pub username: String,
    /// Set when the departure transferred host privileges.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_host_id: Option<Uuid>,
}

/// Event emitted whenever lobby state changes; carries the full snapshot so
/// clients can resynchronize unconditionally.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LobbyUpdatedEvent {
    pub lobby: LobbySummary,
}

/// Event emitted when the host starts the game.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameStartEvent {
    pub session: GameSessionSummary,
    pub state: GameStateSummary,
}

/// Event emitted when a question window opens.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionStartEvent {
    pub question: QuestionPublic,
    /// Wall-clock timestamp the window opened at.
    pub started_at: String,
}

/// Event emitted when a player's answer is accepted (the answer itself is not
/// revealed until the question ends).
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerAnsweredEvent {
    pub username: String,
    pub question_index: usize,
    /// Number of answers recorded so far for this question.
    pub answered_count: usize,
}

/// Once-per-second countdown broadcast while a question is live.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimerUpdateEvent {
    pub question_index: usize,
    pub remaining_seconds: u64,
}

/// One player's outcome for a revealed question.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerQuestionResult {
    pub username: String,
    /// Whether an answer was recorded in time.
    pub answered: bool,
    pub correct: bool,
    /// Points awarded for this question.
    pub delta: i64,
    /// Score after applying the delta.
    pub score: i64,
    /// Multiplier entering the next question.
    pub multiplier: u32,
    pub streak: u32,
}

/// Event emitted when a question closes and the answer is revealed.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionEndEvent {
    pub question_index: usize,
    pub correct_index: usize,
    pub correct_answer: String,
    pub results: Vec<PlayerQuestionResult>,
}

/// Event emitted when the session finishes, carrying final standings.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameEndEvent {
    pub session: GameSessionSummary,
    pub standings: Vec<PlayerStanding>,
}

/// Event emitted when a player's realtime connection drops.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDisconnectedEvent {
    pub username: String,
}

/// Error surfaced to realtime clients without closing the connection.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameErrorEvent {
    pub code: String,
    pub message: String,
}
