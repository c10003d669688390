use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::GameSessionEntity,
    dto::{format_system_time, lobby::LobbySettingsDto},
    state::session::{GameSession, GameState, Question},
};

/// Public projection of a game session record.
#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameSessionSummary {
    pub id: Uuid,
    pub lobby_code: String,
    pub host_id: Uuid,
    pub question_set_ids: Vec<Uuid>,
    pub status: String,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub settings: LobbySettingsDto,
    pub total_questions: u32,
    pub total_score: i64,
    pub correct_answers: u32,
}

impl From<&GameSession> for GameSessionSummary {
    fn from(session: &GameSession) -> Self {
        Self {
            id: session.id,
            lobby_code: session.lobby_code.clone(),
            host_id: session.host_id,
            question_set_ids: session.question_set_ids.clone(),
            status: session.status.as_str().to_string(),
            started_at: format_system_time(session.started_at),
            completed_at: session.completed_at.map(format_system_time),
            settings: (&session.settings).into(),
            total_questions: session.total_questions,
            total_score: session.total_score,
            correct_answers: session.correct_answers,
        }
    }
}

impl From<GameSessionEntity> for GameSessionSummary {
    fn from(entity: GameSessionEntity) -> Self {
        Self {
            id: entity.id,
            lobby_code: entity.lobby_code,
            host_id: entity.host_id,
            question_set_ids: entity.question_set_ids,
            status: entity.status,
            started_at: format_system_time(entity.started_at),
            completed_at: entity.completed_at.map(format_system_time),
            settings: (&entity.settings).into(),
            total_questions: entity.total_questions,
            total_score: entity.total_score,
            correct_answers: entity.correct_answers,
        }
    }
}

/// A question as shown to players: no correct answer included.
#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPublic {
    /// 0-based index within the session.
    pub index: usize,
    /// Total questions in the session.
    pub total: usize,
    pub prompt: String,
    pub options: Vec<String>,
    /// Answer window for this question in seconds.
    pub time_limit_seconds: u64,
}

impl QuestionPublic {
    /// Strip a question down to its player-visible fields.
    pub fn redacted(
        question: &Question,
        index: usize,
        total: usize,
        time_limit_seconds: u64,
    ) -> Self {
        Self {
            index,
            total,
            prompt: question.prompt.clone(),
            options: question.options.clone(),
            time_limit_seconds,
        }
    }
}

/// Payload used to submit an answer over REST.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerRequest {
    /// Raw answer text or option index.
    pub answer: String,
}

/// One player's line in a scoreboard.
#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStanding {
    pub username: String,
    pub score: i64,
    pub multiplier: u32,
    pub streak: u32,
    pub correct_answers: u32,
}

/// Snapshot of the runtime state of an active session.
#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameStateSummary {
    pub phase: String,
    pub current_question_index: usize,
    pub total_questions: usize,
    pub standings: Vec<PlayerStanding>,
}

impl From<&GameState> for GameStateSummary {
    fn from(state: &GameState) -> Self {
        Self {
            phase: state.phase().as_str().to_string(),
            current_question_index: state.current_question_index,
            total_questions: state.total_questions,
            standings: state
                .tallies
                .iter()
                .map(|(username, tally)| PlayerStanding {
                    username: username.clone(),
                    score: tally.score,
                    multiplier: tally.multiplier,
                    streak: tally.streak,
                    correct_answers: tally.correct_answers,
                })
                .collect(),
        }
    }
}
