use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{dao::models::HallOfFameEntryEntity, dto::format_system_time};

/// Payload used to submit a finished session's result to the hall of fame.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitEntryRequest {
    /// Session the result belongs to.
    pub session_id: Uuid,
    /// Player the result belongs to.
    #[validate(length(min = 1, message = "username must not be empty"))]
    pub username: String,
    /// Cosmetic character the player used.
    #[serde(default)]
    pub character_name: Option<String>,
    /// Final session score.
    pub score: i64,
    /// Session accuracy in percent.
    pub accuracy: f64,
    /// Highest multiplier reached during the session.
    pub max_multiplier: u32,
    /// Question set the session was played on.
    pub question_set_id: Uuid,
    /// Display name of the question set.
    #[validate(length(min = 1, message = "question set name must not be empty"))]
    pub question_set_name: String,
}

/// Public projection of a hall-of-fame entry.
#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HallOfFameEntryDto {
    pub session_id: Uuid,
    pub username: String,
    pub character_name: Option<String>,
    pub score: i64,
    pub accuracy: f64,
    pub max_multiplier: u32,
    pub question_set_id: Uuid,
    pub question_set_name: String,
    pub completed_at: String,
}

impl From<HallOfFameEntryEntity> for HallOfFameEntryDto {
    fn from(entity: HallOfFameEntryEntity) -> Self {
        Self {
            session_id: entity.session_id,
            username: entity.username,
            character_name: entity.character_name,
            score: entity.score,
            accuracy: entity.accuracy,
            max_multiplier: entity.max_multiplier,
            question_set_id: entity.question_set_id,
            question_set_name: entity.question_set_name,
            completed_at: format_system_time(entity.completed_at),
        }
    }
}

/// Query parameters accepted by leaderboard endpoints.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardQuery {
    /// Maximum number of entries to return.
    #[serde(default)]
    pub limit: Option<usize>,
}

/// A user's 1-based position on a question set's leaderboard.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RankResponse {
    pub username: String,
    pub question_set_id: Uuid,
    pub rank: usize,
}
