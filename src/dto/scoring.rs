use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Query parameters accepted by the performance rating endpoint.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceRatingQuery {
    pub score: i64,
    pub accuracy: f64,
    pub max_multiplier: u32,
}

/// Qualitative rating response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceRatingResponse {
    /// One of `Excellent`, `Good`, `Average`, `Needs Improvement`.
    pub rating: String,
}

/// Query parameters accepted by the scoring-family leaderboard endpoint.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScoringLeaderboardQuery {
    pub question_set_id: Uuid,
    pub limit: Option<usize>,
}

/// Payload used to check a session's leaderboard eligibility.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityRequest {
    pub session_id: Uuid,
    pub total_questions: u32,
    pub completed_questions: u32,
}

/// Eligibility verdict with the computed completion rate.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityResponse {
    pub is_eligible: bool,
    /// Percentage of questions actually answered, one decimal.
    pub completion_rate: f64,
}

/// Aggregate statistics across a user's leaderboard entries.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserStatisticsResponse {
    pub username: String,
    pub games_played: usize,
    pub total_score: i64,
    pub best_score: i64,
    /// Mean accuracy across entries, one decimal.
    pub average_accuracy: f64,
    pub best_multiplier: u32,
}
