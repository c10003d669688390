//! Hall of fame: eligibility checks, entry submission, leaderboards, and
//! per-user aggregates.
//!
//! Ordering is score descending with earlier submissions winning ties, so a
//! record holder is never displaced by an equal later score.

use std::{cmp::Ordering, time::SystemTime};

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::HallOfFameEntryEntity,
    dto::{
        hall_of_fame::{HallOfFameEntryDto, RankResponse, SubmitEntryRequest},
        scoring::{EligibilityRequest, EligibilityResponse, UserStatisticsResponse},
    },
    error::ServiceError,
    services::scoring,
    state::SharedState,
};

/// Entries returned by leaderboard queries when no limit is given.
const DEFAULT_LEADERBOARD_LIMIT: usize = 10;

/// Check whether a session's completion rate qualifies it for submission.
pub async fn validate_eligibility(
    state: &SharedState,
    request: EligibilityRequest,
) -> Result<EligibilityResponse, ServiceError> {
    let completion_rate =
        scoring::completion_rate(request.total_questions, request.completed_questions)?;
    let is_eligible = completion_rate >= state.config().hall_of_fame_min_completion_rate;

    Ok(EligibilityResponse {
        is_eligible,
        completion_rate,
    })
}

/// Submit one player's finished-session result.
///
/// At most one entry per `(session, username)` pair is ever stored; a repeat
/// submission is rejected without touching the original.
pub async fn submit_entry(
    state: &SharedState,
    request: SubmitEntryRequest,
) -> Result<HallOfFameEntryDto, ServiceError> {
    if request.score < 0 {
        return Err(ServiceError::InvalidInput(
            "score must not be negative".into(),
        ));
    }
    if !(0.0..=100.0).contains(&request.accuracy) {
        return Err(ServiceError::InvalidInput(
            "accuracy must be between 0 and 100".into(),
        ));
    }
    let cap = state.config().multiplier_cap;
    if request.max_multiplier < 1 || request.max_multiplier > cap {
        return Err(ServiceError::InvalidInput(format!(
            "max multiplier must be between 1 and {cap}"
        )));
    }

    // The bank's name wins over whatever the client sent; sets the bank does
    // not know keep the submitted name.
    let question_set_name = state
        .question_bank()
        .question_set_name(request.question_set_id)
        .await?
        .unwrap_or(request.question_set_name);

    let store = state.require_store().await?;
    let entity = HallOfFameEntryEntity {
        session_id: request.session_id,
        username: request.username,
        character_name: request.character_name,
        score: request.score,
        accuracy: request.accuracy,
        max_multiplier: request.max_multiplier,
        question_set_id: request.question_set_id,
        question_set_name,
        completed_at: SystemTime::now(),
    };

    if !store.insert_hall_of_fame_entry(entity.clone()).await? {
        return Err(ServiceError::Conflict(format!(
            "user `{}` already submitted an entry for session `{}`",
            entity.username, entity.session_id
        )));
    }

    info!(
        session = %entity.session_id,
        username = %entity.username,
        score = entity.score,
        "hall of fame entry recorded"
    );
    Ok(entity.into())
}

/// The entry a user submitted for one session, if any.
pub async fn entry_for_session(
    state: &SharedState,
    session_id: Uuid,
    username: &str,
) -> Result<HallOfFameEntryDto, ServiceError> {
    let store = state.require_store().await?;
    let entry = store
        .find_hall_of_fame_entry(session_id, username.to_string())
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "user `{username}` has no entry for session `{session_id}`"
            ))
        })?;

    Ok(entry.into())
}

/// Top entries for a question set, best first.
pub async fn leaderboard(
    state: &SharedState,
    question_set_id: Uuid,
    limit: Option<usize>,
) -> Result<Vec<HallOfFameEntryDto>, ServiceError> {
    let store = state.require_store().await?;
    let mut entries = store.list_hall_of_fame_entries(question_set_id).await?;
    entries.sort_by(rank_order);
    entries.truncate(limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT));

    Ok(entries.into_iter().map(HallOfFameEntryDto::from).collect())
}

/// A user's best (1-based) position on a question set's leaderboard.
pub async fn user_rank(
    state: &SharedState,
    question_set_id: Uuid,
    username: &str,
) -> Result<RankResponse, ServiceError> {
    let store = state.require_store().await?;
    let mut entries = store.list_hall_of_fame_entries(question_set_id).await?;
    entries.sort_by(rank_order);

    let rank = entries
        .iter()
        .position(|entry| entry.username == username)
        .map(|index| index + 1)
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "user `{username}` has no entry for question set `{question_set_id}`"
            ))
        })?;

    Ok(RankResponse {
        username: username.to_string(),
        question_set_id,
        rank,
    })
}

/// A user's best entry per question set, best score first.
pub async fn user_best_scores(
    state: &SharedState,
    username: &str,
) -> Result<Vec<HallOfFameEntryDto>, ServiceError> {
    let store = state.require_store().await?;
    let entries = store
        .list_hall_of_fame_entries_for_user(username.to_string())
        .await?;

    let mut best: Vec<HallOfFameEntryEntity> = Vec::new();
    for entry in entries {
        match best
            .iter_mut()
            .find(|candidate| candidate.question_set_id == entry.question_set_id)
        {
            Some(candidate) => {
                if rank_order(&entry, candidate) == Ordering::Less {
                    *candidate = entry;
                }
            }
            None => best.push(entry),
        }
    }
    best.sort_by(rank_order);

    Ok(best.into_iter().map(HallOfFameEntryDto::from).collect())
}

/// Aggregate statistics across every entry a user has submitted.
pub async fn user_statistics(
    state: &SharedState,
    username: &str,
) -> Result<UserStatisticsResponse, ServiceError> {
    let store = state.require_store().await?;
    let entries = store
        .list_hall_of_fame_entries_for_user(username.to_string())
        .await?;
    if entries.is_empty() {
        return Err(ServiceError::NotFound(format!(
            "user `{username}` has no hall of fame entries"
        )));
    }

    let games_played = entries.len();
    let total_score = entries.iter().map(|entry| entry.score).sum();
    let best_score = entries.iter().map(|entry| entry.score).max().unwrap_or(0);
    let best_multiplier = entries
        .iter()
        .map(|entry| entry.max_multiplier)
        .max()
        .unwrap_or(1);
    let average_accuracy = entries.iter().map(|entry| entry.accuracy).sum::<f64>()
        / games_played as f64;
    let average_accuracy = (average_accuracy * 10.0).round() / 10.0;

    Ok(UserStatisticsResponse {
        username: username.to_string(),
        games_played,
        total_score,
        best_score,
        average_accuracy,
        best_multiplier,
    })
}

/// Leaderboard ordering: score descending, then earlier submission first.
fn rank_order(a: &HallOfFameEntryEntity, b: &HallOfFameEntryEntity) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| a.completed_at.cmp(&b.completed_at))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            memory::MemoryStore,
            question_bank::{QuestionSet, StaticQuestionBank},
        },
        state::AppState,
    };

    async fn test_state() -> SharedState {
        let state = AppState::new(
            AppConfig::default(),
            Arc::new(StaticQuestionBank::default()),
        );
        state.install_store(Arc::new(MemoryStore::new())).await;
        state
    }

    fn request(username: &str, score: i64, question_set_id: Uuid) -> SubmitEntryRequest {
        SubmitEntryRequest {
            session_id: Uuid::new_v4(),
            username: username.into(),
            character_name: None,
            score,
            accuracy: 80.0,
            max_multiplier: 3,
            question_set_id,
            question_set_name: "Capitals".into(),
        }
    }

    #[tokio::test]
    async fn eligibility_uses_the_configured_threshold() {
        let state = test_state().await;

        let full = validate_eligibility(
            &state,
            EligibilityRequest {
                session_id: Uuid::new_v4(),
                total_questions: 10,
                completed_questions: 10,
            },
        )
        .await
        .unwrap();
        assert!(full.is_eligible);
        assert_eq!(full.completion_rate, 100.0);

        let half = validate_eligibility(
            &state,
            EligibilityRequest {
                session_id: Uuid::new_v4(),
                total_questions: 10,
                completed_questions: 5,
            },
        )
        .await
        .unwrap();
        assert!(!half.is_eligible);
        assert_eq!(half.completion_rate, 50.0);
    }

    #[tokio::test]
    async fn leaderboard_orders_by_score_descending() {
        let state = test_state().await;
        let set_id = Uuid::new_v4();

        submit_entry(&state, request("carol", 800, set_id)).await.unwrap();
        submit_entry(&state, request("alice", 1200, set_id)).await.unwrap();
        submit_entry(&state, request("bob", 1000, set_id)).await.unwrap();

        let board = leaderboard(&state, set_id, None).await.unwrap();
        let order: Vec<&str> = board.iter().map(|entry| entry.username.as_str()).collect();
        assert_eq!(order, vec!["alice", "bob", "carol"]);
        assert_eq!(board[0].score, 1200);

        let top_two = leaderboard(&state, set_id, Some(2)).await.unwrap();
        assert_eq!(top_two.len(), 2);
    }

    #[tokio::test]
    async fn rank_is_one_based() {
        let state = test_state().await;
        let set_id = Uuid::new_v4();

        submit_entry(&state, request("alice", 1200, set_id)).await.unwrap();
        submit_entry(&state, request("bob", 1000, set_id)).await.unwrap();
        submit_entry(&state, request("testuser", 800, set_id)).await.unwrap();

        let rank = user_rank(&state, set_id, "testuser").await.unwrap();
        assert_eq!(rank.rank, 3);

        let err = user_rank(&state, set_id, "nobody").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn duplicate_submission_for_a_session_is_rejected() {
        let state = test_state().await;
        let set_id = Uuid::new_v4();
        let mut first = request("alice", 900, set_id);
        let session_id = first.session_id;
        submit_entry(&state, first).await.unwrap();

        first = request("alice", 950, set_id);
        first.session_id = session_id;
        let err = submit_entry(&state, first).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        // The original entry is untouched.
        let board = leaderboard(&state, set_id, None).await.unwrap();
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].score, 900);

        let entry = entry_for_session(&state, session_id, "alice").await.unwrap();
        assert_eq!(entry.score, 900);
        assert!(matches!(
            entry_for_session(&state, session_id, "bob").await.unwrap_err(),
            ServiceError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn submission_validates_ranges() {
        let state = test_state().await;
        let set_id = Uuid::new_v4();

        let mut bad = request("alice", -1, set_id);
        assert!(matches!(
            submit_entry(&state, bad).await.unwrap_err(),
            ServiceError::InvalidInput(_)
        ));

        bad = request("alice", 100, set_id);
        bad.accuracy = 101.0;
        assert!(matches!(
            submit_entry(&state, bad).await.unwrap_err(),
            ServiceError::InvalidInput(_)
        ));

        bad = request("alice", 100, set_id);
        bad.max_multiplier = 0;
        assert!(matches!(
            submit_entry(&state, bad).await.unwrap_err(),
            ServiceError::InvalidInput(_)
        ));
    }

    #[tokio::test]
    async fn best_scores_keep_one_entry_per_set() {
        let state = test_state().await;
        let set_a = Uuid::new_v4();
        let set_b = Uuid::new_v4();

        submit_entry(&state, request("alice", 500, set_a)).await.unwrap();
        submit_entry(&state, request("alice", 900, set_a)).await.unwrap();
        submit_entry(&state, request("alice", 700, set_b)).await.unwrap();

        let best = user_best_scores(&state, "alice").await.unwrap();
        assert_eq!(best.len(), 2);
        assert_eq!(best[0].score, 900);
        assert_eq!(best[0].question_set_id, set_a);
        assert_eq!(best[1].score, 700);
    }

    #[tokio::test]
    async fn statistics_aggregate_across_entries() {
        let state = test_state().await;
        let set_id = Uuid::new_v4();

        let mut first = request("alice", 1000, set_id);
        first.accuracy = 90.0;
        first.max_multiplier = 4;
        submit_entry(&state, first).await.unwrap();

        let mut second = request("alice", 500, set_id);
        second.accuracy = 60.0;
        second.max_multiplier = 2;
        submit_entry(&state, second).await.unwrap();

        let stats = user_statistics(&state, "alice").await.unwrap();
        assert_eq!(stats.games_played, 2);
        assert_eq!(stats.total_score, 1500);
        assert_eq!(stats.best_score, 1000);
        assert_eq!(stats.average_accuracy, 75.0);
        assert_eq!(stats.best_multiplier, 4);

        assert!(matches!(
            user_statistics(&state, "nobody").await.unwrap_err(),
            ServiceError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn submission_takes_the_set_name_from_the_bank() {
        let set_id = Uuid::new_v4();
        let bank = StaticQuestionBank::from_sets([QuestionSet {
            id: set_id,
            name: "World Capitals".into(),
            questions: Vec::new(),
        }]);
        let state = AppState::new(AppConfig::default(), Arc::new(bank));
        state.install_store(Arc::new(MemoryStore::new())).await;

        let mut spoofed = request("alice", 700, set_id);
        spoofed.question_set_name = "Totally Different".into();
        let entry = submit_entry(&state, spoofed).await.unwrap();
        assert_eq!(entry.question_set_name, "World Capitals");

        // A set the bank does not know keeps the submitted name.
        let entry = submit_entry(&state, request("alice", 700, Uuid::new_v4()))
            .await
            .unwrap();
        assert_eq!(entry.question_set_name, "Capitals");
    }

    #[tokio::test]
    async fn degraded_mode_rejects_submission() {
        let state = AppState::new(
            AppConfig::default(),
            Arc::new(StaticQuestionBank::default()),
        );
        let err = submit_entry(&state, request("alice", 100, Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Degraded));
    }
}
