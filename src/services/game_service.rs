//! Server-authoritative session runner and answer intake.
//!
//! Every active session is driven by one spawned runner task that owns the
//! question timeline: it opens answer windows, ticks the countdown, closes
//! questions on the deadline or once every connected player answered, scores
//! the reveal, and finalizes the session. Clients only ever submit answers;
//! all timing decisions come from the server clock.

use std::{
    sync::Arc,
    time::{Duration, Instant, SystemTime},
};

use tokio::time::{Instant as TokioInstant, sleep, sleep_until};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    dao::models::GameSessionEntity,
    dto::{
        format_system_time,
        game::{GameSessionSummary, GameStateSummary, PlayerStanding, QuestionPublic},
        lobby::LobbySummary,
        ws::{
            GameEndEvent, GameStartEvent, PlayerAnsweredEvent, PlayerQuestionResult,
            QuestionEndEvent, QuestionStartEvent, TimerUpdateEvent,
        },
    },
    error::ServiceError,
    services::{lobby_service, scoring, ws_events},
    state::{
        SessionHandle, SharedState,
        lobby::LobbyStatus,
        phase::SessionEvent,
        session::{GameState, Question, SessionStatus},
    },
};

/// Interval between countdown broadcasts while a question is live.
const TIMER_TICK: Duration = Duration::from_secs(1);

/// Spawn the runner task that drives a freshly started session to completion.
pub fn spawn_session_runner(state: SharedState, handle: Arc<SessionHandle>) {
    let runner = handle.clone();
    let task = tokio::spawn(async move { run_session(state, runner).await });
    handle.set_runner(task.abort_handle());
}

async fn run_session(state: SharedState, handle: Arc<SessionHandle>) {
    let code = handle.session.lock().await.lobby_code.clone();

    if let Err(err) = drive_session(&state, &handle, &code).await {
        error!(code, error = %err, "session runner failed");
        ws_events::broadcast_game_error(&state, &code, "session_failed", &err.to_string());

        let entity = {
            let mut session = handle.session.lock().await;
            session.status = SessionStatus::Abandoned;
            session.completed_at = Some(SystemTime::now());
            GameSessionEntity::from(&*session)
        };
        persist_session(&state, entity).await;

        // The lobby must not stay in_progress behind a dead runner.
        reset_lobby_after_game(&state, &code).await;
        state.sessions().remove(&code);
    }
}

/// Record a player's answer for the live question of a lobby's session.
///
/// First submission per question wins; submissions outside the answer window
/// or from users not in the session are rejected.
pub async fn submit_answer(
    state: &SharedState,
    code: &str,
    username: &str,
    answer: String,
) -> Result<(), ServiceError> {
    let handle = state.session(code)?;

    let event = {
        let mut game = handle.game.lock().await;
        game.record_answer(username, answer)?;
        PlayerAnsweredEvent {
            username: username.to_string(),
            question_index: game.current_question_index,
            answered_count: game.answers.len(),
        }
    };

    debug!(code, username, question = event.question_index, "answer recorded");
    handle.touch().await;
    handle.answered.notify_one();
    ws_events::broadcast_player_answered(state, code, event);

    Ok(())
}

/// Snapshot the runtime state of a lobby's active session.
pub async fn current_game_state(
    state: &SharedState,
    code: &str,
) -> Result<GameStateSummary, ServiceError> {
    let handle = state.session(code)?;
    let game = handle.game.lock().await;
    Ok(GameStateSummary::from(&*game))
}

/// Fetch a persisted session record by id.
pub async fn find_session(
    state: &SharedState,
    session_id: Uuid,
) -> Result<GameSessionSummary, ServiceError> {
    let store = state.require_store().await?;
    let entity = store
        .find_session(session_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("session `{session_id}` not found")))?;
    Ok(entity.into())
}

/// Abandon sessions whose every player has been disconnected for longer than
/// the configured grace period. Returns the number of sessions abandoned.
pub async fn abandon_stale_sessions(state: &SharedState) -> usize {
    let grace = Duration::from_secs(state.config().abandoned_grace_secs);
    let snapshot: Vec<(String, Arc<SessionHandle>)> = state
        .sessions()
        .iter()
        .map(|entry| (entry.key().clone(), entry.value().clone()))
        .collect();

    let mut abandoned = 0;
    for (code, handle) in snapshot {
        if !connected_players(state, &code).await.is_empty() {
            continue;
        }
        let idle = handle.last_activity.lock().await.elapsed();
        if idle < grace {
            continue;
        }

        handle.abort_runner();

        let entity = {
            let mut session = handle.session.lock().await;
            session.status = SessionStatus::Abandoned;
            session.completed_at = Some(SystemTime::now());
            GameSessionEntity::from(&*session)
        };
        persist_session(state, entity).await;

        warn!(code, idle_secs = idle.as_secs(), "abandoning stale session");
        state.sessions().remove(&code);
        state.remove_lobby(&code);
        abandoned += 1;
    }

    abandoned
}

/// Drive one session from `game:start` through every question to `game:end`.
async fn drive_session(
    state: &SharedState,
    handle: &Arc<SessionHandle>,
    code: &str,
) -> Result<(), ServiceError> {
    let config = state.config();

    let (session_summary, time_limit) = {
        let session = handle.session.lock().await;
        (
            GameSessionSummary::from(&*session),
            session.settings.time_limit_secs,
        )
    };
    let state_summary = {
        let game = handle.game.lock().await;
        GameStateSummary::from(&*game)
    };
    let total = handle.questions.len();

    ws_events::broadcast_game_start(
        state,
        code,
        GameStartEvent {
            session: session_summary,
            state: state_summary,
        },
    );

    for index in 0..total {
        let started_wall = {
            let mut game = handle.game.lock().await;
            let event = if index == 0 {
                SessionEvent::BeginQuestion
            } else {
                SessionEvent::AdvanceQuestion
            };
            game.apply(event)?;
            game.open_question(index, Duration::from_secs(time_limit));
            game.question_started_wall.unwrap_or_else(SystemTime::now)
        };

        ws_events::broadcast_question_start(
            state,
            code,
            QuestionStartEvent {
                question: QuestionPublic::redacted(
                    &handle.questions[index],
                    index,
                    total,
                    time_limit,
                ),
                started_at: format_system_time(started_wall),
            },
        );

        let close_cause = wait_for_answers(state, handle, code).await;

        let end_event = {
            let mut game = handle.game.lock().await;
            game.apply(close_cause)?;
            reveal_question(
                &mut game,
                &handle.questions[index],
                time_limit,
                config.multiplier_cap,
            )
        };

        sync_lobby_scores(state, code, handle).await;
        ws_events::broadcast_question_end(state, code, end_event);
        sleep(Duration::from_millis(config.reveal_hold_ms)).await;
    }

    {
        let mut game = handle.game.lock().await;
        game.apply(SessionEvent::FinishSession)?;
    }

    finish_session(state, handle, code).await;
    Ok(())
}

/// Wait until the live question should close, ticking the countdown once per
/// second. Closes early when every connected player has answered, or at the
/// deadline otherwise; a fully disconnected roster always runs to the
/// deadline.
async fn wait_for_answers(
    state: &SharedState,
    handle: &Arc<SessionHandle>,
    code: &str,
) -> SessionEvent {
    loop {
        // Lock order is lobby before game, so the connected snapshot is taken
        // first and never under the game lock.
        let connected = connected_players(state, code).await;

        let now = Instant::now();
        let (deadline, all_answered) = {
            let game = handle.game.lock().await;
            let Some(deadline) = game.question_deadline else {
                return SessionEvent::DeadlineReached;
            };
            (deadline, game.all_answered(&connected))
        };

        if all_answered {
            return SessionEvent::AllAnswered;
        }
        if now >= deadline {
            return SessionEvent::DeadlineReached;
        }

        let next_tick = TokioInstant::from_std(deadline.min(now + TIMER_TICK));
        tokio::select! {
            _ = sleep_until(next_tick) => {
                let event = {
                    let game = handle.game.lock().await;
                    TimerUpdateEvent {
                        question_index: game.current_question_index,
                        remaining_seconds: game.remaining_secs(Instant::now()),
                    }
                };
                ws_events::broadcast_timer_update(state, code, event);
            }
            _ = handle.answered.notified() => {}
        }
    }
}

/// Score every player for the closed question and build the reveal payload.
///
/// Missing and late answers score as incorrect. The delta applies the
/// multiplier the player carried into the question; the multiplier then grows
/// or resets for the next one.
fn reveal_question(
    game: &mut GameState,
    question: &Question,
    time_limit: u64,
    multiplier_cap: u32,
) -> QuestionEndEvent {
    let usernames: Vec<String> = game.tallies.keys().cloned().collect();
    let mut results = Vec::with_capacity(usernames.len());

    for username in usernames {
        let recorded = game.answers.get(&username).cloned();
        let Some(tally) = game.tallies.get_mut(&username) else {
            continue;
        };

        let answered = recorded.as_ref().is_some_and(|answer| !answer.late);
        let correct = answered
            && recorded
                .as_ref()
                .is_some_and(|answer| scoring::is_correct(question, &answer.answer));
        let elapsed_secs = recorded
            .as_ref()
            .map(|answer| answer.elapsed.as_secs())
            .unwrap_or(time_limit);

        let outcome = scoring::score_answer(
            correct,
            elapsed_secs,
            time_limit,
            tally.multiplier,
            tally.streak,
            multiplier_cap,
        );

        tally.score += outcome.delta;
        tally.multiplier = outcome.multiplier;
        tally.streak = outcome.streak;
        tally.max_multiplier = tally.max_multiplier.max(outcome.multiplier);
        if outcome.correct {
            tally.correct_answers += 1;
        }

        results.push(PlayerQuestionResult {
            username,
            answered,
            correct,
            delta: outcome.delta,
            score: tally.score,
            multiplier: tally.multiplier,
            streak: tally.streak,
        });
    }

    QuestionEndEvent {
        question_index: game.current_question_index,
        correct_index: question.correct_index,
        correct_answer: question
            .options
            .get(question.correct_index)
            .cloned()
            .unwrap_or_default(),
        results,
    }
}

/// Finalize a session that played through every question: aggregate scores,
/// persist the completed record, reset or complete the lobby, and announce
/// final standings.
async fn finish_session(state: &SharedState, handle: &Arc<SessionHandle>, code: &str) {
    let (standings, total_score, correct_answers) = {
        let game = handle.game.lock().await;
        let mut standings: Vec<PlayerStanding> = game
            .tallies
            .iter()
            .map(|(username, tally)| PlayerStanding {
                username: username.clone(),
                score: tally.score,
                multiplier: tally.max_multiplier,
                streak: tally.streak,
                correct_answers: tally.correct_answers,
            })
            .collect();
        standings.sort_by(|a, b| b.score.cmp(&a.score));

        let total_score = game.tallies.values().map(|tally| tally.score).sum();
        let correct_answers = game.tallies.values().map(|tally| tally.correct_answers).sum();
        (standings, total_score, correct_answers)
    };

    let (session_summary, entity) = {
        let mut session = handle.session.lock().await;
        session.status = SessionStatus::Completed;
        session.completed_at = Some(SystemTime::now());
        session.total_score = total_score;
        session.correct_answers = correct_answers;
        (
            GameSessionSummary::from(&*session),
            GameSessionEntity::from(&*session),
        )
    };
    persist_session(state, entity).await;

    reset_lobby_after_game(state, code).await;

    info!(code, session = %session_summary.id, total_score, "game finished");
    ws_events::broadcast_game_end(
        state,
        code,
        GameEndEvent {
            session: session_summary,
            standings,
        },
    );
    state.sessions().remove(code);
}

/// Return the lobby to `waiting` for a replay, or mark it completed when
/// replays are disabled. On replay every joiner must ready up again; the host
/// stays ready, mirroring lobby creation.
async fn reset_lobby_after_game(state: &SharedState, code: &str) {
    let Ok(entry) = state.lobby_entry(code) else {
        return;
    };

    let summary = {
        let mut lobby = entry.lobby.lock().await;
        if lobby.settings.allow_replay {
            let host_id = lobby.host_id;
            let ttl = Duration::from_secs(state.config().lobby_ttl_secs);
            lobby.status = LobbyStatus::Waiting;
            lobby.expires_at = SystemTime::now() + ttl;
            for player in lobby.players.values_mut() {
                player.is_ready = player.user_id == host_id;
            }
        } else {
            lobby.status = LobbyStatus::Completed;
        }
        LobbySummary::from(&*lobby)
    };

    lobby_service::persist_lobby(state, &entry).await;
    ws_events::broadcast_lobby_updated(state, code, summary);
}

/// Mirror the session tallies into the lobby roster so lobby snapshots show
/// live scores.
async fn sync_lobby_scores(state: &SharedState, code: &str, handle: &Arc<SessionHandle>) {
    let tallies: Vec<(String, i64, u32)> = {
        let game = handle.game.lock().await;
        game.tallies
            .iter()
            .map(|(username, tally)| (username.clone(), tally.score, tally.multiplier))
            .collect()
    };

    let Ok(entry) = state.lobby_entry(code) else {
        return;
    };
    let mut lobby = entry.lobby.lock().await;
    for (username, score, multiplier) in tallies {
        if let Some(player) = lobby
            .players
            .values_mut()
            .find(|player| player.username == username)
        {
            player.score = score;
            player.multiplier = multiplier;
        }
    }
}

/// Usernames currently holding a live connection in the lobby.
async fn connected_players(state: &SharedState, code: &str) -> Vec<String> {
    match state.lobby_entry(code) {
        Ok(entry) => entry.lobby.lock().await.connected_usernames(),
        Err(_) => Vec::new(),
    }
}

/// Write-through a session record; best effort, degraded mode only logs.
async fn persist_session(state: &SharedState, entity: GameSessionEntity) {
    let session_id = entity.id;
    match state.store().await {
        Some(store) => {
            if let Err(err) = store.save_session(entity).await {
                warn!(session = %session_id, error = %err, "failed to persist session");
            }
        }
        None => debug!(session = %session_id, "skipping session persistence (degraded mode)"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::broadcast::error::RecvError;
    use uuid::Uuid;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            memory::MemoryStore,
            question_bank::{QuestionSet, StaticQuestionBank},
        },
        dto::lobby::{CreateLobbyRequest, JoinLobbyRequest, LobbySettingsInput},
        dto::ws::ServerEvent,
        error::ServiceError,
        services::{lobby_service, ws_events},
        state::{AppState, lobby::PlayerPatch, session::GameSession},
    };

    fn question_set(count: usize) -> QuestionSet {
        let set_id = Uuid::new_v4();
        QuestionSet {
            id: set_id,
            name: "Capitals".into(),
            questions: (0..count)
                .map(|i| Question {
                    id: Uuid::new_v4(),
                    question_set_id: set_id,
                    prompt: format!("Question {i}?"),
                    options: vec!["right".into(), "wrong".into(), "also wrong".into()],
                    correct_index: 0,
                })
                .collect(),
        }
    }

    struct Playthrough {
        state: SharedState,
        code: String,
        host_id: Uuid,
        joiner_id: Uuid,
        set_id: Uuid,
    }

    /// Create a ready-to-start two-player lobby over a small question set.
    async fn ready_lobby(question_count: usize) -> Playthrough {
        let set = question_set(question_count);
        let set_id = set.id;
        let bank = StaticQuestionBank::from_sets([set]);
        let state = AppState::new(AppConfig::default(), Arc::new(bank));
        state.install_store(Arc::new(MemoryStore::new())).await;

        let host_id = Uuid::new_v4();
        let summary = lobby_service::create_lobby(
            &state,
            host_id,
            "alice".into(),
            CreateLobbyRequest {
                character: None,
                settings: Some(LobbySettingsInput {
                    question_count: Some(question_count as u32),
                    time_limit_seconds: Some(10),
                    question_set_ids: Some(vec![set_id]),
                    ..LobbySettingsInput::default()
                }),
            },
        )
        .await
        .unwrap();
        let code = summary.code;

        let joiner_id = Uuid::new_v4();
        lobby_service::join_lobby(
            &state,
            joiner_id,
            "bob".into(),
            JoinLobbyRequest {
                lobby_code: code.clone(),
                character: None,
            },
        )
        .await
        .unwrap();
        lobby_service::update_player(
            &state,
            &code,
            joiner_id,
            joiner_id,
            PlayerPatch {
                is_ready: Some(true),
                ..PlayerPatch::default()
            },
        )
        .await
        .unwrap();

        Playthrough {
            state,
            code,
            host_id,
            joiner_id,
            set_id,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn full_playthrough_scores_streaks_and_resets_lobby() {
        let quiz = ready_lobby(3).await;
        let mut events = quiz.state.hub(&quiz.code).subscribe();

        let session = lobby_service::start_game(&quiz.state, &quiz.code, quiz.host_id)
            .await
            .unwrap();
        assert_eq!(session.total_questions, 3);

        let mut alice_multipliers = Vec::new();
        let mut game_end: Option<ServerEvent> = None;

        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => panic!("hub closed before game:end"),
            };
            match event.event.as_str() {
                ws_events::EVENT_QUESTION_START => {
                    // Alice answers correctly, Bob picks a wrong option.
                    submit_answer(&quiz.state, &quiz.code, "alice", "0".into())
                        .await
                        .unwrap();
                    submit_answer(&quiz.state, &quiz.code, "bob", "1".into())
                        .await
                        .unwrap();
                }
                ws_events::EVENT_QUESTION_END => {
                    let results = event.data["results"].as_array().unwrap();
                    let alice = results
                        .iter()
                        .find(|result| result["username"] == "alice")
                        .unwrap();
                    let bob = results
                        .iter()
                        .find(|result| result["username"] == "bob")
                        .unwrap();
                    assert_eq!(alice["correct"], true);
                    assert_eq!(bob["correct"], false);
                    assert_eq!(bob["delta"], 0);
                    alice_multipliers.push(alice["multiplier"].as_u64().unwrap());
                }
                ws_events::EVENT_GAME_END => {
                    game_end = Some(event);
                    break;
                }
                _ => {}
            }
        }

        // Streak grows one per correct answer.
        assert_eq!(alice_multipliers, vec![2, 3, 4]);

        let game_end = game_end.unwrap();
        let standings = game_end.data["standings"].as_array().unwrap();
        assert_eq!(standings[0]["username"], "alice");
        assert!(standings[0]["score"].as_i64().unwrap() > 0);
        assert_eq!(standings[1]["score"], 0);
        assert_eq!(game_end.data["session"]["status"], "completed");

        // Session is gone from the registry and persisted as completed.
        assert!(quiz.state.session(&quiz.code).is_err());
        let persisted = find_session(&quiz.state, session.id).await.unwrap();
        assert_eq!(persisted.status, "completed");
        assert!(persisted.total_score > 0);
        assert_eq!(persisted.correct_answers, 3);

        // allow_replay defaults on: lobby is waiting again, joiner unready.
        let lobby = lobby_service::get_lobby(&quiz.state, &quiz.code).await.unwrap();
        assert_eq!(lobby.status, "waiting");
        let bob = lobby
            .players
            .iter()
            .find(|player| player.user_id == quiz.joiner_id)
            .unwrap();
        assert!(!bob.is_ready);
        let alice = lobby
            .players
            .iter()
            .find(|player| player.user_id == quiz.host_id)
            .unwrap();
        assert!(alice.is_ready);
        assert!(alice.score > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn unanswered_questions_close_on_the_deadline() {
        let quiz = ready_lobby(1).await;
        let mut events = quiz.state.hub(&quiz.code).subscribe();

        lobby_service::start_game(&quiz.state, &quiz.code, quiz.host_id)
            .await
            .unwrap();

        // Nobody answers; the deadline closes the question and the game ends.
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => panic!("hub closed before game:end"),
            };
            match event.event.as_str() {
                ws_events::EVENT_QUESTION_END => {
                    for result in event.data["results"].as_array().unwrap() {
                        assert_eq!(result["answered"], false);
                        assert_eq!(result["delta"], 0);
                    }
                }
                ws_events::EVENT_GAME_END => break,
                _ => {}
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_and_unknown_answers_are_rejected() {
        let quiz = ready_lobby(2).await;
        let mut events = quiz.state.hub(&quiz.code).subscribe();
        lobby_service::start_game(&quiz.state, &quiz.code, quiz.host_id)
            .await
            .unwrap();

        // Wait for the first question window to open.
        loop {
            match events.recv().await {
                Ok(event) if event.event == ws_events::EVENT_QUESTION_START => break,
                Ok(_) => continue,
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => panic!("hub closed early"),
            }
        }

        submit_answer(&quiz.state, &quiz.code, "alice", "0".into())
            .await
            .unwrap();
        let err = submit_answer(&quiz.state, &quiz.code, "alice", "1".into())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let err = submit_answer(&quiz.state, &quiz.code, "mallory", "0".into())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let err = submit_answer(&quiz.state, "ZZZZZZ", "alice", "0".into())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn fully_disconnected_sessions_are_abandoned_after_the_grace_period() {
        let quiz = ready_lobby(2).await;
        let session = lobby_service::start_game(&quiz.state, &quiz.code, quiz.host_id)
            .await
            .unwrap();

        for user in [quiz.host_id, quiz.joiner_id] {
            lobby_service::update_player(
                &quiz.state,
                &quiz.code,
                user,
                user,
                PlayerPatch {
                    is_connected: Some(false),
                    ..PlayerPatch::default()
                },
            )
            .await
            .unwrap();
        }

        // Not stale yet.
        assert_eq!(abandon_stale_sessions(&quiz.state).await, 0);

        let grace = Duration::from_secs(quiz.state.config().abandoned_grace_secs + 1);
        {
            let handle = quiz.state.session(&quiz.code).unwrap();
            *handle.last_activity.lock().await = Instant::now() - grace;
        }

        assert_eq!(abandon_stale_sessions(&quiz.state).await, 1);
        assert!(quiz.state.session(&quiz.code).is_err());
        assert!(quiz.state.lobby_entry(&quiz.code).is_err());

        let persisted = find_session(&quiz.state, session.id).await.unwrap();
        assert_eq!(persisted.status, "abandoned");
        assert!(persisted.completed_at.is_some());

        // The question set id is still what the session was started with.
        assert_eq!(persisted.question_set_ids, vec![quiz.set_id]);
    }

    #[tokio::test]
    async fn runner_failure_abandons_the_session_and_resets_the_lobby() {
        let quiz = ready_lobby(1).await;
        let mut events = quiz.state.hub(&quiz.code).subscribe();

        let settings = {
            let entry = quiz.state.lobby_entry(&quiz.code).unwrap();
            let mut lobby = entry.lobby.lock().await;
            lobby.status = LobbyStatus::InProgress;
            lobby.settings.clone()
        };

        let session = GameSession::new(quiz.code.clone(), quiz.host_id, settings, 1);
        let session_id = session.id;
        let mut game = GameState::new(["alice", "bob"], 1);
        // A phase already past `starting` makes the runner's first transition
        // fail, simulating a corrupted session.
        game.apply(SessionEvent::BeginQuestion).unwrap();
        let handle = SessionHandle::new(session, game, Vec::new());
        quiz.state
            .sessions()
            .insert(quiz.code.clone(), handle.clone());

        run_session(quiz.state.clone(), handle).await;

        let event = events.recv().await.unwrap();
        assert_eq!(event.event, ws_events::EVENT_GAME_START);
        let event = events.recv().await.unwrap();
        assert_eq!(event.event, ws_events::EVENT_GAME_ERROR);
        let event = events.recv().await.unwrap();
        assert_eq!(event.event, ws_events::EVENT_LOBBY_UPDATED);

        // The session is gone, persisted as abandoned, and the lobby is
        // playable again instead of stuck in_progress.
        assert!(quiz.state.session(&quiz.code).is_err());
        let persisted = find_session(&quiz.state, session_id).await.unwrap();
        assert_eq!(persisted.status, "abandoned");
        let lobby = lobby_service::get_lobby(&quiz.state, &quiz.code)
            .await
            .unwrap();
        assert_eq!(lobby.status, "waiting");
    }

    #[tokio::test(start_paused = true)]
    async fn game_state_snapshot_tracks_the_live_question() {
        let quiz = ready_lobby(2).await;
        let mut events = quiz.state.hub(&quiz.code).subscribe();
        lobby_service::start_game(&quiz.state, &quiz.code, quiz.host_id)
            .await
            .unwrap();

        loop {
            match events.recv().await {
                Ok(event) if event.event == ws_events::EVENT_QUESTION_START => break,
                Ok(_) => continue,
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => panic!("hub closed early"),
            }
        }

        let snapshot = current_game_state(&quiz.state, &quiz.code).await.unwrap();
        assert_eq!(snapshot.phase, "question_active");
        assert_eq!(snapshot.current_question_index, 0);
        assert_eq!(snapshot.total_questions, 2);
        assert_eq!(snapshot.standings.len(), 2);
    }
}
