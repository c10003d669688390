//! Lobby lifecycle: creation, membership, settings, start gating, and the
//! expiry sweep.
//!
//! Every mutation of a lobby happens under that lobby's registry mutex, so
//! concurrent joins, leaves, and setting changes on one code are linearized
//! while different codes proceed independently. Broadcasts and persistence
//! writes happen after the lock is dropped, always from a snapshot taken
//! inside the critical section.

use std::{
    sync::Arc,
    time::{Duration, SystemTime},
};

use dashmap::mapref::entry::Entry;
use rand::seq::SliceRandom;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dao::models::LobbyEntity,
    dto::{
        game::GameSessionSummary,
        lobby::{CreateLobbyRequest, JoinLobbyRequest, LobbyStatsResponse, LobbySummary},
        validation::validate_lobby_code,
    },
    error::ServiceError,
    services::{game_service, ws_events},
    state::{
        LobbyEntry, SessionHandle, SharedState,
        lobby::{
            generate_lobby_code, LeaveOutcome, Lobby, LobbySettings, LobbyStatus, Player,
            PlayerPatch, SettingsPatch,
        },
        session::{GameSession, GameState},
    },
};

/// Attempts made to find an unoccupied lobby code before giving up.
const MAX_CODE_ATTEMPTS: usize = 16;

/// Create a lobby with the caller as its host.
///
/// The host joins ready; settings start at the configured defaults with the
/// request's overrides applied on top.
pub async fn create_lobby(
    state: &SharedState,
    user_id: Uuid,
    username: String,
    request: CreateLobbyRequest,
) -> Result<LobbySummary, ServiceError> {
    let config = state.config();

    let mut settings = LobbySettings::defaults(config);
    if let Some(input) = request.settings {
        settings.apply_patch(input.into(), config)?;
    }

    let host = Player::new(user_id, username, request.character, true);
    let summary = register_lobby(state, host, settings)?;

    info!(code = %summary.code, host = %user_id, "lobby created");
    persist_lobby_summary(state, &summary.code).await;

    Ok(summary)
}

/// Join an existing waiting lobby by code.
pub async fn join_lobby(
    state: &SharedState,
    user_id: Uuid,
    username: String,
    request: JoinLobbyRequest,
) -> Result<LobbySummary, ServiceError> {
    validate_lobby_code(&request.lobby_code)
        .map_err(|err| ServiceError::InvalidInput(err.to_string()))?;

    let entry = state.lobby_entry(&request.lobby_code)?;
    let (summary, player) = {
        let mut lobby = entry.lobby.lock().await;
        lobby.add_player(Player::new(
            user_id,
            username,
            request.character,
            false,
        ))?;
        let summary = LobbySummary::from(&*lobby);
        let player = summary
            .players
            .iter()
            .find(|player| player.user_id == user_id)
            .cloned()
            .ok_or_else(|| ServiceError::InvalidState("joined player missing from roster".into()))?;
        (summary, player)
    };

    debug!(code = %summary.code, user = %user_id, "player joined lobby");
    persist_lobby(state, &entry).await;
    ws_events::broadcast_player_joined(state, &summary.code, player);
    ws_events::broadcast_lobby_updated(state, &summary.code, summary.clone());

    Ok(summary)
}

/// Leave a lobby.
///
/// In a waiting lobby the player is removed from the roster, transferring
/// host privileges to the earliest remaining joiner if needed; the last
/// departure deletes the lobby. Once a game has started the roster is frozen,
/// so leaving only marks the player disconnected.
pub async fn leave_lobby(
    state: &SharedState,
    code: &str,
    user_id: Uuid,
) -> Result<(), ServiceError> {
    let entry = state.lobby_entry(code)?;

    enum Departure {
        RosterChanged {
            summary: LobbySummary,
            username: String,
            new_host_id: Option<Uuid>,
        },
        LobbyDeleted,
        Disconnected {
            summary: LobbySummary,
            username: String,
        },
    }

    let departure = {
        let mut lobby = entry.lobby.lock().await;

        if lobby.status != LobbyStatus::Waiting {
            lobby.patch_player(
                user_id,
                PlayerPatch {
                    is_connected: Some(false),
                    ..PlayerPatch::default()
                },
            )?;
            let username = lobby.players[&user_id].username.clone();
            Departure::Disconnected {
                summary: LobbySummary::from(&*lobby),
                username,
            }
        } else {
            let username = lobby
                .players
                .get(&user_id)
                .map(|player| player.username.clone())
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("user `{user_id}` is not in lobby `{code}`"))
                })?;

            match lobby.remove_player(user_id)? {
                LeaveOutcome::LobbyEmpty => Departure::LobbyDeleted,
                LeaveOutcome::HostTransferred(next_host) => Departure::RosterChanged {
                    summary: LobbySummary::from(&*lobby),
                    username,
                    new_host_id: Some(next_host),
                },
                LeaveOutcome::Removed => Departure::RosterChanged {
                    summary: LobbySummary::from(&*lobby),
                    username,
                    new_host_id: None,
                },
            }
        }
    };

    match departure {
        Departure::LobbyDeleted => {
            info!(code, "last player left; deleting lobby");
            state.remove_lobby(code);
            delete_lobby_record(state, code).await;
        }
        Departure::RosterChanged {
            summary,
            username,
            new_host_id,
        } => {
            if let Some(next_host) = new_host_id {
                info!(code, new_host = %next_host, "host left; transferred host privileges");
            }
            persist_lobby(state, &entry).await;
            ws_events::broadcast_player_left(state, code, user_id, username, new_host_id);
            ws_events::broadcast_lobby_updated(state, code, summary);
        }
        Departure::Disconnected { summary, username } => {
            persist_lobby(state, &entry).await;
            ws_events::broadcast_player_disconnected(state, code, username);
            ws_events::broadcast_lobby_updated(state, code, summary);
        }
    }

    Ok(())
}

/// Mark a player's realtime connection as dropped without removing them.
///
/// Unknown members are ignored; the connection may race with a completed
/// leave.
pub async fn mark_disconnected(state: &SharedState, code: &str, user_id: Uuid) {
    let Ok(entry) = state.lobby_entry(code) else {
        return;
    };

    let marked = {
        let mut lobby = entry.lobby.lock().await;
        match lobby.patch_player(
            user_id,
            PlayerPatch {
                is_connected: Some(false),
                ..PlayerPatch::default()
            },
        ) {
            Ok(()) => Some((
                LobbySummary::from(&*lobby),
                lobby.players[&user_id].username.clone(),
            )),
            Err(_) => None,
        }
    };

    if let Some((summary, username)) = marked {
        debug!(code, user = %user_id, "player disconnected");
        ws_events::broadcast_player_disconnected(state, code, username);
        ws_events::broadcast_lobby_updated(state, code, summary);
    }
}

/// Apply a partial update to a roster member.
///
/// Players may update themselves; the host may update anyone.
pub async fn update_player(
    state: &SharedState,
    code: &str,
    requester_id: Uuid,
    target_id: Uuid,
    patch: PlayerPatch,
) -> Result<LobbySummary, ServiceError> {
    let entry = state.lobby_entry(code)?;

    let summary = {
        let mut lobby = entry.lobby.lock().await;
        if requester_id != target_id && !lobby.is_host(requester_id) {
            return Err(ServiceError::Forbidden(
                "only the host may update other players".into(),
            ));
        }
        lobby.patch_player(target_id, patch)?;
        LobbySummary::from(&*lobby)
    };

    persist_lobby(state, &entry).await;
    ws_events::broadcast_lobby_updated(state, code, summary.clone());

    Ok(summary)
}

/// Apply a partial settings update. Host only, and only before the game
/// starts; the session snapshots settings at start, so later edits would be
/// lies.
pub async fn update_settings(
    state: &SharedState,
    code: &str,
    requester_id: Uuid,
    patch: SettingsPatch,
) -> Result<LobbySummary, ServiceError> {
    let entry = state.lobby_entry(code)?;

    let summary = {
        let mut lobby = entry.lobby.lock().await;
        if !lobby.is_host(requester_id) {
            return Err(ServiceError::Forbidden(
                "only the host may change lobby settings".into(),
            ));
        }
        if lobby.status != LobbyStatus::Waiting {
            return Err(ServiceError::InvalidState(
                "settings are frozen once the game has started".into(),
            ));
        }
        lobby.patch_settings(patch, state.config())?;
        LobbySummary::from(&*lobby)
    };

    persist_lobby(state, &entry).await;
    ws_events::broadcast_lobby_updated(state, code, summary.clone());

    Ok(summary)
}

/// Fetch a lobby snapshot by code.
pub async fn get_lobby(state: &SharedState, code: &str) -> Result<LobbySummary, ServiceError> {
    let entry = state.lobby_entry(code)?;
    let lobby = entry.lobby.lock().await;
    Ok(LobbySummary::from(&*lobby))
}

/// Find the lobby the user is currently a member of, if any.
pub async fn my_lobby(state: &SharedState, user_id: Uuid) -> Option<LobbySummary> {
    for (_, entry) in snapshot_lobbies(state) {
        let lobby = entry.lobby.lock().await;
        if lobby.players.contains_key(&user_id) {
            return Some(LobbySummary::from(&*lobby));
        }
    }
    None
}

/// List lobbies, optionally filtered by status wire name.
pub async fn list_lobbies(
    state: &SharedState,
    status: Option<&str>,
) -> Result<Vec<LobbySummary>, ServiceError> {
    let filter = match status {
        Some(value) => Some(LobbyStatus::parse(value).ok_or_else(|| {
            ServiceError::InvalidInput(format!("unknown lobby status `{value}`"))
        })?),
        None => None,
    };

    let mut summaries = Vec::new();
    for (_, entry) in snapshot_lobbies(state) {
        let lobby = entry.lobby.lock().await;
        if filter.is_none_or(|status| lobby.status == status) {
            summaries.push(LobbySummary::from(&*lobby));
        }
    }

    Ok(summaries)
}

/// Aggregate lobby counts by status.
pub async fn lobby_stats(state: &SharedState) -> LobbyStatsResponse {
    let mut stats = LobbyStatsResponse::default();
    for (_, entry) in snapshot_lobbies(state) {
        let lobby = entry.lobby.lock().await;
        stats.total += 1;
        match lobby.status {
            LobbyStatus::Waiting => stats.waiting += 1,
            LobbyStatus::InProgress => stats.in_progress += 1,
            LobbyStatus::Completed => stats.completed += 1,
            LobbyStatus::Expired => stats.expired += 1,
        }
    }
    stats
}

/// Sweep lobbies that sat in `waiting` past their TTL. Returns the number of
/// lobbies removed.
pub async fn cleanup_expired(state: &SharedState) -> usize {
    let now = SystemTime::now();
    let mut removed = 0;

    for (code, entry) in snapshot_lobbies(state) {
        let expired = {
            let mut lobby = entry.lobby.lock().await;
            if lobby.is_expired(now) {
                lobby.status = LobbyStatus::Expired;
                true
            } else {
                false
            }
        };

        if expired {
            info!(code, "sweeping expired lobby");
            state.remove_lobby(&code);
            delete_lobby_record(state, &code).await;
            removed += 1;
        }
    }

    if removed > 0 {
        info!(removed, "expired lobby sweep finished");
    }
    removed
}

/// Start a game session from a waiting lobby. Host only.
///
/// Requires the configured minimum roster size, every player ready, and a
/// non-empty question selection. The session row is persisted before any
/// state changes; a storage failure leaves the lobby untouched.
pub async fn start_game(
    state: &SharedState,
    code: &str,
    requester_id: Uuid,
) -> Result<GameSessionSummary, ServiceError> {
    let config = state.config();
    let entry = state.lobby_entry(code)?;
    let mut lobby = entry.lobby.lock().await;

    if !lobby.is_host(requester_id) {
        return Err(ServiceError::Forbidden(
            "only the host may start the game".into(),
        ));
    }
    if lobby.status != LobbyStatus::Waiting {
        return Err(ServiceError::InvalidState(
            "game has already started".into(),
        ));
    }
    if lobby.players.len() < config.min_players_to_start {
        return Err(ServiceError::InvalidInput(format!(
            "at least {} players are required to start",
            config.min_players_to_start
        )));
    }
    if !lobby.all_ready() {
        return Err(ServiceError::InvalidInput(
            "not all players are ready".into(),
        ));
    }
    if lobby.settings.question_set_ids.is_empty() {
        return Err(ServiceError::InvalidInput(
            "no question sets selected".into(),
        ));
    }

    let store = state.require_store().await?;
    let mut questions = state
        .question_bank()
        .questions_for_sets(lobby.settings.question_set_ids.clone())
        .await?;
    if questions.is_empty() {
        return Err(ServiceError::NotFound(
            "selected question sets contain no questions".into(),
        ));
    }

    questions.shuffle(&mut rand::rng());
    questions.truncate(lobby.settings.question_count as usize);

    let session = GameSession::new(
        code.to_string(),
        lobby.host_id,
        lobby.settings.clone(),
        questions.len() as u32,
    );
    store.save_session((&session).into()).await?;

    lobby.status = LobbyStatus::InProgress;
    for player in lobby.players.values_mut() {
        player.score = 0;
        player.multiplier = 1;
    }

    let usernames: Vec<String> = lobby
        .players
        .values()
        .map(|player| player.username.clone())
        .collect();
    let game = GameState::new(usernames.iter().map(String::as_str), questions.len());

    let summary = GameSessionSummary::from(&session);
    let handle = SessionHandle::new(session, game, questions);
    state.sessions().insert(code.to_string(), handle.clone());
    drop(lobby);

    info!(
        code,
        session = %summary.id,
        questions = summary.total_questions,
        "game started"
    );
    persist_lobby(state, &entry).await;
    game_service::spawn_session_runner(state.clone(), handle);

    Ok(summary)
}

/// Register a freshly built lobby under an unoccupied code.
///
/// The code space is large relative to the number of concurrent lobbies, so a
/// handful of retries is always enough in practice.
fn register_lobby(
    state: &SharedState,
    host: Player,
    settings: LobbySettings,
) -> Result<LobbySummary, ServiceError> {
    let ttl = Duration::from_secs(state.config().lobby_ttl_secs);

    for _ in 0..MAX_CODE_ATTEMPTS {
        let code = generate_lobby_code();
        match state.lobbies().entry(code.clone()) {
            Entry::Occupied(_) => continue,
            Entry::Vacant(slot) => {
                let lobby = Lobby::new(code, host.clone(), settings.clone(), ttl);
                let summary = LobbySummary::from(&lobby);
                slot.insert(LobbyEntry::new(lobby));
                return Ok(summary);
            }
        }
    }

    Err(ServiceError::InvalidState(
        "could not allocate a unique lobby code".into(),
    ))
}

/// Snapshot the lobby registry so per-lobby locks are never taken while a
/// registry shard is held.
fn snapshot_lobbies(state: &SharedState) -> Vec<(String, Arc<LobbyEntry>)> {
    state
        .lobbies()
        .iter()
        .map(|entry| (entry.key().clone(), entry.value().clone()))
        .collect()
}

/// Write-through a lobby snapshot; best effort, degraded mode only logs.
pub(crate) async fn persist_lobby(state: &SharedState, entry: &Arc<LobbyEntry>) {
    let entity = {
        let lobby = entry.lobby.lock().await;
        LobbyEntity::from(&*lobby)
    };
    let code = entity.code.clone();

    match state.store().await {
        Some(store) => {
            if let Err(err) = store.save_lobby(entity).await {
                warn!(code, error = %err, "failed to persist lobby");
            }
        }
        None => debug!(code, "skipping lobby persistence (degraded mode)"),
    }
}

async fn persist_lobby_summary(state: &SharedState, code: &str) {
    if let Ok(entry) = state.lobby_entry(code) {
        persist_lobby(state, &entry).await;
    }
}

/// Delete a lobby's persisted record; best effort.
async fn delete_lobby_record(state: &SharedState, code: &str) {
    if let Some(store) = state.store().await {
        if let Err(err) = store.delete_lobby(code.to_string()).await {
            warn!(code, error = %err, "failed to delete persisted lobby");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use uuid::Uuid;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            memory::MemoryStore,
            question_bank::{QuestionSet, StaticQuestionBank},
        },
        dto::lobby::LobbySettingsInput,
        state::{AppState, session::Question},
    };

    fn question_set(question_count: usize) -> QuestionSet {
        let set_id = Uuid::new_v4();
        QuestionSet {
            id: set_id,
            name: "General Knowledge".into(),
            questions: (0..question_count)
                .map(|i| Question {
                    id: Uuid::new_v4(),
                    question_set_id: set_id,
                    prompt: format!("Question {i}?"),
                    options: vec!["a".into(), "b".into(), "c".into()],
                    correct_index: 0,
                })
                .collect(),
        }
    }

    async fn test_state(set: QuestionSet) -> SharedState {
        let bank = StaticQuestionBank::from_sets([set]);
        let state = AppState::new(AppConfig::default(), Arc::new(bank));
        state.install_store(Arc::new(MemoryStore::new())).await;
        state
    }

    async fn create(state: &SharedState, username: &str) -> (Uuid, LobbySummary) {
        let user_id = Uuid::new_v4();
        let summary = create_lobby(
            state,
            user_id,
            username.into(),
            CreateLobbyRequest {
                character: None,
                settings: None,
            },
        )
        .await
        .unwrap();
        (user_id, summary)
    }

    async fn join(state: &SharedState, code: &str, username: &str) -> Uuid {
        let user_id = Uuid::new_v4();
        join_lobby(
            state,
            user_id,
            username.into(),
            JoinLobbyRequest {
                lobby_code: code.into(),
                character: None,
            },
        )
        .await
        .unwrap();
        user_id
    }

    #[tokio::test]
    async fn create_then_join_then_get() {
        let state = test_state(question_set(3)).await;
        let (host_id, summary) = create(&state, "host").await;
        assert_eq!(summary.players.len(), 1);
        assert!(summary.players[0].is_host);

        join(&state, &summary.code, "alice").await;

        let fetched = get_lobby(&state, &summary.code).await.unwrap();
        assert_eq!(fetched.players.len(), 2);
        assert_eq!(fetched.host_id, host_id);
        assert_eq!(fetched.status, "waiting");
    }

    #[tokio::test]
    async fn join_unknown_code_fails() {
        let state = test_state(question_set(3)).await;
        let err = join_lobby(
            &state,
            Uuid::new_v4(),
            "alice".into(),
            JoinLobbyRequest {
                lobby_code: "ZZZZZZ".into(),
                character: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn malformed_code_is_rejected_before_lookup() {
        let state = test_state(question_set(3)).await;
        let err = join_lobby(
            &state,
            Uuid::new_v4(),
            "alice".into(),
            JoinLobbyRequest {
                lobby_code: "abc".into(),
                character: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn concurrent_joins_are_linearized() {
        let state = test_state(question_set(3)).await;
        let (_, summary) = create(&state, "host").await;

        let mut tasks = Vec::new();
        for i in 0..8 {
            let state = state.clone();
            let code = summary.code.clone();
            tasks.push(tokio::spawn(async move {
                join_lobby(
                    &state,
                    Uuid::new_v4(),
                    format!("player{i}"),
                    JoinLobbyRequest {
                        lobby_code: code,
                        character: None,
                    },
                )
                .await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let fetched = get_lobby(&state, &summary.code).await.unwrap();
        assert_eq!(fetched.players.len(), 9);
    }

    #[tokio::test]
    async fn concurrent_settings_updates_to_disjoint_fields_both_land() {
        let state = test_state(question_set(3)).await;
        let (host_id, summary) = create(&state, "host").await;

        let count_task = {
            let state = state.clone();
            let code = summary.code.clone();
            tokio::spawn(async move {
                update_settings(
                    &state,
                    &code,
                    host_id,
                    SettingsPatch {
                        question_count: Some(7),
                        ..SettingsPatch::default()
                    },
                )
                .await
            })
        };
        let limit_task = {
            let state = state.clone();
            let code = summary.code.clone();
            tokio::spawn(async move {
                update_settings(
                    &state,
                    &code,
                    host_id,
                    SettingsPatch {
                        time_limit_secs: Some(30),
                        ..SettingsPatch::default()
                    },
                )
                .await
            })
        };
        count_task.await.unwrap().unwrap();
        limit_task.await.unwrap().unwrap();

        // The patches touch disjoint fields, so whichever applied second must
        // not have clobbered the first.
        let fetched = get_lobby(&state, &summary.code).await.unwrap();
        assert_eq!(fetched.settings.question_count, 7);
        assert_eq!(fetched.settings.time_limit_seconds, 30);
    }

    #[tokio::test]
    async fn host_leave_transfers_and_last_leave_deletes() {
        let state = test_state(question_set(3)).await;
        let (host_id, summary) = create(&state, "host").await;
        let second = join(&state, &summary.code, "second").await;

        leave_lobby(&state, &summary.code, host_id).await.unwrap();
        let fetched = get_lobby(&state, &summary.code).await.unwrap();
        assert_eq!(fetched.host_id, second);

        leave_lobby(&state, &summary.code, second).await.unwrap();
        assert!(matches!(
            get_lobby(&state, &summary.code).await.unwrap_err(),
            ServiceError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn non_host_cannot_change_settings() {
        let state = test_state(question_set(3)).await;
        let (_, summary) = create(&state, "host").await;
        let joiner = join(&state, &summary.code, "alice").await;

        let err = update_settings(
            &state,
            &summary.code,
            joiner,
            SettingsPatch {
                question_count: Some(5),
                ..SettingsPatch::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn start_requires_host_ready_players_and_questions() {
        let set = question_set(5);
        let set_id = set.id;
        let state = test_state(set).await;
        let (host_id, summary) = create(&state, "host").await;
        let code = summary.code.clone();

        // Below minimum roster size.
        let err = start_game(&state, &code, host_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let joiner = join(&state, &code, "alice").await;

        // Joiner is not ready yet.
        let err = start_game(&state, &code, host_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        update_player(
            &state,
            &code,
            joiner,
            joiner,
            PlayerPatch {
                is_ready: Some(true),
                ..PlayerPatch::default()
            },
        )
        .await
        .unwrap();

        // No question sets selected.
        let err = start_game(&state, &code, host_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        update_settings(
            &state,
            &code,
            host_id,
            SettingsPatch {
                question_set_ids: Some(vec![set_id]),
                ..SettingsPatch::default()
            },
        )
        .await
        .unwrap();

        // Non-host still cannot start.
        let err = start_game(&state, &code, joiner).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let session = start_game(&state, &code, host_id).await.unwrap();
        assert_eq!(session.total_questions, 5);
        assert_eq!(session.status, "in_progress");

        // A second start is rejected.
        let err = start_game(&state, &code, host_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn settings_overrides_apply_at_creation() {
        let state = test_state(question_set(3)).await;
        let user_id = Uuid::new_v4();
        let summary = create_lobby(
            &state,
            user_id,
            "host".into(),
            CreateLobbyRequest {
                character: Some("wizard".into()),
                settings: Some(LobbySettingsInput {
                    question_count: Some(7),
                    time_limit_seconds: Some(30),
                    ..LobbySettingsInput::default()
                }),
            },
        )
        .await
        .unwrap();

        assert_eq!(summary.settings.question_count, 7);
        assert_eq!(summary.settings.time_limit_seconds, 30);
        assert_eq!(summary.players[0].character.as_deref(), Some("wizard"));
    }

    #[tokio::test]
    async fn out_of_bounds_creation_settings_are_rejected() {
        let state = test_state(question_set(3)).await;
        let err = create_lobby(
            &state,
            Uuid::new_v4(),
            "host".into(),
            CreateLobbyRequest {
                character: None,
                settings: Some(LobbySettingsInput {
                    question_count: Some(0),
                    ..LobbySettingsInput::default()
                }),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn my_lobby_finds_membership() {
        let state = test_state(question_set(3)).await;
        let (_, summary) = create(&state, "host").await;
        let joiner = join(&state, &summary.code, "alice").await;

        let found = my_lobby(&state, joiner).await.unwrap();
        assert_eq!(found.code, summary.code);
        assert!(my_lobby(&state, Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn expired_lobbies_are_swept() {
        let state = test_state(question_set(3)).await;
        let (_, summary) = create(&state, "host").await;
        let (_, kept) = create(&state, "other").await;

        // Backdate the first lobby past its TTL.
        {
            let entry = state.lobby_entry(&summary.code).unwrap();
            let mut lobby = entry.lobby.lock().await;
            lobby.expires_at = SystemTime::now() - Duration::from_secs(1);
        }

        let removed = cleanup_expired(&state).await;
        assert_eq!(removed, 1);
        assert!(get_lobby(&state, &summary.code).await.is_err());
        assert!(get_lobby(&state, &kept.code).await.is_ok());
    }

    #[tokio::test]
    async fn stats_count_by_status() {
        let state = test_state(question_set(3)).await;
        create(&state, "host1").await;
        create(&state, "host2").await;

        let stats = lobby_stats(&state).await;
        assert_eq!(stats.waiting, 2);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.in_progress, 0);
    }

    #[tokio::test]
    async fn list_filter_rejects_unknown_status() {
        let state = test_state(question_set(3)).await;
        assert!(matches!(
            list_lobbies(&state, Some("bogus")).await.unwrap_err(),
            ServiceError::InvalidInput(_)
        ));
        assert!(list_lobbies(&state, Some("waiting")).await.is_ok());
    }
}
