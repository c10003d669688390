//! Event names and broadcast helpers for the realtime surface.
//!
//! Every state change that clients care about funnels through one of these
//! helpers so event names and payload shapes stay consistent between the REST
//! and WebSocket code paths.

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dto::{
        lobby::{LobbySummary, PlayerSummary},
        ws::{
            GameEndEvent, GameErrorEvent, GameStartEvent, LobbyUpdatedEvent,
            PlayerAnsweredEvent, PlayerDisconnectedEvent, PlayerJoinedEvent, PlayerLeftEvent,
            QuestionEndEvent, QuestionStartEvent, ServerEvent, TimerUpdateEvent,
        },
    },
    state::SharedState,
};

/// A player joined the lobby roster.
pub const EVENT_PLAYER_JOINED: &str = "player:joined";
/// A player left the lobby roster.
pub const EVENT_PLAYER_LEFT: &str = "player:left";
/// A player's realtime connection dropped without leaving.
pub const EVENT_PLAYER_DISCONNECTED: &str = "player:disconnected";
/// Full lobby snapshot after any lobby state change.
pub const EVENT_LOBBY_UPDATED: &str = "lobby:updated";
/// The host started the game.
pub const EVENT_GAME_START: &str = "game:start";
/// Snapshot of the runtime game state, sent on reconnect.
pub const EVENT_GAME_STATE: &str = "game:state";
/// A question window opened.
pub const EVENT_QUESTION_START: &str = "question:start";
/// A player's answer was accepted.
pub const EVENT_PLAYER_ANSWERED: &str = "player:answered";
/// Once-per-second countdown while a question is live.
pub const EVENT_TIMER_UPDATE: &str = "timer:update";
/// A question closed; correct answer and per-player results revealed.
pub const EVENT_QUESTION_END: &str = "question:end";
/// The session finished; final standings attached.
pub const EVENT_GAME_END: &str = "game:end";
/// A recoverable error scoped to the lobby or session.
pub const EVENT_GAME_ERROR: &str = "game:error";

/// Serialize `payload` and fan it out on the lobby's hub.
///
/// Serialization failures are logged and dropped; a broken payload must never
/// take the session runner down.
pub fn broadcast<T>(state: &SharedState, code: &str, event: &str, payload: &T)
where
    T: Serialize,
{
    match ServerEvent::json(event, payload) {
        Ok(event) => state.broadcast(code, event),
        Err(err) => warn!(code, event, error = %err, "failed to serialize event"),
    }
}

/// Announce a new roster member.
pub fn broadcast_player_joined(state: &SharedState, code: &str, player: PlayerSummary) {
    broadcast(state, code, EVENT_PLAYER_JOINED, &PlayerJoinedEvent { player });
}

/// Announce a departure, including a host transfer if one happened.
pub fn broadcast_player_left(
    state: &SharedState,
    code: &str,
    user_id: Uuid,
    username: String,
    new_host_id: Option<Uuid>,
) {
    broadcast(
        state,
        code,
        EVENT_PLAYER_LEFT,
        &PlayerLeftEvent {
            user_id,
            username,
            new_host_id,
        },
    );
}

/// Announce a dropped connection.
pub fn broadcast_player_disconnected(state: &SharedState, code: &str, username: String) {
    broadcast(
        state,
        code,
        EVENT_PLAYER_DISCONNECTED,
        &PlayerDisconnectedEvent { username },
    );
}

/// Push a full lobby snapshot so clients resynchronize unconditionally.
pub fn broadcast_lobby_updated(state: &SharedState, code: &str, lobby: LobbySummary) {
    broadcast(state, code, EVENT_LOBBY_UPDATED, &LobbyUpdatedEvent { lobby });
}

/// Announce the start of a game session.
pub fn broadcast_game_start(state: &SharedState, code: &str, event: GameStartEvent) {
    broadcast(state, code, EVENT_GAME_START, &event);
}

/// Announce an opened question window.
pub fn broadcast_question_start(state: &SharedState, code: &str, event: QuestionStartEvent) {
    broadcast(state, code, EVENT_QUESTION_START, &event);
}

/// Announce an accepted answer without revealing its content.
pub fn broadcast_player_answered(state: &SharedState, code: &str, event: PlayerAnsweredEvent) {
    broadcast(state, code, EVENT_PLAYER_ANSWERED, &event);
}

/// Push the countdown for the live question.
pub fn broadcast_timer_update(state: &SharedState, code: &str, event: TimerUpdateEvent) {
    broadcast(state, code, EVENT_TIMER_UPDATE, &event);
}

/// Reveal a closed question's answer and per-player results.
pub fn broadcast_question_end(state: &SharedState, code: &str, event: QuestionEndEvent) {
    broadcast(state, code, EVENT_QUESTION_END, &event);
}

/// Announce session completion with final standings.
pub fn broadcast_game_end(state: &SharedState, code: &str, event: GameEndEvent) {
    broadcast(state, code, EVENT_GAME_END, &event);
}

/// Surface a recoverable error to every subscriber of the lobby.
pub fn broadcast_game_error(state: &SharedState, code: &str, error_code: &str, message: &str) {
    broadcast(
        state,
        code,
        EVENT_GAME_ERROR,
        &GameErrorEvent {
            code: error_code.to_string(),
            message: message.to_string(),
        },
    );
}
