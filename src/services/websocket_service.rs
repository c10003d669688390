//! Per-connection WebSocket handling.
//!
//! Each accepted socket runs one handler task plus a dedicated writer task fed
//! over an unbounded channel, so hub broadcasts and direct replies never block
//! on a slow peer's send buffer. The first frame must be a `join` intent;
//! everything after that is ready/answer/leave traffic.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use serde::Serialize;
use tokio::{
    sync::{broadcast::error::RecvError, mpsc::{self, UnboundedSender}},
    time::timeout,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    dto::{
        game::GameStateSummary,
        lobby::JoinLobbyRequest,
        ws::{ClientMessage, GameErrorEvent, LobbyUpdatedEvent, ServerEvent},
    },
    error::ServiceError,
    services::{game_service, lobby_service, ws_events},
    state::{SharedState, lobby::PlayerPatch},
};

/// How long a fresh connection may sit silent before its join is expected.
const JOIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Identity established by the join handshake.
struct Identity {
    lobby_code: String,
    user_id: Uuid,
    username: String,
}

/// Drive one client connection from handshake to disconnect.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (sink, mut stream) = socket.split();
    let (outbound, outbound_rx) = mpsc::unbounded_channel::<Message>();
    let writer = tokio::spawn(write_outbound(sink, outbound_rx));

    let Some((identity, character)) = await_join(&mut stream).await else {
        debug!("connection closed before a valid join intent");
        drop(outbound);
        let _ = writer.await;
        return;
    };

    if let Err(err) = attach(
        &state,
        &identity.lobby_code,
        identity.user_id,
        identity.username.clone(),
        character,
    )
    .await
    {
        send_direct(
            &outbound,
            ws_events::EVENT_GAME_ERROR,
            &GameErrorEvent {
                code: "join_failed".into(),
                message: err.to_string(),
            },
        );
        drop(outbound);
        let _ = writer.await;
        return;
    }

    // Subscribe before snapshotting so no broadcast lands in the gap between
    // the snapshot and the subscription.
    let hub_rx = state.hub(&identity.lobby_code).subscribe();
    let forwarder = tokio::spawn(forward_broadcasts(hub_rx, outbound.clone()));

    send_snapshots(&state, &identity.lobby_code, &outbound).await;
    debug!(
        code = %identity.lobby_code,
        user = %identity.user_id,
        "websocket attached"
    );

    let left = read_intents(&state, &identity, &mut stream, &outbound).await;

    forwarder.abort();
    if left {
        if let Err(err) =
            lobby_service::leave_lobby(&state, &identity.lobby_code, identity.user_id).await
        {
            debug!(code = %identity.lobby_code, error = %err, "leave on close failed");
        }
    } else {
        lobby_service::mark_disconnected(&state, &identity.lobby_code, identity.user_id).await;
    }

    drop(outbound);
    let _ = writer.await;
}

/// Writer task: drains the outbound channel into the socket.
async fn write_outbound(
    mut sink: SplitSink<WebSocket, Message>,
    mut outbound_rx: mpsc::UnboundedReceiver<Message>,
) {
    while let Some(message) = outbound_rx.recv().await {
        if sink.send(message).await.is_err() {
            break;
        }
    }
}

/// Forward hub broadcasts to this connection until it closes or the hub
/// disappears.
async fn forward_broadcasts(
    mut hub_rx: tokio::sync::broadcast::Receiver<ServerEvent>,
    outbound: UnboundedSender<Message>,
) {
    loop {
        match hub_rx.recv().await {
            Ok(event) => {
                if send_event(&outbound, &event).is_err() {
                    break;
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "connection lagged behind lobby broadcasts");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

/// Wait for the opening `join` intent.
async fn await_join(stream: &mut SplitStream<WebSocket>) -> Option<(Identity, Option<String>)> {
    let first = timeout(JOIN_TIMEOUT, async {
        while let Some(Ok(message)) = stream.next().await {
            if let Message::Text(text) = message {
                return ClientMessage::from_json_str(text.as_str()).ok();
            }
        }
        None
    })
    .await
    .ok()??;

    match first {
        ClientMessage::Join {
            lobby_code,
            user_id,
            username,
            character,
        } => Some((
            Identity {
                lobby_code,
                user_id,
                username,
            },
            character,
        )),
        _ => None,
    }
}

/// Join the lobby, or flip the connected flag back on for a reconnecting
/// member.
async fn attach(
    state: &SharedState,
    code: &str,
    user_id: Uuid,
    username: String,
    character: Option<String>,
) -> Result<(), ServiceError> {
    let entry = state.lobby_entry(code)?;
    let is_member = entry.lobby.lock().await.players.contains_key(&user_id);

    if is_member {
        lobby_service::update_player(
            state,
            code,
            user_id,
            user_id,
            PlayerPatch {
                is_connected: Some(true),
                ..PlayerPatch::default()
            },
        )
        .await?;
    } else {
        lobby_service::join_lobby(
            state,
            user_id,
            username,
            JoinLobbyRequest {
                lobby_code: code.to_string(),
                character,
            },
        )
        .await?;
    }

    Ok(())
}

/// Send the lobby snapshot, plus the game state snapshot when a session is
/// live, directly to this connection.
async fn send_snapshots(state: &SharedState, code: &str, outbound: &UnboundedSender<Message>) {
    if let Ok(lobby) = lobby_service::get_lobby(state, code).await {
        send_direct(outbound, ws_events::EVENT_LOBBY_UPDATED, &LobbyUpdatedEvent { lobby });
    }
    if let Ok(handle) = state.session(code) {
        let snapshot = {
            let game = handle.game.lock().await;
            GameStateSummary::from(&*game)
        };
        send_direct(outbound, ws_events::EVENT_GAME_STATE, &snapshot);
    }
}

/// Pump client intents until the connection closes. Returns whether the
/// client explicitly left.
async fn read_intents(
    state: &SharedState,
    identity: &Identity,
    stream: &mut SplitStream<WebSocket>,
    outbound: &UnboundedSender<Message>,
) -> bool {
    while let Some(Ok(message)) = stream.next().await {
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break,
            Message::Ping(payload) => {
                let _ = outbound.send(Message::Pong(payload));
                continue;
            }
            _ => continue,
        };

        let intent = match ClientMessage::from_json_str(text.as_str()) {
            Ok(intent) => intent,
            Err(err) => {
                send_direct(
                    outbound,
                    ws_events::EVENT_GAME_ERROR,
                    &GameErrorEvent {
                        code: "invalid_message".into(),
                        message: err.to_string(),
                    },
                );
                continue;
            }
        };

        match intent {
            ClientMessage::Ready { is_ready } => {
                let result = lobby_service::update_player(
                    state,
                    &identity.lobby_code,
                    identity.user_id,
                    identity.user_id,
                    PlayerPatch {
                        is_ready: Some(is_ready),
                        ..PlayerPatch::default()
                    },
                )
                .await;
                if let Err(err) = result {
                    send_error(outbound, "ready_rejected", &err);
                }
            }
            ClientMessage::Answer { answer, .. } => {
                let result = game_service::submit_answer(
                    state,
                    &identity.lobby_code,
                    &identity.username,
                    answer,
                )
                .await;
                if let Err(err) = result {
                    send_error(outbound, "answer_rejected", &err);
                }
            }
            ClientMessage::Leave => return true,
            ClientMessage::Join { .. } => {
                debug!(code = %identity.lobby_code, "duplicate join intent ignored");
            }
            ClientMessage::Unknown => {
                debug!(code = %identity.lobby_code, "unknown intent ignored");
            }
        }
    }

    false
}

fn send_error(outbound: &UnboundedSender<Message>, code: &str, err: &ServiceError) {
    send_direct(
        outbound,
        ws_events::EVENT_GAME_ERROR,
        &GameErrorEvent {
            code: code.to_string(),
            message: err.to_string(),
        },
    );
}

/// Serialize and queue an event for this connection only.
fn send_direct<T>(outbound: &UnboundedSender<Message>, event: &str, payload: &T)
where
    T: Serialize,
{
    match ServerEvent::json(event, payload) {
        Ok(event) => {
            let _ = send_event(outbound, &event);
        }
        Err(err) => warn!(event, error = %err, "failed to serialize direct event"),
    }
}

fn send_event(outbound: &UnboundedSender<Message>, event: &ServerEvent) -> Result<(), ()> {
    match serde_json::to_string(event) {
        Ok(payload) => outbound.send(Message::Text(payload.into())).map_err(|_| ()),
        Err(err) => {
            warn!(event = %event.event, error = %err, "failed to serialize event frame");
            Ok(())
        }
    }
}
