use tokio::sync::broadcast;

use crate::dto::ws::ServerEvent;

/// Per-lobby broadcast hub fanning events out to every realtime subscriber.
///
/// Events are delivered in the order the server applied them; subscribers that
/// lag past the channel capacity observe a `Lagged` error and resynchronize
/// from a fresh lobby snapshot.
pub struct LobbyHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl LobbyHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }
}
