//! Shared application state: lobby registry, active sessions, broadcast hubs,
//! and the installable storage port.

pub mod hub;
pub mod lobby;
pub mod phase;
pub mod session;

use std::{sync::Arc, time::Instant};

use dashmap::DashMap;
use tokio::sync::{Mutex, Notify, RwLock, watch};

use crate::{
    config::AppConfig,
    dao::{Store, question_bank::QuestionBank},
    dto::ws::ServerEvent,
    error::ServiceError,
    state::{
        hub::LobbyHub,
        lobby::Lobby,
        session::{GameSession, GameState, Question},
    },
};

/// Cheaply cloneable handle to the central application state.
pub type SharedState = Arc<AppState>;

/// Capacity of each per-lobby broadcast channel.
const HUB_CAPACITY: usize = 64;

/// One lobby's slot in the registry.
///
/// The inner mutex is the per-lobby critical section: every state-changing
/// operation on a lobby code locks it, so read-modify-write sequences on the
/// roster and settings never interleave. Operations on different codes
/// proceed independently.
pub struct LobbyEntry {
    /// The lobby guarded by this entry's lock.
    pub lobby: Mutex<Lobby>,
}

impl LobbyEntry {
    /// Wrap a lobby into a registry entry.
    pub fn new(lobby: Lobby) -> Arc<Self> {
        Arc::new(Self {
            lobby: Mutex::new(lobby),
        })
    }
}

/// Runtime handle for one active game session.
pub struct SessionHandle {
    /// Persisted session record.
    pub session: Mutex<GameSession>,
    /// Ephemeral question/answer/timer state.
    pub game: Mutex<GameState>,
    /// The authoritative question sequence, fixed at start.
    pub questions: Vec<Question>,
    /// Signalled whenever an answer lands, so the runner can re-check the
    /// early-advance condition.
    pub answered: Notify,
    /// Last time a player interacted with the session; drives abandonment.
    pub last_activity: Mutex<Instant>,
    /// Abort handle of the runner task driving this session.
    runner: std::sync::Mutex<Option<tokio::task::AbortHandle>>,
}

impl SessionHandle {
    /// Bundle a freshly started session into a shared handle.
    pub fn new(session: GameSession, game: GameState, questions: Vec<Question>) -> Arc<Self> {
        Arc::new(Self {
            session: Mutex::new(session),
            game: Mutex::new(game),
            questions,
            answered: Notify::new(),
            last_activity: Mutex::new(Instant::now()),
            runner: std::sync::Mutex::new(None),
        })
    }

    /// Refresh the activity timestamp.
    pub async fn touch(&self) {
        *self.last_activity.lock().await = Instant::now();
    }

    /// Remember the runner task driving this session.
    pub fn set_runner(&self, handle: tokio::task::AbortHandle) {
        if let Ok(mut guard) = self.runner.lock() {
            *guard = Some(handle);
        }
    }

    /// Abort the runner task, if one is attached.
    pub fn abort_runner(&self) {
        if let Ok(mut guard) = self.runner.lock()
            && let Some(handle) = guard.take()
        {
            handle.abort();
        }
    }
}

/// Central application state storing the lobby registry, active sessions,
/// broadcast hubs, and storage handles.
pub struct AppState {
    config: AppConfig,
    store: RwLock<Option<Arc<dyn Store>>>,
    question_bank: Arc<dyn QuestionBank>,
    lobbies: DashMap<String, Arc<LobbyEntry>>,
    sessions: DashMap<String, Arc<SessionHandle>>,
    hubs: DashMap<String, Arc<LobbyHub>>,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig, question_bank: Arc<dyn QuestionBank>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            config,
            store: RwLock::new(None),
            question_bank,
            lobbies: DashMap::new(),
            sessions: DashMap::new(),
            hubs: DashMap::new(),
            degraded: degraded_tx,
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The question bank collaborator supplying question sequences.
    pub fn question_bank(&self) -> Arc<dyn QuestionBank> {
        self.question_bank.clone()
    }

    /// Obtain a handle to the current store, if one is installed.
    pub async fn store(&self) -> Option<Arc<dyn Store>> {
        let guard = self.store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the current store or fail with a degraded-mode error.
    pub async fn require_store(&self) -> Result<Arc<dyn Store>, ServiceError> {
        self.store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new store implementation and leave degraded mode.
    pub async fn install_store(&self, store: Arc<dyn Store>) {
        {
            let mut guard = self.store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current store and enter degraded mode.
    pub async fn clear_store(&self) {
        {
            let mut guard = self.store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.store.read().await;
        guard.is_none()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Registry of lobbies keyed by code.
    pub fn lobbies(&self) -> &DashMap<String, Arc<LobbyEntry>> {
        &self.lobbies
    }

    /// Resolve a lobby registry entry by code.
    pub fn lobby_entry(&self, code: &str) -> Result<Arc<LobbyEntry>, ServiceError> {
        self.lobbies
            .get(code)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ServiceError::NotFound(format!("lobby `{code}` not found")))
    }

    /// Remove a lobby and its broadcast hub from the registry.
    pub fn remove_lobby(&self, code: &str) {
        self.lobbies.remove(code);
        self.hubs.remove(code);
    }

    /// Registry of active sessions keyed by lobby code.
    pub fn sessions(&self) -> &DashMap<String, Arc<SessionHandle>> {
        &self.sessions
    }

    /// Resolve the active session for a lobby code.
    pub fn session(&self, code: &str) -> Result<Arc<SessionHandle>, ServiceError> {
        self.sessions
            .get(code)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ServiceError::NotFound(format!("no active game for lobby `{code}`")))
    }

    /// Broadcast hub for a lobby code, created on first use.
    pub fn hub(&self, code: &str) -> Arc<LobbyHub> {
        self.hubs
            .entry(code.to_string())
            .or_insert_with(|| Arc::new(LobbyHub::new(HUB_CAPACITY)))
            .value()
            .clone()
    }

    /// Broadcast an event on a lobby's hub.
    pub fn broadcast(&self, code: &str, event: ServerEvent) {
        self.hub(code).broadcast(event);
    }

    /// Update and broadcast the degraded flag when the value changes.
    fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }
}
