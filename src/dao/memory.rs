//! In-memory [`Store`] backend.
//!
//! Used by the binary when no external database is configured and by the
//! service test suites. Semantics match a relational backend: entries are
//! keyed the way the table primary keys are, and hall-of-fame insertion is
//! atomic on the `(session_id, username)` pair.

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    Store,
    models::{GameSessionEntity, HallOfFameEntryEntity, LobbyEntity},
    storage::StorageResult,
};

/// Process-local storage backend.
#[derive(Default)]
pub struct MemoryStore {
    lobbies: Arc<DashMap<String, LobbyEntity>>,
    sessions: Arc<DashMap<Uuid, GameSessionEntity>>,
    entries: Arc<DashMap<(Uuid, String), HallOfFameEntryEntity>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn save_lobby(&self, lobby: LobbyEntity) -> BoxFuture<'static, StorageResult<()>> {
        let lobbies = self.lobbies.clone();
        Box::pin(async move {
            lobbies.insert(lobby.code.clone(), lobby);
            Ok(())
        })
    }

    fn delete_lobby(&self, code: String) -> BoxFuture<'static, StorageResult<()>> {
        let lobbies = self.lobbies.clone();
        Box::pin(async move {
            lobbies.remove(&code);
            Ok(())
        })
    }

    fn save_session(&self, session: GameSessionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let sessions = self.sessions.clone();
        Box::pin(async move {
            sessions.insert(session.id, session);
            Ok(())
        })
    }

    fn find_session(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<GameSessionEntity>>> {
        let sessions = self.sessions.clone();
        Box::pin(async move { Ok(sessions.get(&id).map(|entry| entry.value().clone())) })
    }

    fn insert_hall_of_fame_entry(
        &self,
        entry: HallOfFameEntryEntity,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let entries = self.entries.clone();
        Box::pin(async move {
            let key = (entry.session_id, entry.username.clone());
            // The entry API makes insert-if-absent atomic, mirroring the
            // unique index a relational backend would enforce.
            match entries.entry(key) {
                dashmap::Entry::Occupied(_) => Ok(false),
                dashmap::Entry::Vacant(slot) => {
                    slot.insert(entry);
                    Ok(true)
                }
            }
        })
    }

    fn find_hall_of_fame_entry(
        &self,
        session_id: Uuid,
        username: String,
    ) -> BoxFuture<'static, StorageResult<Option<HallOfFameEntryEntity>>> {
        let entries = self.entries.clone();
        Box::pin(async move {
            Ok(entries
                .get(&(session_id, username))
                .map(|entry| entry.value().clone()))
        })
    }

    fn list_hall_of_fame_entries(
        &self,
        question_set_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<HallOfFameEntryEntity>>> {
        let entries = self.entries.clone();
        Box::pin(async move {
            Ok(entries
                .iter()
                .filter(|entry| entry.value().question_set_id == question_set_id)
                .map(|entry| entry.value().clone())
                .collect())
        })
    }

    fn list_hall_of_fame_entries_for_user(
        &self,
        username: String,
    ) -> BoxFuture<'static, StorageResult<Vec<HallOfFameEntryEntity>>> {
        let entries = self.entries.clone();
        Box::pin(async move {
            Ok(entries
                .iter()
                .filter(|entry| entry.value().username == username)
                .map(|entry| entry.value().clone())
                .collect())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
