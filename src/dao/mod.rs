//! Storage and question-bank ports plus their in-process implementations.

/// In-memory storage backend.
pub mod memory;
/// Database entity definitions.
pub mod models;
/// Question bank port supplying question sequences.
pub mod question_bank;
/// Storage abstraction layer for database operations.
pub mod storage;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{GameSessionEntity, HallOfFameEntryEntity, LobbyEntity};
use crate::dao::storage::StorageResult;

/// Abstraction over the persistence layer for lobbies, game sessions, and
/// hall-of-fame entries.
///
/// Backends are installed into the shared state at runtime; while none is
/// installed the application runs degraded and operations requiring
/// persistence fail with `Unavailable`.
pub trait Store: Send + Sync {
    /// Write-through a lobby record (insert or replace by code).
    fn save_lobby(&self, lobby: LobbyEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Delete a lobby record.
    fn delete_lobby(&self, code: String) -> BoxFuture<'static, StorageResult<()>>;
    /// Insert or replace a game session row.
    fn save_session(&self, session: GameSessionEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch a game session row by id.
    fn find_session(&self, id: Uuid)
    -> BoxFuture<'static, StorageResult<Option<GameSessionEntity>>>;
    /// Insert a hall-of-fame entry; returns `false` when an entry for the same
    /// `(session_id, username)` pair already exists. The uniqueness check is
    /// atomic in the backend.
    fn insert_hall_of_fame_entry(
        &self,
        entry: HallOfFameEntryEntity,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// Fetch the hall-of-fame entry for a `(session_id, username)` pair.
    fn find_hall_of_fame_entry(
        &self,
        session_id: Uuid,
        username: String,
    ) -> BoxFuture<'static, StorageResult<Option<HallOfFameEntryEntity>>>;
    /// All hall-of-fame entries for a question set, in unspecified order.
    fn list_hall_of_fame_entries(
        &self,
        question_set_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<HallOfFameEntryEntity>>>;
    /// All hall-of-fame entries submitted by a user, in unspecified order.
    fn list_hall_of_fame_entries_for_user(
        &self,
        username: String,
    ) -> BoxFuture<'static, StorageResult<Vec<HallOfFameEntryEntity>>>;
    /// Cheap connectivity probe.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
