use std::time::{Duration, SystemTime};

use indexmap::IndexMap;
use rand::Rng;
use uuid::Uuid;

use crate::{config::AppConfig, error::ServiceError};

/// Number of characters in a shareable lobby code.
pub const LOBBY_CODE_LENGTH: usize = 6;
/// Alphabet used for lobby codes (uppercase alphanumerics).
const LOBBY_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Lifecycle states of a lobby.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobbyStatus {
    /// Players can join, leave, and ready up.
    Waiting,
    /// A game session started from this lobby is running.
    InProgress,
    /// The session started from this lobby finished.
    Completed,
    /// The lobby outlived its TTL without ever starting.
    Expired,
}

impl LobbyStatus {
    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            LobbyStatus::Waiting => "waiting",
            LobbyStatus::InProgress => "in_progress",
            LobbyStatus::Completed => "completed",
            LobbyStatus::Expired => "expired",
        }
    }

    /// Parse a wire name back into a status.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "waiting" => Some(LobbyStatus::Waiting),
            "in_progress" => Some(LobbyStatus::InProgress),
            "completed" => Some(LobbyStatus::Completed),
            "expired" => Some(LobbyStatus::Expired),
            _ => None,
        }
    }
}

/// Game settings attached to a lobby, snapshotted into the session at start.
#[derive(Debug, Clone)]
pub struct LobbySettings {
    /// Number of questions served per game.
    pub question_count: u32,
    /// Per-question answer window in seconds.
    pub time_limit_secs: u64,
    /// Whether the lobby returns to `waiting` after a finished game.
    pub allow_replay: bool,
    /// Question sets the game draws from; must be non-empty to start.
    pub question_set_ids: Vec<Uuid>,
}

impl LobbySettings {
    /// Settings with every field at its configured default.
    pub fn defaults(config: &AppConfig) -> Self {
        Self {
            question_count: config.default_question_count,
            time_limit_secs: config.default_time_limit_secs,
            allow_replay: true,
            question_set_ids: Vec::new(),
        }
    }

    /// Apply a partial update, validating each provided field against the
    /// configured bounds. Fields the patch omits keep their value.
    pub fn apply_patch(
        &mut self,
        patch: SettingsPatch,
        config: &AppConfig,
    ) -> Result<(), ServiceError> {
        if let Some(question_count) = patch.question_count {
            if question_count < 1 || question_count > config.max_question_count {
                return Err(ServiceError::InvalidInput(format!(
                    "question count must be between 1 and {}",
                    config.max_question_count
                )));
            }
            self.question_count = question_count;
        }

        if let Some(time_limit_secs) = patch.time_limit_secs {
            if time_limit_secs < config.min_time_limit_secs
                || time_limit_secs > config.max_time_limit_secs
            {
                return Err(ServiceError::InvalidInput(format!(
                    "time limit must be between {} and {} seconds",
                    config.min_time_limit_secs, config.max_time_limit_secs
                )));
            }
            self.time_limit_secs = time_limit_secs;
        }

        if let Some(allow_replay) = patch.allow_replay {
            self.allow_replay = allow_replay;
        }

        if let Some(question_set_ids) = patch.question_set_ids {
            if question_set_ids.is_empty() {
                return Err(ServiceError::InvalidInput(
                    "question set selection must not be empty".into(),
                ));
            }
            self.question_set_ids = question_set_ids;
        }

        Ok(())
    }
}

/// Partial settings update; only provided fields change.
#[derive(Debug, Clone, Default)]
pub struct SettingsPatch {
    /// New question count, if provided.
    pub question_count: Option<u32>,
    /// New per-question time limit, if provided.
    pub time_limit_secs: Option<u64>,
    /// New replay flag, if provided.
    pub allow_replay: Option<bool>,
    /// New question set selection, if provided.
    pub question_set_ids: Option<Vec<Uuid>>,
}

/// Partial player update; only provided fields change.
#[derive(Debug, Clone, Default)]
pub struct PlayerPatch {
    /// New readiness flag, if provided.
    pub is_ready: Option<bool>,
    /// New connection flag, if provided.
    pub is_connected: Option<bool>,
    /// New cosmetic character, if provided.
    pub character: Option<String>,
}

/// A member of a lobby's roster.
#[derive(Debug, Clone)]
pub struct Player {
    /// Identifier supplied by the authentication layer.
    pub user_id: Uuid,
    /// Display name supplied by the authentication layer.
    pub username: String,
    /// Cosmetic character chosen by the player.
    pub character: Option<String>,
    /// Whether the player is ready to start.
    pub is_ready: bool,
    /// Whether the player currently holds a live realtime connection.
    pub is_connected: bool,
    /// Session-scoped score accumulator, mirrored from the last game state.
    pub score: i64,
    /// Current streak multiplier, mirrored from the last game state.
    pub multiplier: u32,
}

impl Player {
    /// Build a freshly joined player. Hosts start ready, joiners do not.
    pub fn new(user_id: Uuid, username: String, character: Option<String>, is_ready: bool) -> Self {
        Self {
            user_id,
            username,
            character,
            is_ready,
            is_connected: true,
            score: 0,
            multiplier: 1,
        }
    }
}

/// Outcome of removing a player from a lobby roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The player was removed and other players remain.
    Removed,
    /// The leaving host was removed and host status moved to this user.
    HostTransferred(Uuid),
    /// The last player left; the lobby should be deleted.
    LobbyEmpty,
}

/// A pre-game waiting room identified by a short shareable code.
///
/// The roster is an ordered map so host transfer can pick the earliest
/// remaining joiner deterministically.
#[derive(Debug, Clone)]
pub struct Lobby {
    /// Unique shareable code; immutable once created.
    pub code: String,
    /// User holding host privileges. Exactly one host at any time.
    pub host_id: Uuid,
    /// Roster in join order; a user appears at most once.
    pub players: IndexMap<Uuid, Player>,
    /// Current lifecycle status.
    pub status: LobbyStatus,
    /// Game settings the host controls.
    pub settings: LobbySettings,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Moment after which a never-started lobby may be swept.
    pub expires_at: SystemTime,
}

impl Lobby {
    /// Build a new lobby with the host as its sole, already-ready player.
    pub fn new(code: String, host: Player, settings: LobbySettings, ttl: Duration) -> Self {
        let created_at = SystemTime::now();
        let host_id = host.user_id;
        let mut players = IndexMap::new();
        players.insert(host_id, host);

        Self {
            code,
            host_id,
            players,
            status: LobbyStatus::Waiting,
            settings,
            created_at,
            expires_at: created_at + ttl,
        }
    }

    /// Whether the given user currently holds host privileges.
    pub fn is_host(&self, user_id: Uuid) -> bool {
        self.host_id == user_id
    }

    /// Whether every roster member is ready.
    pub fn all_ready(&self) -> bool {
        self.players.values().all(|player| player.is_ready)
    }

    /// Whether a never-started lobby has outlived its TTL at `now`.
    pub fn is_expired(&self, now: SystemTime) -> bool {
        self.status == LobbyStatus::Waiting && now >= self.expires_at
    }

    /// Append a player to the roster.
    ///
    /// Fails when the lobby is not accepting joins or the user is already a
    /// member.
    pub fn add_player(&mut self, player: Player) -> Result<(), ServiceError> {
        if self.status != LobbyStatus::Waiting {
            return Err(ServiceError::NotFound(format!(
                "lobby `{}` is not accepting players",
                self.code
            )));
        }
        if self.players.contains_key(&player.user_id) {
            return Err(ServiceError::Conflict(format!(
                "user `{}` already joined lobby `{}`",
                player.user_id, self.code
            )));
        }

        self.players.insert(player.user_id, player);
        Ok(())
    }

    /// Remove a player from a waiting lobby, transferring host status to the
    /// earliest remaining joiner when the host leaves.
    pub fn remove_player(&mut self, user_id: Uuid) -> Result<LeaveOutcome, ServiceError> {
        if self.players.shift_remove(&user_id).is_none() {
            return Err(ServiceError::NotFound(format!(
                "user `{}` is not in lobby `{}`",
                user_id, self.code
            )));
        }

        if self.players.is_empty() {
            return Ok(LeaveOutcome::LobbyEmpty);
        }

        if self.host_id == user_id {
            // IndexMap preserves join order, so the first entry is the
            // earliest remaining joiner.
            let next_host = *self
                .players
                .keys()
                .next()
                .expect("non-empty roster has a first player");
            self.host_id = next_host;
            return Ok(LeaveOutcome::HostTransferred(next_host));
        }

        Ok(LeaveOutcome::Removed)
    }

    /// Apply a partial update to a roster member.
    pub fn patch_player(&mut self, user_id: Uuid, patch: PlayerPatch) -> Result<(), ServiceError> {
        let player = self.players.get_mut(&user_id).ok_or_else(|| {
            ServiceError::NotFound(format!("user `{}` is not in lobby `{}`", user_id, self.code))
        })?;

        if let Some(is_ready) = patch.is_ready {
            player.is_ready = is_ready;
        }
        if let Some(is_connected) = patch.is_connected {
            player.is_connected = is_connected;
        }
        if let Some(character) = patch.character {
            player.character = Some(character);
        }

        Ok(())
    }

    /// Apply a partial settings update, validating each provided field against
    /// the configured bounds. Fields the patch omits keep their value.
    pub fn patch_settings(
        &mut self,
        patch: SettingsPatch,
        config: &AppConfig,
    ) -> Result<(), ServiceError> {
        self.settings.apply_patch(patch, config)
    }

    /// Usernames of currently connected players, in roster order.
    pub fn connected_usernames(&self) -> Vec<String> {
        self.players
            .values()
            .filter(|player| player.is_connected)
            .map(|player| player.username.clone())
            .collect()
    }
}

/// Generate a random lobby code of [`LOBBY_CODE_LENGTH`] uppercase alphanumerics.
///
/// Uniqueness is the caller's concern; collisions are handled by retrying
/// against the registry.
pub fn generate_lobby_code() -> String {
    let mut rng = rand::rng();
    (0..LOBBY_CODE_LENGTH)
        .map(|_| {
            let index = rng.random_range(0..LOBBY_CODE_ALPHABET.len());
            LOBBY_CODE_ALPHABET[index] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_lobby() -> (Lobby, Uuid) {
        let host_id = Uuid::new_v4();
        let host = Player::new(host_id, "host".into(), None, true);
        let settings = LobbySettings::defaults(&AppConfig::default());
        let lobby = Lobby::new("ABC123".into(), host, settings, Duration::from_secs(1800));
        (lobby, host_id)
    }

    #[test]
    fn new_lobby_has_ready_host() {
        let (lobby, host_id) = test_lobby();
        assert_eq!(lobby.status, LobbyStatus::Waiting);
        assert_eq!(lobby.players.len(), 1);
        assert!(lobby.is_host(host_id));
        assert!(lobby.players[&host_id].is_ready);
    }

    #[test]
    fn duplicate_join_is_rejected() {
        let (mut lobby, _) = test_lobby();
        let user_id = Uuid::new_v4();
        lobby
            .add_player(Player::new(user_id, "alice".into(), None, false))
            .unwrap();

        let err = lobby
            .add_player(Player::new(user_id, "alice".into(), None, false))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert_eq!(lobby.players.len(), 2);
    }

    #[test]
    fn join_rejected_once_started() {
        let (mut lobby, _) = test_lobby();
        lobby.status = LobbyStatus::InProgress;

        let err = lobby
            .add_player(Player::new(Uuid::new_v4(), "late".into(), None, false))
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn host_leave_transfers_to_earliest_joiner() {
        let (mut lobby, host_id) = test_lobby();
        let second = Uuid::new_v4();
        let third = Uuid::new_v4();
        lobby
            .add_player(Player::new(second, "second".into(), None, false))
            .unwrap();
        lobby
            .add_player(Player::new(third, "third".into(), None, false))
            .unwrap();

        let outcome = lobby.remove_player(host_id).unwrap();
        assert_eq!(outcome, LeaveOutcome::HostTransferred(second));
        assert_eq!(lobby.host_id, second);
    }

    #[test]
    fn last_leave_empties_lobby() {
        let (mut lobby, host_id) = test_lobby();
        assert_eq!(lobby.remove_player(host_id).unwrap(), LeaveOutcome::LobbyEmpty);
    }

    #[test]
    fn remove_unknown_player_fails() {
        let (mut lobby, _) = test_lobby();
        let err = lobby.remove_player(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn patch_player_only_touches_provided_fields() {
        let (mut lobby, host_id) = test_lobby();
        lobby
            .patch_player(
                host_id,
                PlayerPatch {
                    is_connected: Some(false),
                    ..PlayerPatch::default()
                },
            )
            .unwrap();

        let player = &lobby.players[&host_id];
        assert!(!player.is_connected);
        // Untouched fields keep their values.
        assert!(player.is_ready);
        assert_eq!(player.character, None);
    }

    #[test]
    fn settings_bounds_are_enforced() {
        let (mut lobby, _) = test_lobby();
        let config = AppConfig::default();

        let err = lobby
            .patch_settings(
                SettingsPatch {
                    question_count: Some(0),
                    ..SettingsPatch::default()
                },
                &config,
            )
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let err = lobby
            .patch_settings(
                SettingsPatch {
                    time_limit_secs: Some(config.min_time_limit_secs - 1),
                    ..SettingsPatch::default()
                },
                &config,
            )
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        lobby
            .patch_settings(
                SettingsPatch {
                    question_count: Some(5),
                    time_limit_secs: Some(30),
                    ..SettingsPatch::default()
                },
                &config,
            )
            .unwrap();
        assert_eq!(lobby.settings.question_count, 5);
        assert_eq!(lobby.settings.time_limit_secs, 30);
        // Fields the patch omitted are unchanged.
        assert!(lobby.settings.allow_replay);
    }

    #[test]
    fn generated_codes_are_uppercase_alphanumerics() {
        for _ in 0..32 {
            let code = generate_lobby_code();
            assert_eq!(code.len(), LOBBY_CODE_LENGTH);
            assert!(
                code.chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
            );
        }
    }
}
