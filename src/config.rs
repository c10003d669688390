//! Application-level configuration loading for lobby, scoring, and leaderboard tunables.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "QUIZ_RALLY_BACK_CONFIG_PATH";

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// How long a lobby may sit in `waiting` before the sweeper may expire it.
    pub lobby_ttl_secs: u64,
    /// Question count applied when a lobby is created without one.
    pub default_question_count: u32,
    /// Upper bound accepted for a lobby's question count.
    pub max_question_count: u32,
    /// Per-question time limit applied when a lobby is created without one.
    pub default_time_limit_secs: u64,
    /// Lowest per-question time limit a host may configure.
    pub min_time_limit_secs: u64,
    /// Highest per-question time limit a host may configure.
    pub max_time_limit_secs: u64,
    /// Roster size required before a game can start.
    pub min_players_to_start: usize,
    /// Cap applied to the streak multiplier.
    pub multiplier_cap: u32,
    /// How long the reveal phase holds before advancing to the next question.
    pub reveal_hold_ms: u64,
    /// Completion rate (percent) a session must reach to enter the hall of fame.
    pub hall_of_fame_min_completion_rate: f64,
    /// How long a session with every player disconnected survives before being abandoned.
    pub abandoned_grace_secs: u64,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(path = %path.display(), "loaded configuration from file");
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            lobby_ttl_secs: 1800,
            default_question_count: 10,
            max_question_count: 50,
            default_time_limit_secs: 60,
            min_time_limit_secs: 10,
            max_time_limit_secs: 300,
            min_players_to_start: 2,
            multiplier_cap: 4,
            reveal_hold_ms: 3000,
            hall_of_fame_min_completion_rate: 100.0,
            abandoned_grace_secs: 120,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
///
/// Every field is optional; omitted fields keep their built-in default.
struct RawConfig {
    lobby_ttl_secs: Option<u64>,
    default_question_count: Option<u32>,
    max_question_count: Option<u32>,
    default_time_limit_secs: Option<u64>,
    min_time_limit_secs: Option<u64>,
    max_time_limit_secs: Option<u64>,
    min_players_to_start: Option<usize>,
    multiplier_cap: Option<u32>,
    reveal_hold_ms: Option<u64>,
    hall_of_fame_min_completion_rate: Option<f64>,
    abandoned_grace_secs: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            lobby_ttl_secs: raw.lobby_ttl_secs.unwrap_or(defaults.lobby_ttl_secs),
            default_question_count: raw
                .default_question_count
                .unwrap_or(defaults.default_question_count),
            max_question_count: raw.max_question_count.unwrap_or(defaults.max_question_count),
            default_time_limit_secs: raw
                .default_time_limit_secs
                .unwrap_or(defaults.default_time_limit_secs),
            min_time_limit_secs: raw
                .min_time_limit_secs
                .unwrap_or(defaults.min_time_limit_secs),
            max_time_limit_secs: raw
                .max_time_limit_secs
                .unwrap_or(defaults.max_time_limit_secs),
            min_players_to_start: raw
                .min_players_to_start
                .unwrap_or(defaults.min_players_to_start),
            multiplier_cap: raw.multiplier_cap.unwrap_or(defaults.multiplier_cap),
            reveal_hold_ms: raw.reveal_hold_ms.unwrap_or(defaults.reveal_hold_ms),
            hall_of_fame_min_completion_rate: raw
                .hall_of_fame_min_completion_rate
                .unwrap_or(defaults.hall_of_fame_min_completion_rate),
            abandoned_grace_secs: raw
                .abandoned_grace_secs
                .unwrap_or(defaults.abandoned_grace_secs),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
