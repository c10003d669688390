use std::time::{Duration, Instant, SystemTime};

use indexmap::IndexMap;
use uuid::Uuid;

use crate::{
    error::ServiceError,
    state::{
        lobby::LobbySettings,
        phase::{SessionEvent, SessionPhase, SessionStateMachine},
    },
};

/// A single quiz question served during a session.
#[derive(Debug, Clone)]
pub struct Question {
    /// Stable identifier of the question.
    pub id: Uuid,
    /// Question set this question belongs to.
    pub question_set_id: Uuid,
    /// Text shown to players.
    pub prompt: String,
    /// Answer options in display order.
    pub options: Vec<String>,
    /// Index into `options` of the designated correct answer.
    pub correct_index: usize,
}

/// Lifecycle states of a persisted game session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// The session is running.
    InProgress,
    /// The session finished normally.
    Completed,
    /// Every player disconnected and the grace period elapsed.
    Abandoned,
}

impl SessionStatus {
    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Completed => "completed",
            SessionStatus::Abandoned => "abandoned",
        }
    }
}

/// Persisted record of one playthrough started from a lobby.
#[derive(Debug, Clone)]
pub struct GameSession {
    /// Primary key of the session.
    pub id: Uuid,
    /// Code of the lobby this session started from (back-reference).
    pub lobby_code: String,
    /// Host at the moment the game started.
    pub host_id: Uuid,
    /// Question sets the question sequence was drawn from.
    pub question_set_ids: Vec<Uuid>,
    /// Current lifecycle status.
    pub status: SessionStatus,
    /// Moment the game started.
    pub started_at: SystemTime,
    /// Moment the game finished, if it has.
    pub completed_at: Option<SystemTime>,
    /// Settings snapshot copied from the lobby at start; immutable thereafter.
    pub settings: LobbySettings,
    /// Number of questions served; fixed at creation.
    pub total_questions: u32,
    /// Sum of all player scores, filled at completion.
    pub total_score: i64,
    /// Sum of all correct answers across players, filled at completion.
    pub correct_answers: u32,
}

impl GameSession {
    /// Build a new in-progress session snapshotting the lobby's settings.
    pub fn new(
        lobby_code: String,
        host_id: Uuid,
        settings: LobbySettings,
        total_questions: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            lobby_code,
            host_id,
            question_set_ids: settings.question_set_ids.clone(),
            status: SessionStatus::InProgress,
            started_at: SystemTime::now(),
            completed_at: None,
            settings,
            total_questions,
            total_score: 0,
            correct_answers: 0,
        }
    }
}

/// The answer a player recorded for the current question.
#[derive(Debug, Clone)]
pub struct RecordedAnswer {
    /// Raw answer text as submitted.
    pub answer: String,
    /// Server-measured time from question start to submission.
    pub elapsed: Duration,
    /// Whether the submission arrived after the deadline. Late answers are
    /// kept for display but scored as incorrect.
    pub late: bool,
}

/// Per-player tally kept for the duration of a session.
#[derive(Debug, Clone)]
pub struct PlayerTally {
    /// Accumulated score.
    pub score: i64,
    /// Multiplier applied to the next correct answer.
    pub multiplier: u32,
    /// Current run of consecutive correct answers.
    pub streak: u32,
    /// Number of questions answered correctly.
    pub correct_answers: u32,
    /// Highest multiplier reached during the session.
    pub max_multiplier: u32,
}

impl PlayerTally {
    fn new() -> Self {
        Self {
            score: 0,
            multiplier: 1,
            streak: 0,
            correct_answers: 0,
            max_multiplier: 1,
        }
    }
}

/// Ephemeral, server-held runtime state of an active session.
///
/// All per-player maps are keyed by username and hold one entry per player at
/// session start. `answers` covers the current question only and is cleared on
/// advance.
#[derive(Debug)]
pub struct GameState {
    machine: SessionStateMachine,
    /// 0-based index of the question currently live or being revealed.
    pub current_question_index: usize,
    /// Number of questions the session serves.
    pub total_questions: usize,
    /// Running tallies per player, in roster order.
    pub tallies: IndexMap<String, PlayerTally>,
    /// First-wins answers for the current question.
    pub answers: IndexMap<String, RecordedAnswer>,
    /// Monotonic start of the live question window.
    pub question_started_at: Option<Instant>,
    /// Monotonic deadline of the live question window.
    pub question_deadline: Option<Instant>,
    /// Wall-clock start of the live question window, for wire payloads.
    pub question_started_wall: Option<SystemTime>,
}

impl GameState {
    /// Initialise runtime state with zeroed counters for every player.
    pub fn new<'a>(usernames: impl IntoIterator<Item = &'a str>, total_questions: usize) -> Self {
        let tallies = usernames
            .into_iter()
            .map(|name| (name.to_string(), PlayerTally::new()))
            .collect();

        Self {
            machine: SessionStateMachine::new(),
            current_question_index: 0,
            total_questions,
            tallies,
            answers: IndexMap::new(),
            question_started_at: None,
            question_deadline: None,
            question_started_wall: None,
        }
    }

    /// Current phase of the session.
    pub fn phase(&self) -> SessionPhase {
        self.machine.phase()
    }

    /// Apply a phase transition event.
    pub fn apply(&mut self, event: SessionEvent) -> Result<SessionPhase, ServiceError> {
        self.machine
            .apply(event)
            .map_err(|err| ServiceError::InvalidState(err.to_string()))
    }

    /// Open the answer window for question `index`, clearing previous answers.
    pub fn open_question(&mut self, index: usize, time_limit: Duration) {
        let now = Instant::now();
        self.current_question_index = index;
        self.answers.clear();
        self.question_started_at = Some(now);
        self.question_deadline = Some(now + time_limit);
        self.question_started_wall = Some(SystemTime::now());
    }

    /// Record a player's answer for the current question.
    ///
    /// First submission wins; a second submission for the same question is
    /// rejected without overwriting the recorded answer. Submissions after the
    /// deadline are kept but flagged late.
    pub fn record_answer(&mut self, username: &str, answer: String) -> Result<(), ServiceError> {
        if self.phase() != SessionPhase::QuestionActive {
            return Err(ServiceError::TooLate(
                "question is no longer accepting answers".into(),
            ));
        }
        if !self.tallies.contains_key(username) {
            return Err(ServiceError::NotFound(format!(
                "player `{username}` is not part of this session"
            )));
        }
        if self.answers.contains_key(username) {
            return Err(ServiceError::Conflict(format!(
                "player `{username}` already answered this question"
            )));
        }

        let now = Instant::now();
        let started = self
            .question_started_at
            .ok_or_else(|| ServiceError::InvalidState("no question window is open".into()))?;
        let late = self.question_deadline.is_some_and(|deadline| now > deadline);

        self.answers.insert(
            username.to_string(),
            RecordedAnswer {
                answer,
                elapsed: now.duration_since(started),
                late,
            },
        );

        Ok(())
    }

    /// Whether every player in `connected` has an answer recorded.
    ///
    /// An empty `connected` slice never satisfies the early-advance condition;
    /// the deadline handles fully-disconnected rosters.
    pub fn all_answered(&self, connected: &[String]) -> bool {
        !connected.is_empty()
            && connected
                .iter()
                .all(|username| self.answers.contains_key(username))
    }

    /// Remaining whole seconds of the live question window at `now`.
    pub fn remaining_secs(&self, now: Instant) -> u64 {
        self.question_deadline
            .map(|deadline| deadline.saturating_duration_since(now).as_secs())
            .unwrap_or(0)
    }
}
