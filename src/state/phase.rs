use thiserror::Error;

/// Phases an active game session moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Session created; counters zeroed, first question not yet served.
    Starting,
    /// A question is live and answers are being collected.
    QuestionActive,
    /// The correct answer and per-player deltas are being shown.
    QuestionReveal,
    /// All questions served; final results computed.
    Finished,
}

impl SessionPhase {
    /// Wire name of the phase, used in broadcast payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Starting => "starting",
            SessionPhase::QuestionActive => "question_active",
            SessionPhase::QuestionReveal => "question_reveal",
            SessionPhase::Finished => "finished",
        }
    }
}

/// Events that can be applied to the session phase machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Serve the first question after session start.
    BeginQuestion,
    /// Every connected player has answered the live question.
    AllAnswered,
    /// The server-side question deadline elapsed.
    DeadlineReached,
    /// Reveal hold is over and more questions remain.
    AdvanceQuestion,
    /// Reveal hold is over and the question sequence is exhausted.
    FinishSession,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the machine was in when the invalid event was received.
    pub from: SessionPhase,
    /// The event that cannot be applied from this phase.
    pub event: SessionEvent,
}

/// Phase machine guarding the per-session gameplay flow.
///
/// The deadline/all-answered race is resolved here: whichever event is applied
/// first wins the transition to reveal, and the loser surfaces as an
/// [`InvalidTransition`] instead of corrupting already-computed reveal state.
#[derive(Debug, Clone)]
pub struct SessionStateMachine {
    phase: SessionPhase,
    version: usize,
}

impl Default for SessionStateMachine {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Starting,
            version: 0,
        }
    }
}

impl SessionStateMachine {
    /// Create a new machine initialised in the starting phase.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Number of transitions applied so far.
    pub fn version(&self) -> usize {
        self.version
    }

    /// Apply an event, moving the machine to the next phase.
    pub fn apply(&mut self, event: SessionEvent) -> Result<SessionPhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (SessionPhase::Starting, SessionEvent::BeginQuestion) => SessionPhase::QuestionActive,
            (SessionPhase::QuestionActive, SessionEvent::AllAnswered) => {
                SessionPhase::QuestionReveal
            }
            (SessionPhase::QuestionActive, SessionEvent::DeadlineReached) => {
                SessionPhase::QuestionReveal
            }
            (SessionPhase::QuestionReveal, SessionEvent::AdvanceQuestion) => {
                SessionPhase::QuestionActive
            }
            (SessionPhase::QuestionReveal, SessionEvent::FinishSession) => SessionPhase::Finished,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        self.phase = next;
        self.version += 1;
        Ok(next)
    }
}
