use std::time::SystemTime;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Sentinel stored in [`ParticipantEntity::current_answer_index`] while a
/// participant has not answered the current round.
pub const ANSWER_PENDING: i32 = -1;

/// Length of the human-shareable join code.
pub const JOIN_CODE_LENGTH: usize = 6;

/// Match variants supported by the synchronization engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionKind {
    /// Asynchronous 1v1: both players run the question list independently and
    /// are reconciled when the second one completes.
    Duel,
    /// Free-running race: everyone plays at their own pace, ranked at the end.
    Room,
    /// Host-paced synchronous match with per-question timers.
    Tournament,
}

impl SessionKind {
    /// Participant capacity for this kind. Rooms take their limit from the
    /// application configuration; duels and tournaments are fixed.
    pub fn capacity(self, room_capacity: usize) -> usize {
        match self {
            SessionKind::Duel => 2,
            SessionKind::Room => room_capacity,
            SessionKind::Tournament => 3,
        }
    }
}

/// Phase of a session document. The per-kind state machines restrict which
/// variants are legal for which kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    /// Lobby phase: participants may still join (tournament, room).
    Waiting,
    /// Fixed pre-game countdown anchored to `phase_started_at_ms` (tournament).
    Countdown,
    /// A question window (tournament) or the running race (room).
    InProgress,
    /// Per-round results display between questions (tournament).
    ShowingResults,
    /// Independent-progress play; duels stay here until both players finish.
    Active,
    /// Terminal. The document is read-only history from here on.
    Completed,
}

impl SessionStatus {
    /// Whether the session reached its terminal phase.
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Completed)
    }

    /// Whether new participants may still be appended in this phase.
    /// Capacity is checked separately against [`SessionKind::capacity`].
    pub fn accepts_joins(self) -> bool {
        matches!(self, SessionStatus::Waiting | SessionStatus::Active)
    }
}

/// One question baked into a session at creation time. Option order is
/// shuffled exactly once when the session is created so every participant
/// sees the same order; `correct_option` is the post-shuffle index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionEntity {
    /// Question text shown to participants.
    pub prompt: String,
    /// Answer options in their baked-in display order.
    pub options: Vec<String>,
    /// Index of the correct entry in `options`.
    pub correct_option: usize,
}

/// Per-player state tracked inside a session document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParticipantEntity {
    /// Display name chosen at join time.
    pub name: String,
    /// Accumulated score; never decreases within a session.
    pub score: u32,
    /// Whether this player completed the whole question list (duel, room).
    pub finished: bool,
    /// Answer chosen for the current tournament round, or
    /// [`ANSWER_PENDING`] while unanswered.
    pub current_answer_index: i32,
    /// Milliseconds between the round anchor and this player's answer.
    pub answer_latency_ms: Option<u64>,
    /// Total play time in milliseconds, recorded once at completion.
    pub completion_time_ms: Option<u64>,
    /// Number of questions already answered in independent-progress kinds.
    pub progress: usize,
    /// When this participant joined, against the engine clock.
    pub joined_at_ms: u64,
}

impl ParticipantEntity {
    /// Fresh per-player record for a participant joining at `joined_at_ms`.
    pub fn new(name: String, joined_at_ms: u64) -> Self {
        Self {
            name,
            score: 0,
            finished: false,
            current_answer_index: ANSWER_PENDING,
            answer_latency_ms: None,
            completion_time_ms: None,
            progress: 0,
            joined_at_ms,
        }
    }
}

/// One participant's answer inside a resolved tournament round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundAnswerEntity {
    /// Participant the answer belongs to.
    pub participant: Uuid,
    /// Chosen option, or [`ANSWER_PENDING`] if the round timed out unanswered.
    pub option_index: i32,
    /// Latency from the round anchor, absent when unanswered.
    pub latency_ms: Option<u64>,
    /// Points awarded for this answer.
    pub awarded: u32,
}

/// Snapshot of a resolved tournament round, appended to the results log
/// exactly once per round. Used for post-hoc scoring audit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundOutcomeEntity {
    /// Which question the round played.
    pub question_index: usize,
    /// The correct option for that question.
    pub correct_option: usize,
    /// Every participant's answer and award for the round.
    pub answers: Vec<RoundAnswerEntity>,
}

/// The shared mutable document representing one match. Every mutation is a
/// full-document read-modify-write; there is no partial-field update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionEntity {
    /// Primary key of the session.
    pub id: Uuid,
    /// Human-shareable join code, unique among currently-joinable documents.
    pub code: String,
    /// Which match variant this document drives.
    pub kind: SessionKind,
    /// Current phase.
    pub status: SessionStatus,
    /// Ordered question list, immutable once set.
    pub questions: Vec<QuestionEntity>,
    /// Join-ordered participant records, append-only until terminal.
    pub participants: IndexMap<Uuid, ParticipantEntity>,
    /// Round currently being played (tournament only).
    pub current_question_index: Option<usize>,
    /// Engine-observed timestamp anchoring the current phase. The only
    /// timing value trusted for countdowns and windows.
    pub phase_started_at_ms: u64,
    /// Round window for tournament questions, fixed at creation.
    pub time_per_question_ms: u64,
    /// Append-only per-round outcome snapshots (tournament only).
    pub results_log: Vec<RoundOutcomeEntity>,
    /// Participant allowed to drive host-gated transitions (tournament).
    pub host: Option<Uuid>,
    /// Winner once a duel completes; `None` for a tie or while undecided.
    pub winner: Option<Uuid>,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
    /// Last time the session document was written.
    pub updated_at: SystemTime,
}

impl SessionEntity {
    /// Look up a participant record by identity.
    pub fn participant(&self, id: Uuid) -> Option<&ParticipantEntity> {
        self.participants.get(&id)
    }

    /// Whether `id` holds host authority over this session.
    pub fn is_host(&self, id: Uuid) -> bool {
        self.host == Some(id)
    }

    /// Whether every participant has completed the question list.
    pub fn all_finished(&self) -> bool {
        !self.participants.is_empty() && self.participants.values().all(|p| p.finished)
    }

    /// Whether the results log already contains an entry for `round`.
    pub fn round_resolved(&self, round: usize) -> bool {
        self.results_log.iter().any(|o| o.question_index == round)
    }

    /// Clear every participant's transient answer state for a new round.
    /// Called by exactly one writer per round transition.
    pub fn reset_round_answers(&mut self) {
        for participant in self.participants.values_mut() {
            participant.current_answer_index = ANSWER_PENDING;
            participant.answer_latency_ms = None;
        }
    }
}
