//! Per-kind transition tables and guard conditions.
//!
//! Every transition is a pure function over a freshly fetched session
//! document: it either returns the fully recomputed next document or a
//! [`GuardRejection`]. Rejections are the normal vocabulary of concurrent
//! polling (another writer got there first, or the action arrived for a
//! phase that no longer accepts it) and are abandoned silently by the
//! reconciliation layer, never retried and never surfaced as hard errors.

pub mod duel;
pub mod room;
pub mod tournament;

use thiserror::Error;

use crate::dao::models::SessionEntity;

/// Minimum participants before a tournament or room may start.
pub const MIN_PARTICIPANTS: usize = 2;

/// Why a guard refused to apply a transition against the latest snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GuardRejection {
    /// The operation belongs to a different session kind.
    #[error("operation does not apply to this session kind")]
    WrongKind,
    /// The current phase does not accept this action.
    #[error("session phase does not accept this action")]
    InvalidPhase,
    /// A host-gated transition was attempted by a non-host.
    #[error("only the host may drive this transition")]
    NotHost,
    /// The actor is not a participant of this session.
    #[error("actor is not a participant of this session")]
    UnknownParticipant,
    /// Starting requires more players than have joined.
    #[error("not enough participants to start")]
    NotEnoughParticipants,
    /// A time-gated transition fired before its window ran out.
    #[error("current phase has not run out yet")]
    PhaseStillRunning,
    /// First answer for a round wins; later attempts are dropped.
    #[error("participant already answered this round")]
    AlreadyAnswered,
    /// The round's outcome is already in the results log.
    #[error("round already resolved")]
    AlreadyResolved,
    /// Independent-progress writes must arrive in question order.
    #[error("progress write out of question order")]
    OutOfTurn,
    /// The participant already completed the question list.
    #[error("participant already finished")]
    AlreadyFinished,
}

/// Either the fully recomputed next document or the rejection that stops it.
pub type TransitionResult = Result<SessionEntity, GuardRejection>;

#[cfg(test)]
pub(crate) mod fixtures {
    use std::time::SystemTime;

    use indexmap::IndexMap;
    use uuid::Uuid;

    use crate::dao::models::{
        ParticipantEntity, QuestionEntity, SessionEntity, SessionKind, SessionStatus,
    };

    /// Build a session with `players` participants and `questions` questions,
    /// correct option always index 1. Returns the document plus participant
    /// ids in join order; the first participant hosts tournaments.
    pub fn session(
        kind: SessionKind,
        players: usize,
        questions: usize,
    ) -> (SessionEntity, Vec<Uuid>) {
        let ids: Vec<Uuid> = (0..players).map(|_| Uuid::new_v4()).collect();
        let participants: IndexMap<Uuid, ParticipantEntity> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, ParticipantEntity::new(format!("player-{i}"), 1_000)))
            .collect();

        let status = match kind {
            SessionKind::Duel => SessionStatus::Active,
            SessionKind::Room | SessionKind::Tournament => SessionStatus::Waiting,
        };

        let entity = SessionEntity {
            id: Uuid::new_v4(),
            code: "TEST01".into(),
            kind,
            status,
            questions: (0..questions)
                .map(|i| QuestionEntity {
                    prompt: format!("question {i}"),
                    options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                    correct_option: 1,
                })
                .collect(),
            participants,
            current_question_index: None,
            phase_started_at_ms: 1_000,
            time_per_question_ms: 30_000,
            results_log: Vec::new(),
            host: (kind == SessionKind::Tournament).then(|| ids[0]),
            winner: None,
            created_at: SystemTime::now(),
            updated_at: SystemTime::now(),
        };

        (entity, ids)
    }
}
