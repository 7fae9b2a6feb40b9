//! Asynchronous 1v1 duel: `ACTIVE -> COMPLETED`.
//!
//! Both players walk the shared question list independently; only answer,
//! score, and finished fields are written back per question. The terminal
//! status and winner are decided only by a finished player that re-reads the
//! document and sees its opponent finished too. If both finish inside the
//! same poll window, both may attempt the terminal write; the winner is a
//! pure function of the two final scores, so the write order cannot change
//! the outcome.

use uuid::Uuid;

use crate::dao::models::{SessionEntity, SessionKind, SessionStatus};
use crate::state::machine::{GuardRejection, TransitionResult};
use crate::state::scoring;

fn ensure_kind(session: &SessionEntity) -> Result<(), GuardRejection> {
    if session.kind != SessionKind::Duel {
        return Err(GuardRejection::WrongKind);
    }
    Ok(())
}

/// Record one player's answer to their next question. Progress writes must
/// arrive in question order; answering the final question marks the player
/// finished and stamps their completion time.
pub fn record_answer(
    mut session: SessionEntity,
    actor: Uuid,
    question_index: usize,
    option_index: usize,
    now_ms: u64,
) -> TransitionResult {
    ensure_kind(&session)?;
    if session.status != SessionStatus::Active {
        return Err(GuardRejection::InvalidPhase);
    }

    let question_count = session.questions.len();
    let correct_option = session
        .questions
        .get(question_index)
        .map(|q| q.correct_option)
        .ok_or(GuardRejection::OutOfTurn)?;

    let participant = session
        .participants
        .get_mut(&actor)
        .ok_or(GuardRejection::UnknownParticipant)?;
    if participant.finished {
        return Err(GuardRejection::AlreadyFinished);
    }
    if question_index != participant.progress {
        return Err(GuardRejection::OutOfTurn);
    }

    participant.score += scoring::progress_award(option_index as i32, correct_option);
    participant.progress += 1;
    if participant.progress == question_count {
        participant.finished = true;
        participant.completion_time_ms = Some(now_ms.saturating_sub(participant.joined_at_ms));
    }
    Ok(session)
}

/// Decide and persist the terminal status and winner. Guarded so that only a
/// finished player whose fresh snapshot shows the opponent finished as well
/// may apply it; everyone else abandons and keeps polling.
pub fn finalize(mut session: SessionEntity, actor: Uuid) -> TransitionResult {
    ensure_kind(&session)?;
    if session.status != SessionStatus::Active {
        return Err(GuardRejection::InvalidPhase);
    }

    let finisher = session
        .participant(actor)
        .ok_or(GuardRejection::UnknownParticipant)?;
    if !finisher.finished {
        return Err(GuardRejection::InvalidPhase);
    }
    if session.participants.len() < 2 || !session.all_finished() {
        return Err(GuardRejection::PhaseStillRunning);
    }

    session.winner = scoring::duel_winner(&session.participants);
    session.status = SessionStatus::Completed;
    Ok(session)
}
