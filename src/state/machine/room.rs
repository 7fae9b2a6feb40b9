//! Free-running room race: `WAITING -> IN_PROGRESS -> COMPLETED`.
//!
//! There is no host and no shared timer: any participant may open the race,
//! everyone plays at their own pace, and each player writes score, finished
//! flag, and completion time exactly once. The terminal transition is a pure
//! function of already-committed state ("everyone finished"), so whichever
//! completion write makes it true applies it, and duplicate evaluation is
//! harmless.

use uuid::Uuid;

use crate::dao::models::{SessionEntity, SessionKind, SessionStatus};
use crate::state::clock::ClockAnchor;
use crate::state::machine::{GuardRejection, MIN_PARTICIPANTS, TransitionResult};
use crate::state::scoring;

fn ensure_kind(session: &SessionEntity) -> Result<(), GuardRejection> {
    if session.kind != SessionKind::Room {
        return Err(GuardRejection::WrongKind);
    }
    Ok(())
}

/// `WAITING -> IN_PROGRESS`. Any participant may open the race once at least
/// two players are in; the anchor records the shared race start.
pub fn start(mut session: SessionEntity, actor: Uuid, now_ms: u64) -> TransitionResult {
    ensure_kind(&session)?;
    if session.status != SessionStatus::Waiting {
        return Err(GuardRejection::InvalidPhase);
    }
    if session.participant(actor).is_none() {
        return Err(GuardRejection::UnknownParticipant);
    }
    if session.participants.len() < MIN_PARTICIPANTS {
        return Err(GuardRejection::NotEnoughParticipants);
    }

    session.status = SessionStatus::InProgress;
    session.phase_started_at_ms = now_ms;
    Ok(session)
}

/// Record one player's single completion write: their answers are scored
/// (+1 per correct), the finished flag set, and the completion time measured
/// from the race start. Completes the session when this write makes
/// "everyone finished" true.
pub fn report_completion(
    mut session: SessionEntity,
    actor: Uuid,
    answers: &[i32],
    now_ms: u64,
) -> TransitionResult {
    ensure_kind(&session)?;
    if session.status != SessionStatus::InProgress {
        return Err(GuardRejection::InvalidPhase);
    }

    let score: u32 = session
        .questions
        .iter()
        .zip(answers)
        .map(|(question, answer)| scoring::progress_award(*answer, question.correct_option))
        .sum();
    let answered = answers.len().min(session.questions.len());
    let elapsed = ClockAnchor::new(session.phase_started_at_ms).elapsed_ms(now_ms);

    let participant = session
        .participants
        .get_mut(&actor)
        .ok_or(GuardRejection::UnknownParticipant)?;
    if participant.finished {
        return Err(GuardRejection::AlreadyFinished);
    }

    participant.score += score;
    participant.progress = answered;
    participant.finished = true;
    participant.completion_time_ms = Some(elapsed);

    if session.all_finished() {
        session.status = SessionStatus::Completed;
    }
    Ok(session)
}
