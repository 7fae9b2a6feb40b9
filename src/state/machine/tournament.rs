//! Host-paced synchronous tournament:
//! `WAITING -> COUNTDOWN -> IN_PROGRESS -> SHOWING_RESULTS -> ... -> COMPLETED`.
//!
//! The host drives start, round close, and round advance; the countdown
//! expiry may be observed and applied by any participant's poll. All timing
//! guards read the phase anchor, so racing writers either converge on the
//! same next document or are rejected against the fresher snapshot.

use uuid::Uuid;

use crate::dao::models::{
    ANSWER_PENDING, RoundAnswerEntity, RoundOutcomeEntity, SessionEntity, SessionKind,
    SessionStatus,
};
use crate::state::clock::ClockAnchor;
use crate::state::machine::{GuardRejection, MIN_PARTICIPANTS, TransitionResult};
use crate::state::scoring;

fn ensure_kind(session: &SessionEntity) -> Result<(), GuardRejection> {
    if session.kind != SessionKind::Tournament {
        return Err(GuardRejection::WrongKind);
    }
    Ok(())
}

/// `WAITING -> COUNTDOWN`. Host only, at least two players. Resets every
/// participant's answer state and re-anchors the phase.
pub fn start(mut session: SessionEntity, actor: Uuid, now_ms: u64) -> TransitionResult {
    ensure_kind(&session)?;
    if session.status != SessionStatus::Waiting {
        return Err(GuardRejection::InvalidPhase);
    }
    if !session.is_host(actor) {
        return Err(GuardRejection::NotHost);
    }
    if session.participants.len() < MIN_PARTICIPANTS {
        return Err(GuardRejection::NotEnoughParticipants);
    }

    session.status = SessionStatus::Countdown;
    session.current_question_index = Some(0);
    session.phase_started_at_ms = now_ms;
    session.reset_round_answers();
    Ok(session)
}

/// `COUNTDOWN -> IN_PROGRESS`, time-gated. Any participant's poll may observe
/// the expiry and apply this; a racing writer whose fetch already sees
/// `IN_PROGRESS` is rejected here and abandons.
pub fn begin_question(mut session: SessionEntity, now_ms: u64, countdown_ms: u64) -> TransitionResult {
    ensure_kind(&session)?;
    if session.status != SessionStatus::Countdown {
        return Err(GuardRejection::InvalidPhase);
    }
    if !ClockAnchor::new(session.phase_started_at_ms).expired(countdown_ms, now_ms) {
        return Err(GuardRejection::PhaseStillRunning);
    }

    session.status = SessionStatus::InProgress;
    session.phase_started_at_ms = now_ms;
    Ok(session)
}

/// Record a participant's answer for the current round. First answer wins;
/// the latency is measured against the phase anchor, never taken from the
/// client. Late answers and answers pinned to an already-closed round are
/// dropped.
pub fn submit_answer(
    mut session: SessionEntity,
    actor: Uuid,
    question_index: usize,
    option_index: usize,
    now_ms: u64,
) -> TransitionResult {
    ensure_kind(&session)?;
    if session.status != SessionStatus::InProgress {
        return Err(GuardRejection::InvalidPhase);
    }
    if session.current_question_index != Some(question_index) {
        return Err(GuardRejection::InvalidPhase);
    }

    let anchor = ClockAnchor::new(session.phase_started_at_ms);
    if anchor.expired(session.time_per_question_ms, now_ms) {
        return Err(GuardRejection::InvalidPhase);
    }

    let participant = session
        .participants
        .get_mut(&actor)
        .ok_or(GuardRejection::UnknownParticipant)?;
    if participant.current_answer_index != ANSWER_PENDING {
        return Err(GuardRejection::AlreadyAnswered);
    }

    participant.current_answer_index = option_index as i32;
    participant.answer_latency_ms = Some(anchor.elapsed_ms(now_ms));
    Ok(session)
}

/// `IN_PROGRESS -> SHOWING_RESULTS` once the round timer runs out. Host only.
/// Applies the scoring policy exactly once per round: the results log is
/// checked for the round index before appending, so duplicate host triggers
/// are rejected instead of double-scoring.
pub fn close_question(mut session: SessionEntity, actor: Uuid, now_ms: u64) -> TransitionResult {
    ensure_kind(&session)?;
    if session.status != SessionStatus::InProgress {
        return Err(GuardRejection::InvalidPhase);
    }
    if !session.is_host(actor) {
        return Err(GuardRejection::NotHost);
    }
    let round = session
        .current_question_index
        .ok_or(GuardRejection::InvalidPhase)?;
    if !ClockAnchor::new(session.phase_started_at_ms).expired(session.time_per_question_ms, now_ms)
    {
        return Err(GuardRejection::PhaseStillRunning);
    }
    if session.round_resolved(round) {
        return Err(GuardRejection::AlreadyResolved);
    }

    let correct_option = session.questions[round].correct_option;
    let window_ms = session.time_per_question_ms;

    let mut answers = Vec::with_capacity(session.participants.len());
    for (id, participant) in session.participants.iter_mut() {
        let awarded = scoring::timed_answer_award(
            participant.current_answer_index,
            correct_option,
            participant.answer_latency_ms,
            window_ms,
        );
        participant.score += awarded;
        answers.push(RoundAnswerEntity {
            participant: *id,
            option_index: participant.current_answer_index,
            latency_ms: participant.answer_latency_ms,
            awarded,
        });
    }

    session.results_log.push(RoundOutcomeEntity {
        question_index: round,
        correct_option,
        answers,
    });
    session.status = SessionStatus::ShowingResults;
    session.phase_started_at_ms = now_ms;
    Ok(session)
}

/// `SHOWING_RESULTS -> IN_PROGRESS` (next round) or `-> COMPLETED` after the
/// fixed results-display window. Host only. Advancing resets answer state for
/// the new round; this is the single writer allowed to do so.
pub fn advance(
    mut session: SessionEntity,
    actor: Uuid,
    now_ms: u64,
    results_display_ms: u64,
) -> TransitionResult {
    ensure_kind(&session)?;
    if session.status != SessionStatus::ShowingResults {
        return Err(GuardRejection::InvalidPhase);
    }
    if !session.is_host(actor) {
        return Err(GuardRejection::NotHost);
    }
    if !ClockAnchor::new(session.phase_started_at_ms).expired(results_display_ms, now_ms) {
        return Err(GuardRejection::PhaseStillRunning);
    }
    let round = session
        .current_question_index
        .ok_or(GuardRejection::InvalidPhase)?;

    if round + 1 >= session.questions.len() {
        session.status = SessionStatus::Completed;
    } else {
        session.current_question_index = Some(round + 1);
        session.status = SessionStatus::InProgress;
        session.phase_started_at_ms = now_ms;
        session.reset_round_answers();
    }
    Ok(session)
}
