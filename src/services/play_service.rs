//! Participant-driven play operations: starting a match, tournament round
//! answers, duel progress writes, and room completion reports. Every one is
//! a reconciliation-protocol application of a pure machine transition;
//! guard failures come back as `applied: false`, not as errors.

use tracing::info;

use crate::{
    dao::models::{ANSWER_PENDING, SessionEntity, SessionKind},
    dto::play::{AnswerRequest, CompletionRequest, PlayOutcome, ProgressRequest, StartRequest},
    error::ServiceError,
    services::{
        reconcile::{self, Outcome},
        session_service,
    },
    state::{SharedState, machine},
};

/// Start a tournament (host only) or open a room race (any participant).
/// Duels need no start: they are active from creation.
pub async fn start_session(
    state: &SharedState,
    code: &str,
    request: StartRequest,
) -> Result<PlayOutcome, ServiceError> {
    let store = state.require_session_store().await?;
    let session = session_service::fetch_by_code(&store, code).await?;
    let now_ms = state.now_ms();
    let actor = request.participant_id;

    let outcome = match session.kind {
        SessionKind::Tournament => {
            reconcile::apply(&store, session.id, |doc| {
                machine::tournament::start(doc, actor, now_ms)
            })
            .await?
        }
        SessionKind::Room => {
            reconcile::apply(&store, session.id, |doc| machine::room::start(doc, actor, now_ms))
                .await?
        }
        SessionKind::Duel => {
            return Err(ServiceError::InvalidState(
                "duels are active as soon as they are created".into(),
            ));
        }
    };

    if outcome.applied().is_some() {
        info!(code = %code, kind = ?session.kind, "session started");
    }
    Ok(into_play_outcome(outcome, None))
}

/// Record a tournament round answer. The engine measures the latency from
/// the phase anchor; the first answer per round wins.
pub async fn submit_answer(
    state: &SharedState,
    code: &str,
    request: AnswerRequest,
) -> Result<PlayOutcome, ServiceError> {
    let store = state.require_session_store().await?;
    let session = session_service::fetch_by_code(&store, code).await?;
    ensure_option_in_range(&session, request.question_index, request.option_index as i32)?;
    let now_ms = state.now_ms();

    let outcome = reconcile::apply(&store, session.id, |doc| {
        machine::tournament::submit_answer(
            doc,
            request.participant_id,
            request.question_index,
            request.option_index,
            now_ms,
        )
    })
    .await?;

    Ok(into_play_outcome(outcome, None))
}

/// Record a duel per-question progress write. When the write completes the
/// player's list, the same request re-reads the document and, only if the
/// opponent is finished too, decides and persists the terminal status and
/// winner; otherwise the player keeps polling for the opponent.
pub async fn record_progress(
    state: &SharedState,
    code: &str,
    request: ProgressRequest,
) -> Result<PlayOutcome, ServiceError> {
    let store = state.require_session_store().await?;
    let session = session_service::fetch_by_code(&store, code).await?;
    ensure_option_in_range(&session, request.question_index, request.option_index as i32)?;
    let now_ms = state.now_ms();
    let actor = request.participant_id;

    let correct = session.questions[request.question_index].correct_option == request.option_index;

    let outcome = reconcile::apply(&store, session.id, |doc| {
        machine::duel::record_answer(doc, actor, request.question_index, request.option_index, now_ms)
    })
    .await?;

    let just_finished = outcome
        .applied()
        .and_then(|doc| doc.participant(actor))
        .is_some_and(|p| p.finished);

    if just_finished {
        let decided =
            reconcile::apply(&store, session.id, |doc| machine::duel::finalize(doc, actor)).await?;
        if let Outcome::Applied(done) = decided {
            info!(code = %code, winner = ?done.winner, "duel completed");
            return Ok(PlayOutcome {
                applied: true,
                rejection: None,
                correct: Some(correct),
                session: (&done).into(),
            });
        }
    }

    Ok(into_play_outcome(outcome, Some(correct)))
}

/// Record a room player's single completion write. Completing the last
/// outstanding player also closes the race; duplicate evaluation of the
/// "everyone finished" guard is harmless.
pub async fn report_completion(
    state: &SharedState,
    code: &str,
    request: CompletionRequest,
) -> Result<PlayOutcome, ServiceError> {
    let store = state.require_session_store().await?;
    let session = session_service::fetch_by_code(&store, code).await?;

    if request.answers.len() != session.questions.len() {
        return Err(ServiceError::InvalidInput(format!(
            "expected {} answers, got {}",
            session.questions.len(),
            request.answers.len()
        )));
    }
    for (index, answer) in request.answers.iter().enumerate() {
        if *answer != ANSWER_PENDING {
            ensure_option_in_range(&session, index, *answer)?;
        }
    }

    let now_ms = state.now_ms();
    let actor = request.participant_id;
    let answers = request.answers;

    let outcome = reconcile::apply(&store, session.id, move |doc| {
        machine::room::report_completion(doc, actor, &answers, now_ms)
    })
    .await?;

    if let Some(done) = outcome.applied().filter(|doc| doc.status.is_terminal()) {
        info!(code = %code, players = done.participants.len(), "room race completed");
    }
    Ok(into_play_outcome(outcome, None))
}

fn ensure_option_in_range(
    session: &SessionEntity,
    question_index: usize,
    option_index: i32,
) -> Result<(), ServiceError> {
    let Some(question) = session.questions.get(question_index) else {
        return Err(ServiceError::InvalidInput(format!(
            "question index {question_index} out of range"
        )));
    };
    if option_index < 0 || option_index as usize >= question.options.len() {
        return Err(ServiceError::InvalidInput(format!(
            "option index {option_index} out of range for question {question_index}"
        )));
    }
    Ok(())
}

fn into_play_outcome(outcome: Outcome, correct: Option<bool>) -> PlayOutcome {
    match outcome {
        Outcome::Applied(session) => PlayOutcome {
            applied: true,
            rejection: None,
            correct,
            session: (&session).into(),
        },
        Outcome::Abandoned { rejection, latest } => PlayOutcome {
            applied: false,
            rejection: Some(rejection.to_string()),
            correct: None,
            session: (&latest).into(),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{models::SessionStatus, session_store::memory::MemorySessionStore},
        dto::session::{CreateSessionRequest, JoinSessionRequest, QuestionInput},
        services::{poll_service, session_service},
        state::{AppState, clock::testing::ManualClock},
    };

    const T0: u64 = 1_000_000;

    async fn setup() -> (crate::state::SharedState, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::at(T0));
        let state = AppState::with_clock(AppConfig::default(), clock.clone());
        state
            .install_session_store(Arc::new(MemorySessionStore::new()))
            .await;
        (state, clock)
    }

    fn question(prompt: &str) -> QuestionInput {
        QuestionInput {
            prompt: prompt.into(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_index: 0,
        }
    }

    fn create_request(kind: SessionKind, questions: usize) -> CreateSessionRequest {
        CreateSessionRequest {
            kind,
            host_name: "alice".into(),
            questions: (0..questions).map(|i| question(&format!("q{i}"))).collect(),
            time_per_question_ms: Some(30_000),
        }
    }

    async fn stored(state: &crate::state::SharedState, code: &str) -> SessionEntity {
        let store = state.session_store().await.unwrap();
        session_service::fetch_by_code(&store, code).await.unwrap()
    }

    /// Answer every question of an independent-progress session, getting
    /// `correct` of them right.
    async fn play_duel(
        state: &crate::state::SharedState,
        code: &str,
        participant: uuid::Uuid,
        correct: usize,
    ) -> PlayOutcome {
        let entity = stored(state, code).await;
        let mut last = None;
        for (index, q) in entity.questions.iter().enumerate() {
            let option = if index < correct {
                q.correct_option
            } else {
                (q.correct_option + 1) % q.options.len()
            };
            let outcome = record_progress(
                state,
                code,
                ProgressRequest {
                    participant_id: participant,
                    question_index: index,
                    option_index: option,
                },
            )
            .await
            .unwrap();
            assert!(outcome.applied, "progress write {index} abandoned");
            last = Some(outcome);
        }
        last.unwrap()
    }

    #[tokio::test]
    async fn tournament_single_question_end_to_end() {
        let (state, clock) = setup().await;
        let created = session_service::create_session(&state, create_request(SessionKind::Tournament, 1))
            .await
            .unwrap();
        let host = created.participant_id;
        let code = created.code.clone();

        let bob = session_service::join_session(&state, &code, JoinSessionRequest { name: "bob".into() })
            .await
            .unwrap()
            .participant_id;
        let carol =
            session_service::join_session(&state, &code, JoinSessionRequest { name: "carol".into() })
                .await
                .unwrap()
                .participant_id;

        let started = start_session(&state, &code, StartRequest { participant_id: host })
            .await
            .unwrap();
        assert!(started.applied);
        assert_eq!(started.session.status, SessionStatus::Countdown);

        // Any participant's poll observes the countdown expiry.
        clock.advance(3_000);
        let tick = poll_service::poll(&state, &code, bob).await.unwrap();
        assert!(tick.advanced);
        assert_eq!(tick.session.status, SessionStatus::InProgress);

        let entity = stored(&state, &code).await;
        let correct = entity.questions[0].correct_option;
        let wrong = (correct + 1) % entity.questions[0].options.len();

        // Host answers correctly five seconds in; bob answers wrong; carol
        // never answers.
        clock.advance(5_000);
        let a = submit_answer(
            &state,
            &code,
            AnswerRequest {
                participant_id: host,
                question_index: 0,
                option_index: correct,
            },
        )
        .await
        .unwrap();
        assert!(a.applied);
        let b = submit_answer(
            &state,
            &code,
            AnswerRequest {
                participant_id: bob,
                question_index: 0,
                option_index: wrong,
            },
        )
        .await
        .unwrap();
        assert!(b.applied);

        // Round timer runs out. A non-host poll cannot close the round.
        clock.advance(25_000);
        let tick = poll_service::poll(&state, &code, carol).await.unwrap();
        assert!(!tick.advanced);
        assert_eq!(tick.session.status, SessionStatus::InProgress);

        // The host's poll closes it and applies scoring exactly once.
        let tick = poll_service::poll(&state, &code, host).await.unwrap();
        assert!(tick.advanced);
        assert_eq!(tick.session.status, SessionStatus::ShowingResults);

        let entity = stored(&state, &code).await;
        assert_eq!(entity.participant(host).unwrap().score, 350);
        assert_eq!(entity.participant(bob).unwrap().score, 0);
        assert_eq!(entity.participant(carol).unwrap().score, 0);
        assert_eq!(entity.results_log.len(), 1);

        // After the results display the host's poll completes the
        // single-question tournament.
        clock.advance(5_000);
        let tick = poll_service::poll(&state, &code, host).await.unwrap();
        assert!(tick.advanced);
        assert_eq!(tick.session.status, SessionStatus::Completed);
        let rankings = tick.session.rankings.expect("rankings on completion");
        assert_eq!(rankings[0].participant, host);
        assert_eq!(rankings[0].score, 350);
    }

    #[tokio::test]
    async fn duel_second_finisher_decides_the_winner() {
        let (state, clock) = setup().await;
        let created = session_service::create_session(&state, create_request(SessionKind::Duel, 5))
            .await
            .unwrap();
        let alice = created.participant_id;
        let code = created.code.clone();
        let bob = session_service::join_session(&state, &code, JoinSessionRequest { name: "bob".into() })
            .await
            .unwrap()
            .participant_id;

        // Alice finishes 5/5; the duel stays active while bob plays.
        clock.advance(45_000);
        let outcome = play_duel(&state, &code, alice, 5).await;
        assert_eq!(outcome.session.status, SessionStatus::Active);
        assert!(outcome.session.participants.iter().any(|p| p.finished));

        // Bob finishes 3/5; his completion write decides the terminal state.
        clock.advance(30_000);
        let outcome = play_duel(&state, &code, bob, 3).await;
        assert_eq!(outcome.session.status, SessionStatus::Completed);
        assert_eq!(outcome.session.winner, Some(alice));
    }

    #[tokio::test]
    async fn duel_equal_scores_tie_with_no_winner() {
        let (state, clock) = setup().await;
        let created = session_service::create_session(&state, create_request(SessionKind::Duel, 5))
            .await
            .unwrap();
        let alice = created.participant_id;
        let code = created.code.clone();
        let bob = session_service::join_session(&state, &code, JoinSessionRequest { name: "bob".into() })
            .await
            .unwrap()
            .participant_id;

        clock.advance(40_000);
        play_duel(&state, &code, alice, 4).await;
        clock.advance(2_000);
        let outcome = play_duel(&state, &code, bob, 4).await;

        assert_eq!(outcome.session.status, SessionStatus::Completed);
        assert_eq!(outcome.session.winner, None);

        // The tie is stable: a later poll still reports no winner.
        let tick = poll_service::poll(&state, &code, alice).await.unwrap();
        assert_eq!(tick.session.status, SessionStatus::Completed);
        assert_eq!(tick.session.winner, None);
    }

    #[tokio::test]
    async fn room_race_ranks_by_score_then_time() {
        let (state, clock) = setup().await;
        let created = session_service::create_session(&state, create_request(SessionKind::Room, 4))
            .await
            .unwrap();
        let p1 = created.participant_id;
        let code = created.code.clone();
        let p2 = session_service::join_session(&state, &code, JoinSessionRequest { name: "p2".into() })
            .await
            .unwrap()
            .participant_id;
        let p3 = session_service::join_session(&state, &code, JoinSessionRequest { name: "p3".into() })
            .await
            .unwrap()
            .participant_id;

        // Any participant may open the race, not just the creator.
        let started = start_session(&state, &code, StartRequest { participant_id: p3 })
            .await
            .unwrap();
        assert!(started.applied);

        let entity = stored(&state, &code).await;
        let all_correct: Vec<i32> = entity
            .questions
            .iter()
            .map(|q| q.correct_option as i32)
            .collect();
        let mut two_correct = all_correct.clone();
        for (index, answer) in two_correct.iter_mut().enumerate().skip(2) {
            *answer = (entity.questions[index].correct_option as i32 + 1)
                % entity.questions[index].options.len() as i32;
        }

        // p2 finishes at 90s, p3 at 100s, p1 at 120s.
        clock.advance(90_000);
        let outcome = report_completion(
            &state,
            &code,
            CompletionRequest { participant_id: p2, answers: all_correct.clone() },
        )
        .await
        .unwrap();
        assert!(outcome.applied);
        assert_eq!(outcome.session.status, SessionStatus::InProgress);

        clock.advance(10_000);
        report_completion(
            &state,
            &code,
            CompletionRequest { participant_id: p3, answers: two_correct },
        )
        .await
        .unwrap();

        clock.advance(20_000);
        let outcome = report_completion(
            &state,
            &code,
            CompletionRequest { participant_id: p1, answers: all_correct },
        )
        .await
        .unwrap();
        assert_eq!(outcome.session.status, SessionStatus::Completed);

        let rankings = outcome.session.rankings.expect("rankings on completion");
        let order: Vec<_> = rankings.iter().map(|r| r.participant).collect();
        assert_eq!(order, vec![p2, p1, p3]);
        assert_eq!(rankings[0].completion_time_ms, Some(90_000));
        assert_eq!(rankings[1].completion_time_ms, Some(120_000));
    }

    #[tokio::test]
    async fn join_of_a_full_tournament_leaves_the_document_unchanged() {
        let (state, _clock) = setup().await;
        let created = session_service::create_session(&state, create_request(SessionKind::Tournament, 1))
            .await
            .unwrap();
        let code = created.code.clone();
        for name in ["bob", "carol"] {
            session_service::join_session(&state, &code, JoinSessionRequest { name: name.into() })
                .await
                .unwrap();
        }

        let before = stored(&state, &code).await;
        let err = session_service::join_session(
            &state,
            &code,
            JoinSessionRequest { name: "late".into() },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::SessionFull(_)));

        let after = stored(&state, &code).await;
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn second_answer_for_a_round_is_abandoned() {
        let (state, clock) = setup().await;
        let created = session_service::create_session(&state, create_request(SessionKind::Tournament, 2))
            .await
            .unwrap();
        let host = created.participant_id;
        let code = created.code.clone();
        let bob = session_service::join_session(&state, &code, JoinSessionRequest { name: "bob".into() })
            .await
            .unwrap()
            .participant_id;

        start_session(&state, &code, StartRequest { participant_id: host })
            .await
            .unwrap();
        clock.advance(3_000);
        poll_service::poll(&state, &code, bob).await.unwrap();

        clock.advance(1_000);
        let first = submit_answer(
            &state,
            &code,
            AnswerRequest { participant_id: bob, question_index: 0, option_index: 1 },
        )
        .await
        .unwrap();
        assert!(first.applied);

        let second = submit_answer(
            &state,
            &code,
            AnswerRequest { participant_id: bob, question_index: 0, option_index: 2 },
        )
        .await
        .unwrap();
        assert!(!second.applied);

        let entity = stored(&state, &code).await;
        assert_eq!(entity.participant(bob).unwrap().current_answer_index, 1);
    }
}
