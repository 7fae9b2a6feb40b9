//! The poll contract: each participant re-fetches the session on a fixed
//! cadence and feeds the latest document through one read-and-react tick.
//! The tick evaluates whichever time-gated transition is due for *this*
//! poller (countdown expiry for anyone, round close and round advance for
//! the host), applies at most one write through the reconciliation
//! protocol, and returns the view plus recomputed remaining time.
//!
//! Propagation is bounded only by the poll interval; there is no push.

use uuid::Uuid;

use crate::{
    dao::models::{SessionEntity, SessionKind, SessionStatus},
    dto::play::PollResponse,
    error::ServiceError,
    services::{reconcile, session_service},
    state::{SharedState, clock::ClockAnchor, machine},
};

/// One poll tick for `participant` against the session behind `code`.
pub async fn poll(
    state: &SharedState,
    code: &str,
    participant: Uuid,
) -> Result<PollResponse, ServiceError> {
    let store = state.require_session_store().await?;
    let fetched = session_service::fetch_by_code(&store, code).await?;
    let now_ms = state.now_ms();
    let config = state.config();

    let mut advanced = false;
    let mut current = fetched;

    if current.kind == SessionKind::Tournament {
        let anchor = ClockAnchor::new(current.phase_started_at_ms);
        let due = match current.status {
            SessionStatus::Countdown => anchor.expired(config.countdown_ms, now_ms),
            SessionStatus::InProgress => {
                current.is_host(participant)
                    && anchor.expired(current.time_per_question_ms, now_ms)
            }
            SessionStatus::ShowingResults => {
                current.is_host(participant) && anchor.expired(config.results_display_ms, now_ms)
            }
            _ => false,
        };

        if due {
            let countdown_ms = config.countdown_ms;
            let results_display_ms = config.results_display_ms;
            let status = current.status;
            let outcome = reconcile::apply(&store, current.id, move |doc| match status {
                SessionStatus::Countdown => {
                    machine::tournament::begin_question(doc, now_ms, countdown_ms)
                }
                SessionStatus::InProgress => {
                    machine::tournament::close_question(doc, participant, now_ms)
                }
                SessionStatus::ShowingResults => {
                    machine::tournament::advance(doc, participant, now_ms, results_display_ms)
                }
                _ => Err(machine::GuardRejection::InvalidPhase),
            })
            .await?;

            advanced = outcome.applied().is_some();
            current = match outcome {
                reconcile::Outcome::Applied(session) => session,
                reconcile::Outcome::Abandoned { latest, .. } => latest,
            };
        }
    }

    Ok(PollResponse {
        advanced,
        remaining_ms: remaining_for(&current, now_ms, config),
        poll_after_ms: config.poll_interval_for(current.kind),
        session: (&current).into(),
    })
}

/// Remaining milliseconds in the current timed phase, recomputed from the
/// phase anchor on every tick.
fn remaining_for(
    session: &SessionEntity,
    now_ms: u64,
    config: &crate::config::AppConfig,
) -> Option<u64> {
    if session.kind != SessionKind::Tournament {
        return None;
    }
    let anchor = ClockAnchor::new(session.phase_started_at_ms);
    match session.status {
        SessionStatus::Countdown => Some(anchor.remaining_ms(config.countdown_ms, now_ms)),
        SessionStatus::InProgress => {
            Some(anchor.remaining_ms(session.time_per_question_ms, now_ms))
        }
        SessionStatus::ShowingResults => {
            Some(anchor.remaining_ms(config.results_display_ms, now_ms))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::session_store::memory::MemorySessionStore,
        dto::{
            play::StartRequest,
            session::{CreateSessionRequest, JoinSessionRequest, QuestionInput},
        },
        services::{play_service, session_service},
        state::{AppState, clock::testing::ManualClock},
    };

    const T0: u64 = 500_000;

    async fn tournament_in_countdown() -> (crate::state::SharedState, Arc<ManualClock>, String, Uuid, Uuid)
    {
        let clock = Arc::new(ManualClock::at(T0));
        let state = AppState::with_clock(AppConfig::default(), clock.clone());
        state
            .install_session_store(Arc::new(MemorySessionStore::new()))
            .await;

        let created = session_service::create_session(
            &state,
            CreateSessionRequest {
                kind: SessionKind::Tournament,
                host_name: "host".into(),
                questions: vec![QuestionInput {
                    prompt: "q".into(),
                    options: vec!["a".into(), "b".into()],
                    correct_index: 0,
                }],
                time_per_question_ms: Some(30_000),
            },
        )
        .await
        .unwrap();
        let host = created.participant_id;
        let code = created.code.clone();
        let guest =
            session_service::join_session(&state, &code, JoinSessionRequest { name: "guest".into() })
                .await
                .unwrap()
                .participant_id;
        play_service::start_session(&state, &code, StartRequest { participant_id: host })
            .await
            .unwrap();

        (state, clock, code, host, guest)
    }

    #[tokio::test]
    async fn countdown_remaining_recomputes_after_a_stall() {
        let (state, clock, code, _host, guest) = tournament_in_countdown().await;

        clock.advance(1_200);
        let tick = poll(&state, &code, guest).await.unwrap();
        assert!(!tick.advanced);
        assert_eq!(tick.remaining_ms, Some(1_800));

        // The same participant stalls past the expiry; the next poll sees
        // zero remaining, never a negative or drifted value.
        clock.advance(60_000);
        let tick = poll(&state, &code, guest).await.unwrap();
        assert_eq!(tick.session.status, SessionStatus::InProgress);
    }

    #[tokio::test]
    async fn any_participants_poll_advances_an_expired_countdown() {
        let (state, clock, code, _host, guest) = tournament_in_countdown().await;

        clock.advance(3_000);
        let tick = poll(&state, &code, guest).await.unwrap();
        assert!(tick.advanced);
        assert_eq!(tick.session.status, SessionStatus::InProgress);
        assert_eq!(tick.remaining_ms, Some(30_000));

        // Re-polling the already-advanced session is a no-op.
        let tick = poll(&state, &code, guest).await.unwrap();
        assert!(!tick.advanced);
    }

    #[tokio::test]
    async fn round_close_is_gated_on_the_host() {
        let (state, clock, code, host, guest) = tournament_in_countdown().await;

        clock.advance(3_000);
        poll(&state, &code, guest).await.unwrap();

        // Window runs out; a stalled host means the session sits in
        // IN_PROGRESS no matter how often the others poll.
        clock.advance(30_000);
        for _ in 0..3 {
            let tick = poll(&state, &code, guest).await.unwrap();
            assert!(!tick.advanced);
            assert_eq!(tick.session.status, SessionStatus::InProgress);
            assert_eq!(tick.remaining_ms, Some(0));
        }

        let tick = poll(&state, &code, host).await.unwrap();
        assert!(tick.advanced);
        assert_eq!(tick.session.status, SessionStatus::ShowingResults);
    }

    #[tokio::test]
    async fn duel_polls_carry_no_timer_and_a_relaxed_cadence() {
        let clock = Arc::new(ManualClock::at(T0));
        let state = AppState::with_clock(AppConfig::default(), clock.clone());
        state
            .install_session_store(Arc::new(MemorySessionStore::new()))
            .await;

        let created = session_service::create_session(
            &state,
            CreateSessionRequest {
                kind: SessionKind::Duel,
                host_name: "alice".into(),
                questions: vec![QuestionInput {
                    prompt: "q".into(),
                    options: vec!["a".into(), "b".into()],
                    correct_index: 0,
                }],
                time_per_question_ms: None,
            },
        )
        .await
        .unwrap();

        let tick = poll(&state, &created.code, created.participant_id)
            .await
            .unwrap();
        assert!(!tick.advanced);
        assert_eq!(tick.remaining_ms, None);
        assert_eq!(
            tick.poll_after_ms,
            AppConfig::default().relaxed_poll_interval_ms
        );
    }

    #[tokio::test]
    async fn unknown_code_surfaces_not_found() {
        let state = AppState::with_clock(
            AppConfig::default(),
            Arc::new(ManualClock::at(T0)),
        );
        state
            .install_session_store(Arc::new(MemorySessionStore::new()))
            .await;

        let err = poll(&state, "NOSUCH", Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
