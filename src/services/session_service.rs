//! Session lifecycle: creation (with the one-time shuffles and join-code
//! allocation), joining, and the joinable-session listing.

use std::sync::Arc;
use std::time::SystemTime;

use indexmap::IndexMap;
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{
        models::{ParticipantEntity, QuestionEntity, SessionEntity, SessionKind, SessionStatus},
        session_store::SessionStore,
    },
    dto::session::{
        CreateSessionRequest, JoinSessionRequest, JoinedSession, QuestionInput, SessionCreated,
        SessionListItem,
    },
    error::ServiceError,
    state::SharedState,
};

/// Alphabet used for join codes: uppercase letters and digits.
const JOIN_CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
/// How many collisions we tolerate before giving up on code allocation.
const JOIN_CODE_MAX_ATTEMPTS: usize = 32;

/// Create a session of the requested kind, shuffling the question order and
/// every question's options exactly once so all participants see identical
/// content, and allocating a join code unique among joinable documents.
pub async fn create_session(
    state: &SharedState,
    request: CreateSessionRequest,
) -> Result<SessionCreated, ServiceError> {
    let store = state.require_session_store().await?;
    let now_ms = state.now_ms();
    let timestamp = SystemTime::now();

    let host_name = request.host_name.trim().to_string();
    let questions = bake_questions(request.questions);
    let code = allocate_join_code(&store).await?;

    let host_id = Uuid::new_v4();
    let mut participants = IndexMap::new();
    participants.insert(host_id, ParticipantEntity::new(host_name, now_ms));

    let status = match request.kind {
        SessionKind::Duel => SessionStatus::Active,
        SessionKind::Room | SessionKind::Tournament => SessionStatus::Waiting,
    };

    let session = SessionEntity {
        id: Uuid::new_v4(),
        code: code.clone(),
        kind: request.kind,
        status,
        questions,
        participants,
        current_question_index: None,
        phase_started_at_ms: now_ms,
        time_per_question_ms: request
            .time_per_question_ms
            .unwrap_or(state.config().default_time_per_question_ms),
        results_log: Vec::new(),
        host: (request.kind == SessionKind::Tournament).then_some(host_id),
        winner: None,
        created_at: timestamp,
        updated_at: timestamp,
    };

    store.create_session(session.clone()).await?;
    info!(code = %code, kind = ?session.kind, "session created");

    Ok(SessionCreated {
        code,
        participant_id: host_id,
        session: (&session).into(),
    })
}

/// Append a participant to a joinable session. `NotFound` and `SessionFull`
/// surface to the caller; both are user-visible join failures.
pub async fn join_session(
    state: &SharedState,
    code: &str,
    request: JoinSessionRequest,
) -> Result<JoinedSession, ServiceError> {
    let store = state.require_session_store().await?;
    let mut session = fetch_by_code(&store, code).await?;

    if !session.status.accepts_joins() {
        return Err(ServiceError::InvalidState(format!(
            "session `{code}` no longer accepts players"
        )));
    }
    let capacity = state.config().capacity_for(session.kind);
    if session.participants.len() >= capacity {
        return Err(ServiceError::SessionFull(format!(
            "session `{code}` already has {capacity} players"
        )));
    }

    let participant_id = Uuid::new_v4();
    let name = request.name.trim().to_string();
    session
        .participants
        .insert(participant_id, ParticipantEntity::new(name, state.now_ms()));
    session.updated_at = SystemTime::now();
    store.replace_session(session.clone()).await?;

    info!(code = %code, participant = %participant_id, "participant joined");

    Ok(JoinedSession {
        participant_id,
        session: (&session).into(),
    })
}

/// List sessions that still accept players, optionally filtered by kind.
pub async fn list_joinable(
    state: &SharedState,
    kind: Option<SessionKind>,
) -> Result<Vec<SessionListItem>, ServiceError> {
    let store = state.require_session_store().await?;
    let sessions = store.list_joinable(kind).await?;

    Ok(sessions
        .iter()
        .filter(|session| {
            session.participants.len() < state.config().capacity_for(session.kind)
        })
        .map(|session| {
            SessionListItem::from_entity(session, state.config().capacity_for(session.kind))
        })
        .collect())
}

/// Resolve a join code to the latest document carrying it.
pub async fn fetch_by_code(
    store: &Arc<dyn SessionStore>,
    code: &str,
) -> Result<SessionEntity, ServiceError> {
    store
        .find_by_code(code.to_string())
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("no session with code `{code}`")))
}

/// Bake the played question set: shuffle the question order, then each
/// question's options, recording where the correct answer landed. This
/// happens once; polls never re-shuffle.
fn bake_questions(inputs: Vec<QuestionInput>) -> Vec<QuestionEntity> {
    let mut rng = rand::rng();

    let mut questions: Vec<QuestionEntity> = inputs
        .into_iter()
        .map(|input| {
            let mut order: Vec<usize> = (0..input.options.len()).collect();
            order.shuffle(&mut rng);

            let options = order.iter().map(|&i| input.options[i].clone()).collect();
            let correct_option = order
                .iter()
                .position(|&i| i == input.correct_index)
                .unwrap_or(0);

            QuestionEntity {
                prompt: input.prompt,
                options,
                correct_option,
            }
        })
        .collect();

    if questions.len() > 1 {
        questions.shuffle(&mut rng);
    }

    questions
}

/// Allocate a join code unique among currently-joinable documents,
/// regenerating on collision. Codes of terminal sessions may be recycled.
async fn allocate_join_code(store: &Arc<dyn SessionStore>) -> Result<String, ServiceError> {
    let mut attempts = 0;
    loop {
        let code = random_code();
        match store.find_by_code(code.clone()).await? {
            Some(existing) if !existing.status.is_terminal() => {
                attempts += 1;
                if attempts >= JOIN_CODE_MAX_ATTEMPTS {
                    return Err(ServiceError::InvalidState(
                        "could not allocate a unique join code".into(),
                    ));
                }
            }
            _ => return Ok(code),
        }
    }
}

fn random_code() -> String {
    let mut rng = rand::rng();
    (0..crate::dao::models::JOIN_CODE_LENGTH)
        .map(|_| JOIN_CODE_CHARSET[rng.random_range(0..JOIN_CODE_CHARSET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::validation::validate_join_code;

    #[test]
    fn generated_codes_have_the_expected_shape() {
        for _ in 0..64 {
            let code = random_code();
            assert!(validate_join_code(&code).is_ok(), "bad code {code}");
        }
    }

    #[test]
    fn baking_keeps_the_correct_answer_aligned() {
        let inputs = vec![
            QuestionInput {
                prompt: "capital of France?".into(),
                options: vec!["Lyon".into(), "Paris".into(), "Nice".into(), "Lille".into()],
                correct_index: 1,
            },
            QuestionInput {
                prompt: "2 + 2?".into(),
                options: vec!["3".into(), "4".into()],
                correct_index: 1,
            },
        ];

        let baked = bake_questions(inputs);
        assert_eq!(baked.len(), 2);
        for question in &baked {
            let correct = &question.options[question.correct_option];
            assert!(correct == "Paris" || correct == "4");
        }
    }
}
