use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dao::models::{
        QuestionEntity, RoundAnswerEntity, RoundOutcomeEntity, SessionEntity, SessionKind,
        SessionStatus,
    },
    dto::{common::ParticipantView, format_system_time},
    state::scoring,
};

/// Payload used to create a brand-new session of any kind.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateSessionRequest {
    /// Which match variant to create.
    pub kind: SessionKind,
    /// Display name of the creating participant.
    #[validate(length(min = 1, max = 32))]
    pub host_name: String,
    /// Question set played by the session; shuffled once at creation.
    #[validate(length(min = 1), nested)]
    pub questions: Vec<QuestionInput>,
    /// Round window override for tournaments, in milliseconds.
    #[serde(default)]
    pub time_per_question_ms: Option<u64>,
}

/// Incoming question definition for session creation.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QuestionInput {
    /// Question text.
    pub prompt: String,
    /// Answer options in authoring order.
    pub options: Vec<String>,
    /// Index of the correct entry in `options` (pre-shuffle).
    pub correct_index: usize,
}

impl Validate for QuestionInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.prompt.trim().is_empty() {
            errors.add("prompt", ValidationError::new("prompt_empty"));
        }

        if self.options.len() < 2 || self.options.len() > 8 {
            let mut err = ValidationError::new("options_count");
            err.message = Some("a question needs between 2 and 8 options".into());
            errors.add("options", err);
        }

        if self.options.iter().any(|option| option.trim().is_empty()) {
            errors.add("options", ValidationError::new("option_empty"));
        }

        if self.correct_index >= self.options.len() {
            let mut err = ValidationError::new("correct_index_range");
            err.message = Some("correct_index must point into options".into());
            errors.add("correct_index", err);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Payload used to join an existing session by code.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct JoinSessionRequest {
    /// Display name of the joining participant.
    #[validate(length(min = 1, max = 32))]
    pub name: String,
}

/// A question as shown to participants: the correct option stays server-side.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuestionView {
    /// Question text.
    pub prompt: String,
    /// Answer options in their baked-in display order.
    pub options: Vec<String>,
}

impl From<&QuestionEntity> for QuestionView {
    fn from(question: &QuestionEntity) -> Self {
        Self {
            prompt: question.prompt.clone(),
            options: question.options.clone(),
        }
    }
}

/// One participant's answer inside a resolved round view.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoundAnswerView {
    /// Participant the answer belongs to.
    pub participant: Uuid,
    /// Chosen option, `-1` when the round timed out unanswered.
    pub option_index: i32,
    /// Latency from the round anchor.
    pub latency_ms: Option<u64>,
    /// Points awarded.
    pub awarded: u32,
}

impl From<&RoundAnswerEntity> for RoundAnswerView {
    fn from(answer: &RoundAnswerEntity) -> Self {
        Self {
            participant: answer.participant,
            option_index: answer.option_index,
            latency_ms: answer.latency_ms,
            awarded: answer.awarded,
        }
    }
}

/// A resolved tournament round, safe to reveal because the round is closed.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoundOutcomeView {
    /// Which question the round played.
    pub question_index: usize,
    /// The correct option for that question.
    pub correct_option: usize,
    /// Every participant's answer and award.
    pub answers: Vec<RoundAnswerView>,
}

impl From<&RoundOutcomeEntity> for RoundOutcomeView {
    fn from(outcome: &RoundOutcomeEntity) -> Self {
        Self {
            question_index: outcome.question_index,
            correct_option: outcome.correct_option,
            answers: outcome.answers.iter().map(Into::into).collect(),
        }
    }
}

/// Final standing entry, present once a session completes.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RankingView {
    /// Participant identity.
    pub participant: Uuid,
    /// Display name.
    pub name: String,
    /// Final score.
    pub score: u32,
    /// Total play time, when the participant finished.
    pub completion_time_ms: Option<u64>,
}

/// Full projection of a session document returned by every poll.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionView {
    /// Session identifier.
    pub id: Uuid,
    /// Human-shareable join code.
    pub code: String,
    /// Match variant.
    pub kind: SessionKind,
    /// Current phase.
    pub status: SessionStatus,
    /// Questions with their baked-in option order.
    pub questions: Vec<QuestionView>,
    /// Participants in join order.
    pub participants: Vec<ParticipantView>,
    /// Round currently being played (tournament).
    pub current_question_index: Option<usize>,
    /// Round window in milliseconds (tournament).
    pub time_per_question_ms: u64,
    /// Host identity, when the kind has host-gated transitions.
    pub host: Option<Uuid>,
    /// Duel winner once completed; absent for a tie.
    pub winner: Option<Uuid>,
    /// Resolved rounds (tournament).
    pub results_log: Vec<RoundOutcomeView>,
    /// Final standings, present once the session completes.
    pub rankings: Option<Vec<RankingView>>,
    /// Creation timestamp (RFC3339).
    pub created_at: String,
    /// Last write timestamp (RFC3339).
    pub updated_at: String,
}

impl From<&SessionEntity> for SessionView {
    fn from(session: &SessionEntity) -> Self {
        let rankings = session.status.is_terminal().then(|| {
            scoring::rank(&session.participants)
                .into_iter()
                .filter_map(|id| {
                    session.participant(id).map(|p| RankingView {
                        participant: id,
                        name: p.name.clone(),
                        score: p.score,
                        completion_time_ms: p.completion_time_ms,
                    })
                })
                .collect()
        });

        Self {
            id: session.id,
            code: session.code.clone(),
            kind: session.kind,
            status: session.status,
            questions: session.questions.iter().map(Into::into).collect(),
            participants: session
                .participants
                .iter()
                .map(|(id, p)| (*id, p).into())
                .collect(),
            current_question_index: session.current_question_index,
            time_per_question_ms: session.time_per_question_ms,
            host: session.host,
            winner: session.winner,
            results_log: session.results_log.iter().map(Into::into).collect(),
            rankings,
            created_at: format_system_time(session.created_at),
            updated_at: format_system_time(session.updated_at),
        }
    }
}

/// Response returned once a session has been created.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionCreated {
    /// Join code to share with the other players.
    pub code: String,
    /// Identity of the creating participant.
    pub participant_id: Uuid,
    /// Initial session view.
    pub session: SessionView,
}

/// Response returned once a participant has joined a session.
#[derive(Debug, Serialize, ToSchema)]
pub struct JoinedSession {
    /// Identity handed to the joining participant.
    pub participant_id: Uuid,
    /// Session view as of the join write.
    pub session: SessionView,
}

/// Compact listing entry for the joinable-session browser.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionListItem {
    /// Join code.
    pub code: String,
    /// Match variant.
    pub kind: SessionKind,
    /// Players already in.
    pub participant_count: usize,
    /// Player capacity for this kind.
    pub capacity: usize,
    /// Number of questions the session plays.
    pub question_count: usize,
    /// Creation timestamp (RFC3339).
    pub created_at: String,
}

impl SessionListItem {
    /// Build a listing entry; capacity depends on runtime configuration.
    pub fn from_entity(session: &SessionEntity, capacity: usize) -> Self {
        Self {
            code: session.code.clone(),
            kind: session.kind,
            participant_count: session.participants.len(),
            capacity,
            question_count: session.questions.len(),
            created_at: format_system_time(session.created_at),
        }
    }
}
