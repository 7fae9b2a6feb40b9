use serde::Serialize;
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dao::models::{ANSWER_PENDING, ParticipantEntity};

/// Public projection of a participant exposed to polling clients.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ParticipantView {
    /// Participant identity handed out at join time.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Current score.
    pub score: u32,
    /// Whether the participant completed the whole question list.
    pub finished: bool,
    /// Whether the participant answered the current tournament round.
    /// The chosen option is withheld until the round resolves.
    pub has_answered: bool,
    /// Questions answered so far in independent-progress kinds.
    pub progress: usize,
    /// Total play time in milliseconds, present once finished.
    pub completion_time_ms: Option<u64>,
}

impl From<(Uuid, &ParticipantEntity)> for ParticipantView {
    fn from((id, participant): (Uuid, &ParticipantEntity)) -> Self {
        Self {
            id,
            name: participant.name.clone(),
            score: participant.score,
            finished: participant.finished,
            has_answered: participant.current_answer_index != ANSWER_PENDING,
            progress: participant.progress,
            completion_time_ms: participant.completion_time_ms,
        }
    }
}
