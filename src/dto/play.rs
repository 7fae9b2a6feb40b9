use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::session::SessionView;

/// Payload for starting a tournament (host) or opening a room race.
#[derive(Debug, Deserialize, ToSchema)]
pub struct StartRequest {
    /// Acting participant.
    pub participant_id: Uuid,
}

/// A tournament round answer. The round index pins the answer to the round
/// the client was looking at, so an answer raced by a round advance is
/// dropped instead of landing in the wrong round.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AnswerRequest {
    /// Acting participant.
    pub participant_id: Uuid,
    /// Round the answer belongs to.
    pub question_index: usize,
    /// Chosen option.
    pub option_index: usize,
}

/// A duel per-question progress write.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ProgressRequest {
    /// Acting participant.
    pub participant_id: Uuid,
    /// Question being answered; must be the participant's next one.
    pub question_index: usize,
    /// Chosen option.
    pub option_index: usize,
}

/// A room player's single completion write: one entry per question, `-1`
/// for questions left unanswered.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CompletionRequest {
    /// Acting participant.
    pub participant_id: Uuid,
    /// Chosen option per question, in question order.
    pub answers: Vec<i32>,
}

/// Result of a guarded mutation. `applied: false` is a normal outcome under
/// concurrent polling (another writer got there first, or the phase moved
/// on); the embedded view always reflects the latest observed document.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayOutcome {
    /// Whether the transition was applied.
    pub applied: bool,
    /// Why the transition was abandoned, when it was.
    pub rejection: Option<String>,
    /// Whether the submitted answer was correct (duel progress writes only).
    pub correct: Option<bool>,
    /// Latest observed session view.
    pub session: SessionView,
}

/// One poll tick's result: the latest view plus the timing hints clients
/// need to render countdowns and schedule the next poll.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct PollResponse {
    /// Whether this poll's observation applied a due transition.
    pub advanced: bool,
    /// Milliseconds left in the current timed phase, when there is one.
    pub remaining_ms: Option<u64>,
    /// Recommended delay before the next poll, in milliseconds.
    pub poll_after_ms: u64,
    /// Latest session view.
    pub session: SessionView,
}
