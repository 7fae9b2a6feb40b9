//! The reconciliation protocol: every transition-triggering operation is a
//! fetch of the latest document, a guard evaluated against that fresh
//! snapshot, a purely computed next document, and one full-document write.
//!
//! A guard that re-evaluates to false because another writer got there first
//! is simply abandoned: no retry, no error. This is the core race-safety
//! mechanism, and it requires every transition to be idempotent or to
//! converge to the same terminal value regardless of write order.

use std::sync::Arc;
use std::time::SystemTime;

use tracing::debug;
use uuid::Uuid;

use crate::{
    dao::{models::SessionEntity, session_store::SessionStore},
    error::ServiceError,
    state::machine::GuardRejection,
};

/// Result of one reconciliation attempt. Both arms carry the latest observed
/// document so callers can always hand a fresh view back to the client.
#[derive(Debug)]
pub enum Outcome {
    /// The guard held and the new document was written.
    Applied(SessionEntity),
    /// The guard refused against the fresh snapshot; nothing was written.
    Abandoned {
        /// Why the transition did not apply.
        rejection: GuardRejection,
        /// The snapshot the guard was evaluated against.
        latest: SessionEntity,
    },
}

impl Outcome {
    /// The written document, when the transition applied.
    pub fn applied(&self) -> Option<&SessionEntity> {
        match self {
            Outcome::Applied(session) => Some(session),
            Outcome::Abandoned { .. } => None,
        }
    }

    /// Latest observed document regardless of outcome.
    pub fn latest(&self) -> &SessionEntity {
        match self {
            Outcome::Applied(session) => session,
            Outcome::Abandoned { latest, .. } => latest,
        }
    }
}

/// Run one guarded transition against the latest stored document.
///
/// The closure must be pure: it receives the freshly fetched document and
/// either returns the fully recomputed next one or the rejection that stops
/// it. Terminal documents are read-only history and reject every transition
/// outright.
pub async fn apply<F>(
    store: &Arc<dyn SessionStore>,
    id: Uuid,
    transition: F,
) -> Result<Outcome, ServiceError>
where
    F: FnOnce(SessionEntity) -> Result<SessionEntity, GuardRejection>,
{
    let Some(latest) = store.find_session(id).await? else {
        return Err(ServiceError::NotFound(format!("session `{id}` not found")));
    };

    if latest.status.is_terminal() {
        debug!(session = %id, "transition against terminal session abandoned");
        return Ok(Outcome::Abandoned {
            rejection: GuardRejection::InvalidPhase,
            latest,
        });
    }

    match transition(latest.clone()) {
        Ok(mut next) => {
            next.updated_at = SystemTime::now();
            store.replace_session(next.clone()).await?;
            Ok(Outcome::Applied(next))
        }
        Err(rejection) => {
            debug!(session = %id, %rejection, "transition abandoned");
            Ok(Outcome::Abandoned { rejection, latest })
        }
    }
}
