//! In-memory session store used as the default backend and by tests.

use dashmap::DashMap;
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{SessionEntity, SessionKind};
use crate::dao::session_store::SessionStore;
use crate::dao::storage::StorageResult;

/// Process-local store keeping every session document in a [`DashMap`].
///
/// Semantics intentionally mirror the persistent backends: replaces are
/// last-write-wins full-document swaps, and the code index always points at
/// the most recently created document for a code.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: DashMap<Uuid, SessionEntity>,
    codes: DashMap<String, Uuid>,
}

impl MemorySessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn create_session(&self, session: SessionEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.codes.insert(session.code.clone(), session.id);
        self.sessions.insert(session.id, session);
        Box::pin(async { Ok(()) })
    }

    fn replace_session(&self, session: SessionEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.sessions.insert(session.id, session);
        Box::pin(async { Ok(()) })
    }

    fn find_session(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<SessionEntity>>> {
        let found = self.sessions.get(&id).map(|entry| entry.value().clone());
        Box::pin(async move { Ok(found) })
    }

    fn find_by_code(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<SessionEntity>>> {
        let found = self.codes.get(&code).and_then(|entry| {
            self.sessions
                .get(entry.value())
                .map(|doc| doc.value().clone())
        });
        Box::pin(async move { Ok(found) })
    }

    fn list_joinable(
        &self,
        kind: Option<SessionKind>,
    ) -> BoxFuture<'static, StorageResult<Vec<SessionEntity>>> {
        let sessions = self
            .sessions
            .iter()
            .filter(|entry| entry.value().status.accepts_joins())
            .filter(|entry| kind.is_none_or(|k| entry.value().kind == k))
            .map(|entry| entry.value().clone())
            .collect::<Vec<_>>();
        Box::pin(async move { Ok(sessions) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use indexmap::IndexMap;

    use super::*;
    use crate::dao::models::SessionStatus;

    fn sample(kind: SessionKind, status: SessionStatus, code: &str) -> SessionEntity {
        SessionEntity {
            id: Uuid::new_v4(),
            code: code.to_string(),
            kind,
            status,
            questions: Vec::new(),
            participants: IndexMap::new(),
            current_question_index: None,
            phase_started_at_ms: 0,
            time_per_question_ms: 30_000,
            results_log: Vec::new(),
            host: None,
            winner: None,
            created_at: SystemTime::now(),
            updated_at: SystemTime::now(),
        }
    }

    #[tokio::test]
    async fn create_then_find_by_code_and_id() {
        let store = MemorySessionStore::new();
        let session = sample(SessionKind::Room, SessionStatus::Waiting, "AB12CD");
        let id = session.id;
        store.create_session(session).await.unwrap();

        let by_id = store.find_session(id).await.unwrap().unwrap();
        assert_eq!(by_id.code, "AB12CD");

        let by_code = store.find_by_code("AB12CD".into()).await.unwrap().unwrap();
        assert_eq!(by_code.id, id);

        assert!(store.find_by_code("ZZZZZZ".into()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn replace_is_last_write_wins() {
        let store = MemorySessionStore::new();
        let session = sample(SessionKind::Duel, SessionStatus::Active, "QQ33WW");
        let id = session.id;
        store.create_session(session.clone()).await.unwrap();

        let mut first = session.clone();
        first.status = SessionStatus::Active;
        let mut second = session;
        second.status = SessionStatus::Completed;

        store.replace_session(first).await.unwrap();
        store.replace_session(second).await.unwrap();

        let current = store.find_session(id).await.unwrap().unwrap();
        assert_eq!(current.status, SessionStatus::Completed);
    }

    #[tokio::test]
    async fn list_joinable_filters_status_and_kind() {
        let store = MemorySessionStore::new();
        store
            .create_session(sample(SessionKind::Room, SessionStatus::Waiting, "ROOM01"))
            .await
            .unwrap();
        store
            .create_session(sample(SessionKind::Room, SessionStatus::Completed, "ROOM02"))
            .await
            .unwrap();
        store
            .create_session(sample(SessionKind::Duel, SessionStatus::Active, "DUEL01"))
            .await
            .unwrap();

        let rooms = store.list_joinable(Some(SessionKind::Room)).await.unwrap();
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].code, "ROOM01");

        let all = store.list_joinable(None).await.unwrap();
        assert_eq!(all.len(), 2);
    }
}
