#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{SessionEntity, SessionKind};
use crate::dao::storage::StorageResult;

/// Abstraction over the shared session-document store.
///
/// The store offers no transactional primitive: `replace_session` is a
/// full-document last-write-wins replace, and all race safety comes from the
/// idempotent, guard-checked transitions layered on top of it.
pub trait SessionStore: Send + Sync {
    /// Persist a freshly created session document.
    fn create_session(&self, session: SessionEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Replace a session document wholesale. Last write wins; no version check.
    fn replace_session(&self, session: SessionEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch the latest session document by primary key.
    fn find_session(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<SessionEntity>>>;
    /// Resolve a join code to the latest document carrying it.
    fn find_by_code(&self, code: String)
    -> BoxFuture<'static, StorageResult<Option<SessionEntity>>>;
    /// List sessions whose phase still accepts joins, optionally filtered by
    /// kind. Capacity filtering is the caller's concern.
    fn list_joinable(
        &self,
        kind: Option<SessionKind>,
    ) -> BoxFuture<'static, StorageResult<Vec<SessionEntity>>>;
    /// Cheap probe that the backend is reachable.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Attempt to re-establish a lost backend connection.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
