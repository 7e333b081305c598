use async_trait::async_trait;

use crate::domain::{NewSessionRecord, SessionId};

/// Long-lived session record store, written exactly once per run at
/// finalization.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert_session(
        &self,
        record: &NewSessionRecord,
    ) -> Result<SessionId, SessionStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("insert failed: {0}")]
    InsertFailed(String),
}
