use async_trait::async_trait;
use thiserror::Error;

use freightdesk_core::domain::conversation::{ConversationState, ThreadId, UserId};
use freightdesk_core::errors::{ApplicationError, DomainError};

pub mod memory;
pub mod session;

pub use memory::InMemorySessionStore;
pub use session::SqlSessionStore;

#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("refusing to store invalid conversation state: {0}")]
    Invalid(#[from] DomainError),
}

impl From<SessionStoreError> for ApplicationError {
    fn from(value: SessionStoreError) -> Self {
        match value {
            SessionStoreError::Invalid(error) => Self::Domain(error),
            other => Self::Persistence(other.to_string()),
        }
    }
}

/// Keyed storage of one `ConversationState` per thread.
///
/// Writes are last-write-wins. Two requests racing on the same thread can
/// lose an update; callers that need stronger guarantees serialize per thread.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, thread_id: &ThreadId)
        -> Result<Option<ConversationState>, SessionStoreError>;

    async fn put(&self, state: ConversationState) -> Result<(), SessionStoreError>;

    /// Verifies the backing storage answers. Stores without a remote side
    /// are always reachable.
    async fn health_check(&self) -> Result<(), SessionStoreError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str;

    /// Returns the stored state, or a fresh unsaved one at the greeting step.
    async fn get_or_create(
        &self,
        user_id: &UserId,
        thread_id: &ThreadId,
    ) -> Result<ConversationState, SessionStoreError> {
        match self.get(thread_id).await? {
            Some(state) => Ok(state),
            None => Ok(ConversationState::new(user_id.clone(), thread_id.clone())),
        }
    }
}
