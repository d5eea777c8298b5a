use sqlx::Row;

use freightdesk_core::domain::conversation::{ConversationState, ThreadId};

use super::{SessionStore, SessionStoreError};
use crate::DbPool;

/// SQLite-backed store. The full state is kept as a JSON document; the
/// derived step is written next to it for operators and never read back.
pub struct SqlSessionStore {
    pool: DbPool,
}

impl SqlSessionStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl SessionStore for SqlSessionStore {
    async fn get(
        &self,
        thread_id: &ThreadId,
    ) -> Result<Option<ConversationState>, SessionStoreError> {
        let row = sqlx::query("SELECT state_json FROM conversation_sessions WHERE thread_id = ?")
            .bind(&thread_id.0)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let raw: String = row.try_get("state_json")?;
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|error| SessionStoreError::Decode(format!("thread `{thread_id}`: {error}")))
    }

    async fn put(&self, state: ConversationState) -> Result<(), SessionStoreError> {
        state.validate()?;
        let state_json = serde_json::to_string(&state)
            .map_err(|error| SessionStoreError::Decode(error.to_string()))?;

        sqlx::query(
            "INSERT INTO conversation_sessions \
                (thread_id, user_id, current_step, state_json, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?) \
             ON CONFLICT(thread_id) DO UPDATE SET \
                current_step = excluded.current_step, \
                state_json = excluded.state_json, \
                updated_at = excluded.updated_at",
        )
        .bind(&state.thread_id.0)
        .bind(&state.user_id.0)
        .bind(state.current_step().as_str())
        .bind(&state_json)
        .bind(state.created_at.to_rfc3339())
        .bind(state.last_activity.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn health_check(&self) -> Result<(), SessionStoreError> {
        crate::connection::ping(&self.pool).await.map_err(SessionStoreError::from)
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}
