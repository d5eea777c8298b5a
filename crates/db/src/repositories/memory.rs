use std::collections::HashMap;

use tokio::sync::RwLock;

use freightdesk_core::domain::conversation::{ConversationState, ThreadId};

use super::{SessionStore, SessionStoreError};

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, ConversationState>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(
        &self,
        thread_id: &ThreadId,
    ) -> Result<Option<ConversationState>, SessionStoreError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(&thread_id.0).cloned())
    }

    async fn put(&self, state: ConversationState) -> Result<(), SessionStoreError> {
        state.validate()?;
        let mut sessions = self.sessions.write().await;
        sessions.insert(state.thread_id.0.clone(), state);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use freightdesk_core::domain::conversation::{ConversationState, ThreadId, UserId};
    use freightdesk_core::flows::states::DialogueStep;

    use crate::repositories::{InMemorySessionStore, SessionStore, SessionStoreError};

    fn ids(thread: &str) -> (UserId, ThreadId) {
        (UserId("U-1".to_string()), ThreadId(thread.to_string()))
    }

    #[tokio::test]
    async fn get_or_create_returns_fresh_greeting_state_without_saving() {
        let store = InMemorySessionStore::new();
        let (user_id, thread_id) = ids("thread-new");

        let state = store.get_or_create(&user_id, &thread_id).await.expect("create state");

        assert_eq!(state.current_step(), DialogueStep::Greeting);
        assert_eq!(state.user_id, user_id);
        assert!(store.get(&thread_id).await.expect("get").is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn put_then_get_returns_latest_state() {
        let store = InMemorySessionStore::new();
        let (user_id, thread_id) = ids("thread-1");
        let mut state = ConversationState::new(user_id.clone(), thread_id.clone());
        store.put(state.clone()).await.expect("first put");

        state.shipment.origin = Some("Mumbai".to_string());
        state.attempts = 2;
        store.put(state.clone()).await.expect("overwrite");

        let loaded = store.get_or_create(&user_id, &thread_id).await.expect("load");
        assert_eq!(loaded, state);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn threads_are_isolated() {
        let store = InMemorySessionStore::new();
        let (user_id, first) = ids("thread-a");
        let (_, second) = ids("thread-b");

        let mut state = ConversationState::new(user_id.clone(), first.clone());
        state.shipment.cargo = Some("furniture".to_string());
        store.put(state).await.expect("put");

        let other = store.get_or_create(&user_id, &second).await.expect("other thread");
        assert!(other.shipment.cargo.is_none());
    }

    #[tokio::test]
    async fn invalid_state_is_rejected() {
        let store = InMemorySessionStore::new();
        let (user_id, thread_id) = ids("thread-bad");
        let mut state = ConversationState::new(user_id, thread_id.clone());
        state.shipment.origin = Some("Delhi".to_string());
        state.shipment.destination = Some("Delhi".to_string());

        let error = store.put(state).await.expect_err("same origin and destination");
        assert!(matches!(error, SessionStoreError::Invalid(_)));
        assert!(store.get(&thread_id).await.expect("get").is_none());
    }
}
