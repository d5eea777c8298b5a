use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use freightdesk_core::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use freightdesk_core::domain::conversation::{
    ConversationState, MessageRole, ThreadId, UserId, INVOICE_UPLOADED_MARKER,
};
use freightdesk_core::errors::{ApplicationError, DomainError};
use freightdesk_db::{SessionStore, SessionStoreError};

use crate::dialogue::DialogueEngine;

const AUDIT_ACTOR: &str = "dialogue";

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Store(#[from] SessionStoreError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("conversation not found: {0}")]
    NotFound(ThreadId),
    #[error("thread {thread_id} belongs to another user")]
    ThreadOwnedByAnotherUser { thread_id: ThreadId },
}

impl From<RuntimeError> for ApplicationError {
    fn from(value: RuntimeError) -> Self {
        match value {
            RuntimeError::Store(error) => error.into(),
            RuntimeError::Domain(error) => Self::Domain(error),
            RuntimeError::NotFound(thread_id) => Self::NotFound(thread_id.0),
            RuntimeError::ThreadOwnedByAnotherUser { thread_id } => {
                Self::Domain(DomainError::InvariantViolation(format!(
                    "thread {thread_id} belongs to another user"
                )))
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnReply {
    /// Text to show the user.
    Message(String),
    /// All slots are confirmed; the caller should compute a quote.
    GenerateQuote,
    /// Nothing to say, e.g. for an invoice notification.
    Silent,
}

#[derive(Clone, Debug)]
pub struct TurnResult {
    pub state: ConversationState,
    pub reply: TurnReply,
}

/// Loads a thread, runs one dialogue turn and stores the result.
pub struct AgentRuntime {
    engine: DialogueEngine,
    sessions: Arc<dyn SessionStore>,
    audit: Arc<dyn AuditSink>,
}

impl AgentRuntime {
    pub fn new(
        engine: DialogueEngine,
        sessions: Arc<dyn SessionStore>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self { engine, sessions, audit }
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    pub async fn handle_thread_message(
        &self,
        user_id: &UserId,
        thread_id: &ThreadId,
        text: &str,
        correlation_id: &str,
    ) -> Result<TurnResult, RuntimeError> {
        let context = AuditContext::new(Some(thread_id.clone()), correlation_id, AUDIT_ACTOR);
        let state = self.sessions.get_or_create(user_id, thread_id).await?;

        if state.user_id != *user_id {
            warn!(
                event_name = "dialogue.turn_rejected",
                thread_id = %thread_id,
                correlation_id,
                user_id = %user_id,
                "message from a user who does not own the thread"
            );
            self.audit.emit(
                AuditEvent::new(
                    &context,
                    "dialogue.turn_processed",
                    AuditCategory::Ingress,
                    AuditOutcome::Rejected,
                )
                .with_metadata("user_id", user_id.0.clone()),
            );
            return Err(RuntimeError::ThreadOwnedByAnotherUser { thread_id: thread_id.clone() });
        }

        let from_step = state.current_step();
        let outcome = self.engine.process_turn(&state, text);
        if outcome.reply.is_empty() {
            return Ok(TurnResult { state: outcome.next_state, reply: TurnReply::Silent });
        }

        let quote_requested = outcome.is_quote_request();
        let next_state = outcome.next_state;
        let to_step = next_state.current_step();
        self.sessions.put(next_state.clone()).await?;

        info!(
            event_name = "dialogue.turn_processed",
            thread_id = %thread_id,
            correlation_id,
            from_step = %from_step,
            to_step = %to_step,
            attempts = next_state.attempts,
            "dialogue turn processed"
        );
        self.audit.emit(
            AuditEvent::new(
                &context,
                "dialogue.turn_processed",
                AuditCategory::Dialogue,
                AuditOutcome::Success,
            )
            .with_metadata("from_step", from_step.as_str())
            .with_metadata("to_step", to_step.as_str())
            .with_metadata("attempts", next_state.attempts.to_string()),
        );

        let reply = if quote_requested {
            info!(
                event_name = "dialogue.quote_requested",
                thread_id = %thread_id,
                correlation_id,
                "shipment confirmed, quote requested"
            );
            self.audit.emit(AuditEvent::new(
                &context,
                "dialogue.quote_requested",
                AuditCategory::Dialogue,
                AuditOutcome::Success,
            ));
            TurnReply::GenerateQuote
        } else {
            TurnReply::Message(outcome.reply)
        };

        Ok(TurnResult { state: next_state, reply })
    }

    pub async fn conversation(
        &self,
        thread_id: &ThreadId,
    ) -> Result<ConversationState, RuntimeError> {
        self.sessions
            .get(thread_id)
            .await?
            .ok_or_else(|| RuntimeError::NotFound(thread_id.clone()))
    }

    /// Attaches an uploaded invoice to an existing thread and leaves a
    /// system note in its message log.
    pub async fn record_invoice_upload(
        &self,
        thread_id: &ThreadId,
        invoice_id: &str,
        file_name: &str,
        correlation_id: &str,
    ) -> Result<ConversationState, RuntimeError> {
        let mut state = self.conversation(thread_id).await?;
        state.attach_invoice(invoice_id);
        state.push_message(MessageRole::System, format!("{INVOICE_UPLOADED_MARKER} {file_name}"));
        state.touch();
        self.sessions.put(state.clone()).await?;

        info!(
            event_name = "dialogue.invoice_recorded",
            thread_id = %thread_id,
            correlation_id,
            invoice_id,
            "invoice attached to conversation"
        );
        let context = AuditContext::new(Some(thread_id.clone()), correlation_id, AUDIT_ACTOR);
        self.audit.emit(
            AuditEvent::new(
                &context,
                "dialogue.invoice_recorded",
                AuditCategory::Persistence,
                AuditOutcome::Success,
            )
            .with_metadata("invoice_id", invoice_id),
        );

        Ok(state)
    }

    /// Called by the quoting collaborator once a quote exists.
    pub async fn mark_quote_generated(
        &self,
        thread_id: &ThreadId,
    ) -> Result<ConversationState, RuntimeError> {
        let mut state = self.conversation(thread_id).await?;
        state.mark_quote_generated()?;
        self.sessions.put(state.clone()).await?;
        Ok(state)
    }

    /// Called by the booking collaborator once the shipment is booked.
    pub async fn mark_completed(
        &self,
        thread_id: &ThreadId,
    ) -> Result<ConversationState, RuntimeError> {
        let mut state = self.conversation(thread_id).await?;
        state.mark_completed()?;
        self.sessions.put(state.clone()).await?;
        Ok(state)
    }
}
