use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::shipment::ShipmentData;
use crate::errors::DomainError;
use crate::flows::engine::determine_next_step;
use crate::flows::states::{ConversationLifecycle, DialogueStep};

/// Marker the invoice collaborator injects into a thread when a file lands.
pub const INVOICE_UPLOADED_MARKER: &str = "Invoice uploaded:";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadId(pub String);

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Dialogue state for one thread.
///
/// The current step is never stored; [`ConversationState::current_step`]
/// derives it from the lifecycle marker and the collected data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    pub thread_id: ThreadId,
    pub user_id: UserId,
    pub lifecycle: ConversationLifecycle,
    pub shipment: ShipmentData,
    pub invoice_ids: Vec<String>,
    pub messages: Vec<ChatMessage>,
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl ConversationState {
    pub fn new(user_id: UserId, thread_id: ThreadId) -> Self {
        let now = Utc::now();
        Self {
            thread_id,
            user_id,
            lifecycle: ConversationLifecycle::New,
            shipment: ShipmentData::default(),
            invoice_ids: Vec::new(),
            messages: Vec::new(),
            attempts: 0,
            created_at: now,
            last_activity: now,
        }
    }

    pub fn current_step(&self) -> DialogueStep {
        match self.lifecycle {
            ConversationLifecycle::New => DialogueStep::Greeting,
            ConversationLifecycle::QuoteGenerated => DialogueStep::QuoteGenerated,
            ConversationLifecycle::Completed => DialogueStep::Completed,
            ConversationLifecycle::Collecting => collecting_step(&self.shipment),
        }
    }

    pub fn push_message(&mut self, role: MessageRole, content: impl Into<String>) {
        self.messages.push(ChatMessage { role, content: content.into(), timestamp: Utc::now() });
    }

    pub fn attach_invoice(&mut self, invoice_id: impl Into<String>) {
        self.invoice_ids.push(invoice_id.into());
    }

    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    pub fn mark_quote_generated(&mut self) -> Result<(), DomainError> {
        if self.current_step() != DialogueStep::ReadyForQuote {
            return Err(DomainError::InvalidLifecycleTransition {
                from: self.current_step(),
                to: DialogueStep::QuoteGenerated,
            });
        }
        self.lifecycle = ConversationLifecycle::QuoteGenerated;
        self.touch();
        Ok(())
    }

    pub fn mark_completed(&mut self) -> Result<(), DomainError> {
        if self.lifecycle != ConversationLifecycle::QuoteGenerated {
            return Err(DomainError::InvalidLifecycleTransition {
                from: self.current_step(),
                to: DialogueStep::Completed,
            });
        }
        self.lifecycle = ConversationLifecycle::Completed;
        self.touch();
        Ok(())
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.thread_id.0.trim().is_empty() {
            return Err(DomainError::InvariantViolation("thread id must not be empty".to_owned()));
        }
        if self.user_id.0.trim().is_empty() {
            return Err(DomainError::InvariantViolation("user id must not be empty".to_owned()));
        }
        if let (Some(origin), Some(destination)) =
            (&self.shipment.origin, &self.shipment.destination)
        {
            if origin.eq_ignore_ascii_case(destination) {
                return Err(DomainError::InvariantViolation(format!(
                    "destination `{destination}` must differ from origin"
                )));
            }
        }
        Ok(())
    }
}

/// Quotable data without a service level still gets one service-level
/// question; the collect_service_level turn always sets it.
fn collecting_step(shipment: &ShipmentData) -> DialogueStep {
    match determine_next_step(shipment) {
        DialogueStep::ReadyForQuote if shipment.service_level.is_none() => {
            DialogueStep::CollectServiceLevel
        }
        step => step,
    }
}

pub fn is_invoice_notification(text: &str) -> bool {
    text.contains(INVOICE_UPLOADED_MARKER)
}

#[cfg(test)]
mod tests {
    use crate::domain::conversation::{
        is_invoice_notification, ConversationState, MessageRole, ThreadId, UserId,
    };
    use crate::domain::shipment::{ServiceLevel, ShipmentData};
    use crate::errors::DomainError;
    use crate::flows::states::{ConversationLifecycle, DialogueStep};

    fn state() -> ConversationState {
        ConversationState::new(UserId("U-100".to_owned()), ThreadId("thread-1".to_owned()))
    }

    fn quotable() -> ShipmentData {
        ShipmentData {
            origin: Some("Mumbai".to_owned()),
            destination: Some("Dubai".to_owned()),
            cargo: Some("electronics".to_owned()),
            weight: Some("100 kg".to_owned()),
            service_level: None,
        }
    }

    #[test]
    fn fresh_state_starts_at_greeting() {
        let state = state();
        assert_eq!(state.current_step(), DialogueStep::Greeting);
        assert_eq!(state.attempts, 0);
        assert!(state.shipment.is_empty());
        assert!(state.messages.is_empty());
    }

    #[test]
    fn collecting_step_follows_data() {
        let mut state = state();
        state.lifecycle = ConversationLifecycle::Collecting;
        assert_eq!(state.current_step(), DialogueStep::CollectOrigin);

        state.shipment.origin = Some("Delhi".to_owned());
        assert_eq!(state.current_step(), DialogueStep::CollectDestination);
    }

    #[test]
    fn quotable_data_without_service_level_asks_for_it_once() {
        let mut state = state();
        state.lifecycle = ConversationLifecycle::Collecting;
        state.shipment = quotable();
        assert_eq!(state.current_step(), DialogueStep::CollectServiceLevel);

        state.shipment.service_level = Some(ServiceLevel::Standard);
        assert_eq!(state.current_step(), DialogueStep::ReadyForQuote);
    }

    #[test]
    fn quote_generation_requires_ready_state() {
        let mut state = state();
        let error = state.mark_quote_generated().expect_err("greeting cannot be quoted");
        assert!(matches!(
            error,
            DomainError::InvalidLifecycleTransition { from: DialogueStep::Greeting, .. }
        ));

        state.lifecycle = ConversationLifecycle::Collecting;
        state.shipment = quotable();
        state.shipment.service_level = Some(ServiceLevel::Express);
        state.mark_quote_generated().expect("ready state can be quoted");
        assert_eq!(state.current_step(), DialogueStep::QuoteGenerated);

        state.mark_completed().expect("quoted state can complete");
        assert_eq!(state.current_step(), DialogueStep::Completed);
    }

    #[test]
    fn validate_rejects_destination_equal_to_origin() {
        let mut state = state();
        state.shipment.origin = Some("Pune".to_owned());
        state.shipment.destination = Some("pune".to_owned());

        assert!(matches!(state.validate(), Err(DomainError::InvariantViolation(_))));
    }

    #[test]
    fn messages_and_invoices_append_in_order() {
        let mut state = state();
        state.push_message(MessageRole::User, "hello");
        state.push_message(MessageRole::Assistant, "hi there");
        state.attach_invoice("INV-1");
        state.attach_invoice("INV-2");

        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages[0].role, MessageRole::User);
        assert_eq!(state.invoice_ids, vec!["INV-1".to_owned(), "INV-2".to_owned()]);
    }

    #[test]
    fn invoice_marker_is_detected_anywhere_in_text() {
        assert!(is_invoice_notification("Invoice uploaded: march.pdf"));
        assert!(is_invoice_notification("[system] Invoice uploaded: a.pdf"));
        assert!(!is_invoice_notification("I uploaded an invoice"));
    }
}
