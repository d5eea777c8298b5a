pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod flows;

pub use audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
pub use domain::conversation::{
    ChatMessage, ConversationState, MessageRole, ThreadId, UserId, INVOICE_UPLOADED_MARKER,
};
pub use domain::shipment::{ServiceLevel, ShipmentData, SlotField};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use flows::{determine_next_step, ConversationLifecycle, DialogueStep};
