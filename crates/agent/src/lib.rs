//! Shipment intake dialogue
//!
//! This crate turns free-form chat messages into a structured shipment
//! request, one turn at a time:
//! 1. **Extraction** (`extraction`) - heuristic slot filling for origin,
//!    destination, cargo, weight and service level
//! 2. **Dialogue** (`dialogue`) - decides what to ask next and tracks retries
//! 3. **Responses** (`responses`) - prompt and confirmation templates
//! 4. **Runtime** (`runtime`) - loads a thread from the session store, runs a
//!    turn and writes the result back
//!
//! Everything here is deterministic. Quote computation and booking belong to
//! outside collaborators, which the runtime signals with
//! [`runtime::TurnReply::GenerateQuote`].

pub mod dialogue;
pub mod extraction;
pub mod responses;
pub mod runtime;

pub use dialogue::{DialogueEngine, TurnOutcome, GENERATE_QUOTE};
pub use extraction::{Gazetteer, SlotExtractor, StaticGazetteer};
pub use runtime::{AgentRuntime, RuntimeError, TurnReply, TurnResult};
