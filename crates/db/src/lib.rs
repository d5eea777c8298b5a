//! Session persistence for the dialogue engine.
//!
//! A [`SessionStore`] maps thread identifiers to their `ConversationState`.
//! Two backends ship here:
//! - [`InMemorySessionStore`] for tests and the interactive CLI
//! - [`SqlSessionStore`] backed by SQLite for long-running deployments
//!
//! Stores are constructed explicitly, usually through [`open_session_store`],
//! and injected into the agent runtime.

pub mod connection;
pub mod migrations;
pub mod repositories;
pub mod sessions;

pub use connection::{connect, connect_for, connect_with_settings, ping, DbPool};
pub use repositories::{InMemorySessionStore, SessionStore, SessionStoreError, SqlSessionStore};
pub use sessions::{open_session_store, OpenStoreError};
