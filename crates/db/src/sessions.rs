use std::sync::Arc;

use freightdesk_core::config::{AppConfig, SessionBackend};
use sqlx::migrate::MigrateError;
use thiserror::Error;

use crate::connection::connect_for;
use crate::migrations;
use crate::repositories::{InMemorySessionStore, SessionStore, SqlSessionStore};

#[derive(Debug, Error)]
pub enum OpenStoreError {
    #[error("database connection failed: {0}")]
    Connect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migrate(#[source] MigrateError),
}

impl OpenStoreError {
    /// Stable class name for operator-facing reports.
    pub fn class(&self) -> &'static str {
        match self {
            Self::Connect(_) => "db_connectivity",
            Self::Migrate(_) => "migration",
        }
    }
}

/// Opens the store selected by `sessions.backend`. SQLite is migrated before
/// it is handed out.
pub async fn open_session_store(
    config: &AppConfig,
) -> Result<Arc<dyn SessionStore>, OpenStoreError> {
    match config.sessions.backend {
        SessionBackend::Memory => Ok(Arc::new(InMemorySessionStore::new())),
        SessionBackend::Sqlite => {
            let pool = connect_for(&config.database).await.map_err(OpenStoreError::Connect)?;
            migrations::run_pending(&pool).await.map_err(OpenStoreError::Migrate)?;
            Ok(Arc::new(SqlSessionStore::new(pool)))
        }
    }
}
