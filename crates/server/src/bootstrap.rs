use std::sync::Arc;

use freightdesk_agent::{AgentRuntime, DialogueEngine};
use freightdesk_core::audit::{AuditEvent, AuditSink};
use freightdesk_core::config::{AppConfig, ConfigError, LoadOptions};
use freightdesk_db::{open_session_store, OpenStoreError, SessionStore};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub sessions: Arc<dyn SessionStore>,
    pub runtime: Arc<AgentRuntime>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    SessionStore(#[from] OpenStoreError),
}

/// Writes audit events to the structured log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogAuditSink;

impl AuditSink for LogAuditSink {
    fn emit(&self, event: AuditEvent) {
        info!(
            event_name = "system.audit",
            audit_event = %event.event_type,
            audit_id = %event.event_id,
            category = ?event.category,
            outcome = ?event.outcome,
            correlation_id = %event.correlation_id,
            thread_id = event.thread_id.as_ref().map(|id| id.0.as_str()).unwrap_or("unknown"),
            metadata = ?event.metadata,
            "audit event"
        );
    }
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        session_backend = config.sessions.backend.as_str(),
        "starting application bootstrap"
    );

    let sessions = open_session_store(&config).await?;
    let engine = DialogueEngine::from_config(&config.extraction);
    let runtime = Arc::new(AgentRuntime::new(engine, sessions.clone(), Arc::new(LogAuditSink)));

    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        session_backend = sessions.backend_name(),
        "dialogue runtime initialized"
    );

    Ok(Application { config, sessions, runtime })
}
