use std::env;
use std::sync::{Arc, Mutex, OnceLock};

use freightdesk_agent::{AgentRuntime, DialogueEngine};
use freightdesk_cli::commands::{chat, config, doctor, migrate, smoke};
use freightdesk_core::audit::NoopAuditSink;
use freightdesk_core::domain::conversation::{ThreadId, UserId};
use freightdesk_core::flows::DialogueStep;
use freightdesk_db::InMemorySessionStore;
use serde_json::Value;

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(&[("FREIGHTDESK_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_returns_config_failure_for_non_sqlite_url() {
    with_env(&[("FREIGHTDESK_DATABASE_URL", "postgres://localhost/freight")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn smoke_returns_success_report_with_memory_sessions() {
    with_env(&[("FREIGHTDESK_SESSIONS_BACKEND", "memory")], || {
        let result = smoke::run();
        assert_eq!(result.exit_code, 0, "expected successful smoke report: {}", result.output);

        let payload = parse_payload(last_line(&result.output));
        assert_eq!(payload["command"], "smoke");
        assert_eq!(payload["status"], "pass");
        assert_eq!(payload["checks"].as_array().map(Vec::len), Some(4));
    });
}

#[test]
fn smoke_runs_against_sqlite_sessions() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("smoke.db").display());

    let vars =
        [("FREIGHTDESK_SESSIONS_BACKEND", "sqlite"), ("FREIGHTDESK_DATABASE_URL", url.as_str())];
    with_env(&vars, || {
        let first = smoke::run();
        assert_eq!(first.exit_code, 0, "expected successful smoke report: {}", first.output);

        let second = smoke::run();
        assert_eq!(second.exit_code, 0, "smoke should be repeatable against one database");
    });
}

#[test]
fn smoke_returns_failure_when_config_invalid() {
    with_env(&[("FREIGHTDESK_SERVER_PORT", "0")], || {
        let result = smoke::run();
        assert_eq!(result.exit_code, 6, "expected smoke failure code");

        let payload = parse_payload(last_line(&result.output));
        assert_eq!(payload["command"], "smoke");
        assert_eq!(payload["status"], "fail");
        assert_eq!(payload["checks"][1]["status"], "skipped");
    });
}

#[test]
fn doctor_reports_pass_with_memory_sessions() {
    with_env(&[("FREIGHTDESK_EXTRACTION_EXTRA_LOCATIONS", "Kampala,Nairobi")], || {
        let payload = parse_payload(&doctor::run(true));
        assert_eq!(payload["overall_status"], "pass");

        let gazetteer = &payload["checks"][1];
        assert_eq!(gazetteer["name"], "extraction_gazetteer");
        let details = gazetteer["details"].as_str().unwrap_or_default();
        assert!(details.contains("2 from configuration"));
    });
}

#[test]
fn doctor_reports_failure_for_unknown_backend() {
    with_env(&[("FREIGHTDESK_SESSIONS_BACKEND", "redis")], || {
        let output = doctor::run(false);
        assert!(output.starts_with("doctor: one or more readiness checks failed"));
        assert!(output.contains("- [skip] session_store"));
    });
}

#[test]
fn config_attributes_env_sources() {
    let vars = [("FREIGHTDESK_SESSIONS_BACKEND", "sqlite"), ("FREIGHTDESK_LOG_LEVEL", "debug")];
    with_env(&vars, || {
        let result = config::run();
        assert_eq!(result.exit_code, 0);
        assert!(result
            .output
            .contains("- sessions.backend = sqlite (source: env (FREIGHTDESK_SESSIONS_BACKEND))"));
        assert!(result
            .output
            .contains("- logging.level = debug (source: env (FREIGHTDESK_LOG_LEVEL))"));
        assert!(result.output.contains("- server.port = 8080 (source: default)"));
    });
}

#[tokio::test]
async fn chat_session_walks_a_thread_to_the_quote_signal() {
    let agent = AgentRuntime::new(
        DialogueEngine::default(),
        Arc::new(InMemorySessionStore::new()),
        Arc::new(NoopAuditSink),
    );
    let input = b"From Pune\n\nLondon\ngarments in cartons\n800 kg\neconomy\nyes\n/quit\nignored\n";
    let mut output = Vec::new();

    let summary = chat::run_session(
        &agent,
        &UserId("U-chat".to_string()),
        &ThreadId("chat-1".to_string()),
        &input[..],
        &mut output,
    )
    .await
    .expect("chat session");

    assert_eq!(summary.turns, 6);
    assert_eq!(summary.last_step, DialogueStep::ReadyForQuote);
    assert!(summary.quote_requested);

    let transcript = String::from_utf8(output).expect("utf8 transcript");
    assert!(transcript.contains("agent> Got it. Where is the shipment going from Pune?"));
    assert!(transcript.contains("agent> [quote requested for thread `chat-1`]"));
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn last_line(output: &str) -> &str {
    output.lines().last().unwrap_or_default()
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard = ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    let keys = [
        "FREIGHTDESK_DATABASE_URL",
        "FREIGHTDESK_DATABASE_MAX_CONNECTIONS",
        "FREIGHTDESK_DATABASE_TIMEOUT_SECS",
        "FREIGHTDESK_SESSIONS_BACKEND",
        "FREIGHTDESK_EXTRACTION_EXTRA_LOCATIONS",
        "FREIGHTDESK_SERVER_BIND_ADDRESS",
        "FREIGHTDESK_SERVER_PORT",
        "FREIGHTDESK_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "FREIGHTDESK_LOGGING_LEVEL",
        "FREIGHTDESK_LOGGING_FORMAT",
        "FREIGHTDESK_LOG_LEVEL",
        "FREIGHTDESK_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
