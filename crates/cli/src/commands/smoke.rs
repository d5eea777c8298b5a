use std::time::Instant;

use crate::commands::{build_runtime, CommandResult};
use freightdesk_agent::{AgentRuntime, TurnReply};
use freightdesk_core::config::{AppConfig, LoadOptions};
use freightdesk_core::domain::conversation::{ThreadId, UserId};
use freightdesk_core::flows::DialogueStep;
use freightdesk_db::open_session_store;
use serde::Serialize;
use uuid::Uuid;

const SMOKE_USER: &str = "smoke-operator";

/// Scripted turns and the step each one should land on.
const SCRIPT: [(&str, DialogueStep); 3] = [
    ("Mumbai", DialogueStep::CollectDestination),
    ("Dubai", DialogueStep::CollectCargo),
    ("electronics and spare parts, 120 kg, express", DialogueStep::ReadyForQuote),
];

const CONFIRMATION: &str = "yes, proceed";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum SmokeStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct SmokeCheck {
    name: &'static str,
    status: SmokeStatus,
    elapsed_ms: u64,
    message: String,
}

#[derive(Debug, Serialize)]
struct SmokeReport {
    command: &'static str,
    status: SmokeStatus,
    summary: String,
    total_elapsed_ms: u64,
    checks: Vec<SmokeCheck>,
}

pub fn run() -> CommandResult {
    let started = Instant::now();
    let mut checks = Vec::new();

    let config = match timed_check(|| AppConfig::load(LoadOptions::default())) {
        Ok((elapsed_ms, config)) => {
            checks.push(SmokeCheck {
                name: "config_validation",
                status: SmokeStatus::Pass,
                elapsed_ms,
                message: "configuration loaded and validated".to_string(),
            });
            config
        }
        Err((elapsed_ms, error)) => {
            checks.push(SmokeCheck {
                name: "config_validation",
                status: SmokeStatus::Fail,
                elapsed_ms,
                message: error.to_string(),
            });
            checks.push(skipped("session_store"));
            checks.push(skipped("dialogue_script"));
            checks.push(skipped("quote_signal"));
            return finalize_report(checks, elapsed_since(started));
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            checks.push(SmokeCheck {
                name: "session_store",
                status: SmokeStatus::Fail,
                elapsed_ms: 0,
                message: format!("failed to initialize async runtime: {error}"),
            });
            checks.push(skipped("dialogue_script"));
            checks.push(skipped("quote_signal"));
            return finalize_report(checks, elapsed_since(started));
        }
    };

    let store_started = Instant::now();
    let sessions = match runtime.block_on(open_session_store(&config)) {
        Ok(sessions) => {
            checks.push(SmokeCheck {
                name: "session_store",
                status: SmokeStatus::Pass,
                elapsed_ms: elapsed_since(store_started),
                message: format!("{} session store opened", sessions.backend_name()),
            });
            sessions
        }
        Err(error) => {
            checks.push(SmokeCheck {
                name: "session_store",
                status: SmokeStatus::Fail,
                elapsed_ms: elapsed_since(store_started),
                message: format!("{}: {error}", error.class()),
            });
            checks.push(skipped("dialogue_script"));
            checks.push(skipped("quote_signal"));
            return finalize_report(checks, elapsed_since(started));
        }
    };

    let agent = build_runtime(&config, sessions);
    let user = UserId(SMOKE_USER.to_string());
    let thread = ThreadId(format!("smoke-{}", Uuid::new_v4()));

    let script_started = Instant::now();
    let script_result = runtime.block_on(run_script(&agent, &user, &thread));
    let script_ok = script_result.is_ok();
    checks.push(SmokeCheck {
        name: "dialogue_script",
        status: if script_ok { SmokeStatus::Pass } else { SmokeStatus::Fail },
        elapsed_ms: elapsed_since(script_started),
        message: script_result.unwrap_or_else(|error| error),
    });

    if !script_ok {
        checks.push(skipped("quote_signal"));
        return finalize_report(checks, elapsed_since(started));
    }

    let quote_started = Instant::now();
    let quote_result = runtime.block_on(async {
        agent.handle_thread_message(&user, &thread, CONFIRMATION, "smoke").await
    });
    let (status, message) = match quote_result {
        Ok(result) if result.reply == TurnReply::GenerateQuote => {
            (SmokeStatus::Pass, "confirmation produced the quote signal".to_string())
        }
        Ok(result) => {
            (SmokeStatus::Fail, format!("expected the quote signal, got {:?}", result.reply))
        }
        Err(error) => (SmokeStatus::Fail, format!("confirmation turn failed: {error}")),
    };
    checks.push(SmokeCheck {
        name: "quote_signal",
        status,
        elapsed_ms: elapsed_since(quote_started),
        message,
    });

    finalize_report(checks, elapsed_since(started))
}

async fn run_script(
    agent: &AgentRuntime,
    user: &UserId,
    thread: &ThreadId,
) -> Result<String, String> {
    for (turn, (text, expected)) in SCRIPT.iter().enumerate() {
        let result = agent
            .handle_thread_message(user, thread, text, "smoke")
            .await
            .map_err(|error| format!("turn {} failed: {error}", turn + 1))?;
        let step = result.state.current_step();
        if step != *expected {
            return Err(format!("turn {} landed on `{step}`, expected `{expected}`", turn + 1));
        }
    }
    Ok(format!("{} scripted turns reached ready_for_quote on thread `{thread}`", SCRIPT.len()))
}

fn timed_check<T, E>(check: impl FnOnce() -> Result<T, E>) -> Result<(u64, T), (u64, E)> {
    let started = Instant::now();
    match check() {
        Ok(value) => Ok((elapsed_since(started), value)),
        Err(error) => Err((elapsed_since(started), error)),
    }
}

fn elapsed_since(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn skipped(name: &'static str) -> SmokeCheck {
    SmokeCheck {
        name,
        status: SmokeStatus::Skipped,
        elapsed_ms: 0,
        message: "skipped due previous failure".to_string(),
    }
}

fn finalize_report(checks: Vec<SmokeCheck>, total_elapsed_ms: u64) -> CommandResult {
    let passed = checks.iter().filter(|check| check.status == SmokeStatus::Pass).count();
    let total = checks.len();
    let failed = checks.iter().any(|check| check.status == SmokeStatus::Fail);

    let report = SmokeReport {
        command: "smoke",
        status: if failed { SmokeStatus::Fail } else { SmokeStatus::Pass },
        summary: format!("smoke: {passed}/{total} checks passed in {total_elapsed_ms}ms"),
        total_elapsed_ms,
        checks,
    };

    let human = report.summary.clone();
    let machine = serde_json::to_string(&report).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"smoke\",\"status\":\"fail\",\"summary\":\"serialization failed\",\"error\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    });

    CommandResult { exit_code: if failed { 6 } else { 0 }, output: format!("{human}\n{machine}") }
}
