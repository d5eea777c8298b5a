use std::io::Write;

use crate::commands::{build_runtime, CommandResult};
use freightdesk_agent::{AgentRuntime, TurnReply};
use freightdesk_core::config::{AppConfig, LoadOptions};
use freightdesk_core::domain::conversation::{ThreadId, UserId};
use freightdesk_core::flows::DialogueStep;
use freightdesk_db::open_session_store;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatSummary {
    pub turns: usize,
    pub last_step: DialogueStep,
    pub quote_requested: bool,
}

pub fn run(thread: String, user: String) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "chat",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "chat",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let user = UserId(user);
    let thread = ThreadId(thread);
    let result = runtime.block_on(async {
        let sessions = open_session_store(&config)
            .await
            .map_err(|error| (error.class(), error.to_string(), 4u8))?;
        let agent = build_runtime(&config, sessions);
        let stdin = BufReader::new(tokio::io::stdin());
        let mut stdout = std::io::stdout();
        run_session(&agent, &user, &thread, stdin, &mut stdout)
            .await
            .map_err(|error| ("chat_session", error.to_string(), 5u8))
    });

    match result {
        Ok(summary) => CommandResult::success(
            "chat",
            format!(
                "{} turns on thread `{thread}`, last step `{}`{}",
                summary.turns,
                summary.last_step,
                if summary.quote_requested { ", quote requested" } else { "" }
            ),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("chat", error_class, message, exit_code)
        }
    }
}

/// Feeds each non-empty input line to the runtime until EOF or `/quit`.
pub async fn run_session<R, W>(
    agent: &AgentRuntime,
    user: &UserId,
    thread: &ThreadId,
    reader: R,
    writer: &mut W,
) -> anyhow::Result<ChatSummary>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut summary =
        ChatSummary { turns: 0, last_step: DialogueStep::Greeting, quote_requested: false };
    writeln!(writer, "chatting on thread `{thread}` as `{user}` (type /quit to leave)")?;
    writer.flush()?;

    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if matches!(text, "/quit" | "/exit") {
            break;
        }

        let correlation_id = format!("chat-{thread}-{}", summary.turns + 1);
        let result = agent.handle_thread_message(user, thread, text, &correlation_id).await?;
        summary.turns += 1;
        summary.last_step = result.state.current_step();

        match result.reply {
            TurnReply::Message(reply) => writeln!(writer, "agent> {reply}")?,
            TurnReply::GenerateQuote => {
                summary.quote_requested = true;
                writeln!(writer, "agent> [quote requested for thread `{thread}`]")?;
            }
            TurnReply::Silent => {}
        }
        writer.flush()?;
    }

    Ok(summary)
}
