pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "freightdesk",
    about = "Freightdesk operator CLI",
    long_about = "Inspect configuration, check readiness, apply migrations, and talk to the shipment intake dialogue.",
    after_help = "Examples:\n  freightdesk doctor --json\n  freightdesk config\n  freightdesk smoke\n  freightdesk chat --thread demo-1"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Run a scripted dialogue against the configured session store")]
    Smoke,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, gazetteer, and session store readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Chat with the intake dialogue over stdin")]
    Chat {
        #[arg(long, help = "Thread identifier (a new one is generated when omitted)")]
        thread: Option<String>,
        #[arg(long, default_value = "local-operator", help = "User identifier owning the thread")]
        user: String,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Smoke => commands::smoke::run(),
        Command::Config => commands::config::run(),
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Chat { thread, user } => {
            let thread = thread.unwrap_or_else(|| format!("cli-{}", uuid::Uuid::new_v4()));
            commands::chat::run(thread, user)
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
