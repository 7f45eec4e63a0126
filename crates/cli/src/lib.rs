pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use commands::chat::ChatOptions;

#[derive(Debug, Parser)]
#[command(
    name = "loja",
    about = "Loja operator CLI",
    long_about = "Operate the shop bot from a terminal without a Telegram token.",
    after_help = "Examples:\n  loja config\n  loja migrate\n  loja catalog\n  loja chat --memory --name Maria"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Print every catalog category as the bot lists it")]
    Catalog,
    #[command(about = "Talk to the shop from this terminal, one message per line")]
    Chat {
        #[arg(long, default_value = "local", help = "User id the session is stored under")]
        user: String,
        #[arg(long, help = "First name used in the greeting")]
        name: Option<String>,
        #[arg(long, help = "Keep the session in memory instead of the configured database")]
        memory: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Catalog => commands::catalog::run(),
        Command::Chat { user, name, memory } => {
            commands::chat::run(ChatOptions { user_id: user, first_name: name, memory })
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Command};

    #[test]
    fn chat_arguments_are_parsed() {
        let cli =
            Cli::try_parse_from(["loja", "chat", "--user", "42", "--name", "Maria", "--memory"])
                .expect("valid arguments");

        let Command::Chat { user, name, memory } = cli.command else {
            panic!("expected chat command");
        };
        assert_eq!(user, "42");
        assert_eq!(name.as_deref(), Some("Maria"));
        assert!(memory);
    }

    #[test]
    fn chat_defaults_to_local_user_and_configured_store() {
        let cli = Cli::try_parse_from(["loja", "chat"]).expect("valid arguments");

        let Command::Chat { user, name, memory } = cli.command else {
            panic!("expected chat command");
        };
        assert_eq!(user, "local");
        assert_eq!(name, None);
        assert!(!memory);
    }
}
