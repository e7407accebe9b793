//! CLI command definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for callgate
#[derive(Parser, Debug)]
#[command(name = "callgate")]
#[command(author, version, about = "Terminal assistant that calls functions only after you say yes")]
#[command(long_about = r#"
callgate is a chat assistant that can act on your behalf: check balances,
place market orders, send email and manage your calendar.

Every turn the model either answers directly or picks exactly one function.
Functions that change something (orders, email, new events) run only after
you confirm them at a y/n prompt.

Configuration files are loaded from (in priority order):
1. CALLGATE_* environment variables
2. --config <path>       Explicit config file
3. ./callgate.toml       Project-level config
4. ~/.config/callgate/config.toml   Global config

Example:
  callgate                          Start the chat REPL
  callgate "What's my BTC balance?"  Run a single turn
  callgate --yes "Buy $20 of ETH"    Approve without prompting
"#)]
pub struct Cli {
    /// Prompt for a single turn (starts the chat REPL when omitted)
    pub prompt: Option<String>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Write diagnostic logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Append the conversation transcript (JSONL) to this file
    #[arg(long, value_name = "PATH")]
    pub conversation_log: Option<PathBuf>,

    /// Approve every confirmation without prompting
    #[arg(short, long)]
    pub yes: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_one_shot_with_flags() {
        let cli = Cli::parse_from(["callgate", "-vv", "--yes", "check my balance"]);
        assert_eq!(cli.verbose, 2);
        assert!(cli.yes);
        assert_eq!(cli.prompt.as_deref(), Some("check my balance"));
    }

    #[test]
    fn test_repl_by_default() {
        let cli = Cli::parse_from(["callgate", "--conversation-log", "/tmp/t.jsonl"]);
        assert!(cli.prompt.is_none());
        assert!(!cli.yes);
        assert_eq!(cli.conversation_log, Some(PathBuf::from("/tmp/t.jsonl")));
    }
}
