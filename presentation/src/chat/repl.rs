//! REPL (Read-Eval-Print Loop) for interactive chat

use crate::output::console::ConsoleDisplay;
use crate::output::format::function_row;
use callgate_application::{
    ChatCompletionGateway, FunctionExecutorPort, RunTurnError, RunTurnUseCase,
};
use callgate_domain::{ConversationContext, TurnOutcome};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Slash commands understood by the REPL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Functions,
    History,
    Quit,
    Unknown,
}

impl ReplCommand {
    pub fn parse(input: &str) -> Self {
        match input.split_whitespace().next().unwrap_or_default() {
            "/help" | "/h" | "/?" => ReplCommand::Help,
            "/functions" | "/f" => ReplCommand::Functions,
            "/history" => ReplCommand::History,
            "/quit" | "/exit" | "/q" => ReplCommand::Quit,
            _ => ReplCommand::Unknown,
        }
    }
}

/// Interactive chat REPL
///
/// Owns the conversation for the whole session. Each line runs one turn;
/// Ctrl-C during a turn cancels it and keeps the conversation.
pub struct ChatRepl<G: ChatCompletionGateway + 'static, E: FunctionExecutorPort + 'static> {
    use_case: RunTurnUseCase<G, E>,
    context: ConversationContext,
    history_file: Option<PathBuf>,
}

impl<G: ChatCompletionGateway + 'static, E: FunctionExecutorPort + 'static> ChatRepl<G, E> {
    pub fn new(use_case: RunTurnUseCase<G, E>, context: ConversationContext) -> Self {
        Self {
            use_case,
            context,
            history_file: dirs::data_dir().map(|p| p.join("callgate").join("history.txt")),
        }
    }

    /// Override (or disable, with `None`) the readline history file.
    pub fn with_history_file(mut self, path: Option<PathBuf>) -> Self {
        self.history_file = path;
        self
    }

    pub fn context(&self) -> &ConversationContext {
        &self.context
    }

    /// Run the interactive REPL until `/quit` or Ctrl-D.
    pub async fn run(&mut self) -> RlResult<()> {
        let mut rl = DefaultEditor::new()?;

        if let Some(ref path) = self.history_file {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = rl.load_history(path);
        }

        self.print_welcome();

        loop {
            match rl.readline(">>> ") {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(line);

                    if line.starts_with('/') {
                        if self.handle_command(line) {
                            break;
                        }
                        continue;
                    }

                    self.process_input(line).await;
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Bye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        if let Some(ref path) = self.history_file {
            let _ = rl.save_history(path);
        }

        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│                  callgate                   │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        println!(
            "Functions: {}",
            self.use_case.executor().function_names().join(", ")
        );
        println!("Write functions ask for confirmation before they run.");
        println!();
        Self::print_help();
    }

    fn print_help() {
        println!("Commands:");
        println!("  /help, /h, /?     - Show this help");
        println!("  /functions, /f    - List available functions");
        println!("  /history          - Show conversation size");
        println!("  /quit, /exit, /q  - Exit chat");
        println!();
        println!("Ctrl-C cancels a running turn, Ctrl-D exits.");
        println!();
    }

    /// Handle slash commands. Returns true if should exit.
    fn handle_command(&self, line: &str) -> bool {
        match ReplCommand::parse(line) {
            ReplCommand::Quit => {
                println!("Bye!");
                return true;
            }
            ReplCommand::Help => {
                println!();
                Self::print_help();
            }
            ReplCommand::Functions => {
                println!();
                for schema in self.use_case.executor().list_schemas() {
                    println!("  {}", function_row(&schema));
                }
                println!();
            }
            ReplCommand::History => {
                println!(
                    "{} messages, {} exchanges",
                    self.context.len(),
                    self.context.exchange_count()
                );
            }
            ReplCommand::Unknown => {
                println!("Unknown command: {}", line);
                println!("Type /help for available commands");
            }
        }
        false
    }

    async fn process_input(&mut self, input: &str) {
        println!();
        match self.run_turn(input).await {
            Ok(outcome) => debug!(function = ?outcome.function(), "Turn finished"),
            Err(e) if e.is_cancelled() => println!("{}", "Turn cancelled.".yellow()),
            Err(e) => eprintln!("{} {}", "Error:".red().bold(), e),
        }
        println!();
    }

    /// Run one turn, cancelling it on Ctrl-C.
    pub async fn run_turn(&mut self, input: &str) -> Result<TurnOutcome, RunTurnError> {
        let token = CancellationToken::new();
        let use_case = self.use_case.clone().with_cancellation(token.clone());
        let display = ConsoleDisplay::new();

        let turn = use_case.execute(&mut self.context, input, &display);
        tokio::pin!(turn);

        loop {
            tokio::select! {
                result = &mut turn => return result,
                _ = tokio::signal::ctrl_c(), if !token.is_cancelled() => {
                    debug!("Ctrl-C received, cancelling turn");
                    token.cancel();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(ReplCommand::parse("/help"), ReplCommand::Help);
        assert_eq!(ReplCommand::parse("/?"), ReplCommand::Help);
        assert_eq!(ReplCommand::parse("/functions"), ReplCommand::Functions);
        assert_eq!(ReplCommand::parse("/history"), ReplCommand::History);
        assert_eq!(ReplCommand::parse("/q"), ReplCommand::Quit);
        assert_eq!(ReplCommand::parse("/quit now"), ReplCommand::Quit);
        assert_eq!(ReplCommand::parse("/models"), ReplCommand::Unknown);
    }
}
