//! Console rendering of a running turn.
//!
//! [`ConsoleDisplay`] implements the [`TurnDisplay`] port: a spinner while
//! waiting, reply text printed as it streams, and one status line per
//! function call.

use crate::output::format::{format_arguments, result_summary};
use crate::progress::Spinner;
use callgate_application::{ReplyKind, TurnDisplay};
use callgate_domain::{ExecutionResult, FunctionArguments};
use colored::Colorize;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

pub struct ConsoleDisplay {
    spinner: Spinner,
    /// Whether the current reply has printed anything yet.
    streaming: AtomicBool,
}

impl ConsoleDisplay {
    pub fn new() -> Self {
        Self {
            spinner: Spinner::new(),
            streaming: AtomicBool::new(false),
        }
    }

    /// No spinner; used when stdout is not a terminal.
    pub fn plain() -> Self {
        Self {
            spinner: Spinner::hidden(),
            streaming: AtomicBool::new(false),
        }
    }

    /// Argument lines for the selection banner. Write functions list them in
    /// the confirmation prompt instead.
    fn selection_arguments(arguments: &FunctionArguments, requires_confirmation: bool) -> Vec<String> {
        if requires_confirmation {
            Vec::new()
        } else {
            format_arguments(arguments)
        }
    }

    fn waiting_message(kind: ReplyKind) -> &'static str {
        match kind {
            ReplyKind::Decision => "Thinking...",
            ReplyKind::Summary => "Summarizing...",
            ReplyKind::Acknowledgement => "Wrapping up...",
        }
    }
}

impl Default for ConsoleDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnDisplay for ConsoleDisplay {
    fn on_reply_start(&self, kind: ReplyKind) {
        self.streaming.store(false, Ordering::SeqCst);
        self.spinner.start(Self::waiting_message(kind));
    }

    fn on_reply_chunk(&self, chunk: &str) {
        if !self.streaming.swap(true, Ordering::SeqCst) {
            self.spinner.clear();
        }
        let mut stdout = io::stdout().lock();
        let _ = write!(stdout, "{}", chunk);
        let _ = stdout.flush();
    }

    fn on_reply_end(&self) {
        self.spinner.clear();
        if self.streaming.swap(false, Ordering::SeqCst) {
            println!();
        }
    }

    fn on_function_selected(&self, name: &str, arguments: &FunctionArguments, requires_confirmation: bool) {
        self.spinner.clear();
        let marker = if requires_confirmation {
            "write".yellow()
        } else {
            "read".green()
        };
        println!("{} {} ({})", "->".cyan(), name.bold(), marker);
        for line in Self::selection_arguments(arguments, requires_confirmation) {
            println!("   {}", line.dimmed());
        }
    }

    fn on_function_start(&self, name: &str) {
        self.spinner.start(format!("Running {}...", name));
    }

    fn on_function_result(&self, name: &str, result: &ExecutionResult) {
        self.spinner.clear();
        let summary = result_summary(result);
        if result.is_success() {
            println!("{} {} {}", "v".green(), name, summary.dimmed());
        } else {
            println!("{} {} {}", "x".red(), name, summary.red());
        }
    }

    fn on_cancelled(&self, name: &str) {
        self.spinner.clear();
        println!("{} {} cancelled", "x".yellow(), name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_write_arguments_are_left_to_the_prompt() {
        let args = json!({"action": "buy", "amountInDollars": 50, "asset": "BTC"});
        let args = args.as_object().unwrap();

        assert!(ConsoleDisplay::selection_arguments(args, true).is_empty());
        assert_eq!(
            ConsoleDisplay::selection_arguments(args, false),
            vec!["action: buy", "amountInDollars: 50", "asset: BTC"]
        );
    }
}
