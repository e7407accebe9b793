//! Presentation layer for callgate
//!
//! This crate contains the CLI definition, the chat REPL, the console
//! turn display and the interactive confirmation prompt.

pub mod chat;
pub mod cli;
pub mod confirmation;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use chat::{ChatRepl, ReplCommand};
pub use cli::commands::Cli;
pub use confirmation::InteractiveConfirmation;
pub use output::console::ConsoleDisplay;
pub use progress::Spinner;
