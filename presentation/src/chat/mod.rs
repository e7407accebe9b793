//! Interactive chat module
//!
//! Provides the readline-based chat REPL and the single-turn runner.

mod repl;

pub use repl::{ChatRepl, ReplCommand};
