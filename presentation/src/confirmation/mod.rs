//! Operator confirmation at the terminal

mod interactive;

pub use interactive::{InteractiveConfirmation, parse_answer};
