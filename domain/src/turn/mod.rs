//! Turn lifecycle.
//!
//! - [`entities::TurnPhase`]: the per-turn state machine
//! - [`entities::TurnOutcome`]: how a completed turn ended

pub mod entities;
