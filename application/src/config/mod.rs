//! Application-level configuration.
//!
//! - [`TurnParams`]: knobs of the turn loop (confirmation timeout, cancellation wording)

pub mod turn_params;

pub use turn_params::TurnParams;
