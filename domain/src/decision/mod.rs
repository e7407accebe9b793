//! Decision protocol.
//!
//! Every turn starts with one forced call to a single meta-tool whose
//! arguments say either "answer directly with this text" or "invoke this
//! function with these arguments". The direct answer is wrapped in sentinel
//! characters so it can be shown live while the arguments JSON is still
//! streaming.
//!
//! - [`entities::Decision`]: the decoded choice
//! - [`protocol::DecisionProtocol`]: builds the meta-tool, encodes and decodes decisions
//! - [`sentinel::SentinelDemux`]: splits visible text out of a streamed field
//! - [`escape::JsonStringUnescaper`]: incremental JSON string unescaping for display
//! - [`accumulator::DecisionStreamDecoder`]: per-call accumulation of a streamed response

pub mod accumulator;
pub mod entities;
pub mod escape;
pub mod protocol;
pub mod sentinel;

/// Name of the meta-tool forced on the first inference call of a turn.
pub const DECISION_TOOL_NAME: &str = "use_function_decision";

/// Marks the start of human-visible text inside the `response` field.
pub const START_SENTINEL: char = '\u{2593}';

/// Marks the end of human-visible text inside the `response` field.
pub const END_SENTINEL: char = '\u{2591}';
