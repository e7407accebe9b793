//! Inference session streaming.
//!
//! - [`stream::StreamEvent`]: one event of a streamed chat completion

pub mod stream;
