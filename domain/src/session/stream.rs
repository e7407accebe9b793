//! Streaming events for chat completion responses.
//!
//! [`StreamEvent`] bridges the provider's incremental wire format to the
//! application layer, enabling live display of model output and
//! incremental decoding of tool-call arguments.

/// An event in a streaming chat completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A plain text chunk from the model.
    Delta(String),

    /// Incremental tool call data.
    ///
    /// Tool calls arrive in chunks: first `id` and `name`, then incremental
    /// `arguments_delta` fragments that must be concatenated. `index`
    /// identifies which tool call the delta belongs to.
    ToolCallDelta {
        index: usize,
        id: Option<String>,
        name: Option<String>,
        arguments_delta: Option<String>,
    },

    /// The stream finished normally.
    Completed { finish_reason: Option<String> },

    /// The stream failed part-way.
    Error(String),
}

impl StreamEvent {
    /// Returns the text content if this is a Delta event.
    pub fn text(&self) -> Option<&str> {
        match self {
            StreamEvent::Delta(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true if this event signals the end of the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Completed { .. } | StreamEvent::Error(_))
    }
}
