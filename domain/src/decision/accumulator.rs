//! Streamed response accumulation
//!
//! [`DecisionStreamDecoder`] consumes the fragments of one streamed chat
//! completion as they arrive and returns, per fragment, the text to show
//! right away. Plain content is shown verbatim. Tool-call arguments go
//! through a [`SentinelDemux`] and only the first call drives the display;
//! later calls are accumulated silently.
//!
//! A second call that starts while the first one is between its sentinels
//! is recorded as a violation: display stops, accumulation continues, and
//! decoding the decision fails.
//!
//! Once the stream ends, [`finish`](DecisionStreamDecoder::finish) yields a
//! [`StreamedResponse`] holding the full content and every tool call with
//! its raw arguments.

use super::entities::{Decision, DecisionDecodeError};
use super::escape::JsonStringUnescaper;
use super::protocol::DecisionProtocol;
use super::sentinel::{SentinelDemux, SentinelState};
use super::DECISION_TOOL_NAME;
use crate::conversation::entities::ToolCallRecord;

/// Per-call state while a tool call streams in.
#[derive(Debug, Clone)]
pub struct ToolCallAccumulator {
    pub index: usize,
    pub id: Option<String>,
    pub function_name: String,
    demux: SentinelDemux,
}

impl ToolCallAccumulator {
    fn new(index: usize) -> Self {
        Self {
            index,
            id: None,
            function_name: String::new(),
            demux: SentinelDemux::new(),
        }
    }

    pub fn arguments(&self) -> &str {
        self.demux.raw()
    }

    pub fn sentinel_state(&self) -> SentinelState {
        self.demux.state()
    }

    fn into_record(self) -> ToolCallRecord {
        let id = self.id.unwrap_or_else(|| format!("call_{}", self.index));
        ToolCallRecord::new(id, self.function_name, self.demux.into_raw())
    }
}

/// A fully streamed chat completion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamedResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCallRecord>,
    /// Protocol violation observed while streaming.
    pub violation: Option<DecisionDecodeError>,
    /// Whether any decision text reached the display while streaming.
    pub response_streamed: bool,
}

impl StreamedResponse {
    /// Decode the first tool call as a decision.
    ///
    /// Later tool calls are ignored; only one function runs per turn.
    pub fn decision(&self) -> Result<(&ToolCallRecord, Decision), DecisionDecodeError> {
        if let Some(violation) = &self.violation {
            return Err(violation.clone());
        }
        let call = self
            .tool_calls
            .first()
            .ok_or(DecisionDecodeError::NoDecision)?;
        if call.name != DECISION_TOOL_NAME {
            return Err(DecisionDecodeError::UnexpectedToolCall(call.name.clone()));
        }
        let decision = DecisionProtocol::decode(&call.arguments)?;
        Ok((call, decision))
    }
}

#[derive(Debug, Default)]
pub struct DecisionStreamDecoder {
    content: String,
    calls: Vec<ToolCallAccumulator>,
    display_index: Option<usize>,
    unescaper: JsonStringUnescaper,
    violation: Option<DecisionDecodeError>,
    response_streamed: bool,
}

impl DecisionStreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plain assistant text. Shown as-is.
    pub fn on_content(&mut self, text: &str) -> Option<String> {
        self.content.push_str(text);
        (!text.is_empty()).then(|| text.to_string())
    }

    /// One tool-call fragment. Returns the text to show, if any.
    pub fn on_tool_call(
        &mut self,
        index: usize,
        id: Option<&str>,
        name: Option<&str>,
        arguments: Option<&str>,
    ) -> Option<String> {
        let position = match self.calls.iter().position(|c| c.index == index) {
            Some(position) => position,
            None => {
                let streaming_body = self
                    .display_call()
                    .filter(|active| active.sentinel_state() == SentinelState::InBody)
                    .map(|active| active.index);
                if self.violation.is_none()
                    && let Some(first) = streaming_body
                {
                    self.violation = Some(DecisionDecodeError::InterleavedToolCalls {
                        first,
                        second: index,
                    });
                }
                self.calls.push(ToolCallAccumulator::new(index));
                if self.display_index.is_none() {
                    self.display_index = Some(index);
                }
                self.calls.len() - 1
            }
        };

        let drives_display = self.display_index == Some(index) && self.violation.is_none();
        let call = &mut self.calls[position];

        if call.id.is_none()
            && let Some(id) = id.filter(|s| !s.is_empty())
        {
            call.id = Some(id.to_string());
        }
        if call.function_name.is_empty()
            && let Some(name) = name
        {
            call.function_name = name.to_string();
        }

        let fragment = arguments?;
        let visible = call.demux.feed(fragment);

        if !drives_display {
            return None;
        }
        let shown = visible
            .map(|raw| self.unescaper.feed(&raw))
            .filter(|text| !text.is_empty());
        self.response_streamed |= shown.is_some();
        shown
    }

    /// Whether a protocol violation has been observed so far.
    pub fn violation(&self) -> Option<&DecisionDecodeError> {
        self.violation.as_ref()
    }

    fn display_call(&self) -> Option<&ToolCallAccumulator> {
        let index = self.display_index?;
        self.calls.iter().find(|c| c.index == index)
    }

    pub fn finish(self) -> StreamedResponse {
        StreamedResponse {
            violation: self.violation,
            response_streamed: self.response_streamed,
            content: self.content,
            tool_calls: self
                .calls
                .into_iter()
                .map(ToolCallAccumulator::into_record)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_call(decoder: &mut DecisionStreamDecoder, index: usize, fragments: &[&str]) -> String {
        let mut shown = String::new();
        for (i, fragment) in fragments.iter().enumerate() {
            let (id, name) = if i == 0 {
                (Some("call_abc"), Some(DECISION_TOOL_NAME))
            } else {
                (None, None)
            };
            if let Some(text) = decoder.on_tool_call(index, id, name, Some(fragment)) {
                shown.push_str(&text);
            }
        }
        shown
    }

    #[test]
    fn test_direct_answer_streams_and_decodes() {
        let mut decoder = DecisionStreamDecoder::new();
        let shown = feed_call(
            &mut decoder,
            0,
            &[
                "{\"use_function\":false,\"function_name\":null,\"response\":\"",
                "▓Line one\\n",
                "\\\"quoted\\\"",
                "░\",\"function_arguments\":null}",
            ],
        );
        assert_eq!(shown, "Line one\n\"quoted\"");

        let response = decoder.finish();
        let (call, decision) = response.decision().unwrap();
        assert_eq!(call.id, "call_abc");
        assert_eq!(
            decision,
            Decision::Respond {
                text: "Line one\n\"quoted\"".to_string()
            }
        );
    }

    #[test]
    fn test_function_choice_displays_nothing() {
        let mut decoder = DecisionStreamDecoder::new();
        let shown = feed_call(
            &mut decoder,
            0,
            &[
                "{\"use_function\":true,\"function_name\":\"get_balance\",",
                "\"response\":null,\"function_arguments\":\"{\\\"asset\\\":\\\"BTC\\\"}\"}",
            ],
        );
        assert!(shown.is_empty());

        let response = decoder.finish();
        let (_, decision) = response.decision().unwrap();
        assert_eq!(decision.function_name(), Some("get_balance"));
    }

    #[test]
    fn test_only_first_call_drives_display() {
        let mut decoder = DecisionStreamDecoder::new();
        feed_call(&mut decoder, 0, &["{\"response\":\"▓first░\"}"]);
        let shown =
            decoder.on_tool_call(1, Some("call_2"), Some(DECISION_TOOL_NAME), Some("▓second░"));
        assert_eq!(shown, None);

        let response = decoder.finish();
        assert_eq!(response.tool_calls.len(), 2);
        assert_eq!(response.tool_calls[1].arguments, "▓second░");
    }

    #[test]
    fn test_interleaved_call_fails_decode() {
        let mut decoder = DecisionStreamDecoder::new();
        feed_call(&mut decoder, 0, &["{\"response\":\"▓still talking"]);
        decoder.on_tool_call(1, Some("call_2"), Some(DECISION_TOOL_NAME), Some("{"));
        assert!(decoder.violation().is_some());

        // display stops once the violation is recorded
        assert_eq!(decoder.on_tool_call(0, None, None, Some(" more░\"}")), None);

        let response = decoder.finish();
        assert_eq!(response.tool_calls.len(), 2);
        assert_eq!(
            response.decision().unwrap_err(),
            DecisionDecodeError::InterleavedToolCalls { first: 0, second: 1 }
        );
    }

    #[test]
    fn test_plain_content_is_shown() {
        let mut decoder = DecisionStreamDecoder::new();
        assert_eq!(decoder.on_content("Your balance "), Some("Your balance ".to_string()));
        assert_eq!(decoder.on_content(""), None);
        decoder.on_content("is 0.5 BTC.");

        let response = decoder.finish();
        assert_eq!(response.content, "Your balance is 0.5 BTC.");
        assert_eq!(response.decision().unwrap_err(), DecisionDecodeError::NoDecision);
    }

    #[test]
    fn test_unexpected_tool_name() {
        let mut decoder = DecisionStreamDecoder::new();
        decoder.on_tool_call(0, Some("call_1"), Some("get_balance"), Some("{}"));
        let response = decoder.finish();
        assert_eq!(
            response.decision().unwrap_err(),
            DecisionDecodeError::UnexpectedToolCall("get_balance".to_string())
        );
    }

    #[test]
    fn test_missing_id_is_synthesized() {
        let mut decoder = DecisionStreamDecoder::new();
        decoder.on_tool_call(3, None, Some(DECISION_TOOL_NAME), Some("{}"));
        let response = decoder.finish();
        assert_eq!(response.tool_calls[0].id, "call_3");
    }

    #[test]
    fn test_unterminated_response_is_decode_error() {
        let mut decoder = DecisionStreamDecoder::new();
        let shown = feed_call(
            &mut decoder,
            0,
            &["{\"use_function\":false,\"function_name\":null,\"response\":\"▓cut", "\",\"function_arguments\":null}"],
        );
        assert_eq!(shown, "cut\",\"function_arguments\":null}");
        assert_eq!(
            decoder.finish().decision().unwrap_err(),
            DecisionDecodeError::UnterminatedResponse("end")
        );
    }

    #[test]
    fn test_escaped_sentinels_are_not_streamed() {
        let mut decoder = DecisionStreamDecoder::new();
        let shown = feed_call(
            &mut decoder,
            0,
            &["{\"use_function\":false,\"function_name\":null,", "\"response\":\"\\u2593Hi\\u2591\",\"function_arguments\":null}"],
        );
        assert_eq!(shown, "");
        let response = decoder.finish();
        assert!(!response.response_streamed);
        let (_, decision) = response.decision().unwrap();
        assert_eq!(decision, Decision::Respond { text: "Hi".to_string() });
    }

    #[test]
    fn test_sentinel_response_is_marked_streamed() {
        let mut decoder = DecisionStreamDecoder::new();
        feed_call(&mut decoder, 0, &["{\"response\":\"▓Hi", "░\"}"]);
        assert!(decoder.finish().response_streamed);
    }
}
