//! Sentinel demultiplexer
//!
//! Splits the human-visible part out of a field that is streamed one
//! fragment at a time. Visible text sits between a start and an end
//! sentinel; everything else in the field is structured data.
//!
//! ```text
//!           start seen              end seen
//! BeforeStart ─────────▶ InBody ─────────────▶ AfterEnd
//!   (emit nothing)       (emit fragments)      (emit nothing)
//! ```
//!
//! The raw buffer keeps every fragment, sentinels included, because the
//! sentinels are part of the JSON payload parsed after the stream ends.
//! Sentinels are single characters, so one can never be split across two
//! fragments.

use super::{END_SENTINEL, START_SENTINEL};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SentinelState {
    #[default]
    BeforeStart,
    InBody,
    AfterEnd,
}

#[derive(Debug, Clone, Default)]
pub struct SentinelDemux {
    state: SentinelState,
    raw: String,
}

impl SentinelDemux {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SentinelState {
        self.state
    }

    /// Everything fed so far, verbatim.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn into_raw(self) -> String {
        self.raw
    }

    /// Feed one fragment; returns the part of it to display, if any.
    pub fn feed(&mut self, fragment: &str) -> Option<String> {
        self.raw.push_str(fragment);

        let visible = match self.state {
            SentinelState::AfterEnd => return None,
            SentinelState::BeforeStart => {
                let start = fragment.find(START_SENTINEL)?;
                self.state = SentinelState::InBody;
                &fragment[start + START_SENTINEL.len_utf8()..]
            }
            SentinelState::InBody => fragment,
        };

        let visible = match visible.find(END_SENTINEL) {
            Some(end) => {
                self.state = SentinelState::AfterEnd;
                &visible[..end]
            }
            None => visible,
        };

        (!visible.is_empty()).then(|| visible.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(fragments: &[&str]) -> (String, SentinelDemux) {
        let mut demux = SentinelDemux::new();
        let mut shown = String::new();
        for fragment in fragments {
            if let Some(text) = demux.feed(fragment) {
                shown.push_str(&text);
            }
        }
        (shown, demux)
    }

    #[test]
    fn test_split_across_fragments() {
        let fragments = [
            "{\"use_function\":false,\"response\":\"",
            "▓Hel",
            "lo, ",
            "world░",
            "\",\"function_arguments\":null}",
        ];
        let (shown, demux) = run(&fragments);
        assert_eq!(shown, "Hello, world");
        assert_eq!(demux.state(), SentinelState::AfterEnd);
        assert_eq!(demux.raw(), fragments.concat());
    }

    #[test]
    fn test_both_sentinels_in_one_fragment() {
        let (shown, _) = run(&["\"response\":\"▓Hi there░\",\"x\":1"]);
        assert_eq!(shown, "Hi there");
    }

    #[test]
    fn test_sentinel_at_fragment_edges() {
        let (shown, _) = run(&["abc▓", "body", "░", "tail"]);
        assert_eq!(shown, "body");
    }

    #[test]
    fn test_no_sentinels_displays_nothing() {
        let (shown, demux) = run(&["{\"use_function\":true,", "\"function_name\":\"get_balance\"}"]);
        assert!(shown.is_empty());
        assert_eq!(demux.state(), SentinelState::BeforeStart);
    }

    #[test]
    fn test_after_end_ignores_new_start() {
        let (shown, _) = run(&["▓one░", "▓two░"]);
        assert_eq!(shown, "one");
    }

    #[test]
    fn test_unterminated_body_keeps_streaming() {
        let (shown, demux) = run(&["▓partial", " text"]);
        assert_eq!(shown, "partial text");
        assert_eq!(demux.state(), SentinelState::InBody);
    }

    #[test]
    fn test_every_split_point_yields_body() {
        let payload = "{\"response\":\"▓Bonjour à tous░\"}";
        let chars: Vec<char> = payload.chars().collect();
        for split in 0..=chars.len() {
            let head: String = chars[..split].iter().collect();
            let tail: String = chars[split..].iter().collect();
            let (shown, _) = run(&[&head, &tail]);
            assert_eq!(shown, "Bonjour à tous", "split at {}", split);
            assert!(!shown.contains(START_SENTINEL) && !shown.contains(END_SENTINEL));
        }
    }
}
