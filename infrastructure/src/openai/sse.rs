//! Server-Sent Events line decoding
//!
//! HTTP body chunks can end anywhere, including mid-line and in the middle
//! of a multi-byte UTF-8 sequence. [`SseLineBuffer`] keeps the incomplete
//! tail as bytes and only decodes whole lines.

/// One meaningful SSE line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseLine {
    /// Payload of a `data:` field.
    Data(String),
    /// The `data: [DONE]` terminator.
    Done,
}

#[derive(Debug, Default)]
pub struct SseLineBuffer {
    pending: Vec<u8>,
}

impl SseLineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a body chunk and return the complete lines it finished.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseLine> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(newline) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=newline).collect();
            if let Some(parsed) = parse_line(&line) {
                lines.push(parsed);
            }
        }
        lines
    }

    /// Flush a final line that was not newline-terminated.
    pub fn finish(&mut self) -> Option<SseLine> {
        let rest = std::mem::take(&mut self.pending);
        parse_line(&rest)
    }
}

fn parse_line(raw: &[u8]) -> Option<SseLine> {
    let line = String::from_utf8_lossy(raw);
    let line = line.trim_end_matches(['\r', '\n']);

    // comments (": keep-alive") and other fields (event:, id:, retry:)
    let data = line.strip_prefix("data:")?;
    let data = data.strip_prefix(' ').unwrap_or(data);

    if data == "[DONE]" {
        Some(SseLine::Done)
    } else if data.is_empty() {
        None
    } else {
        Some(SseLine::Data(data.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_split_across_chunks() {
        let mut buffer = SseLineBuffer::new();
        assert!(buffer.feed(b"data: {\"a\"").is_empty());
        assert_eq!(
            buffer.feed(b":1}\n\ndata: [DONE]\n"),
            vec![SseLine::Data("{\"a\":1}".to_string()), SseLine::Done]
        );
    }

    #[test]
    fn test_utf8_split_mid_sequence() {
        // U+2593 is three bytes: e2 96 93
        let mut buffer = SseLineBuffer::new();
        assert!(buffer.feed(b"data: \xe2\x96").is_empty());
        assert_eq!(
            buffer.feed(b"\x93x\n"),
            vec![SseLine::Data("\u{2593}x".to_string())]
        );
    }

    #[test]
    fn test_comments_and_crlf() {
        let mut buffer = SseLineBuffer::new();
        let lines = buffer.feed(b": keep-alive\r\nevent: message\r\ndata:{}\r\n\r\n");
        assert_eq!(lines, vec![SseLine::Data("{}".to_string())]);
    }

    #[test]
    fn test_finish_flushes_unterminated_line() {
        let mut buffer = SseLineBuffer::new();
        buffer.feed(b"data: [DONE]");
        assert_eq!(buffer.finish(), Some(SseLine::Done));
        assert_eq!(buffer.finish(), None);
    }
}
