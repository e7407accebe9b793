//! Incremental JSON string unescaping
//!
//! Visible response text is cut out of a JSON string literal, so it still
//! carries escape sequences (`\n`, `\"`, `\u00e9`). Escapes can be split
//! across fragments; the unescaper holds incomplete sequences until the
//! next fragment completes them.

#[derive(Debug, Clone, Default)]
enum EscapeState {
    #[default]
    Plain,
    /// Saw a backslash.
    Backslash,
    /// Inside `\uXXXX`, collecting hex digits.
    Unicode(String),
}

#[derive(Debug, Clone, Default)]
pub struct JsonStringUnescaper {
    state: EscapeState,
    /// High surrogate waiting for its low half.
    high_surrogate: Option<u16>,
}

impl JsonStringUnescaper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unescape one fragment. Incomplete escapes at the end are held back.
    pub fn feed(&mut self, fragment: &str) -> String {
        let mut out = String::with_capacity(fragment.len());

        for c in fragment.chars() {
            match std::mem::take(&mut self.state) {
                EscapeState::Plain => {
                    if c == '\\' {
                        self.state = EscapeState::Backslash;
                    } else {
                        self.flush_surrogate(&mut out);
                        out.push(c);
                    }
                }
                EscapeState::Backslash => {
                    let decoded = match c {
                        'n' => Some('\n'),
                        't' => Some('\t'),
                        'r' => Some('\r'),
                        'b' => Some('\u{0008}'),
                        'f' => Some('\u{000C}'),
                        '"' => Some('"'),
                        '\\' => Some('\\'),
                        '/' => Some('/'),
                        'u' => None,
                        other => Some(other),
                    };
                    match decoded {
                        Some(ch) => {
                            self.flush_surrogate(&mut out);
                            out.push(ch);
                        }
                        None => self.state = EscapeState::Unicode(String::with_capacity(4)),
                    }
                }
                EscapeState::Unicode(mut digits) => {
                    digits.push(c);
                    if digits.len() < 4 {
                        self.state = EscapeState::Unicode(digits);
                        continue;
                    }
                    match u16::from_str_radix(&digits, 16) {
                        Ok(unit) => self.push_unit(unit, &mut out),
                        Err(_) => {
                            self.flush_surrogate(&mut out);
                            out.push(char::REPLACEMENT_CHARACTER);
                        }
                    }
                }
            }
        }

        out
    }

    fn push_unit(&mut self, unit: u16, out: &mut String) {
        match unit {
            0xD800..=0xDBFF => {
                self.flush_surrogate(out);
                self.high_surrogate = Some(unit);
            }
            0xDC00..=0xDFFF => match self.high_surrogate.take() {
                Some(high) => {
                    let code = 0x10000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(unit) - 0xDC00);
                    out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
                }
                None => out.push(char::REPLACEMENT_CHARACTER),
            },
            _ => {
                self.flush_surrogate(out);
                out.push(char::from_u32(u32::from(unit)).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
        }
    }

    /// A lone high surrogate followed by anything else is unrepresentable.
    fn flush_surrogate(&mut self, out: &mut String) {
        if self.high_surrogate.take().is_some() {
            out.push(char::REPLACEMENT_CHARACTER);
        }
    }
}
