/// A line grew past the configured maximum length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Frame exceeds the maximum length of {max} bytes")]
pub struct LineTooLong {
    pub max: usize,
}

/// Reassembles complete lines from arbitrarily split transport chunks.
///
/// Chunks are decoded as UTF-8 as they arrive. A code point split across two
/// chunks is carried over until its remaining bytes arrive, invalid sequences
/// are replaced with `U+FFFD`.
#[derive(Debug, Default)]
pub struct LineBuffer {
    /// Decoded text after the last newline seen so far.
    pending: String,

    /// Trailing bytes of an incomplete code point.
    carry: Vec<u8>,

    max_length: Option<usize>,

    /// Set once a line exceeded `max_length`. No further input is accepted.
    overflow: Option<LineTooLong>,
}

impl LineBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject lines longer than `max` bytes, terminator excluded.
    #[must_use]
    pub fn with_max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    /// Append `chunk`, returning every line it completed, in order.
    ///
    /// Returned lines do not include their `\n` terminator. Once a line
    /// exceeds the maximum length, only the lines before it are returned and
    /// [`overflow`](Self::overflow) reports the failure.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        if self.overflow.is_some() {
            return vec![];
        }

        self.decode(chunk);

        let mut lines: Vec<String> = match self.pending.rfind('\n') {
            Some(end) => {
                let rest = self.pending.split_off(end + 1);
                let complete = std::mem::replace(&mut self.pending, rest);

                complete[..end].split('\n').map(str::to_owned).collect()
            }
            None => vec![],
        };

        let Some(max) = self.max_length else {
            return lines;
        };

        if let Some(at) = lines.iter().position(|line| line.len() > max) {
            lines.truncate(at);
            self.fail(max);
        } else if self.pending.len() > max {
            self.fail(max);
        }

        lines
    }

    /// The line length failure, if any line exceeded the maximum.
    #[must_use]
    pub fn overflow(&self) -> Option<LineTooLong> {
        self.overflow
    }

    fn fail(&mut self, max: usize) {
        self.overflow = Some(LineTooLong { max });
        self.pending.clear();
        self.carry.clear();
    }

    /// Text received after the last complete line.
    #[must_use]
    pub fn pending(&self) -> &str {
        &self.pending
    }

    fn decode(&mut self, chunk: &[u8]) {
        let mut bytes = std::mem::take(&mut self.carry);
        bytes.extend_from_slice(chunk);

        let mut input = bytes.as_slice();
        loop {
            match std::str::from_utf8(input) {
                Ok(text) => {
                    self.pending.push_str(text);
                    break;
                }
                Err(error) => {
                    let (valid, rest) = input.split_at(error.valid_up_to());
                    self.pending
                        .push_str(std::str::from_utf8(valid).unwrap_or_default());

                    match error.error_len() {
                        // Incomplete code point at the end of the chunk.
                        None => {
                            self.carry = rest.to_vec();
                            break;
                        }
                        Some(len) => {
                            self.pending.push(char::REPLACEMENT_CHARACTER);
                            input = &rest[len..];
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn keeps_trailing_partial_line_pending() {
        let mut buffer = LineBuffer::new();

        assert_eq!(buffer.push(b"data: a\ndata: b"), vec!["data: a"]);
        assert_eq!(buffer.pending(), "data: b");
        assert_eq!(buffer.push(b"c\n\n"), vec!["data: bc", ""]);
        assert_eq!(buffer.pending(), "");
    }

    #[test]
    fn no_newline_yields_nothing() {
        let mut buffer = LineBuffer::new();

        assert!(buffer.push(b"data: ").is_empty());
        assert!(buffer.push(b"{}").is_empty());
        assert_eq!(buffer.pending(), "data: {}");
    }

    #[test]
    fn carries_split_code_point() {
        let mut buffer = LineBuffer::new();
        let text = "é€\n".as_bytes();

        for byte in &text[..text.len() - 1] {
            assert!(buffer.push(&[*byte]).is_empty());
        }

        assert_eq!(buffer.push(b"\n"), vec!["é€"]);
    }

    #[test]
    fn replaces_invalid_sequences() {
        let mut buffer = LineBuffer::new();

        assert_eq!(buffer.push(b"a\xFFb\n"), vec!["a\u{FFFD}b"]);
    }

    #[test]
    fn unterminated_line_over_limit_fails() {
        let mut buffer = LineBuffer::new().with_max_length(8);

        assert!(buffer.push(b"data: {").is_empty());
        assert_eq!(buffer.overflow(), None);

        assert!(buffer.push(b"\"a\":1").is_empty());
        assert_eq!(buffer.overflow(), Some(LineTooLong { max: 8 }));
        assert_eq!(buffer.pending(), "");
    }

    #[test]
    fn lines_before_oversized_line_are_kept() {
        let mut buffer = LineBuffer::new().with_max_length(4);

        assert_eq!(buffer.push(b"ok\nfine\ntoo long\nok\n"), vec!["ok", "fine"]);
        assert_eq!(buffer.overflow(), Some(LineTooLong { max: 4 }));
        assert!(buffer.push(b"more\n").is_empty());
    }

    #[test]
    fn limit_excludes_terminator() {
        let mut buffer = LineBuffer::new().with_max_length(4);

        assert_eq!(buffer.push(b"abcd\n\n"), vec!["abcd", ""]);
        assert_eq!(buffer.overflow(), None);
    }
}
