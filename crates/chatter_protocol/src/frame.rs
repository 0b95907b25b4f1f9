//! Line framing of response streams.
//!
//! A frame is a single line starting with [`PREFIX`], followed by either a
//! compact JSON payload or the [`SENTINEL`]. Downstream, every frame is
//! followed by an empty line, so each frame ends in `\n\n`.

use crate::{StreamEvent, error::Result};

/// The prefix every frame line starts with.
pub const PREFIX: &str = "data: ";

/// The payload marking the end of a stream.
pub const SENTINEL: &str = "[DONE]";

/// The encoded sentinel frame.
pub const DONE: &str = "data: [DONE]\n\n";

/// A decoded frame line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame<'a> {
    /// A payload that still needs to be parsed.
    Payload(&'a str),

    /// The end-of-stream sentinel.
    Done,
}

impl<'a> Frame<'a> {
    /// Decode a complete line, without its delimiter.
    ///
    /// Returns `None` for lines that are not frames, such as the blank lines
    /// separating frames or keep-alive comments.
    #[must_use]
    pub fn parse(line: &'a str) -> Option<Self> {
        let payload = line.strip_prefix(PREFIX)?;
        if payload == SENTINEL {
            return Some(Self::Done);
        }

        Some(Self::Payload(payload))
    }
}

/// Encode a raw JSON payload as a downstream frame.
///
/// The payload is written as-is; it must be compact (newline free) JSON.
#[must_use]
pub fn encode(payload: &str) -> String {
    format!("{PREFIX}{payload}\n\n")
}

/// Encode an event as a downstream frame.
pub fn encode_event(event: &StreamEvent) -> Result<String> {
    event.to_payload().map(|payload| encode(&payload))
}
