use chatter_protocol::{StreamEvent, frame::Frame};
use tracing::{debug, trace, warn};

use crate::buffer::{LineBuffer, LineTooLong};

/// Incremental decoder turning transport chunks into [`StreamEvent`]s.
///
/// The decoder produces the same events, in the same order, no matter how
/// the byte stream is split into chunks.
#[derive(Debug, Default)]
pub struct Decoder {
    lines: LineBuffer,
    finished: bool,
}

impl Decoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail once a single frame grows past `max` bytes.
    #[must_use]
    pub fn with_max_frame_bytes(mut self, max: usize) -> Self {
        self.lines = self.lines.with_max_length(max);
        self
    }

    /// Decode `chunk`, returning the events it completed.
    ///
    /// Once the sentinel frame is seen, any remaining and future input is
    /// ignored. An oversized frame stops decoding, see [`Self::overflow`].
    pub fn decode(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        if self.finished {
            trace!(len = chunk.len(), "Ignoring input after sentinel.");
            return vec![];
        }

        let mut events = vec![];
        for line in self.lines.push(chunk) {
            match Frame::parse(&line) {
                None => {}
                Some(Frame::Done) => {
                    debug!(events = events.len(), "Received sentinel.");
                    self.finished = true;
                    break;
                }
                Some(Frame::Payload(payload)) => match StreamEvent::from_payload(payload) {
                    Ok(event) => events.push(event),
                    Err(error) => warn!(%error, payload, "Dropping malformed frame."),
                },
            }
        }

        events
    }

    /// Whether the sentinel frame was received.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// The frame length failure that stopped decoding, if any.
    ///
    /// A stream cannot be resynchronised after an oversized frame.
    #[must_use]
    pub fn overflow(&self) -> Option<LineTooLong> {
        self.lines.overflow()
    }
}

#[cfg(test)]
#[path = "decoder_tests.rs"]
mod tests;
