//! Re-framing an upstream frame stream into a downstream event stream.
//!
//! Once [`sse_response`] is returned the response headers are committed.
//! From that point on the only way to report a failure is in-band: a single
//! `error` frame, followed by the sentinel.

use std::convert::Infallible;

use async_stream::stream;
use axum::{
    body::Body,
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use chatter_protocol::{StreamEvent, frame};
use chatter_upstream::FrameStream;
use futures::{Stream, StreamExt as _};
use tracing::{debug, error, trace, warn};

/// Phases of a committed stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Headers are flushed, no frame was relayed yet.
    Opened,

    /// At least one upstream frame was relayed.
    Relaying,

    /// The sentinel was written.
    Closed,
}

/// Tracks the phase of a relayed stream and notices downstream disconnects.
///
/// The tracker lives inside the response body stream. When the client goes
/// away the body is dropped before reaching [`Phase::Closed`], and with it the
/// upstream frame stream, which releases the upstream connection.
#[derive(Debug)]
struct Tracker {
    phase: Phase,
    relayed: usize,
}

impl Tracker {
    const fn new() -> Self {
        Self {
            phase: Phase::Opened,
            relayed: 0,
        }
    }

    fn relayed(&mut self) {
        self.phase = Phase::Relaying;
        self.relayed += 1;
    }
}

impl Drop for Tracker {
    fn drop(&mut self) {
        if self.phase != Phase::Closed {
            warn!(
                phase = ?self.phase,
                frames = self.relayed,
                "Downstream disconnected, releasing upstream stream."
            );
        }
    }
}

/// Relay every upstream frame downstream, then close with the sentinel.
///
/// Payloads are passed through byte-for-byte. An upstream failure ends the
/// stream with a synthesized `error` frame before the sentinel.
pub fn relay(frames: FrameStream) -> impl Stream<Item = Result<Bytes, Infallible>> + Send {
    stream! {
        let mut tracker = Tracker::new();
        let mut frames = frames;
        trace!("Stream opened.");

        while let Some(item) = frames.next().await {
            match item {
                Ok(payload) => {
                    tracker.relayed();
                    trace!(index = tracker.relayed, "Relaying frame.");
                    yield Ok(Bytes::from(frame::encode(payload.get())));
                }
                Err(error) => {
                    error!(%error, frames = tracker.relayed, "Upstream failed mid-stream.");
                    yield Ok(error_frame(&error));
                    break;
                }
            }
        }

        // Release the upstream before writing the sentinel.
        drop(frames);

        tracker.phase = Phase::Closed;
        debug!(frames = tracker.relayed, "Stream closed.");
        yield Ok(Bytes::from_static(frame::DONE.as_bytes()));
    }
}

/// Wrap a framed byte stream in a committed event-stream response.
pub fn sse_response<S>(stream: S) -> Response
where
    S: Stream<Item = Result<Bytes, Infallible>> + Send + 'static,
{
    (
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/event-stream"),
            ),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
            (header::CONNECTION, HeaderValue::from_static("keep-alive")),
        ],
        Body::from_stream(stream),
    )
        .into_response()
}

fn error_frame(error: &chatter_upstream::Error) -> Bytes {
    match frame::encode_event(&StreamEvent::error(error.to_string())) {
        Ok(frame) => Bytes::from(frame),
        Err(_) => Bytes::from_static(b"data: {\"type\":\"error\",\"error\":\"upstream failure\"}\n\n"),
    }
}

#[cfg(test)]
#[path = "relay_tests.rs"]
mod tests;
