//! Turning the upstream line stream into raw frame payloads.

use std::time::Duration;

use async_stream::stream;
use chatter_protocol::frame::SENTINEL;
use futures::{Stream, StreamExt as _};
use serde_json::value::RawValue;
use tokio_util::codec::LinesCodecError;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};

/// Yield the payload of every `data:` line in `lines`.
///
/// The returned stream ends at the upstream sentinel, at the end of the
/// transport, or after yielding its first error. Every read is bounded by
/// `idle_timeout`.
pub(crate) fn frames<S>(
    lines: S,
    idle_timeout: Duration,
    max_frame_bytes: usize,
) -> impl Stream<Item = Result<Box<RawValue>>> + Send
where
    S: Stream<Item = std::result::Result<String, LinesCodecError>> + Send,
{
    stream! {
        let mut lines = std::pin::pin!(lines);
        let mut count = 0_usize;

        loop {
            let line = match tokio::time::timeout(idle_timeout, lines.next()).await {
                Ok(Some(Ok(line))) => line,
                Ok(None) => {
                    debug!(frames = count, "Upstream closed the stream without a sentinel.");
                    break;
                }
                Ok(Some(Err(LinesCodecError::MaxLineLengthExceeded))) => {
                    warn!(max = max_frame_bytes, "Upstream frame too large.");
                    yield Err(Error::FrameTooLarge(max_frame_bytes));
                    break;
                }
                Ok(Some(Err(LinesCodecError::Io(error)))) => {
                    warn!(%error, frames = count, "Upstream stream failed.");
                    yield Err(Error::Stream(error.to_string()));
                    break;
                }
                Err(_) => {
                    warn!(timeout = ?idle_timeout, frames = count, "Upstream stream idle.");
                    yield Err(Error::Timeout(idle_timeout));
                    break;
                }
            };

            // Each data line starts with "data:", anything else (blank
            // separators, comments, other SSE fields) is skipped.
            let Some(data) = line.strip_prefix("data:").map(str::trim) else {
                continue;
            };

            if data.is_empty() {
                continue;
            }

            if data == SENTINEL {
                debug!(frames = count, "Upstream stream finished.");
                break;
            }

            match RawValue::from_string(data.to_owned()) {
                Ok(payload) => {
                    count += 1;
                    trace!(index = count, bytes = data.len(), "Received upstream frame.");
                    yield Ok(payload);
                }
                Err(error) => {
                    warn!(%error, data, "Upstream frame is not valid JSON.");
                    yield Err(Error::Json(error));
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "frames_tests.rs"]
mod tests;
