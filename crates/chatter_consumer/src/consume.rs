use std::{fmt, pin::pin};

use chatter_protocol::StreamEvent;
use futures::{Stream, StreamExt as _};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::decoder::Decoder;

/// How a consumed stream ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    /// The sentinel frame was received.
    Completed,

    /// The transport closed without a sentinel frame.
    Ended,

    /// Reading from the transport failed.
    Failed(String),

    /// The caller cancelled the stream.
    Aborted,
}

/// Drive `stream` to completion, dispatching every decoded event to
/// `handler` before the next chunk is read.
///
/// A transport failure is dispatched as a local [`StreamEvent::Error`] before
/// returning. Cancelling `cancel` stops reading immediately and drops the
/// stream.
pub async fn consume<S, B, E, F>(stream: S, cancel: &CancellationToken, handler: F) -> StreamOutcome
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: fmt::Display,
    F: FnMut(StreamEvent),
{
    consume_with(Decoder::new(), stream, cancel, handler).await
}

/// Like [`consume`], decoding with a configured `decoder`.
///
/// A frame the decoder rejects fails the stream the same way a transport
/// failure does.
pub async fn consume_with<S, B, E, F>(
    mut decoder: Decoder,
    stream: S,
    cancel: &CancellationToken,
    mut handler: F,
) -> StreamOutcome
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: fmt::Display,
    F: FnMut(StreamEvent),
{
    let mut stream = pin!(stream);

    loop {
        let item = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("Stream aborted.");
                return StreamOutcome::Aborted;
            }
            item = stream.next() => item,
        };

        match item {
            Some(Ok(chunk)) => {
                for event in decoder.decode(chunk.as_ref()) {
                    handler(event);
                }

                if decoder.is_finished() {
                    return StreamOutcome::Completed;
                }

                if let Some(error) = decoder.overflow() {
                    return fail(error, &mut handler);
                }
            }
            Some(Err(error)) => return fail(error, &mut handler),
            None => {
                debug!("Stream ended without sentinel.");
                return StreamOutcome::Ended;
            }
        }
    }
}

fn fail(error: impl fmt::Display, handler: &mut impl FnMut(StreamEvent)) -> StreamOutcome {
    let error = error.to_string();
    warn!(%error, "Stream failed.");
    handler(StreamEvent::error(error.clone()));

    StreamOutcome::Failed(error)
}
