//! Client side of the relay: reassembling frames from an arbitrarily chunked
//! byte stream and driving a conversation.
//!
//! [`consume`] turns a byte stream into ordered [`StreamEvent`]s. [`Session`]
//! builds on it to bootstrap conversations and record exchanges.
//!
//! [`StreamEvent`]: chatter_protocol::StreamEvent

mod buffer;
mod client;
mod consume;
mod decoder;
mod error;
mod session;

pub use buffer::{LineBuffer, LineTooLong};
pub use client::{ByteStream, RelayClient};
pub use consume::{StreamOutcome, consume, consume_with};
pub use decoder::Decoder;
pub use error::Error;
pub use session::{Exchange, Session};
pub use tokio_util::sync::CancellationToken;
