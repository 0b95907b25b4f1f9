//! Wire types shared by the relay server, the upstream client and the stream
//! consumer.
//!
//! Everything that crosses a process boundary lives here: the tagged
//! [`Response`] union, the [`StreamEvent`]s carried inside stream frames, the
//! [`frame`] encoding itself and the request bodies accepted by the relay.

mod conversation;
mod de;
mod error;
mod event;
pub mod frame;
mod response;

pub use conversation::{
    Conversation, ConversationId, CreateConversationRequest, CreateResponseRequest, Feedback,
    ResponseEnvelope, UpstreamResponseRequest,
};
pub use error::Error;
pub use event::StreamEvent;
pub use response::{
    Cell, Chart, ChartData, ChartKind, Dataset, NamedSeries, Response, Series, Table,
};
