use chatter_protocol::{ConversationId, Response, StreamEvent};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    client::RelayClient,
    consume::{StreamOutcome, consume_with},
    decoder::Decoder,
    error::{Error, Result},
};

/// A submitted message and the response it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    pub message: String,

    /// Upstream identifier of the response, used to leave feedback.
    pub response_id: Option<String>,

    pub response: Response,
}

/// The caller-owned state of one chat: the current conversation and the
/// exchanges made in it.
///
/// Submissions take `&mut self`, so a session never has two requests in
/// flight.
#[derive(Debug)]
pub struct Session {
    client: RelayClient,
    conversation: Option<ConversationId>,
    exchanges: Vec<Exchange>,
    max_frame_bytes: Option<usize>,
}

impl Session {
    #[must_use]
    pub fn new(client: RelayClient) -> Self {
        Self {
            client,
            conversation: None,
            exchanges: vec![],
            max_frame_bytes: None,
        }
    }

    /// Fail streamed submissions that receive a frame over `max` bytes.
    #[must_use]
    pub fn with_max_frame_bytes(mut self, max: usize) -> Self {
        self.max_frame_bytes = Some(max);
        self
    }

    /// Continue an existing conversation.
    #[must_use]
    pub fn with_conversation(mut self, conversation: ConversationId) -> Self {
        self.conversation = Some(conversation);
        self
    }

    #[must_use]
    pub fn conversation(&self) -> Option<&ConversationId> {
        self.conversation.as_ref()
    }

    #[must_use]
    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    /// Forget the conversation and its exchanges.
    pub fn reset(&mut self) {
        self.conversation = None;
        self.exchanges.clear();
    }

    /// Replace the current conversation with a freshly created one.
    ///
    /// On failure the session is left untouched.
    pub async fn new_conversation(&mut self) -> Result<&ConversationId> {
        let conversation = self.client.create_conversation().await?;
        info!(conversation = %conversation.id, "Started new conversation.");

        self.exchanges.clear();
        Ok(self.conversation.insert(conversation.id))
    }

    /// Submit `message` and wait for its response.
    ///
    /// Without a current conversation one is created first. The conversation
    /// and the new exchange are only recorded once the response succeeded,
    /// so a failed submission leaves the session as it was. In streaming
    /// mode `on_step` is called for every progress step as it arrives.
    pub async fn submit<F>(
        &mut self,
        message: &str,
        stream: bool,
        cancel: &CancellationToken,
        on_step: F,
    ) -> Result<&Exchange>
    where
        F: FnMut(&str, &str),
    {
        if message.trim().is_empty() {
            return Err(Error::EmptyMessage);
        }

        let conversation = match &self.conversation {
            Some(conversation) => conversation.clone(),
            None => {
                let conversation = self.client.create_conversation().await?;
                debug!(conversation = %conversation.id, "Created conversation for submission.");
                conversation.id
            }
        };

        let exchange = if stream {
            self.stream_response(&conversation, message, cancel, on_step)
                .await?
        } else {
            let envelope = self.client.create_response(&conversation, message).await?;

            Exchange {
                message: message.to_owned(),
                response_id: envelope.id,
                response: envelope.response,
            }
        };

        self.conversation = Some(conversation);

        let index = self.exchanges.len();
        self.exchanges.push(exchange);
        Ok(&self.exchanges[index])
    }

    async fn stream_response<F>(
        &self,
        conversation: &ConversationId,
        message: &str,
        cancel: &CancellationToken,
        mut on_step: F,
    ) -> Result<Exchange>
    where
        F: FnMut(&str, &str),
    {
        let body = self
            .client
            .create_response_stream(conversation, message)
            .await?;

        let mut completed = None;
        let mut failure = None;
        let decoder = match self.max_frame_bytes {
            Some(max) => Decoder::new().with_max_frame_bytes(max),
            None => Decoder::new(),
        };

        let outcome = consume_with(decoder, body, cancel, |event| match event {
            StreamEvent::Step { step, message: text } => on_step(&step, &text),
            StreamEvent::Completed { id, response } => {
                completed.get_or_insert((id, response));
            }
            StreamEvent::Error { error } => {
                failure.get_or_insert(error);
            }
        })
        .await;

        match (completed, failure) {
            (Some((id, response)), failure) => {
                if let Some(error) = failure {
                    warn!(%error, "Stream reported an error after completing, keeping response.");
                }

                Ok(Exchange {
                    message: message.to_owned(),
                    response_id: Some(id),
                    response,
                })
            }
            (None, Some(error)) => Err(Error::Stream(error)),
            (None, None) if outcome == StreamOutcome::Aborted => Err(Error::Aborted),
            (None, None) => Err(Error::Incomplete),
        }
    }
}
