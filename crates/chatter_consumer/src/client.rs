use std::pin::Pin;

use bytes::Bytes;
use chatter_protocol::{Conversation, ConversationId, CreateResponseRequest, ResponseEnvelope};
use futures::{Stream, StreamExt as _};
use reqwest::{
    RequestBuilder,
    header::{ACCEPT, HeaderValue},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::trace;

use crate::error::{Error, Result};

/// Raw body chunks of a streamed response, exactly as the transport
/// delivers them.
pub type ByteStream = Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>;

/// HTTP client for the relay's public endpoints.
#[derive(Debug, Clone)]
pub struct RelayClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl RelayClient {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();

        Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    pub async fn create_conversation(&self) -> Result<Conversation> {
        let request = self
            .http_client
            .post(self.url("create-conversation"))
            .json(&Value::Object(serde_json::Map::new()));

        self.send_json(request).await
    }

    pub async fn create_response(
        &self,
        conversation_id: &ConversationId,
        message: &str,
    ) -> Result<ResponseEnvelope> {
        let body = CreateResponseRequest::new(conversation_id.clone(), message, false);
        let request = self.http_client.post(self.url("create-response")).json(&body);

        self.send_json(request).await
    }

    /// Start a streamed response.
    ///
    /// Fails if the relay rejects the request before streaming. The returned
    /// stream yields body chunks until the transport closes.
    pub async fn create_response_stream(
        &self,
        conversation_id: &ConversationId,
        message: &str,
    ) -> Result<ByteStream> {
        let body = CreateResponseRequest::new(conversation_id.clone(), message, true);
        let request = self
            .http_client
            .post(self.url("create-response"))
            .header(ACCEPT, HeaderValue::from_static("text/event-stream"))
            .json(&body);

        let response = self.send(request).await?;

        Ok(response.bytes_stream().boxed())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let body = self.send(request).await?.text().await?;

        serde_json::from_str(&body).map_err(Into::into)
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        let request = request.build()?;
        trace!(method = %request.method(), url = %request.url(), "Calling relay.");

        let response = self.http_client.execute(request).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|value| value.get("error")?.as_str().map(str::to_owned))
            .unwrap_or_else(|| format!("request failed with status {}", status.as_u16()));

        Err(Error::Api {
            code: status.as_u16(),
            message,
        })
    }
}
