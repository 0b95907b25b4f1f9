use std::{collections::HashMap, io, pin::Pin, time::Duration};

use chatter_protocol::{
    Conversation, ConversationId, CreateConversationRequest, Feedback, UpstreamResponseRequest,
};
use futures::{Stream, TryStreamExt as _};
use reqwest::{
    RequestBuilder,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue},
};
use serde::de::DeserializeOwned;
use serde_json::{Value, value::RawValue};
use tokio_util::{
    codec::{FramedRead, LinesCodec},
    io::StreamReader,
};
use tracing::{error, trace};

use crate::{
    error::{Error, Result},
    frames::frames,
};

/// Default bound on how long the client waits for the next upstream read.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Default upper bound on the length of a single upstream frame.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 1024 * 1024;

/// A lazy, non-restartable sequence of raw upstream frame payloads.
///
/// The stream ends after the upstream sentinel, or right after yielding its
/// first error.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<Box<RawValue>>> + Send>>;

#[derive(Debug, Clone)]
pub struct Client {
    api_key: String,
    agent_id: String,
    http_client: reqwest::Client,
    base_url: String,
    idle_timeout: Duration,
    max_frame_bytes: usize,
}

impl Client {
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        agent_id: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            agent_id: agent_id.into(),
            http_client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }

    #[must_use]
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    #[must_use]
    pub fn with_max_frame_bytes(mut self, max_frame_bytes: usize) -> Self {
        self.max_frame_bytes = max_frame_bytes;
        self
    }

    #[must_use]
    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// Create a new conversation for the given user.
    pub async fn create_conversation(
        &self,
        request: &CreateConversationRequest,
    ) -> Result<Conversation> {
        let url = self.url(&["conversations"]);
        let request = self.http_client.post(&url).json(request);

        self.send_json(request).await
    }

    /// Create a response, returning the upstream JSON document untouched.
    pub async fn create_response(
        &self,
        conversation_id: &ConversationId,
        message: &str,
    ) -> Result<Value> {
        let url = self.url(&["conversations", conversation_id.as_str(), "response"]);
        let body = self.response_request(message, false);
        let request = self.http_client.post(&url).json(&body);

        self.send_json(request).await
    }

    /// Create a streamed response.
    ///
    /// Fails before returning if the upstream rejects the request. Once the
    /// stream is returned, failures are yielded as its final item.
    pub async fn create_response_stream(
        &self,
        conversation_id: &ConversationId,
        message: &str,
    ) -> Result<FrameStream> {
        let url = self.url(&["conversations", conversation_id.as_str(), "response"]);
        let body = self.response_request(message, true);
        let request = self
            .http_client
            .post(&url)
            .header(ACCEPT, HeaderValue::from_static("text/event-stream"))
            .json(&body);

        let response = tokio::time::timeout(self.idle_timeout, self.send(request))
            .await
            .map_err(|_| Error::Timeout(self.idle_timeout))??;

        let byte_stream = response.bytes_stream().map_err(io::Error::other);
        let lines = FramedRead::new(
            StreamReader::new(byte_stream),
            LinesCodec::new_with_max_length(self.max_frame_bytes),
        );

        Ok(Box::pin(frames(
            lines,
            self.idle_timeout,
            self.max_frame_bytes,
        )))
    }

    /// Leave feedback on a response.
    pub async fn create_feedback(
        &self,
        conversation_id: &ConversationId,
        response_id: &str,
        feedback: &Feedback,
    ) -> Result<Value> {
        let url = self.url(&[
            "conversations",
            conversation_id.as_str(),
            "response",
            response_id,
            "feedback",
        ]);
        let request = self.http_client.post(&url).json(feedback);

        self.send_json(request).await
    }

    /// Update previously left feedback.
    pub async fn update_feedback(
        &self,
        conversation_id: &ConversationId,
        response_id: &str,
        feedback_id: &str,
        feedback: &Feedback,
    ) -> Result<Value> {
        let url = self.url(&[
            "conversations",
            conversation_id.as_str(),
            "response",
            response_id,
            "feedback",
            feedback_id,
        ]);
        let request = self.http_client.patch(&url).json(feedback);

        self.send_json(request).await
    }

    fn url(&self, segments: &[&str]) -> String {
        let mut url = format!("{}/agents/{}", self.base_url, self.agent_id);
        for segment in segments {
            url.push('/');
            url.push_str(segment);
        }

        url
    }

    fn response_request(&self, message: &str, stream: bool) -> UpstreamResponseRequest {
        UpstreamResponseRequest {
            agent_id: self.agent_id.clone(),
            message: message.to_owned(),
            stream,
        }
    }

    /// Build HTTP headers required for making API calls.
    /// Returns an error if any header value cannot be constructed.
    fn build_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            format!("Bearer {}", self.api_key)
                .parse()
                .map_err(|e| Error::Config(format!("Invalid API key header format: {e}")))?,
        );

        Ok(headers)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request.timeout(self.idle_timeout)).await?;
        let body = response.text().await?;

        serde_json::from_str(&body).map_err(Into::into)
    }

    /// Send the request, turning any non-success status into [`Error::Api`].
    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        let headers = self.build_headers()?;
        let request = request.headers(headers).build()?;

        let redacted_headers = request
            .headers()
            .iter()
            .map(|(k, v)| {
                if k == AUTHORIZATION {
                    return (k.to_string(), "[REDACTED]".to_owned());
                }

                (k.to_string(), v.to_str().unwrap_or_default().to_owned())
            })
            .collect::<HashMap<_, _>>();

        trace!(
            method = %request.method(),
            url = %request.url(),
            headers = ?redacted_headers,
            "Triggering request."
        );

        let response = self.http_client.execute(request).await?;

        trace!(
            status = response.status().as_u16(),
            content_length = response.content_length().unwrap_or_default(),
            content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .map(|v| v.to_str().unwrap_or_default()),
            "Received response."
        );

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let code = status.as_u16();
        let body = response.text().await.unwrap_or_default();
        error!(status = code, body, "Unexpected response.");

        Err(Error::Api {
            code,
            message: error_message(&body)
                .unwrap_or_else(|| format!("request failed with status {code}")),
        })
    }
}

/// Extract a human readable message from an upstream error body.
fn error_message(body: &str) -> Option<String> {
    let value = serde_json::from_str::<Value>(body).ok();
    let from_json = value.as_ref().and_then(|value| {
        ["error", "message"].iter().find_map(|key| match value.get(key)? {
            Value::String(message) => Some(message.clone()),
            Value::Object(error) => error.get("message")?.as_str().map(str::to_owned),
            _ => None,
        })
    });

    from_json.or_else(|| {
        let body = body.trim();
        (!body.is_empty()).then(|| body.to_owned())
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn builds_agent_scoped_urls() {
        let client = Client::new("http://localhost:9000/api/", "key", "agent-1");

        assert_eq!(
            client.url(&["conversations", "c1", "response"]),
            "http://localhost:9000/api/agents/agent-1/conversations/c1/response"
        );
    }

    #[test]
    fn extracts_error_messages() {
        assert_eq!(error_message(r#"{"error":"nope"}"#).as_deref(), Some("nope"));
        assert_eq!(
            error_message(r#"{"error":{"message":"bad agent"}}"#).as_deref(),
            Some("bad agent")
        );
        assert_eq!(error_message(r#"{"message":"gone"}"#).as_deref(), Some("gone"));
        assert_eq!(error_message("Bad Gateway\n").as_deref(), Some("Bad Gateway"));
        assert_eq!(error_message(""), None);
    }
}
