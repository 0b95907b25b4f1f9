//! A mock upstream agent API.

pub use httpmock::{
    Method::{GET, PATCH, POST},
    Mock, MockServer,
};
use serde_json::Value;

use crate::sse;

pub const AGENT_ID: &str = "agent-test";
pub const API_KEY: &str = "test-key";

/// Path of the upstream conversation-create endpoint.
#[must_use]
pub fn conversations_path() -> String {
    format!("/agents/{AGENT_ID}/conversations")
}

/// Path of the upstream response-create endpoint.
#[must_use]
pub fn response_path(conversation_id: &str) -> String {
    format!("/agents/{AGENT_ID}/conversations/{conversation_id}/response")
}

/// Mount a streaming response for `conversation_id` that emits `payloads`
/// followed by the sentinel.
pub async fn stream_response<'a>(
    server: &'a MockServer,
    conversation_id: &str,
    payloads: &[Value],
) -> Mock<'a> {
    let path = response_path(conversation_id);
    let body = sse::body(payloads);

    server
        .mock_async(|when, then| {
            when.method(POST)
                .path(path)
                .header("authorization", format!("Bearer {API_KEY}"))
                .json_body_partial(r#"{ "stream": true }"#);
            then.status(200)
                .header("content-type", "text/event-stream")
                .body(body);
        })
        .await
}

/// Mount a unary response for `conversation_id`.
pub async fn unary_response<'a>(
    server: &'a MockServer,
    conversation_id: &str,
    status: u16,
    body: Value,
) -> Mock<'a> {
    let path = response_path(conversation_id);

    server
        .mock_async(|when, then| {
            when.method(POST)
                .path(path)
                .json_body_partial(r#"{ "stream": false }"#);
            then.status(status).json_body(body);
        })
        .await
}

/// Mount the conversation-create endpoint.
pub async fn create_conversation(server: &MockServer, status: u16, body: Value) -> Mock<'_> {
    let path = conversations_path();

    server
        .mock_async(|when, then| {
            when.method(POST).path(path);
            then.status(status).json_body(body);
        })
        .await
}
