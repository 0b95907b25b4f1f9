use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Response;

/// Opaque, upstream-assigned conversation identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A conversation as returned by the upstream.
///
/// Only the identifier is interpreted, every other field is kept so the
/// relay can hand the object back verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of the upstream conversation-create call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationRequest {
    pub user_identifier: String,
    pub user_context: Map<String, Value>,
}

/// Body of the relay's `create-response` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResponseRequest {
    #[serde(default)]
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<ConversationId>,

    #[serde(default)]
    pub stream: bool,
}

impl CreateResponseRequest {
    #[must_use]
    pub fn new(conversation_id: ConversationId, message: impl Into<String>, stream: bool) -> Self {
        Self {
            message: message.into(),
            conversation_id: Some(conversation_id),
            stream,
        }
    }
}

/// Body of the upstream response-create call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamResponseRequest {
    pub agent_id: String,
    pub message: String,
    pub stream: bool,
}

/// A non-streamed answer: the [`Response`] plus the identifiers the
/// upstream attaches to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<ConversationId>,

    #[serde(flatten)]
    pub response: Response,
}

/// User feedback on a single response, forwarded to the upstream as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}
