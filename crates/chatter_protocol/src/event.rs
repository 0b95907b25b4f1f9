use serde::{Deserialize, Deserializer, Serialize, de::Error as _};
use serde_json::Value;

use crate::{
    Response, de,
    error::{Error, Result},
};

/// An event carried inside a stream frame.
///
/// Every response stream consists of zero or more [`StreamEvent::Step`]s
/// followed by exactly one terminal event, either [`StreamEvent::Completed`]
/// or [`StreamEvent::Error`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum StreamEvent {
    /// Intermediate progress reported by the agent.
    #[serde(rename = "agent_step")]
    Step { step: String, message: String },

    /// The final answer.
    #[serde(rename = "completed")]
    Completed { id: String, response: Response },

    /// The request failed.
    #[serde(rename = "error")]
    Error { error: String },
}

impl StreamEvent {
    #[must_use]
    pub fn step(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Step {
            step: step.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn completed(id: impl Into<String>, response: Response) -> Self {
        Self::Completed {
            id: id.into(),
            response,
        }
    }

    #[must_use]
    pub fn error(error: impl Into<String>) -> Self {
        Self::Error {
            error: error.into(),
        }
    }

    /// Parse an event from a frame payload.
    pub fn from_payload(payload: &str) -> Result<Self> {
        serde_json::from_str(payload).map_err(Error::MalformedFrame)
    }

    /// Compact JSON encoding of the event, suitable as a frame payload.
    pub fn to_payload(&self) -> Result<String> {
        serde_json::to_string(self).map_err(Error::MalformedFrame)
    }

    /// Returns `true` if the event ends a response stream.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Error { .. })
    }
}

/// The accepted wire shapes of a tagged event.
#[derive(Deserialize)]
#[serde(tag = "type")]
enum Tagged {
    #[serde(rename = "agent_step", alias = "response.agent_step")]
    Step {
        #[serde(default, deserialize_with = "de::opaque_label")]
        step: String,
        #[serde(default)]
        message: String,
    },

    #[serde(rename = "completed", alias = "response.completed")]
    Completed {
        #[serde(default, deserialize_with = "de::opaque_label")]
        id: String,
        response: Response,
    },

    #[serde(rename = "error")]
    Error {
        #[serde(default = "unknown_error", deserialize_with = "de::error_description")]
        error: String,
    },
}

fn unknown_error() -> String {
    "unknown error".to_owned()
}

impl<'de> Deserialize<'de> for StreamEvent {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;

        // Older relays wrote mid-stream failures as `{ "error": ... }`,
        // without a type tag.
        if let (None, Some(error)) = (value.get("type"), value.get("error")) {
            let error = de::error_description(error.clone()).map_err(D::Error::custom)?;
            return Ok(Self::Error { error });
        }

        let event = match Tagged::deserialize(value).map_err(D::Error::custom)? {
            Tagged::Step { step, message } => Self::Step { step, message },
            Tagged::Completed { id, response } => Self::Completed { id, response },
            Tagged::Error { error } => Self::Error { error },
        };

        Ok(event)
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
