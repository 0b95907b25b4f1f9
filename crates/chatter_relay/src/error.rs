use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::error;

pub(crate) type Result<T> = std::result::Result<T, Error>;

/// Message returned instead of the real error when errors are not exposed.
pub(crate) const GENERIC_ERROR: &str = "Something went wrong";

/// Errors surfaced to the client before any streamed byte is written.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    BadRequest(String),

    #[error("Upstream error: {0}")]
    Upstream(#[from] chatter_upstream::Error),

    #[error("Invalid relay configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The HTTP status of the error response.
    ///
    /// Upstream failures keep the upstream status when the upstream sent an
    /// error status, everything else is a `500`.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(error) => error
                .status()
                .and_then(|code| StatusCode::from_u16(code).ok())
                .filter(|status| status.is_client_error() || status.is_server_error())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Self::Config(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// The stable shape of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Marks a response as produced from an [`Error`], so its message can be
/// redacted.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Redactable;

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        error!(status = status.as_u16(), error = %self, "Request failed.");

        let mut response = (status, Json(ErrorBody::new(self.to_string()))).into_response();
        response.extensions_mut().insert(Redactable);
        response
    }
}
