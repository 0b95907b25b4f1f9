use std::time::Duration;

pub(crate) type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request could not be sent, or its response could not be read.
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// The transport failed after the stream started.
    #[error("Stream processing error: {0}")]
    Stream(String),

    #[error("Upstream idle for more than {}s", .0.as_secs_f32())]
    Timeout(Duration),

    #[error("Stream frame exceeds {0} bytes")]
    FrameTooLarge(usize),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API error (status {}): {}", .code, .message)]
    Api { code: u16, message: String },

    #[error("client config error: {0}")]
    Config(String),
}

impl Error {
    /// The upstream HTTP status, if the upstream answered with one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { code, .. } => Some(*code),
            Self::Request(error) => error.status().map(|status| status.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        if std::mem::discriminant(self) != std::mem::discriminant(other) {
            return false;
        }

        // Good enough for testing purposes
        format!("{self:?}") == format!("{other:?}")
    }
}
