pub(crate) type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Relay error (status {code}): {message}")]
    Api { code: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Message must not be empty")]
    EmptyMessage,

    /// The stream reported an error instead of a response.
    #[error("{0}")]
    Stream(String),

    #[error("Stream ended before a response was completed")]
    Incomplete,

    #[error("Request aborted")]
    Aborted,
}

#[cfg(test)]
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        // Good enough for testing purposes
        format!("{self:?}") == format!("{other:?}")
    }
}
