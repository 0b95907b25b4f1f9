pub(crate) type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Malformed frame payload: {0}")]
    MalformedFrame(#[from] serde_json::Error),
}

#[cfg(test)]
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        // Good enough for testing purposes
        format!("{self:?}") == format!("{other:?}")
    }
}
