use std::sync::Arc;

use serde_json::{Map, Value};

/// Shared, immutable request-handling state.
///
/// Nothing in here is mutated by requests, so concurrent requests never
/// observe each other.
#[derive(Debug, Clone)]
pub struct AppState {
    pub(crate) upstream: chatter_upstream::Client,
    pub(crate) user_context: Arc<Map<String, Value>>,
    pub(crate) expose_errors: bool,
}

impl AppState {
    #[must_use]
    pub fn new(upstream: chatter_upstream::Client) -> Self {
        Self {
            upstream,
            user_context: Arc::new(Map::new()),
            expose_errors: true,
        }
    }

    /// The user context attached to every created conversation.
    #[must_use]
    pub fn with_user_context(mut self, user_context: Map<String, Value>) -> Self {
        self.user_context = Arc::new(user_context);
        self
    }

    /// Whether error responses carry the real error message.
    #[must_use]
    pub fn with_exposed_errors(mut self, expose_errors: bool) -> Self {
        self.expose_errors = expose_errors;
        self
    }
}
