use serde::{Deserialize, Serialize};

/// A conversation freshly created by the service.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationStarted {
    /// Opaque token identifying the server-side session.
    pub conversation_id: String,
}

/// The service's answer to a [`ChatRequest`](crate::ChatRequest).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatReply {
    /// The answer text, possibly Markdown-formatted.
    pub answer: String,
}

/// Result of a health probe.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Status reported by the service, e.g. `healthy`.
    pub status: String,
    /// Version reported by the service, if any.
    #[serde(default)]
    pub version: Option<String>,
}

impl HealthStatus {
    /// Returns `true` if the service reports itself as healthy.
    #[inline]
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}
