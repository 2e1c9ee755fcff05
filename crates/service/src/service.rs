use std::error::Error;

use crate::error::ErrorKind;
use crate::request::ChatRequest;
use crate::response::{ChatReply, ConversationStarted, HealthStatus};

/// The error type for a chat service.
pub trait ChatServiceError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;
}

/// A type that represents a remote conversational service.
///
/// Once the service is created, it should behave like a stateless object.
/// Conversation state lives on the remote side and is addressed by the
/// conversation id; callers own the id and pass it back on every call.
///
/// Every returned future always runs to completion: there is no
/// cancellation at this level.
pub trait ChatService: Send + Sync {
    /// The error type that may be returned by the service.
    type Error: ChatServiceError;

    /// Starts a new conversation.
    fn start_conversation(
        &self,
    ) -> impl Future<Output = Result<ConversationStarted, Self::Error>>
    + Send
    + 'static;

    /// Asks a question within an existing conversation.
    fn send_chat(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<ChatReply, Self::Error>> + Send + 'static;

    /// Resets a conversation.
    ///
    /// Some services address the conversation explicitly and some reset
    /// whatever the caller is attached to, so the id is optional.
    fn reset_conversation(
        &self,
        conversation_id: Option<&str>,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'static;

    /// Probes the service health.
    fn check_health(
        &self,
    ) -> impl Future<Output = Result<HealthStatus, Self::Error>> + Send + 'static;
}
