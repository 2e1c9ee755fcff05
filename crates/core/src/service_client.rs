use std::pin::Pin;
use std::sync::Arc;

use confab_service::{
    ChatReply, ChatRequest, ChatService, ChatServiceError, ConversationStarted,
    HealthStatus,
};
use tracing::Instrument;

type ServiceResult<T> = Result<T, Box<dyn ChatServiceError>>;
type BoxedFuture<T> = Pin<Box<dyn Future<Output = ServiceResult<T>> + Send>>;

/// Object-safe mirror of [`ChatService`].
trait ErasedService: Send + Sync {
    fn start_conversation(&self) -> BoxedFuture<ConversationStarted>;
    fn send_chat(&self, req: ChatRequest) -> BoxedFuture<ChatReply>;
    fn reset_conversation(&self, conversation_id: Option<String>)
    -> BoxedFuture<()>;
    fn check_health(&self) -> BoxedFuture<HealthStatus>;
}

fn erase<T, E, F>(fut: F, span: tracing::Span) -> BoxedFuture<T>
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    E: ChatServiceError,
{
    Box::pin(
        async move {
            trace!("request issued");
            let result = fut.await;
            match &result {
                Ok(_) => trace!("request finished"),
                Err(err) => error!("got an error: {err:?}"),
            }
            result.map_err(|err| Box::new(err) as Box<dyn ChatServiceError>)
        }
        .instrument(span),
    )
}

impl<S: ChatService> ErasedService for S {
    fn start_conversation(&self) -> BoxedFuture<ConversationStarted> {
        let fut = ChatService::start_conversation(self);
        erase(fut, trace_span!("start conversation"))
    }

    fn send_chat(&self, req: ChatRequest) -> BoxedFuture<ChatReply> {
        let fut = ChatService::send_chat(self, &req);
        erase(
            fut,
            trace_span!("send chat", conversation_id = %req.conversation_id),
        )
    }

    fn reset_conversation(
        &self,
        conversation_id: Option<String>,
    ) -> BoxedFuture<()> {
        let fut = ChatService::reset_conversation(self, conversation_id.as_deref());
        erase(fut, trace_span!("reset conversation"))
    }

    fn check_health(&self) -> BoxedFuture<HealthStatus> {
        let fut = ChatService::check_health(self);
        erase(fut, trace_span!("check health"))
    }
}

/// A wrapper around a chat service that provides a type-erased
/// interface for the other modules.
#[derive(Clone)]
pub struct ServiceClient {
    service: Arc<dyn ErasedService>,
}

impl ServiceClient {
    #[inline]
    pub fn new<S: ChatService + 'static>(service: S) -> Self {
        // We have to erase the type `S`, since `ServiceClient` doesn't have
        // a generic parameter and we don't want it either.
        Self {
            service: Arc::new(service),
        }
    }

    #[inline]
    pub async fn start_conversation(
        &self,
    ) -> ServiceResult<ConversationStarted> {
        self.service.start_conversation().await
    }

    #[inline]
    pub async fn send_chat(&self, req: ChatRequest) -> ServiceResult<ChatReply> {
        self.service.send_chat(req).await
    }

    #[inline]
    pub async fn reset_conversation(
        &self,
        conversation_id: Option<String>,
    ) -> ServiceResult<()> {
        self.service.reset_conversation(conversation_id).await
    }

    #[inline]
    pub async fn check_health(&self) -> ServiceResult<HealthStatus> {
        self.service.check_health().await
    }
}

#[cfg(test)]
mod tests {
    use confab_service::ErrorKind;
    use confab_test_service::{PresetReply, RecordedCall, TestChatService};

    use super::*;

    #[tokio::test]
    async fn test_forwarding() {
        let service = TestChatService::default();
        service.add_start_reply(PresetReply::success("abc123"));
        service.add_chat_reply(PresetReply::success("Hi there"));
        service.add_reset_reply(PresetReply::protocol_failure("nope"));

        let client = ServiceClient::new(service.clone());
        let started = client.start_conversation().await.unwrap();
        assert_eq!(started.conversation_id, "abc123");

        let reply = client
            .send_chat(ChatRequest::new("abc123", "Hello"))
            .await
            .unwrap();
        assert_eq!(reply.answer, "Hi there");

        let err = client
            .reset_conversation(Some("abc123".to_owned()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
        assert_eq!(err.to_string(), "nope");

        assert!(client.check_health().await.unwrap().is_healthy());
        assert_eq!(service.calls().len(), 4);
        assert_eq!(service.calls()[3], RecordedCall::Health);
    }
}
