use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::future::ready;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use confab_service::{
    ChatReply, ChatRequest, ChatService, ChatServiceError, ConversationStarted,
    ErrorKind, HealthStatus,
};
use tokio::time::sleep;

#[derive(Debug)]
struct FakeServiceError(ErrorKind);

impl Display for FakeServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Error for FakeServiceError {}

impl ChatServiceError for FakeServiceError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

/// Echoes questions back, but only for the conversations it has started.
#[derive(Default)]
struct FakeChatService {
    conversations: Arc<Mutex<Vec<String>>>,
}

impl ChatService for FakeChatService {
    type Error = FakeServiceError;

    fn start_conversation(
        &self,
    ) -> impl Future<Output = Result<ConversationStarted, Self::Error>>
    + Send
    + 'static {
        let conversations = Arc::clone(&self.conversations);
        async move {
            sleep(Duration::from_millis(1)).await;
            let mut conversations = conversations.lock().unwrap();
            let conversation_id = format!("conv:{}", conversations.len());
            conversations.push(conversation_id.clone());
            Ok(ConversationStarted { conversation_id })
        }
    }

    fn send_chat(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<ChatReply, Self::Error>> + Send + 'static
    {
        let known = self
            .conversations
            .lock()
            .unwrap()
            .contains(&req.conversation_id);
        let result = if known {
            Ok(ChatReply {
                answer: format!("You said {}", req.question),
            })
        } else {
            Err(FakeServiceError(ErrorKind::Protocol))
        };
        ready(result)
    }

    fn reset_conversation(
        &self,
        conversation_id: Option<&str>,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'static {
        let mut conversations = self.conversations.lock().unwrap();
        let result = match conversation_id {
            Some(id) => {
                conversations.retain(|c| c != id);
                Ok(())
            }
            None => Err(FakeServiceError(ErrorKind::Transport)),
        };
        ready(result)
    }

    fn check_health(
        &self,
    ) -> impl Future<Output = Result<HealthStatus, Self::Error>> + Send + 'static
    {
        ready(Ok(HealthStatus {
            status: "healthy".to_owned(),
            version: Some("1.0".to_owned()),
        }))
    }
}

#[tokio::test]
async fn test_conversation_round() {
    let service = FakeChatService::default();
    let started = service.start_conversation().await.unwrap();
    assert_eq!(started.conversation_id, "conv:0");

    let req = ChatRequest::new(&started.conversation_id, "Good morning");
    let reply = service.send_chat(&req).await.unwrap();
    assert_eq!(reply.answer, "You said Good morning");

    service
        .reset_conversation(Some(&started.conversation_id))
        .await
        .unwrap();
    let err = service.send_chat(&req).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protocol);
}

#[tokio::test]
async fn test_error() {
    let service = FakeChatService::default();
    let err = service.reset_conversation(None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);

    let health = service.check_health().await.unwrap();
    assert!(health.is_healthy());
}
