//! A local fake chat service for testing purpose.

mod preset;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use confab_service::{
    ChatReply, ChatRequest, ChatService, ChatServiceError, ConversationStarted,
    ErrorKind, HealthStatus,
};
use tokio::time::sleep;

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for Error {}

impl ChatServiceError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// A call received by [`TestChatService`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RecordedCall {
    Start,
    Chat(ChatRequest),
    Reset(Option<String>),
    Health,
}

#[derive(Default)]
struct Script {
    starts: VecDeque<PresetReply>,
    chats: VecDeque<PresetReply>,
    resets: VecDeque<PresetReply>,
    calls: Vec<RecordedCall>,
    delay: Option<Duration>,
}

/// A local fake chat service for testing purpose.
///
/// Before sending requests, you need to setup the script, which is how
/// the service should reply to each kind of call. Replies are consumed in
/// order; if there are no enough replies for a call, a protocol error is
/// returned.
///
/// Every call is recorded at the moment it is issued, before its future
/// is polled, so tests can tell whether a call happened at all.
///
/// Clones share the same script, keep one to inspect the calls after the
/// service has been moved into a client.
#[derive(Clone, Default)]
pub struct TestChatService {
    script: Arc<Mutex<Script>>,
}

impl TestChatService {
    #[inline]
    pub fn add_start_reply(&self, reply: PresetReply) {
        self.script().starts.push_back(reply);
    }

    #[inline]
    pub fn add_chat_reply(&self, reply: PresetReply) {
        self.script().chats.push_back(reply);
    }

    #[inline]
    pub fn add_reset_reply(&self, reply: PresetReply) {
        self.script().resets.push_back(reply);
    }

    /// Delays the completion of every call by `duration`.
    #[inline]
    pub fn set_delay(&self, duration: Duration) {
        self.script().delay = Some(duration);
    }

    /// Returns the calls received so far.
    #[inline]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.script().calls.clone()
    }

    /// Returns the chat requests received so far.
    pub fn chat_requests(&self) -> Vec<ChatRequest> {
        self.script()
            .calls
            .iter()
            .filter_map(|call| match call {
                RecordedCall::Chat(req) => Some(req.clone()),
                _ => None,
            })
            .collect()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        // A panicking test must not hide the calls from the others.
        self.script.lock().unwrap_or_else(|err| err.into_inner())
    }

    fn take_reply(
        &self,
        call: RecordedCall,
    ) -> (Result<String, Error>, Option<Duration>) {
        let mut script = self.script();
        let queue = match &call {
            RecordedCall::Start => &mut script.starts,
            RecordedCall::Chat(_) => &mut script.chats,
            RecordedCall::Reset(_) => &mut script.resets,
            RecordedCall::Health => unreachable!("health is not scripted"),
        };
        let result = match queue.pop_front() {
            Some(PresetReply::Success(payload)) => Ok(payload),
            Some(PresetReply::Failure(failure)) => Err(Error {
                message: failure.message,
                kind: failure.kind.into(),
            }),
            None => Err(Error {
                message: "no enough replies".to_owned(),
                kind: ErrorKind::Protocol,
            }),
        };
        script.calls.push(call);
        (result, script.delay)
    }
}

async fn delayed<T>(result: T, delay: Option<Duration>) -> T {
    if let Some(delay) = delay {
        sleep(delay).await;
    }
    result
}

impl ChatService for TestChatService {
    type Error = crate::Error;

    fn start_conversation(
        &self,
    ) -> impl Future<Output = Result<ConversationStarted, Self::Error>>
    + Send
    + 'static {
        let (result, delay) = self.take_reply(RecordedCall::Start);
        let result =
            result.map(|conversation_id| ConversationStarted { conversation_id });
        delayed(result, delay)
    }

    fn send_chat(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<ChatReply, Self::Error>> + Send + 'static
    {
        let (result, delay) = self.take_reply(RecordedCall::Chat(req.clone()));
        let result = result.map(|answer| ChatReply { answer });
        delayed(result, delay)
    }

    fn reset_conversation(
        &self,
        conversation_id: Option<&str>,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'static {
        let call = RecordedCall::Reset(conversation_id.map(ToOwned::to_owned));
        let (result, delay) = self.take_reply(call);
        delayed(result.map(|_| ()), delay)
    }

    fn check_health(
        &self,
    ) -> impl Future<Output = Result<HealthStatus, Self::Error>> + Send + 'static
    {
        let delay = {
            let mut script = self.script();
            script.calls.push(RecordedCall::Health);
            script.delay
        };
        let status = HealthStatus {
            status: "healthy".to_owned(),
            version: Some("test".to_owned()),
        };
        delayed(Ok(status), delay)
    }
}
