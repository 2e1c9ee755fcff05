mod builder;
mod state;
#[cfg(test)]
mod tests;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use confab_service::{ChatRequest, HealthStatus};

use crate::error::Error;
use crate::service_client::ServiceClient;
use crate::transcript::{Message, MessageKind, Sender, Transcript};
pub use builder::ConversationClientBuilder;
use state::ClientState;
pub use state::ConversationState;

/// The greeting appended once a conversation has started.
pub const DEFAULT_WELCOME_MESSAGE: &str = "Hello! I'm your Open Source \
     Contribution Assistant. How can I help you today?";

const START_FAILED_MESSAGE: &str = "Sorry, there was an error connecting to \
     the server. Please try refreshing the page.";

pub(crate) struct Settings {
    pub(crate) welcome_message: String,
    pub(crate) realtime: Option<bool>,
    pub(crate) suggestions: Vec<String>,
}

#[derive(Default)]
pub(crate) struct Callbacks {
    pub(crate) on_message: Option<Box<dyn Fn(&Message) + Send + Sync>>,
    pub(crate) on_transcript_cleared: Option<Box<dyn Fn() + Send + Sync>>,
    pub(crate) on_busy_changed: Option<Box<dyn Fn(bool) + Send + Sync>>,
    pub(crate) on_focus_input: Option<Box<dyn Fn() + Send + Sync>>,
}

struct Inner {
    service: ServiceClient,
    settings: Settings,
    callbacks: Callbacks,
    state: Mutex<ClientState>,
    // Serializes everything that creates or drops the conversation id, so
    // a chat call always observes the outcome of the start call before it.
    session_gate: tokio::sync::Mutex<()>,
}

/// A client owning one conversation with a remote chat service.
///
/// The client keeps the conversation id, the transcript and the busy
/// guard. Hosts render the transcript through the callbacks registered on
/// [`ConversationClientBuilder`], which are always invoked without any
/// internal lock held, so they may call back into the client.
///
/// At most one chat (or reset) request is outstanding at a time. While one
/// is in flight, [`send`](Self::send) and [`reset`](Self::reset) are
/// rejected with [`ErrorKind::Busy`](crate::ErrorKind::Busy) and leave the
/// transcript untouched.
///
/// Cloning the client is cheap and yields a handle to the same
/// conversation.
#[derive(Clone)]
pub struct ConversationClient {
    inner: Arc<Inner>,
}

impl ConversationClient {
    fn from_builder(builder: ConversationClientBuilder) -> Self {
        let ConversationClientBuilder {
            service,
            settings,
            callbacks,
        } = builder;

        let inner = Inner {
            service,
            settings,
            callbacks,
            state: Default::default(),
            session_gate: Default::default(),
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Returns the current stage.
    #[inline]
    pub fn state(&self) -> ConversationState {
        self.lock_state().stage()
    }

    /// Returns the current conversation id, if any.
    #[inline]
    pub fn conversation_id(&self) -> Option<String> {
        self.lock_state().conversation_id.clone()
    }

    /// Returns `true` while a chat or reset request is in flight.
    #[inline]
    pub fn is_busy(&self) -> bool {
        self.lock_state().busy
    }

    /// Returns a snapshot of the transcript.
    #[inline]
    pub fn transcript(&self) -> Transcript {
        self.lock_state().transcript.clone()
    }

    /// Returns the suggested prompts.
    #[inline]
    pub fn suggestions(&self) -> &[String] {
        &self.inner.settings.suggestions
    }

    /// Starts a conversation and returns its id.
    ///
    /// On success a welcome message is appended. On failure an error
    /// message is appended and the client stays uninitialized. If a
    /// conversation is already active, its id is returned and nothing else
    /// happens, so concurrent callers end up sharing one conversation.
    pub async fn start(&self) -> Result<String, Error> {
        let _gate = self.inner.session_gate.lock().await;
        self.start_gated().await
    }

    /// Sends a question and returns the answer.
    ///
    /// Whitespace-only input is rejected with
    /// [`ErrorKind::Validation`](crate::ErrorKind::Validation) before
    /// anything happens. Otherwise the trimmed question is appended to the
    /// transcript right away, a conversation is started first if needed,
    /// and the answer (or an error message) is appended when the service
    /// replies.
    pub async fn send(&self, text: &str) -> Result<String, Error> {
        let question = text.trim();
        if question.is_empty() {
            return Err(Error::validation().with_reason("empty message"));
        }
        let busy = self.enter_busy()?;
        self.append(Sender::User, MessageKind::Normal, question.to_owned());

        let result = self.ask(question).await;

        drop(busy);
        if result.is_ok() {
            if let Some(on_focus_input) = &self.inner.callbacks.on_focus_input {
                on_focus_input();
            }
        }
        result
    }

    /// Sends the suggested prompt at `index`, see [`send`](Self::send).
    pub async fn send_suggestion(&self, index: usize) -> Result<String, Error> {
        let Some(suggestion) = self.inner.settings.suggestions.get(index) else {
            return Err(Error::validation()
                .with_reason(format!("no suggestion at index {index}")));
        };
        self.send(suggestion).await
    }

    /// Resets the conversation.
    ///
    /// The service is asked to reset first. If it agrees, the transcript is
    /// cleared, the id is dropped and a new conversation is started right
    /// away, which appends a fresh welcome message. If it refuses, the
    /// transcript and the id are kept and an error message is appended.
    /// Without a conversation id there is nothing to reset remotely, so
    /// the transcript is cleared and a conversation is started.
    pub async fn reset(&self) -> Result<(), Error> {
        let _busy = self.enter_busy()?;
        self.reset_busy().await
    }

    /// Probes the service health. The transcript is not involved.
    pub async fn check_health(&self) -> Result<HealthStatus, Error> {
        Ok(self.inner.service.check_health().await?)
    }
}

impl ConversationClient {
    #[inline]
    fn lock_state(&self) -> MutexGuard<'_, ClientState> {
        // Callbacks never run under this lock, so a poisoned state can only
        // come from a panic between two consistent updates.
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn append(&self, sender: Sender, kind: MessageKind, text: String) {
        let message = Message::new(sender, kind, text);
        self.lock_state()
            .transcript
            .messages
            .push(message.clone());
        if let Some(on_message) = &self.inner.callbacks.on_message {
            on_message(&message);
        }
    }

    fn enter_busy(&self) -> Result<BusyGuard<'_>, Error> {
        {
            let mut state = self.lock_state();
            if state.busy {
                debug!("rejected a request while busy");
                return Err(Error::busy());
            }
            state.busy = true;
        }
        if let Some(on_busy_changed) = &self.inner.callbacks.on_busy_changed {
            on_busy_changed(true);
        }
        Ok(BusyGuard { client: self })
    }

    fn leave_busy(&self) {
        self.lock_state().busy = false;
        if let Some(on_busy_changed) = &self.inner.callbacks.on_busy_changed {
            on_busy_changed(false);
        }
    }

    /// Runs the start transition, assuming the session gate is held.
    async fn start_gated(&self) -> Result<String, Error> {
        let existing_id = self.lock_state().conversation_id.clone();
        if let Some(conversation_id) = existing_id {
            return Ok(conversation_id);
        }

        let initializing = InitializingGuard::enter(self);
        let result = self.inner.service.start_conversation().await;
        drop(initializing);

        let mut state = self.lock_state();
        match result {
            Ok(started) => {
                let conversation_id = started.conversation_id;
                state.conversation_id = Some(conversation_id.clone());
                drop(state);
                info!("conversation started with id {conversation_id}");

                let welcome = self.inner.settings.welcome_message.clone();
                self.append(Sender::Assistant, MessageKind::Normal, welcome);
                Ok(conversation_id)
            }
            Err(err) => {
                drop(state);
                warn!("failed to start conversation: {err}");

                self.append(
                    Sender::Assistant,
                    MessageKind::Error,
                    START_FAILED_MESSAGE.to_owned(),
                );
                Err(err.into())
            }
        }
    }

    /// Asks the question, assuming the busy flag is held.
    async fn ask(&self, question: &str) -> Result<String, Error> {
        // The start call reports its own failure in the transcript.
        let conversation_id = self.start().await?;

        let mut req = ChatRequest::new(conversation_id, question);
        if let Some(realtime) = self.inner.settings.realtime {
            req = req.with_realtime(realtime);
        }

        match self.inner.service.send_chat(req).await {
            Ok(reply) => {
                self.append(
                    Sender::Assistant,
                    MessageKind::Normal,
                    reply.answer.clone(),
                );
                Ok(reply.answer)
            }
            Err(err) => {
                let err = Error::from(err);
                warn!("chat request failed: {err}");
                self.append(
                    Sender::Assistant,
                    MessageKind::Error,
                    format!("Sorry, there was an error: {}", err.reason()),
                );
                Err(err)
            }
        }
    }

    /// Resets the conversation, assuming the busy flag is held.
    async fn reset_busy(&self) -> Result<(), Error> {
        let _gate = self.inner.session_gate.lock().await;

        let reset = match self.conversation_id() {
            Some(id) => self.inner.service.reset_conversation(Some(id)).await,
            None => Ok(()),
        };
        if let Err(err) = reset {
            let err = Error::from(err);
            warn!("failed to reset conversation: {err}");
            self.append(
                Sender::Assistant,
                MessageKind::Error,
                format!("Error resetting conversation: {}", err.reason()),
            );
            return Err(err);
        }

        {
            let mut state = self.lock_state();
            state.conversation_id = None;
            state.transcript.messages.clear();
        }
        if let Some(on_cleared) = &self.inner.callbacks.on_transcript_cleared {
            on_cleared();
        }
        info!("conversation reset");

        self.start_gated().await.map(|_| ())
    }
}

/// Clears the busy flag when dropped, which also covers a request future
/// dropped before completion.
struct BusyGuard<'a> {
    client: &'a ConversationClient,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.client.leave_busy();
    }
}

/// Holds the client in the initializing stage until dropped.
struct InitializingGuard<'a> {
    client: &'a ConversationClient,
}

impl<'a> InitializingGuard<'a> {
    fn enter(client: &'a ConversationClient) -> Self {
        client.lock_state().initializing = true;
        Self { client }
    }
}

impl Drop for InitializingGuard<'_> {
    fn drop(&mut self) {
        self.client.lock_state().initializing = false;
    }
}
