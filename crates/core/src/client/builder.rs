use confab_service::ChatService;

use super::{Callbacks, ConversationClient, DEFAULT_WELCOME_MESSAGE, Settings};
use crate::service_client::ServiceClient;
use crate::transcript::Message;

/// [`ConversationClient`] builder.
pub struct ConversationClientBuilder {
    pub(crate) service: ServiceClient,
    pub(crate) settings: Settings,
    pub(crate) callbacks: Callbacks,
}

impl ConversationClientBuilder {
    /// Creates a new builder with the specified chat service.
    #[inline]
    pub fn with_service<S: ChatService + 'static>(service: S) -> Self {
        Self {
            service: ServiceClient::new(service),
            settings: Settings {
                welcome_message: DEFAULT_WELCOME_MESSAGE.to_owned(),
                realtime: None,
                suggestions: vec![],
            },
            callbacks: Callbacks::default(),
        }
    }

    /// Sets the message greeting the user once a conversation starts.
    #[inline]
    pub fn with_welcome_message<S: Into<String>>(mut self, message: S) -> Self {
        self.settings.welcome_message = message.into();
        self
    }

    /// Asks the service to use (or not) live data for every question.
    #[inline]
    pub fn with_realtime(mut self, realtime: bool) -> Self {
        self.settings.realtime = Some(realtime);
        self
    }

    /// Sets the suggested prompts offered to the user.
    #[inline]
    pub fn with_suggestions<I, S>(mut self, suggestions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.settings.suggestions =
            suggestions.into_iter().map(Into::into).collect();
        self
    }

    /// Attaches a callback to be invoked when a message is appended to
    /// the transcript.
    #[inline]
    pub fn on_message(
        mut self,
        on_message: impl Fn(&Message) + Send + Sync + 'static,
    ) -> Self {
        self.callbacks.on_message = Some(Box::new(on_message));
        self
    }

    /// Attaches a callback to be invoked when the transcript is cleared.
    #[inline]
    pub fn on_transcript_cleared(
        mut self,
        on_transcript_cleared: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        self.callbacks.on_transcript_cleared =
            Some(Box::new(on_transcript_cleared));
        self
    }

    /// Attaches a callback to be invoked when the client becomes busy
    /// (`true`, input should be disabled) or idle again (`false`).
    #[inline]
    pub fn on_busy_changed(
        mut self,
        on_busy_changed: impl Fn(bool) + Send + Sync + 'static,
    ) -> Self {
        self.callbacks.on_busy_changed = Some(Box::new(on_busy_changed));
        self
    }

    /// Attaches a callback to be invoked when the input should regain
    /// focus, after an answer has been received.
    #[inline]
    pub fn on_focus_input(
        mut self,
        on_focus_input: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        self.callbacks.on_focus_input = Some(Box::new(on_focus_input));
        self
    }

    /// Builds the client.
    #[inline]
    pub fn build(self) -> ConversationClient {
        ConversationClient::from_builder(self)
    }
}
