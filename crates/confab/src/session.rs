use std::fs;
use std::io;
use std::path::Path;

use confab_core::transcript::{Message, Transcript};
use confab_core::{ConversationClient, ConversationClientBuilder, Error};
use confab_http_service::HttpChatService;
use confab_service::{ChatService, HealthStatus};

use crate::config::AppConfig;

/// A session builder.
///
/// See [`Session`].
pub struct SessionBuilder {
    client_builder: ConversationClientBuilder,
}

impl SessionBuilder {
    /// Creates a session builder talking to the HTTP deployment described
    /// by `config`.
    pub fn from_config(config: &AppConfig) -> Self {
        let service = HttpChatService::new(config.http_service_config());
        Self::with_service(service).with_config(config)
    }

    /// Creates a session builder with a specified chat service.
    pub fn with_service<S: ChatService + 'static>(service: S) -> Self {
        let client_builder = ConversationClientBuilder::with_service(service);
        Self { client_builder }
    }

    /// Applies the client settings of `config`. The service settings are
    /// ignored, they only matter to [`from_config`](Self::from_config).
    pub fn with_config(mut self, config: &AppConfig) -> Self {
        let mut builder = self
            .client_builder
            .with_suggestions(config.suggestions.iter().cloned());
        if let Some(welcome) = &config.welcome_message {
            builder = builder.with_welcome_message(welcome);
        }
        if let Some(realtime) = config.realtime {
            builder = builder.with_realtime(realtime);
        }
        self.client_builder = builder;
        self
    }

    /// Attaches a callback to be invoked when a message is appended.
    #[inline]
    pub fn on_message(
        mut self,
        on_message: impl Fn(&Message) + Send + Sync + 'static,
    ) -> Self {
        self.client_builder = self.client_builder.on_message(on_message);
        self
    }

    /// Attaches a callback to be invoked when the transcript is cleared.
    #[inline]
    pub fn on_transcript_cleared(
        mut self,
        on_transcript_cleared: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        self.client_builder = self
            .client_builder
            .on_transcript_cleared(on_transcript_cleared);
        self
    }

    /// Attaches a callback to be invoked when the session becomes busy or
    /// idle.
    #[inline]
    pub fn on_busy_changed(
        mut self,
        on_busy_changed: impl Fn(bool) + Send + Sync + 'static,
    ) -> Self {
        self.client_builder = self.client_builder.on_busy_changed(on_busy_changed);
        self
    }

    /// Builds a new session.
    pub fn build(self) -> Session {
        Session {
            client: self.client_builder.build(),
        }
    }
}

/// A chat session, like a window that displays messages and has an input
/// box.
///
/// The session holds a fully configured client that you can use directly,
/// and it is basically a wrapper around [`ConversationClient`].
#[derive(Clone)]
pub struct Session {
    client: ConversationClient,
}

impl Session {
    /// Returns the underlying client.
    #[inline]
    pub fn client(&self) -> &ConversationClient {
        &self.client
    }

    /// Starts the conversation, greeting the user.
    #[inline]
    pub async fn start(&self) -> Result<String, Error> {
        self.client.start().await
    }

    /// Sends a message to the session.
    #[inline]
    pub async fn send_message(&self, message: &str) -> Result<String, Error> {
        self.client.send(message).await
    }

    /// Sends the suggested prompt numbered `number`, counting from 1 as
    /// they are listed to the user.
    pub async fn send_suggestion(&self, number: usize) -> Result<String, Error> {
        let index = number.checked_sub(1).unwrap_or(usize::MAX);
        self.client.send_suggestion(index).await
    }

    /// Resets the conversation.
    #[inline]
    pub async fn reset(&self) -> Result<(), Error> {
        self.client.reset().await
    }

    /// Probes the service health.
    #[inline]
    pub async fn check_health(&self) -> Result<HealthStatus, Error> {
        self.client.check_health().await
    }

    /// Returns a snapshot of the transcript.
    #[inline]
    pub fn transcript(&self) -> Transcript {
        self.client.transcript()
    }

    /// Writes the transcript as a standalone HTML document to `path`.
    pub fn export_transcript(&self, path: &Path) -> io::Result<()> {
        let document = format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n\
             <meta charset=\"utf-8\">\n<title>Conversation</title>\n\
             </head>\n<body>\n<div id=\"chat-messages\">\n{}</div>\n\
             </body>\n</html>\n",
            self.transcript().to_html()
        );
        fs::write(path, document)?;
        info!("transcript exported to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use confab_core::ErrorKind;
    use confab_test_service::{PresetReply, TestChatService};

    use super::*;

    #[tokio::test]
    async fn test_configured_session() {
        let service = TestChatService::default();
        service.add_start_reply(PresetReply::success("abc123"));
        service.add_chat_reply(PresetReply::success("See [docs](javascript:x)"));

        let mut config = AppConfig::with_base_url("http://unused");
        config.welcome_message = Some("Welcome!".to_owned());
        config.realtime = Some(true);
        config.suggestions = vec!["Find Rust issues".to_owned()];
        let session = SessionBuilder::with_service(service.clone())
            .with_config(&config)
            .build();

        session.start().await.unwrap();
        assert_eq!(session.transcript().messages()[0].text(), "Welcome!");

        let err = session.send_suggestion(0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        session.send_suggestion(1).await.unwrap();
        let requests = service.chat_requests();
        assert_eq!(requests[0].question, "Find Rust issues");
        assert_eq!(requests[0].realtime, Some(true));

        let path = std::env::temp_dir().join(format!(
            "confab-transcript-{}.html",
            std::process::id()
        ));
        session.export_transcript(&path).unwrap();
        let document = fs::read_to_string(&path).unwrap();
        fs::remove_file(&path).ok();
        assert!(document.contains("<div class=\"message user-message\">"));
        assert!(document.contains("Find Rust issues"));
        assert!(!document.contains("javascript"));
    }
}
