//! A chat service speaking JSON over HTTP.

#[macro_use]
extern crate tracing;

mod config;
mod proto;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use confab_service::{
    ChatReply, ChatRequest, ChatService, ChatServiceError, ConversationStarted,
    ErrorKind, HealthStatus,
};
use mime::Mime;
use reqwest::{Client, RequestBuilder, header};
use serde_json::Value;

pub use config::{
    CONVERSATION_ID_PLACEHOLDER, HttpServiceConfig, HttpServiceConfigBuilder,
    ParseProfileError, ServiceProfile,
};

/// Error type for [`HttpChatService`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ChatServiceError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Chat service reached over HTTP.
#[derive(Clone, Debug)]
pub struct HttpChatService {
    client: Client,
    config: Arc<HttpServiceConfig>,
}

impl HttpChatService {
    /// Creates a new `HttpChatService` with the given configuration.
    #[inline]
    pub fn new(config: HttpServiceConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    /// Creates a new `HttpChatService` sharing an existing HTTP client.
    #[inline]
    pub fn with_client(client: Client, config: HttpServiceConfig) -> Self {
        Self {
            client,
            config: Arc::new(config),
        }
    }

    fn post(&self, url: String) -> RequestBuilder {
        self.client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json")
    }
}

/// Sends the request and decodes the JSON body of a 2xx response.
async fn fetch_json(req: RequestBuilder) -> Result<Value, Error> {
    let resp = req
        .send()
        .await
        .map_err(|err| Error::new(format!("{err}"), ErrorKind::Transport))?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(proto::status_error(status.as_u16(), &body));
    }

    // A missing content type is tolerated, a wrong one is not.
    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(ToOwned::to_owned);
    if let Some(content_type) = &content_type {
        let is_json = content_type
            .parse()
            .map(|m: Mime| m.subtype() == mime::JSON)
            .unwrap_or(false);
        if !is_json {
            return Err(Error::new(
                format!("Unexpected content type: {content_type}"),
                ErrorKind::Protocol,
            ));
        }
    }

    let bytes = resp
        .bytes()
        .await
        .map_err(|err| Error::new(format!("{err}"), ErrorKind::Transport))?;
    trace!("got response body: {}", String::from_utf8_lossy(&bytes));
    serde_json::from_slice(&bytes).map_err(|err| {
        Error::new(format!("Malformed response: {err}"), ErrorKind::Protocol)
    })
}

impl ChatService for HttpChatService {
    type Error = Error;

    fn start_conversation(
        &self,
    ) -> impl Future<Output = Result<ConversationStarted, Self::Error>>
    + Send
    + 'static {
        let req = self.post(self.config.url(&self.config.start_path));
        let config = Arc::clone(&self.config);
        async move {
            debug!("starting conversation");
            let body = fetch_json(req).await?;
            proto::parse_started(&body, &config)
        }
    }

    fn send_chat(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<ChatReply, Self::Error>> + Send + 'static
    {
        let http_req = self
            .post(self.config.url(&self.config.chat_path))
            .json(req);
        let config = Arc::clone(&self.config);
        let conversation_id = req.conversation_id.clone();
        async move {
            debug!("sending chat message to {conversation_id}");
            let body = fetch_json(http_req).await?;
            proto::parse_chat_reply(&body, &config)
        }
    }

    fn reset_conversation(
        &self,
        conversation_id: Option<&str>,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'static {
        let req = self
            .config
            .reset_url(conversation_id)
            .map(|url| self.post(url));
        let config = Arc::clone(&self.config);
        async move {
            let Some(req) = req else {
                return Err(Error::new(
                    "No conversation to reset",
                    ErrorKind::Protocol,
                ));
            };
            debug!("resetting conversation");
            let body = fetch_json(req).await?;
            proto::parse_reset(&body, &config)
        }
    }

    fn check_health(
        &self,
    ) -> impl Future<Output = Result<HealthStatus, Self::Error>> + Send + 'static
    {
        let req = self
            .client
            .get(self.config.url(&self.config.health_path))
            .header(header::ACCEPT, "application/json");
        async move {
            let body = fetch_json(req).await?;
            proto::parse_health(&body)
        }
    }
}
