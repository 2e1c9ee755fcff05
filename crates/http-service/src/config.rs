use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::str::FromStr;

use reqwest::Url;

/// Placeholder substituted with the conversation id in a reset path.
pub const CONVERSATION_ID_PLACEHOLDER: &str = "{conversation_id}";

/// Known deployments of the conversational backend.
///
/// The deployments disagree on endpoint paths and response field names,
/// so the profile only seeds defaults; every setting can still be
/// overridden through [`HttpServiceConfigBuilder`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ServiceProfile {
    /// The API gateway deployment: `/api/chat` answering in `answer`,
    /// `/api/reset` without an id, and an explicit `success` status.
    #[default]
    Gateway,
    /// The bare application: `/chat` answering in `response`, and
    /// `/reset-conversation/{conversation_id}`. It reports no status
    /// field, so success is judged by the payload alone.
    Direct,
}

impl ServiceProfile {
    fn chat_path(self) -> &'static str {
        match self {
            ServiceProfile::Gateway => "/api/chat",
            ServiceProfile::Direct => "/chat",
        }
    }

    fn reset_path(self) -> &'static str {
        match self {
            ServiceProfile::Gateway => "/api/reset",
            ServiceProfile::Direct => "/reset-conversation/{conversation_id}",
        }
    }

    fn answer_field(self) -> &'static str {
        match self {
            ServiceProfile::Gateway => "answer",
            ServiceProfile::Direct => "response",
        }
    }

    fn success_status(self) -> Option<&'static str> {
        match self {
            ServiceProfile::Gateway => Some("success"),
            ServiceProfile::Direct => None,
        }
    }
}

/// Error returned when parsing an unknown [`ServiceProfile`] name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseProfileError(String);

impl Display for ParseProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown service profile `{}`, expected `gateway` or `direct`",
            self.0
        )
    }
}

impl StdError for ParseProfileError {}

impl FromStr for ServiceProfile {
    type Err = ParseProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gateway" => Ok(ServiceProfile::Gateway),
            "direct" => Ok(ServiceProfile::Direct),
            _ => Err(ParseProfileError(s.to_owned())),
        }
    }
}

/// Builder for [`HttpServiceConfig`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HttpServiceConfigBuilder {
    base_url: String,
    profile: ServiceProfile,
    start_path: Option<String>,
    chat_path: Option<String>,
    reset_path: Option<String>,
    health_path: Option<String>,
    answer_field: Option<String>,
    success_status: Option<Option<String>>,
}

impl HttpServiceConfigBuilder {
    /// Creates a builder with the given base URL, e.g.
    /// `http://localhost:5000`.
    #[inline]
    pub fn with_base_url<S: Into<String>>(base_url: S) -> Self {
        Self {
            base_url: base_url.into(),
            profile: ServiceProfile::default(),
            start_path: None,
            chat_path: None,
            reset_path: None,
            health_path: None,
            answer_field: None,
            success_status: None,
        }
    }

    /// Sets the deployment profile seeding the defaults.
    #[inline]
    pub fn with_profile(mut self, profile: ServiceProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Sets the path of the start call.
    #[inline]
    pub fn with_start_path<S: Into<String>>(mut self, path: S) -> Self {
        self.start_path = Some(path.into());
        self
    }

    /// Sets the path of the chat call.
    #[inline]
    pub fn with_chat_path<S: Into<String>>(mut self, path: S) -> Self {
        self.chat_path = Some(path.into());
        self
    }

    /// Sets the path of the reset call. A `{conversation_id}` placeholder
    /// is substituted with the current conversation id.
    #[inline]
    pub fn with_reset_path<S: Into<String>>(mut self, path: S) -> Self {
        self.reset_path = Some(path.into());
        self
    }

    /// Sets the path of the health probe.
    #[inline]
    pub fn with_health_path<S: Into<String>>(mut self, path: S) -> Self {
        self.health_path = Some(path.into());
        self
    }

    /// Sets the name of the field carrying the answer in a chat response.
    #[inline]
    pub fn with_answer_field<S: Into<String>>(mut self, field: S) -> Self {
        self.answer_field = Some(field.into());
        self
    }

    /// Sets the `status` value a start or reset response must carry.
    /// `None` disables the check.
    #[inline]
    pub fn with_success_status<S: Into<String>>(
        mut self,
        status: Option<S>,
    ) -> Self {
        self.success_status = Some(status.map(Into::into));
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> HttpServiceConfig {
        let profile = self.profile;
        HttpServiceConfig {
            base_url: self.base_url.trim_end_matches('/').to_owned(),
            start_path: self
                .start_path
                .unwrap_or_else(|| "/start-conversation".to_owned()),
            chat_path: self
                .chat_path
                .unwrap_or_else(|| profile.chat_path().to_owned()),
            reset_path: self
                .reset_path
                .unwrap_or_else(|| profile.reset_path().to_owned()),
            health_path: self
                .health_path
                .unwrap_or_else(|| "/api/health".to_owned()),
            answer_field: self
                .answer_field
                .unwrap_or_else(|| profile.answer_field().to_owned()),
            success_status: self.success_status.unwrap_or_else(|| {
                profile.success_status().map(ToOwned::to_owned)
            }),
        }
    }
}

/// Configuration for [`HttpChatService`](crate::HttpChatService).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HttpServiceConfig {
    pub(crate) base_url: String,
    pub(crate) start_path: String,
    pub(crate) chat_path: String,
    pub(crate) reset_path: String,
    pub(crate) health_path: String,
    pub(crate) answer_field: String,
    pub(crate) success_status: Option<String>,
}

impl HttpServiceConfig {
    #[inline]
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Returns the reset URL, or `None` if the path needs an id that
    /// isn't available.
    pub(crate) fn reset_url(&self, conversation_id: Option<&str>) -> Option<String> {
        if !self.reset_path.contains(CONVERSATION_ID_PLACEHOLDER) {
            return Some(self.url(&self.reset_path));
        }
        let segment = encode_path_segment(conversation_id?);
        let path = self
            .reset_path
            .replace(CONVERSATION_ID_PLACEHOLDER, &segment);
        Some(self.url(&path))
    }
}

/// Percent-encodes `segment` so that it stays a single path segment.
fn encode_path_segment(segment: &str) -> String {
    let Ok(mut url) = Url::parse("http://localhost") else {
        return segment.to_owned();
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.clear().push(segment);
    }
    url.path().trim_start_matches('/').to_owned()
}
