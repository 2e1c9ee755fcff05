//! Application configuration read from the environment.

use std::env;
use std::error::Error;
use std::fmt::{self, Display};

use confab_http_service::{
    HttpServiceConfig, HttpServiceConfigBuilder, ServiceProfile,
};

/// Prompts offered when `CONFAB_SUGGESTIONS` is not set.
pub const DEFAULT_SUGGESTIONS: &[&str] = &[
    "How do I make my first open source contribution?",
    "Find beginner-friendly Python repositories",
    "What does a good first issue look like?",
];

/// Separator between prompts in `CONFAB_SUGGESTIONS`.
const SUGGESTION_SEPARATOR: char = '|';

/// Error returned when the environment holds an unusable configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set.
    Missing(&'static str),
    /// A variable is set to a value that cannot be used.
    Invalid {
        /// Name of the variable.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(name) => {
                write!(f, "{name} environment variable is not set")
            }
            ConfigError::Invalid { name, reason } => {
                write!(f, "{name} is invalid: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Everything needed to assemble a [`Session`](crate::Session) against
/// an HTTP deployment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    /// Base URL of the service, e.g. `http://localhost:5000`.
    pub base_url: String,
    /// Deployment profile seeding paths and field names.
    pub profile: ServiceProfile,
    /// Overrides the chat path of the profile.
    pub chat_path: Option<String>,
    /// Overrides the reset path of the profile.
    pub reset_path: Option<String>,
    /// Overrides the answer field of the profile.
    pub answer_field: Option<String>,
    /// Realtime preference sent with every question.
    pub realtime: Option<bool>,
    /// Overrides the welcome message.
    pub welcome_message: Option<String>,
    /// Suggested prompts.
    pub suggestions: Vec<String>,
}

impl AppConfig {
    /// Creates a configuration with defaults for everything but the URL.
    pub fn with_base_url<S: Into<String>>(base_url: S) -> Self {
        Self {
            base_url: base_url.into(),
            profile: ServiceProfile::default(),
            chat_path: None,
            reset_path: None,
            answer_field: None,
            realtime: None,
            welcome_message: None,
            suggestions: DEFAULT_SUGGESTIONS
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
        }
    }

    /// Reads the configuration from the `CONFAB_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable
    /// name to its value.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let base_url = non_empty("CONFAB_BASE_URL")
            .ok_or(ConfigError::Missing("CONFAB_BASE_URL"))?;
        let mut config = Self::with_base_url(base_url);

        if let Some(profile) = non_empty("CONFAB_PROFILE") {
            config.profile =
                profile.parse().map_err(|err| ConfigError::Invalid {
                    name: "CONFAB_PROFILE",
                    reason: format!("{err}"),
                })?;
        }
        if let Some(realtime) = non_empty("CONFAB_REALTIME") {
            config.realtime = Some(parse_bool("CONFAB_REALTIME", &realtime)?);
        }
        if let Some(suggestions) = non_empty("CONFAB_SUGGESTIONS") {
            config.suggestions = suggestions
                .split(SUGGESTION_SEPARATOR)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToOwned::to_owned)
                .collect();
        }
        config.chat_path = non_empty("CONFAB_CHAT_PATH");
        config.reset_path = non_empty("CONFAB_RESET_PATH");
        config.answer_field = non_empty("CONFAB_ANSWER_FIELD");
        config.welcome_message = non_empty("CONFAB_WELCOME");

        Ok(config)
    }

    /// Builds the HTTP service configuration.
    pub fn http_service_config(&self) -> HttpServiceConfig {
        let mut builder = HttpServiceConfigBuilder::with_base_url(&self.base_url)
            .with_profile(self.profile);
        if let Some(path) = &self.chat_path {
            builder = builder.with_chat_path(path);
        }
        if let Some(path) = &self.reset_path {
            builder = builder.with_reset_path(path);
        }
        if let Some(field) = &self.answer_field {
            builder = builder.with_answer_field(field);
        }
        builder.build()
    }
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            reason: format!("expected a boolean, got `{value}`"),
        }),
    }
}
