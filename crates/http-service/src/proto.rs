use confab_service::{
    ChatReply, ConversationStarted, ErrorKind, HealthStatus,
};
use serde::Deserialize;
use serde_json::Value;

use crate::{Error, HttpServiceConfig};

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
struct StatusBody {
    status: Option<String>,
    message: Option<String>,
    error: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
struct StartBody {
    #[serde(flatten)]
    status: StatusBody,
    conversation_id: Option<String>,
}

// -----------
// Conversions
// -----------

/// Renders an `error` field, which some deployments fill with a string
/// and others with a structured validation report.
pub fn error_text(error: &Value) -> String {
    match error {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn reported_error(body: &StatusBody) -> Option<String> {
    body.error
        .as_ref()
        .filter(|error| !error.is_null())
        .map(error_text)
}

fn check_status(
    body: &StatusBody,
    config: &HttpServiceConfig,
    fallback: &str,
) -> Result<(), Error> {
    if let Some(error) = reported_error(body) {
        return Err(Error::new(error, ErrorKind::Protocol));
    }
    let Some(expected) = &config.success_status else {
        return Ok(());
    };
    if body.status.as_deref() == Some(expected.as_str()) {
        return Ok(());
    }
    let message = body.message.clone().unwrap_or_else(|| fallback.to_owned());
    Err(Error::new(message, ErrorKind::Protocol))
}

fn decode<'a, T: Deserialize<'a>>(body: &'a Value) -> Result<T, Error> {
    T::deserialize(body).map_err(|err| {
        Error::new(format!("Malformed response: {err}"), ErrorKind::Protocol)
    })
}

pub fn parse_started(
    body: &Value,
    config: &HttpServiceConfig,
) -> Result<ConversationStarted, Error> {
    let body: StartBody = decode(body)?;
    check_status(&body.status, config, "Failed to start conversation")?;
    match body.conversation_id {
        Some(conversation_id) if !conversation_id.is_empty() => {
            Ok(ConversationStarted { conversation_id })
        }
        _ => Err(Error::new(
            "Missing conversation id in response",
            ErrorKind::Protocol,
        )),
    }
}

pub fn parse_chat_reply(
    body: &Value,
    config: &HttpServiceConfig,
) -> Result<ChatReply, Error> {
    let Some(object) = body.as_object() else {
        return Err(Error::new(
            "Malformed response: expected an object",
            ErrorKind::Protocol,
        ));
    };
    if let Some(error) = object.get("error").filter(|e| !e.is_null()) {
        return Err(Error::new(error_text(error), ErrorKind::Protocol));
    }
    match object.get(&config.answer_field) {
        Some(Value::String(answer)) => Ok(ChatReply {
            answer: answer.clone(),
        }),
        _ => Err(Error::new(
            format!("Missing `{}` field in response", config.answer_field),
            ErrorKind::Protocol,
        )),
    }
}

pub fn parse_reset(
    body: &Value,
    config: &HttpServiceConfig,
) -> Result<(), Error> {
    let body: StatusBody = decode(body)?;
    check_status(&body, config, "Failed to reset conversation")
}

pub fn parse_health(body: &Value) -> Result<HealthStatus, Error> {
    decode(body)
}

/// Builds the error for a non-2xx response, keeping the service's own
/// explanation when the body carries one.
pub fn status_error(status: u16, body: &str) -> Error {
    let reason = serde_json::from_str::<StatusBody>(body)
        .ok()
        .and_then(|body| reported_error(&body).or(body.message));
    let message = match reason {
        Some(reason) => format!("HTTP status {status}: {reason}"),
        None => format!("HTTP status {status}"),
    };
    Error::new(message, ErrorKind::Transport)
}
