use confab_service::ErrorKind;
use serde::{Deserialize, Serialize};

/// Mirrors [`ErrorKind`] so presets can be (de)serialized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetErrorKind {
    Transport,
    Protocol,
}

impl From<PresetErrorKind> for ErrorKind {
    #[inline]
    fn from(kind: PresetErrorKind) -> Self {
        match kind {
            PresetErrorKind::Transport => ErrorKind::Transport,
            PresetErrorKind::Protocol => ErrorKind::Protocol,
        }
    }
}

/// A failure the service should report.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetFailure {
    pub kind: PresetErrorKind,
    pub message: String,
}

/// The preset outcome of one service call.
///
/// For a start call the success payload is the conversation id, for a
/// chat call it is the answer, and it is ignored for a reset call.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetReply {
    #[serde(rename = "success")]
    Success(String),
    #[serde(rename = "failure")]
    Failure(PresetFailure),
}

impl PresetReply {
    /// Creates a successful reply.
    #[inline]
    pub fn success<S: Into<String>>(payload: S) -> Self {
        Self::Success(payload.into())
    }

    /// Creates a reply failing like an unreachable service or a non-2xx
    /// status would.
    #[inline]
    pub fn transport_failure<S: Into<String>>(message: S) -> Self {
        Self::Failure(PresetFailure {
            kind: PresetErrorKind::Transport,
            message: message.into(),
        })
    }

    /// Creates a reply failing like a malformed or explicitly failed
    /// payload would.
    #[inline]
    pub fn protocol_failure<S: Into<String>>(message: S) -> Self {
        Self::Failure(PresetFailure {
            kind: PresetErrorKind::Protocol,
            message: message.into(),
        })
    }
}
