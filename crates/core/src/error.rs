use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt::{self, Display};

use confab_service::{ChatServiceError, ErrorKind as ServiceErrorKind};

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The service was unreachable or answered with a non-2xx status.
    Transport,
    /// The service answered with a malformed payload or reported a
    /// failure.
    Protocol,
    /// The input was rejected before anything was sent.
    Validation,
    /// Another request is still outstanding.
    Busy,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Transport => write!(f, "Transport error"),
            ErrorKind::Protocol => write!(f, "Protocol error"),
            ErrorKind::Validation => write!(f, "Invalid input"),
            ErrorKind::Busy => write!(f, "Another request is in progress"),
        }
    }
}

/// Describes a failed client operation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Error {
    kind: ErrorKind,
    reason: Option<String>,
}

impl Error {
    /// Creates a new error with the `Validation` kind.
    #[inline]
    pub fn validation() -> Self {
        Self {
            kind: ErrorKind::Validation,
            reason: None,
        }
    }

    /// Creates a new error with the `Busy` kind.
    #[inline]
    pub fn busy() -> Self {
        Self {
            kind: ErrorKind::Busy,
            reason: None,
        }
    }

    /// Attaches a reason to the error.
    #[inline]
    pub fn with_reason<S: Into<String>>(self, reason: S) -> Self {
        Self {
            kind: self.kind,
            reason: Some(reason.into()),
        }
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the reason for the error.
    #[inline]
    pub fn reason(&self) -> Cow<'_, str> {
        match self.reason.as_deref() {
            Some(reason) => Cow::Borrowed(reason),
            None => Cow::Owned(format!("{}", self.kind)),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "{}: {reason}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl StdError for Error {}

impl From<Box<dyn ChatServiceError>> for Error {
    fn from(err: Box<dyn ChatServiceError>) -> Self {
        let kind = match err.kind() {
            ServiceErrorKind::Transport => ErrorKind::Transport,
            ServiceErrorKind::Protocol => ErrorKind::Protocol,
        };
        Self {
            kind,
            reason: Some(err.to_string()),
        }
    }
}
