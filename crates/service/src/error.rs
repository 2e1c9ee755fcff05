use std::fmt::{self, Display, Formatter};

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The service is unreachable, or it answered with a non-2xx status.
    Transport,
    /// The service answered, but the payload is malformed, lacks the
    /// expected fields, or explicitly reports a failure.
    Protocol,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Transport => write!(f, "Transport error"),
            ErrorKind::Protocol => write!(f, "Protocol error"),
        }
    }
}
