//! Transcript-related types.

use std::fmt::Write as _;

use crate::render::render_markdown;

/// Who authored a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Sender {
    /// The person typing into the input.
    User,
    /// The remote service, or the client speaking on its behalf.
    Assistant,
}

impl Sender {
    /// Returns a lowercase label, suitable for CSS classes.
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Assistant => "assistant",
        }
    }
}

/// Whether a message carries regular content or reports a failure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// A regular turn.
    #[default]
    Normal,
    /// An error surfaced to the user.
    Error,
}

/// A rendered turn in the transcript. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Message {
    sender: Sender,
    kind: MessageKind,
    text: String,
    html: String,
}

impl Message {
    pub(crate) fn new(sender: Sender, kind: MessageKind, text: String) -> Self {
        let html = render_markdown(&text);
        Self {
            sender,
            kind,
            text,
            html,
        }
    }

    /// Returns the author of this message.
    #[inline]
    pub fn sender(&self) -> Sender {
        self.sender
    }

    /// Returns the kind of this message.
    #[inline]
    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Returns `true` if this message reports a failure.
    #[inline]
    pub fn is_error(&self) -> bool {
        self.kind == MessageKind::Error
    }

    /// Returns the source text, possibly Markdown-formatted.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the sanitized HTML rendering of the text.
    #[inline]
    pub fn html(&self) -> &str {
        &self.html
    }
}

/// The ordered, append-only sequence of messages shown to the user.
///
/// The only way to remove messages is clearing the whole transcript,
/// which happens when the conversation is reset.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct Transcript {
    pub(crate) messages: Vec<Message>,
}

impl Transcript {
    /// Returns all messages, oldest first.
    #[inline]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the number of messages.
    #[inline]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if there are no messages.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns the most recent message.
    #[inline]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Renders the transcript as an HTML fragment, one element per message.
    pub fn to_html(&self) -> String {
        let mut output = String::new();
        for message in &self.messages {
            let error_class = if message.is_error() { " error" } else { "" };
            // Writing into a `String` cannot fail.
            let _ = write!(
                output,
                "<div class=\"message {sender}-message{error_class}\">\
                 <div class=\"message-content\">{html}</div></div>\n",
                sender = message.sender.as_str(),
                html = message.html,
            );
        }
        output
    }
}
