use crate::transcript::Transcript;

/// The observable stage of a [`ConversationClient`](super::ConversationClient).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ConversationState {
    /// No conversation id.
    #[default]
    Uninitialized,
    /// A start request is in flight.
    Initializing,
    /// A conversation id is present and nothing is in flight.
    Active,
    /// A chat or reset request is in flight; new submissions are rejected.
    Busy,
}

#[derive(Default)]
pub(crate) struct ClientState {
    pub(crate) conversation_id: Option<String>,
    pub(crate) initializing: bool,
    pub(crate) busy: bool,
    pub(crate) transcript: Transcript,
}

impl ClientState {
    #[inline]
    pub(crate) fn stage(&self) -> ConversationState {
        if self.initializing {
            ConversationState::Initializing
        } else if self.busy {
            ConversationState::Busy
        } else if self.conversation_id.is_some() {
            ConversationState::Active
        } else {
            ConversationState::Uninitialized
        }
    }
}
