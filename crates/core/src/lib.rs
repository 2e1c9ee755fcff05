//! Core logic including the conversation lifecycle, the transcript and
//! message rendering.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod client;
mod error;
pub mod render;
mod service_client;
pub mod transcript;

pub use client::{
    ConversationClient, ConversationClientBuilder, ConversationState,
    DEFAULT_WELCOME_MESSAGE,
};
pub use error::{Error, ErrorKind};
