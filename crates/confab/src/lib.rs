//! A chat client for conversational assistants served over HTTP.
//!
//! The crate includes a CLI tool for using in the terminal. And you can also
//! use it as a library to embed the conversation into your own host apps.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod config;
mod session;

pub use session::{Session, SessionBuilder};

/// Re-exports of [`confab_core`] crate.
pub mod core {
    pub use confab_core::*;
}
