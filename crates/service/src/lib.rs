//! An abstraction layer for remote conversational services.
//!
//! This crate establishes the contract a conversation client relies on
//! when talking to a chat backend: starting a conversation, asking a
//! question within it, resetting it, and probing the service health.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to. Transport details
//! (HTTP paths, field names, etc.) belong to the implementing crates.

#![deny(missing_docs)]

mod error;
mod request;
mod response;
mod service;

pub use error::*;
pub use request::*;
pub use response::*;
pub use service::*;
