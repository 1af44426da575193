//! Domain layer of tagchat.
//!
//! Holds the conversation model, settings, the template engine and the
//! traits through which the application layer reaches the host document
//! environment, the completion endpoint and persistent storage.

pub mod chat;
pub mod config;
pub mod error;
pub mod host;
pub mod notice;
pub mod session;
pub mod template;

// Re-export common error type
pub use error::{Result, TagchatError};
