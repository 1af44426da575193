//! Chat-completion boundary.
//!
//! The core sends an ordered transcript and receives the assistant's reply
//! text, or a typed failure. No streaming, no retries.

use crate::notice::Notice;
use crate::session::Turn;
use async_trait::async_trait;
use thiserror::Error;

/// Failure of a single completion request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// No credential is configured. No request was attempted.
    #[error("No API key configured")]
    MissingCredential,

    /// The endpoint rejected the request for rate-limit or quota reasons.
    #[error("Quota exceeded: {message}")]
    QuotaExceeded { message: String },

    /// Any other network or remote failure.
    #[error("Chat completion request failed: {message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },
}

impl ChatError {
    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Transport {
            status,
            message: message.into(),
        }
    }

    /// Maps the failure to the notice shown to the user.
    pub fn notice(&self) -> Notice {
        match self {
            ChatError::MissingCredential => Notice::MissingCredential,
            ChatError::QuotaExceeded { .. } => Notice::QuotaExceeded,
            ChatError::Transport { message, .. } => Notice::RequestFailed(message.clone()),
        }
    }
}

/// Sends a transcript to a remote chat-completion endpoint.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Returns the assistant's reply to `turns`.
    async fn send(&self, turns: &[Turn]) -> Result<String, ChatError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_mapping() {
        assert_eq!(ChatError::MissingCredential.notice(), Notice::MissingCredential);
        assert_eq!(
            ChatError::QuotaExceeded {
                message: "slow down".into()
            }
            .notice(),
            Notice::QuotaExceeded
        );
        assert_eq!(
            ChatError::transport(Some(500), "boom").notice(),
            Notice::RequestFailed("boom".into())
        );
    }

    #[test]
    fn test_transport_message() {
        assert_eq!(
            ChatError::transport(None, "offline").to_string(),
            "Chat completion request failed: offline"
        );
    }
}
