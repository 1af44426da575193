//! User-facing notices.

use std::fmt;

/// A condition the user must be told about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The credential is not configured; nothing was sent.
    MissingCredential,
    /// The endpoint reported a rate-limit or quota problem.
    QuotaExceeded,
    /// A request failed for another reason.
    RequestFailed(String),
    /// The user tried to send an empty message.
    EmptyInput,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::MissingCredential => f.write_str("Please add an api key to the settings"),
            Notice::QuotaExceeded => f.write_str(
                "Quota has been exceeded. Either: \n 1. Too many requests per minute were sent. \n 2. You reached your monthly limit",
            ),
            Notice::RequestFailed(message) => write!(f, "Request failed: {message}"),
            Notice::EmptyInput => f.write_str("Please enter a message."),
        }
    }
}
