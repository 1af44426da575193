//! Application layer for tagchat.
//!
//! Coordinates the domain types of `tagchat-core` with the collaborators
//! supplied by the host: the session store and its per-document locks, the
//! tag dispatcher reacting to document-open signals, the conversation
//! service extending sessions, the retention sweeper, the settings surface
//! and the single live chat view.

pub mod app;
pub mod conversation_service;
pub mod dispatcher;
pub mod session;
pub mod settings_service;
pub mod sweeper;
pub mod view;

#[cfg(test)]
pub(crate) mod test_support;

pub use app::TagchatApp;
pub use conversation_service::ConversationService;
pub use dispatcher::{DispatchOutcome, SkipReason, TagDispatcher};
pub use session::{KeyedLocks, SessionStore};
pub use settings_service::{CREDENTIAL_ENV_VAR, SettingsService};
pub use sweeper::{RetentionSweeper, SweepReport, elapsed_days};
pub use view::{ChatView, ViewRenderer, ViewSlot};
