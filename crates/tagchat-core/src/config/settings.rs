//! Process-wide settings.

use super::binding::TagBinding;
use crate::session::Session;
use serde::{Deserialize, Serialize};

/// Behavior given to new sessions when none is configured.
pub const DEFAULT_SYSTEM_BEHAVIOR: &str = "You are a helpful assistant.";

/// Behavior of the "last active" session of a fresh install.
pub const DEFAULT_LAST_ACTIVE_BEHAVIOR: &str = "You are a helpful assistant";

/// Model requested from the completion endpoint by default.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

pub const DEFAULT_RETENTION_DAYS: u32 = 10;

/// Upper bound for `retention_days`.
pub const MAX_RETENTION_DAYS: u32 = 30;

/// Clamps a user supplied retention to `[0, MAX_RETENTION_DAYS]`.
pub fn clamp_retention_days(days: i64) -> u32 {
    days.clamp(0, MAX_RETENTION_DAYS as i64) as u32
}

/// Process-wide configuration, loaded once and persisted on change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Bearer credential for the completion endpoint. Empty means unset.
    pub api_key: String,
    /// Model name sent with every completion request.
    pub model: String,
    /// Tags that seed a session, in evaluation order.
    pub tags: Vec<String>,
    /// Template paths, positionally bound to `tags`.
    pub template_paths: Vec<String>,
    /// Content of the system turn of every new session.
    pub system_behavior: String,
    /// Sessions older than this many elapsed days are evicted.
    pub retention_days: u32,
    /// Working session of the most recently closed view.
    pub last_active: Session,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            tags: Vec::new(),
            template_paths: Vec::new(),
            system_behavior: DEFAULT_SYSTEM_BEHAVIOR.to_string(),
            retention_days: DEFAULT_RETENTION_DAYS,
            last_active: Session::detached(DEFAULT_LAST_ACTIVE_BEHAVIOR),
        }
    }
}

impl Settings {
    /// Returns the configured bindings in evaluation order.
    pub fn tag_bindings(&self) -> Vec<TagBinding> {
        TagBinding::zip(&self.tags, &self.template_paths)
    }

    /// Returns the configured credential, if any.
    pub fn credential(&self) -> Option<&str> {
        let key = self.api_key.trim();
        (!key.is_empty()).then_some(key)
    }
}

/// Supplies the bearer credential at request time.
///
/// The credential may change while the process runs (settings edits), so
/// clients ask for it on every call instead of capturing it once.
pub trait CredentialSource: Send + Sync {
    /// Returns the credential, or `None` when it is not configured.
    fn api_key(&self) -> Option<String>;

    /// Returns the model to request.
    fn model(&self) -> String {
        DEFAULT_MODEL.to_string()
    }
}
