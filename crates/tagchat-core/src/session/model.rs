//! Session domain model.

use super::message::Turn;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The assistant conversation bound to one document.
///
/// The first turn is always the `system` turn rendered from the configured
/// behavior at creation time. Turns are append-only; `last_updated` is
/// refreshed on every append.
///
/// A *detached* session has an empty key. It is not backed by the session
/// store; the default "last active" session of a fresh install is one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Document identity (the document name).
    pub key: String,
    /// Conversation history, oldest first.
    pub turns: Vec<Turn>,
    /// Timestamp of the last appended turn.
    pub last_updated: DateTime<Utc>,
}

impl Session {
    /// Creates a session for `key` whose only turn is the system behavior.
    pub fn new(key: impl Into<String>, system_behavior: impl Into<String>) -> Self {
        Self::new_at(key, system_behavior, Utc::now())
    }

    /// Same as [`Session::new`] with an explicit creation time.
    pub fn new_at(
        key: impl Into<String>,
        system_behavior: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            key: key.into(),
            turns: vec![Turn::system(system_behavior)],
            last_updated: now,
        }
    }

    /// Creates a session that is not bound to any document.
    pub fn detached(system_behavior: impl Into<String>) -> Self {
        Self::new(String::new(), system_behavior)
    }

    pub fn is_detached(&self) -> bool {
        self.key.is_empty()
    }

    /// Appends a turn and refreshes `last_updated`.
    pub fn push(&mut self, turn: Turn) {
        self.push_at(turn, Utc::now());
    }

    pub fn push_at(&mut self, turn: Turn, now: DateTime<Utc>) {
        self.turns.push(turn);
        self.last_updated = now;
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(Turn::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(Turn::assistant(content));
    }

    /// Returns the most recent turn, if any.
    pub fn last_turn(&self) -> Option<&Turn> {
        self.turns.last()
    }
}
