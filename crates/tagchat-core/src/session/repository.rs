//! Persistent state repository trait.
//!
//! Defines the interface for loading and saving the persisted form of the
//! settings, the "last active" session and the session map snapshot.

use super::model::Session;
use crate::config::Settings;
use crate::error::Result;
use async_trait::async_trait;

/// Everything tagchat keeps on disk between runs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PersistedState {
    pub settings: Settings,
    /// Snapshot of the session store, ordered by key.
    pub sessions: Vec<Session>,
}

/// An abstract repository for the persisted tagchat state.
///
/// Settings changes are written through immediately, while the session map
/// is only written on shutdown. Implementations must therefore be able to
/// update either part without clobbering the other.
#[async_trait]
pub trait StateRepository: Send + Sync {
    /// Loads the persisted state.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(state))`: State found
    /// - `Ok(None)`: Nothing persisted yet
    /// - `Err(_)`: Error occurred during retrieval
    async fn load(&self) -> Result<Option<PersistedState>>;

    /// Saves the settings (including the last active session), leaving the
    /// stored session map untouched.
    async fn save_settings(&self, settings: &Settings) -> Result<()>;

    /// Replaces the stored session map with `sessions`.
    async fn save_sessions(&self, sessions: &[Session]) -> Result<()>;
}
