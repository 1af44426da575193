//! TOML-based StateRepository implementation

use crate::dto::{LegacyPluginDataV1_0_0, SettingsRecordV2_0_0, StateV2_0_0};
use crate::paths::TagchatPaths;
use crate::storage::AtomicTomlFile;
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use tagchat_core::config::Settings;
use tagchat_core::session::{PersistedState, Session, StateRepository};
use tagchat_core::{Result, TagchatError};
use version_migrate::{FromDomain, IntoDomain, MigratesTo};

/// Stores settings and the session map in a single TOML document.
///
/// Settings and sessions are updated independently through read-modify-write
/// cycles on the same file, so a settings change never drops the session
/// map and vice versa.
pub struct TomlStateRepository {
    file: AtomicTomlFile<StateV2_0_0>,
}

impl TomlStateRepository {
    /// Creates a repository backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: AtomicTomlFile::new(path),
        }
    }

    /// Creates a repository at the default location
    /// (`~/.config/tagchat/tagchat.toml`).
    pub fn default_location() -> Result<Self> {
        let path = TagchatPaths::state_file().map_err(|e| TagchatError::config(e.to_string()))?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Imports the legacy plugin's `data.json`, replacing the stored state.
    ///
    /// Returns the imported state.
    pub fn import_legacy(&self, legacy_path: &Path) -> Result<PersistedState> {
        let json = fs::read_to_string(legacy_path).map_err(|e| {
            TagchatError::io(format!(
                "Failed to read legacy data {}: {}",
                legacy_path.display(),
                e
            ))
        })?;
        let legacy: LegacyPluginDataV1_0_0 = serde_json::from_str(&json)?;

        tracing::info!("Migrating legacy plugin data from {:?}", legacy_path);
        let state: StateV2_0_0 = legacy.migrate();
        self.file.save(&state)?;

        let imported: PersistedState = state.into_domain();
        tracing::info!(
            "Imported {} session(s) into {:?}",
            imported.sessions.len(),
            self.file.path()
        );
        Ok(imported)
    }
}

#[async_trait]
impl StateRepository for TomlStateRepository {
    async fn load(&self) -> Result<Option<PersistedState>> {
        let Some(state) = self.file.load()? else {
            tracing::debug!("No state file at {:?}", self.file.path());
            return Ok(None);
        };

        let state: PersistedState = state.into_domain();
        tracing::debug!(
            "Loaded {} session(s) from {:?}",
            state.sessions.len(),
            self.file.path()
        );
        Ok(Some(state))
    }

    async fn save_settings(&self, settings: &Settings) -> Result<()> {
        let record = SettingsRecordV2_0_0::from_domain(settings.clone());
        self.file.update(StateV2_0_0::default(), |state| {
            state.settings = record;
        })?;
        Ok(())
    }

    async fn save_sessions(&self, sessions: &[Session]) -> Result<()> {
        self.file.update(StateV2_0_0::default(), |state| {
            state.set_sessions(sessions);
        })?;
        tracing::info!(
            "Saved {} session(s) to {:?}",
            sessions.len(),
            self.file.path()
        );
        Ok(())
    }
}
