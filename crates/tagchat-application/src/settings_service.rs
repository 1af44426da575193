//! Settings surface.
//!
//! Holds the process-wide [`Settings`] and writes every change through to
//! the [`StateRepository`] before returning.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tagchat_core::config::{
    CredentialSource, DEFAULT_MODEL, Settings, clamp_retention_days, normalize_tag,
    parse_csv_list,
};
use tagchat_core::session::{Session, StateRepository};
use tagchat_core::{Result, TagchatError};

/// Environment variable consulted when no credential is configured.
pub const CREDENTIAL_ENV_VAR: &str = "OPENAI_API_KEY";

pub struct SettingsService {
    settings: RwLock<Settings>,
    repository: Arc<dyn StateRepository>,
    credential_env_var: Option<String>,
}

impl SettingsService {
    pub fn new(settings: Settings, repository: Arc<dyn StateRepository>) -> Self {
        Self {
            settings: RwLock::new(settings),
            repository,
            credential_env_var: Some(CREDENTIAL_ENV_VAR.to_string()),
        }
    }

    /// Disables the environment fallback for the credential.
    pub fn without_env_fallback(mut self) -> Self {
        self.credential_env_var = None;
        self
    }

    /// Returns a copy of the current settings.
    pub fn settings(&self) -> Settings {
        self.read().clone()
    }

    pub async fn set_api_key(&self, api_key: &str) -> Result<()> {
        let api_key = api_key.trim().to_string();
        self.update(|settings| settings.api_key = api_key).await
    }

    /// Sets the ordered tag list from comma separated text.
    ///
    /// Entries are trimmed, a leading `#` is stripped and empty entries are
    /// dropped.
    pub async fn set_tags_csv(&self, value: &str) -> Result<()> {
        let tags: Vec<String> = parse_csv_list(value)
            .iter()
            .map(|tag| normalize_tag(tag).to_string())
            .filter(|tag| !tag.is_empty())
            .collect();
        self.update(|settings| settings.tags = tags).await
    }

    /// Sets the ordered template path list from comma separated text.
    pub async fn set_template_paths_csv(&self, value: &str) -> Result<()> {
        let paths = parse_csv_list(value);
        self.update(|settings| settings.template_paths = paths).await
    }

    pub async fn set_system_behavior(&self, behavior: &str) -> Result<()> {
        let behavior = behavior.to_string();
        self.update(|settings| settings.system_behavior = behavior)
            .await
    }

    /// Sets the retention, clamped to `[0, 30]`. Returns the stored value.
    pub async fn set_retention_days(&self, days: i64) -> Result<u32> {
        let days = clamp_retention_days(days);
        self.update(|settings| settings.retention_days = days).await?;
        Ok(days)
    }

    /// Parses and sets the retention. Non-numeric input is rejected and
    /// leaves the settings unchanged.
    pub async fn set_retention_days_str(&self, value: &str) -> Result<u32> {
        let days: i64 = value.trim().parse().map_err(|_| {
            TagchatError::config(format!("Retention must be a whole number of days, got '{value}'"))
        })?;
        self.set_retention_days(days).await
    }

    pub async fn set_model(&self, model: &str) -> Result<()> {
        let model = match model.trim() {
            "" => DEFAULT_MODEL.to_string(),
            model => model.to_string(),
        };
        self.update(|settings| settings.model = model).await
    }

    /// Stores the working session of a closed view.
    pub async fn set_last_active(&self, session: Session) -> Result<()> {
        self.update(|settings| settings.last_active = session).await
    }

    /// Writes the current settings to the repository.
    pub async fn persist(&self) -> Result<()> {
        let snapshot = self.settings();
        self.repository.save_settings(&snapshot).await
    }

    async fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Settings),
    {
        let snapshot = {
            let mut settings = self.write();
            f(&mut settings);
            settings.clone()
        };
        self.repository.save_settings(&snapshot).await?;
        tracing::debug!("Settings saved");
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, Settings> {
        self.settings
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Settings> {
        self.settings
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CredentialSource for SettingsService {
    fn api_key(&self) -> Option<String> {
        if let Some(key) = self.read().credential() {
            return Some(key.to_string());
        }
        self.credential_env_var
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }

    fn model(&self) -> String {
        self.read().model.clone()
    }
}
