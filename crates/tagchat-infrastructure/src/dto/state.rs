//! Persisted state DTOs.
//!
//! The TOML document mirrors the domain model but keeps timestamps as
//! RFC 3339 strings and the session map as an explicit table keyed by
//! document name.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use version_migrate::{FromDomain, IntoDomain, Versioned};

use tagchat_core::config::{
    DEFAULT_MODEL, DEFAULT_RETENTION_DAYS, DEFAULT_SYSTEM_BEHAVIOR, Settings,
    clamp_retention_days,
};
use tagchat_core::session::{PersistedState, Session, Turn};

pub const STATE_VERSION: &str = "2.0.0";

fn default_state_version() -> String {
    STATE_VERSION.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_system_behavior() -> String {
    DEFAULT_SYSTEM_BEHAVIOR.to_string()
}

fn default_retention_days() -> i64 {
    DEFAULT_RETENTION_DAYS as i64
}

/// Parses an RFC 3339 timestamp, falling back to `now` for unreadable
/// values so a damaged entry is kept rather than evicted on the next sweep.
pub(crate) fn parse_timestamp(key: &str, value: &str) -> DateTime<Utc> {
    match DateTime::parse_from_rfc3339(value) {
        Ok(timestamp) => timestamp.with_timezone(&Utc),
        Err(err) => {
            tracing::warn!(
                "Unreadable last_updated '{}' for session '{}': {}",
                value,
                key,
                err
            );
            Utc::now()
        }
    }
}

// ============================================================================
// Session record
// ============================================================================

/// One session as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Versioned)]
#[versioned(version = "2.0.0")]
pub struct SessionRecordV2_0_0 {
    #[serde(default)]
    pub key: String,
    /// RFC 3339 timestamp of the last appended turn.
    pub last_updated: String,
    #[serde(default)]
    pub turns: Vec<Turn>,
}

impl IntoDomain<Session> for SessionRecordV2_0_0 {
    fn into_domain(self) -> Session {
        let last_updated = parse_timestamp(&self.key, &self.last_updated);
        Session {
            key: self.key,
            turns: self.turns,
            last_updated,
        }
    }
}

impl FromDomain<Session> for SessionRecordV2_0_0 {
    fn from_domain(session: Session) -> Self {
        Self {
            key: session.key,
            last_updated: session.last_updated.to_rfc3339(),
            turns: session.turns,
        }
    }
}

// ============================================================================
// Settings record
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Versioned)]
#[versioned(version = "2.0.0")]
pub struct SettingsRecordV2_0_0 {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub template_paths: Vec<String>,
    #[serde(default = "default_system_behavior")]
    pub system_behavior: String,
    /// Stored signed so hand edited negative values clamp instead of failing.
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_active: Option<SessionRecordV2_0_0>,
}

impl Default for SettingsRecordV2_0_0 {
    fn default() -> Self {
        Self::from_domain(Settings::default())
    }
}

impl IntoDomain<Settings> for SettingsRecordV2_0_0 {
    fn into_domain(self) -> Settings {
        let defaults = Settings::default();
        Settings {
            api_key: self.api_key,
            model: self.model,
            tags: self.tags,
            template_paths: self.template_paths,
            system_behavior: self.system_behavior,
            retention_days: clamp_retention_days(self.retention_days),
            last_active: self
                .last_active
                .map(|record| -> Session { record.into_domain() })
                .unwrap_or(defaults.last_active),
        }
    }
}

impl FromDomain<Settings> for SettingsRecordV2_0_0 {
    fn from_domain(settings: Settings) -> Self {
        Self {
            api_key: settings.api_key,
            model: settings.model,
            tags: settings.tags,
            template_paths: settings.template_paths,
            system_behavior: settings.system_behavior,
            retention_days: settings.retention_days as i64,
            last_active: Some(SessionRecordV2_0_0::from_domain(settings.last_active)),
        }
    }
}

// ============================================================================
// State document
// ============================================================================

/// Root of `tagchat.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Versioned)]
#[versioned(version = "2.0.0")]
pub struct StateV2_0_0 {
    #[serde(default = "default_state_version")]
    pub version: String,
    #[serde(default)]
    pub settings: SettingsRecordV2_0_0,
    /// Session map keyed by document name.
    #[serde(default)]
    pub sessions: BTreeMap<String, SessionRecordV2_0_0>,
}

impl Default for StateV2_0_0 {
    fn default() -> Self {
        Self {
            version: default_state_version(),
            settings: SettingsRecordV2_0_0::default(),
            sessions: BTreeMap::new(),
        }
    }
}

impl StateV2_0_0 {
    /// Replaces the session map with `sessions`.
    pub fn set_sessions(&mut self, sessions: &[Session]) {
        self.sessions = sessions
            .iter()
            .cloned()
            .map(|session| {
                (
                    session.key.clone(),
                    SessionRecordV2_0_0::from_domain(session),
                )
            })
            .collect();
    }
}

impl IntoDomain<PersistedState> for StateV2_0_0 {
    fn into_domain(self) -> PersistedState {
        let sessions: Vec<Session> = self
            .sessions
            .into_iter()
            .map(|(key, mut record)| -> Session {
                // The table key is authoritative.
                record.key = key;
                record.into_domain()
            })
            .collect();

        PersistedState {
            settings: self.settings.into_domain(),
            sessions,
        }
    }
}

impl FromDomain<PersistedState> for StateV2_0_0 {
    fn from_domain(state: PersistedState) -> Self {
        let mut dto = Self {
            version: default_state_version(),
            settings: SettingsRecordV2_0_0::from_domain(state.settings),
            sessions: BTreeMap::new(),
        };
        dto.set_sessions(&state.sessions);
        dto
    }
}
