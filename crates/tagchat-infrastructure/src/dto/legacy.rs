//! DTOs for the legacy editor plugin's `data.json`.
//!
//! The plugin stored its settings and the conversation map as one JSON
//! object. Dates were serialized by the host as ISO strings; numbers were
//! JavaScript numbers, so retention may arrive as a float.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use version_migrate::{MigratesTo, Versioned};

use tagchat_core::config::{DEFAULT_MODEL, DEFAULT_SYSTEM_BEHAVIOR, clamp_retention_days};
use tagchat_core::session::Turn;

use super::state::{STATE_VERSION, SessionRecordV2_0_0, SettingsRecordV2_0_0, StateV2_0_0};

fn default_behavior() -> String {
    DEFAULT_SYSTEM_BEHAVIOR.to_string()
}

fn default_retention() -> f64 {
    10.0
}

/// A dated conversation as written by the plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyConversationV1_0_0 {
    #[serde(default)]
    pub conversations: Vec<Turn>,
    #[serde(default)]
    pub last_updated: String,
}

/// Represents V1.0.0: the plugin's `data.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.0.0")]
pub struct LegacyPluginDataV1_0_0 {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub path_to_prompt_template: Vec<String>,
    #[serde(default = "default_behavior")]
    pub chatgpt_behavior: String,
    #[serde(default = "default_retention")]
    pub convo_retention: f64,
    #[serde(default)]
    pub conversations: BTreeMap<String, LegacyConversationV1_0_0>,
    #[serde(default)]
    pub last_convo: Option<LegacyConversationV1_0_0>,
}

fn legacy_session(key: String, conversation: LegacyConversationV1_0_0) -> SessionRecordV2_0_0 {
    SessionRecordV2_0_0 {
        key,
        last_updated: conversation.last_updated,
        turns: conversation.conversations,
    }
}

/// Migration from the plugin's JSON layout to the TOML state document.
impl MigratesTo<StateV2_0_0> for LegacyPluginDataV1_0_0 {
    fn migrate(self) -> StateV2_0_0 {
        let retention_days = if self.convo_retention.is_finite() {
            self.convo_retention.trunc() as i64
        } else {
            default_retention() as i64
        };

        let settings = SettingsRecordV2_0_0 {
            api_key: self.api_key,
            model: DEFAULT_MODEL.to_string(),
            tags: self.tags,
            template_paths: self.path_to_prompt_template,
            system_behavior: self.chatgpt_behavior,
            retention_days: clamp_retention_days(retention_days) as i64,
            last_active: self
                .last_convo
                .map(|conversation| legacy_session(String::new(), conversation)),
        };

        let sessions = self
            .conversations
            .into_iter()
            .map(|(key, conversation)| (key.clone(), legacy_session(key, conversation)))
            .collect();

        StateV2_0_0 {
            version: STATE_VERSION.to_string(),
            settings,
            sessions,
        }
    }
}
