pub mod chat;
pub mod config;
pub mod documents;

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tagchat_application::TagchatApp;
use tagchat_core::chat::ChatClient;
use tagchat_core::config::CredentialSource;
use tagchat_infrastructure::{FsVaultHost, TomlStateRepository};
use tagchat_interaction::OpenAIApiClient;

/// Locations shared by every command.
pub struct Env {
    pub vault: PathBuf,
    pub state_file: PathBuf,
    pub endpoint: Option<String>,
}

impl Env {
    pub fn repository(&self) -> TomlStateRepository {
        TomlStateRepository::new(&self.state_file)
    }

    /// Loads the state and wires the application.
    pub async fn start(&self) -> Result<TagchatApp> {
        let endpoint = self.endpoint.clone();
        let app = TagchatApp::start(
            Arc::new(self.repository()),
            Arc::new(FsVaultHost::new(&self.vault)),
            |credentials: Arc<dyn CredentialSource>| -> Arc<dyn ChatClient> {
                let client = OpenAIApiClient::new(credentials);
                match endpoint {
                    Some(url) => Arc::new(client.with_base_url(url)),
                    None => Arc::new(client),
                }
            },
        )
        .await?;
        Ok(app)
    }
}
