//! Bootstrap and shutdown of the application services.

use crate::conversation_service::ConversationService;
use crate::dispatcher::TagDispatcher;
use crate::session::{KeyedLocks, SessionStore};
use crate::settings_service::SettingsService;
use crate::sweeper::{RetentionSweeper, SweepReport};
use crate::view::{ChatView, ViewRenderer, ViewSlot};
use std::sync::Arc;
use tagchat_core::Result;
use tagchat_core::chat::ChatClient;
use tagchat_core::config::{CredentialSource, Settings};
use tagchat_core::host::DocumentHost;
use tagchat_core::session::{Session, StateRepository};

/// The wired application.
///
/// `start` loads the persisted state (or defaults), restores the session
/// store and runs the boot-time retention sweep. `shutdown` writes the
/// session snapshot and the settings back.
pub struct TagchatApp {
    repository: Arc<dyn StateRepository>,
    settings: Arc<SettingsService>,
    store: SessionStore,
    conversation: Arc<ConversationService>,
    dispatcher: TagDispatcher,
    sweeper: RetentionSweeper,
    views: Arc<ViewSlot>,
    boot_sweep: SweepReport,
}

impl TagchatApp {
    /// Starts the application.
    ///
    /// `make_client` receives the credential source backed by the loaded
    /// settings.
    pub async fn start<F>(
        repository: Arc<dyn StateRepository>,
        host: Arc<dyn DocumentHost>,
        make_client: F,
    ) -> Result<Self>
    where
        F: FnOnce(Arc<dyn CredentialSource>) -> Arc<dyn ChatClient>,
    {
        let state = repository.load().await?.unwrap_or_default();
        Self::assemble(repository, host, make_client, state.settings, state.sessions, true).await
    }

    /// Same as [`start`](Self::start) without the credential environment
    /// fallback.
    pub async fn start_isolated<F>(
        repository: Arc<dyn StateRepository>,
        host: Arc<dyn DocumentHost>,
        make_client: F,
    ) -> Result<Self>
    where
        F: FnOnce(Arc<dyn CredentialSource>) -> Arc<dyn ChatClient>,
    {
        let state = repository.load().await?.unwrap_or_default();
        Self::assemble(repository, host, make_client, state.settings, state.sessions, false).await
    }

    async fn assemble<F>(
        repository: Arc<dyn StateRepository>,
        host: Arc<dyn DocumentHost>,
        make_client: F,
        settings: Settings,
        sessions: Vec<Session>,
        env_fallback: bool,
    ) -> Result<Self>
    where
        F: FnOnce(Arc<dyn CredentialSource>) -> Arc<dyn ChatClient>,
    {
        let settings = SettingsService::new(settings, repository.clone());
        let settings = Arc::new(if env_fallback {
            settings
        } else {
            settings.without_env_fallback()
        });

        let store = SessionStore::new();
        let restored = store.restore(sessions).await;
        tracing::info!("Restored {} session(s)", restored);

        let views = Arc::new(ViewSlot::new());
        let credentials: Arc<dyn CredentialSource> = settings.clone();
        let client = make_client(credentials);
        let conversation = Arc::new(ConversationService::new(
            store.clone(),
            KeyedLocks::new(),
            client,
            views.clone(),
        ));
        let dispatcher = TagDispatcher::new(host, settings.clone(), conversation.clone());
        let sweeper = RetentionSweeper::new(store.clone(), settings.clone());
        let boot_sweep = sweeper.sweep().await;

        Ok(Self {
            repository,
            settings,
            store,
            conversation,
            dispatcher,
            sweeper,
            views,
            boot_sweep,
        })
    }

    pub fn settings(&self) -> &Arc<SettingsService> {
        &self.settings
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn conversation(&self) -> &Arc<ConversationService> {
        &self.conversation
    }

    pub fn dispatcher(&self) -> &TagDispatcher {
        &self.dispatcher
    }

    pub fn sweeper(&self) -> &RetentionSweeper {
        &self.sweeper
    }

    /// Report of the sweep that ran during start.
    pub fn boot_sweep(&self) -> &SweepReport {
        &self.boot_sweep
    }

    /// Opens the chat view, replacing any open one.
    pub fn open_view(&self, renderer: Arc<dyn ViewRenderer>) -> Arc<ChatView> {
        let view = Arc::new(ChatView::open(
            self.conversation.clone(),
            self.settings.clone(),
            renderer,
        ));
        self.views.attach(view.clone());
        view
    }

    /// Closes the open view, saving its working session as last active.
    pub async fn close_view(&self) -> Result<()> {
        match self.views.detach() {
            Some(view) => view.close().await,
            None => Ok(()),
        }
    }

    /// Writes the session map snapshot.
    pub async fn persist_sessions(&self) -> Result<()> {
        let snapshot = self.store.snapshot().await;
        self.repository.save_sessions(&snapshot).await
    }

    /// Closes the view and writes everything back.
    pub async fn shutdown(&self) -> Result<()> {
        self.close_view().await?;
        self.persist_sessions().await?;
        self.settings.persist().await?;
        tracing::info!("State saved");
        Ok(())
    }
}
