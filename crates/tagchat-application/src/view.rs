//! Chat view and the slot holding the single live view.

use crate::conversation_service::ConversationService;
use crate::settings_service::SettingsService;
use std::sync::{Arc, Mutex, MutexGuard};
use tagchat_core::Result;
use tagchat_core::chat::ChatError;
use tagchat_core::host::SessionObserver;
use tagchat_core::notice::Notice;
use tagchat_core::session::Session;

/// Draws a session and notices for the user.
pub trait ViewRenderer: Send + Sync {
    fn render_session(&self, session: &Session);

    fn render_notice(&self, notice: &Notice);
}

/// An open chat view.
///
/// Owns a working copy of one session: initially the "last active" session
/// from settings, replaced by every session the core pushes. Closing the
/// view writes the working copy back as the new "last active" session.
pub struct ChatView {
    working: Mutex<Session>,
    conversation: Arc<ConversationService>,
    settings: Arc<SettingsService>,
    renderer: Arc<dyn ViewRenderer>,
}

impl ChatView {
    /// Opens a view on the last active session and renders it.
    pub fn open(
        conversation: Arc<ConversationService>,
        settings: Arc<SettingsService>,
        renderer: Arc<dyn ViewRenderer>,
    ) -> Self {
        let working = settings.settings().last_active;
        renderer.render_session(&working);
        Self {
            working: Mutex::new(working),
            conversation,
            settings,
            renderer,
        }
    }

    /// Returns a copy of the working session.
    pub fn working(&self) -> Session {
        self.lock_working().clone()
    }

    /// Replaces the working session and renders it.
    pub fn show(&self, session: &Session) {
        *self.lock_working() = session.clone();
        self.renderer.render_session(session);
    }

    /// Sends `text` on the working session.
    ///
    /// Store-backed sessions go through the store; the detached "last
    /// active" session is extended locally.
    pub async fn send(&self, text: &str) -> Result<Option<ChatError>> {
        let working = self.working();
        let stored = !working.is_detached()
            && self
                .conversation
                .current_session(&working.key)
                .await
                .is_some();

        let (session, failure) = if stored {
            self.conversation
                .append_user_turn(&working.key, text)
                .await?
        } else {
            self.conversation.extend_detached(working, text).await?
        };

        *self.lock_working() = session;
        Ok(failure)
    }

    /// Writes the working session back as the last active session.
    pub async fn close(&self) -> Result<()> {
        let working = self.working();
        tracing::debug!("Closing view on '{}'", working.key);
        self.settings.set_last_active(working).await
    }

    fn lock_working(&self) -> MutexGuard<'_, Session> {
        self.working
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Holds at most one live view and forwards notifications to it.
#[derive(Default)]
pub struct ViewSlot {
    view: Mutex<Option<Arc<ChatView>>>,
}

impl ViewSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `view`, replacing any previous one.
    pub fn attach(&self, view: Arc<ChatView>) {
        *self.lock() = Some(view);
    }

    /// Removes and returns the live view.
    pub fn detach(&self) -> Option<Arc<ChatView>> {
        self.lock().take()
    }

    pub fn current(&self) -> Option<Arc<ChatView>> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Arc<ChatView>>> {
        self.view
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionObserver for ViewSlot {
    fn session_changed(&self, session: &Session) {
        if let Some(view) = self.current() {
            view.show(session);
        }
    }

    fn notice(&self, notice: &Notice) {
        match self.current() {
            Some(view) => view.renderer.render_notice(notice),
            // Callers without a view show failures themselves.
            None => tracing::debug!("{}", notice),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{KeyedLocks, SessionStore};
    use crate::test_support::{InMemoryStateRepository, ScriptedChatClient};
    use tagchat_core::config::Settings;
    use tagchat_core::session::Turn;

    #[derive(Default)]
    struct RecordingRenderer {
        sessions: Mutex<Vec<Session>>,
        notices: Mutex<Vec<Notice>>,
    }

    impl ViewRenderer for RecordingRenderer {
        fn render_session(&self, session: &Session) {
            self.sessions.lock().unwrap().push(session.clone());
        }

        fn render_notice(&self, notice: &Notice) {
            self.notices.lock().unwrap().push(notice.clone());
        }
    }

    struct Fixture {
        slot: Arc<ViewSlot>,
        view: Arc<ChatView>,
        renderer: Arc<RecordingRenderer>,
        store: SessionStore,
        repository: Arc<InMemoryStateRepository>,
    }

    fn fixture(client: ScriptedChatClient) -> Fixture {
        fixture_with(Settings::default(), client)
    }

    fn fixture_with(settings: Settings, client: ScriptedChatClient) -> Fixture {
        let slot = Arc::new(ViewSlot::new());
        let store = SessionStore::new();
        let repository = Arc::new(InMemoryStateRepository::default());
        let settings = Arc::new(SettingsService::new(settings, repository.clone()));
        let conversation = Arc::new(ConversationService::new(
            store.clone(),
            KeyedLocks::new(),
            Arc::new(client),
            slot.clone(),
        ));
        let renderer = Arc::new(RecordingRenderer::default());
        let view = Arc::new(ChatView::open(conversation, settings, renderer.clone()));
        slot.attach(view.clone());
        Fixture {
            slot,
            view,
            renderer,
            store,
            repository,
        }
    }

    #[tokio::test]
    async fn test_view_opens_on_last_active_session() {
        let f = fixture(ScriptedChatClient::default());
        let working = f.view.working();
        assert!(working.is_detached());
        assert_eq!(working.turns, vec![Turn::system("You are a helpful assistant")]);
        assert_eq!(f.renderer.sessions.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_detached_send_and_close_persist_last_active() {
        let f = fixture(ScriptedChatClient::replying(vec![Ok("Hi!".to_string())]));

        let failure = f.view.send("Hello").await.unwrap();
        assert!(failure.is_none());
        assert_eq!(f.view.working().turns.len(), 3);
        assert!(f.store.is_empty().await);

        f.view.close().await.unwrap();
        let stored = f.repository.stored().unwrap().settings.last_active;
        assert_eq!(stored.turns, f.view.working().turns);
    }

    #[tokio::test]
    async fn test_restored_keyed_last_active_is_not_written_to_store() {
        // Closed on a stored session that has since been evicted.
        let settings = Settings {
            last_active: Session::new("Notes.md", "sys"),
            ..Settings::default()
        };
        let f = fixture_with(
            settings,
            ScriptedChatClient::replying(vec![Ok("Hi!".to_string())]),
        );

        let failure = f.view.send("hello").await.unwrap();

        assert!(failure.is_none());
        assert_eq!(f.view.working().turns.len(), 3);
        assert!(f.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_notifications_replace_working_copy() {
        let f = fixture(ScriptedChatClient::replying(vec![Ok("More.".to_string())]));
        let session = Session::new("Notes.md", "sys");
        f.store.put("Notes.md", session.clone()).await;

        f.slot.session_changed(&session);
        assert_eq!(f.view.working().key, "Notes.md");

        f.view.send("Go on").await.unwrap();
        let stored = f.store.get("Notes.md").await.unwrap();
        assert_eq!(stored.turns.len(), 3);
        assert_eq!(f.view.working(), stored);
    }

    #[tokio::test]
    async fn test_empty_input_raises_notice_on_view() {
        let f = fixture(ScriptedChatClient::default());
        assert!(f.view.send("").await.is_err());
        assert_eq!(*f.renderer.notices.lock().unwrap(), vec![Notice::EmptyInput]);
        assert!(f.slot.detach().is_some());
        assert!(f.slot.current().is_none());
    }

    #[tokio::test]
    async fn test_notices_without_view_are_not_rendered() {
        let f = fixture(ScriptedChatClient::default());
        f.slot.detach();

        f.slot.notice(&Notice::QuotaExceeded);
        f.slot.session_changed(&Session::new("Notes.md", "sys"));

        assert!(f.renderer.notices.lock().unwrap().is_empty());
        assert!(f.view.working().is_detached());
    }
}
