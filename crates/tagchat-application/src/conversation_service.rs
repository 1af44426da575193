//! Extends sessions with user turns and assistant replies.

use crate::session::{KeyedLocks, SessionStore};
use std::sync::Arc;
use tagchat_core::chat::{ChatClient, ChatError};
use tagchat_core::host::SessionObserver;
use tagchat_core::notice::Notice;
use tagchat_core::session::Session;
use tagchat_core::{Result, TagchatError};

/// Read and write paths over store-backed sessions.
///
/// Every mutation of a stored session happens while holding that
/// document's lock from [`KeyedLocks`], so an append never interleaves with
/// a dispatch or another append on the same document.
pub struct ConversationService {
    store: SessionStore,
    locks: KeyedLocks,
    client: Arc<dyn ChatClient>,
    observer: Arc<dyn SessionObserver>,
}

impl ConversationService {
    pub fn new(
        store: SessionStore,
        locks: KeyedLocks,
        client: Arc<dyn ChatClient>,
        observer: Arc<dyn SessionObserver>,
    ) -> Self {
        Self {
            store,
            locks,
            client,
            observer,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn locks(&self) -> &KeyedLocks {
        &self.locks
    }

    pub fn observer(&self) -> &Arc<dyn SessionObserver> {
        &self.observer
    }

    /// Returns the stored session of the document `key`.
    pub async fn current_session(&self, key: &str) -> Option<Session> {
        self.store.get(key).await
    }

    /// Appends `text` as a user turn to the stored session of `key` and asks
    /// for the assistant's reply.
    ///
    /// The user turn stays appended even when the remote call fails, so a
    /// retry is a plain re-send. The failure, if any, is returned next to
    /// the updated session.
    ///
    /// # Errors
    ///
    /// - [`TagchatError::EmptyInput`] when `text` is blank; nothing changes.
    /// - [`TagchatError::NotFound`] when no session is stored under `key`.
    pub async fn append_user_turn(
        &self,
        key: &str,
        text: &str,
    ) -> Result<(Session, Option<ChatError>)> {
        self.validate_input(text)?;

        let _guard = self.locks.lock(key).await;
        let mut session = self
            .store
            .get(key)
            .await
            .ok_or_else(|| TagchatError::not_found("Session", key))?;

        session.push_user(text);
        self.store.put(key, session.clone()).await;
        self.observer.session_changed(&session);

        Ok(self.complete(session, true).await)
    }

    /// Same as [`append_user_turn`](Self::append_user_turn) for a session
    /// that is not backed by the store (the restored "last active" one).
    ///
    /// The session is never written to the store, whatever its key.
    pub async fn extend_detached(
        &self,
        mut session: Session,
        text: &str,
    ) -> Result<(Session, Option<ChatError>)> {
        self.validate_input(text)?;

        session.push_user(text);
        self.observer.session_changed(&session);

        Ok(self.complete(session, false).await)
    }

    /// Sends the transcript of `session` and appends the reply.
    ///
    /// With `stored` set, the reply is written back to the store and the
    /// caller must hold the session's key lock. On failure the session is
    /// returned unchanged.
    pub(crate) async fn complete(
        &self,
        mut session: Session,
        stored: bool,
    ) -> (Session, Option<ChatError>) {
        match self.client.send(&session.turns).await {
            Ok(reply) => {
                session.push_assistant(reply);
                if stored {
                    self.store.put(session.key.clone(), session.clone()).await;
                }
                tracing::info!(
                    "Appended assistant reply to '{}' ({} turns)",
                    session.key,
                    session.turns.len()
                );
                self.observer.session_changed(&session);
                (session, None)
            }
            Err(err) => {
                self.report_failure(&session, &err);
                self.observer.session_changed(&session);
                (session, Some(err))
            }
        }
    }

    fn validate_input(&self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            self.observer.notice(&Notice::EmptyInput);
            return Err(TagchatError::EmptyInput);
        }
        Ok(())
    }

    fn report_failure(&self, session: &Session, err: &ChatError) {
        match err {
            ChatError::MissingCredential => {
                tracing::warn!("No API key configured; '{}' was not sent", session.key)
            }
            ChatError::QuotaExceeded { message } => {
                tracing::warn!("Quota exceeded for '{}': {}", session.key, message)
            }
            ChatError::Transport { .. } => {
                tracing::error!("Completion for '{}' failed: {}", session.key, err)
            }
        }
        self.observer.notice(&err.notice());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{RecordingObserver, ScriptedChatClient};
    use tagchat_core::session::{Role, Turn};

    struct Fixture {
        service: ConversationService,
        client: Arc<ScriptedChatClient>,
        observer: Arc<RecordingObserver>,
    }

    fn fixture(replies: Vec<std::result::Result<String, ChatError>>) -> Fixture {
        let client = Arc::new(ScriptedChatClient::replying(replies));
        let observer = Arc::new(RecordingObserver::default());
        let service = ConversationService::new(
            SessionStore::new(),
            KeyedLocks::new(),
            client.clone(),
            observer.clone(),
        );
        Fixture {
            service,
            client,
            observer,
        }
    }

    #[tokio::test]
    async fn test_append_user_turn_adds_user_and_assistant_turns() {
        let f = fixture(vec![Ok("Sure.".to_string())]);
        f.service
            .store()
            .put("Notes.md", Session::new("Notes.md", "sys"))
            .await;

        let (session, failure) = f
            .service
            .append_user_turn("Notes.md", "Tell me more")
            .await
            .unwrap();

        assert!(failure.is_none());
        assert_eq!(
            session.turns,
            vec![
                Turn::system("sys"),
                Turn::user("Tell me more"),
                Turn::assistant("Sure."),
            ]
        );
        assert_eq!(f.service.current_session("Notes.md").await, Some(session));
        // user turn first, then the reply
        assert_eq!(f.observer.sessions().len(), 2);
        assert_eq!(f.client.calls.lock().unwrap()[0].len(), 2);
    }

    #[tokio::test]
    async fn test_failed_reply_keeps_user_turn() {
        let f = fixture(vec![Err(ChatError::transport(Some(500), "boom"))]);
        f.service
            .store()
            .put("Notes.md", Session::new("Notes.md", "sys"))
            .await;

        let (session, failure) = f
            .service
            .append_user_turn("Notes.md", "again?")
            .await
            .unwrap();

        assert_eq!(failure, Some(ChatError::transport(Some(500), "boom")));
        assert_eq!(session.last_turn().map(|t| t.role), Some(Role::User));
        let stored = f.service.current_session("Notes.md").await.unwrap();
        assert_eq!(stored.turns.len(), 2);
        assert_eq!(
            f.observer.notices(),
            vec![Notice::RequestFailed("boom".to_string())]
        );
    }

    #[tokio::test]
    async fn test_empty_input_changes_nothing() {
        let f = fixture(vec![]);
        f.service
            .store()
            .put("Notes.md", Session::new("Notes.md", "sys"))
            .await;

        let err = f.service.append_user_turn("Notes.md", "   ").await.unwrap_err();

        assert_eq!(err, TagchatError::EmptyInput);
        assert_eq!(f.observer.notices(), vec![Notice::EmptyInput]);
        assert_eq!(f.client.call_count(), 0);
        assert_eq!(
            f.service.current_session("Notes.md").await.unwrap().turns.len(),
            1
        );
    }

    #[tokio::test]
    async fn test_unknown_document_is_not_found() {
        let f = fixture(vec![]);
        let err = f.service.append_user_turn("Nope.md", "hi").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_missing_credential_notice() {
        let f = fixture(vec![Err(ChatError::MissingCredential)]);
        f.service
            .store()
            .put("Notes.md", Session::new("Notes.md", "sys"))
            .await;

        let (_, failure) = f.service.append_user_turn("Notes.md", "hi").await.unwrap();

        assert_eq!(failure, Some(ChatError::MissingCredential));
        assert_eq!(f.observer.notices(), vec![Notice::MissingCredential]);
    }

    #[tokio::test]
    async fn test_detached_sessions_never_enter_the_store() {
        let f = fixture(vec![Ok("hello".to_string())]);

        let (session, failure) = f
            .service
            .extend_detached(Session::detached("sys"), "hi")
            .await
            .unwrap();

        assert!(failure.is_none());
        assert_eq!(session.turns.len(), 3);
        assert!(f.service.store().is_empty().await);
    }

    #[tokio::test]
    async fn test_keyed_detached_session_stays_out_of_the_store() {
        let f = fixture(vec![Ok("hello".to_string())]);

        let (session, _) = f
            .service
            .extend_detached(Session::new("Notes.md", "sys"), "hi")
            .await
            .unwrap();

        assert_eq!(session.turns.len(), 3);
        assert!(f.service.current_session("Notes.md").await.is_none());
    }
}
