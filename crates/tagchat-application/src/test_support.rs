//! Hand written collaborators for application tests.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use tagchat_core::chat::{ChatClient, ChatError};
use tagchat_core::config::Settings;
use tagchat_core::host::{Document, DocumentHost, SessionObserver};
use tagchat_core::notice::Notice;
use tagchat_core::session::{PersistedState, Session, StateRepository, Turn};
use tagchat_core::{Result, TagchatError};

/// Documents, tags and templates held in memory.
#[derive(Default)]
pub struct InMemoryHost {
    tags: HashMap<String, BTreeSet<String>>,
    texts: HashMap<String, String>,
    templates: HashMap<String, String>,
    pub reads: Mutex<Vec<String>>,
}

impl InMemoryHost {
    pub fn with_document(mut self, name: &str, text: &str, tags: &[&str]) -> Self {
        self.texts.insert(name.to_string(), text.to_string());
        self.tags.insert(
            name.to_string(),
            tags.iter().map(|tag| tag.to_string()).collect(),
        );
        self
    }

    pub fn with_template(mut self, path: &str, text: &str) -> Self {
        self.templates.insert(path.to_string(), text.to_string());
        self
    }

    pub fn read_count(&self) -> usize {
        self.reads.lock().unwrap().len()
    }
}

#[async_trait]
impl DocumentHost for InMemoryHost {
    async fn tags_for_document(&self, doc: &Document) -> Option<BTreeSet<String>> {
        self.tags.get(&doc.path).cloned()
    }

    async fn load_template(&self, path: &str) -> Option<String> {
        self.templates.get(path).cloned()
    }

    async fn read_document_text(&self, doc: &Document) -> Result<String> {
        self.reads.lock().unwrap().push(doc.path.clone());
        self.texts
            .get(&doc.path)
            .cloned()
            .ok_or_else(|| TagchatError::not_found("Document", doc.path.clone()))
    }
}

/// Replies from a queue and records every transcript it was sent.
#[derive(Default)]
pub struct ScriptedChatClient {
    replies: Mutex<VecDeque<std::result::Result<String, ChatError>>>,
    pub calls: Mutex<Vec<Vec<Turn>>>,
    delay: Option<Duration>,
}

impl ScriptedChatClient {
    pub fn replying(replies: Vec<std::result::Result<String, ChatError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatClient for ScriptedChatClient {
    async fn send(&self, turns: &[Turn]) -> std::result::Result<String, ChatError> {
        self.calls.lock().unwrap().push(turns.to_vec());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("ok".to_string()))
    }
}

/// Records every notification.
#[derive(Default)]
pub struct RecordingObserver {
    pub sessions: Mutex<Vec<Session>>,
    pub notices: Mutex<Vec<Notice>>,
}

impl RecordingObserver {
    pub fn sessions(&self) -> Vec<Session> {
        self.sessions.lock().unwrap().clone()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }
}

impl SessionObserver for RecordingObserver {
    fn session_changed(&self, session: &Session) {
        self.sessions.lock().unwrap().push(session.clone());
    }

    fn notice(&self, notice: &Notice) {
        self.notices.lock().unwrap().push(notice.clone());
    }
}

/// Keeps persisted state in memory.
#[derive(Default)]
pub struct InMemoryStateRepository {
    pub state: Mutex<Option<PersistedState>>,
}

impl InMemoryStateRepository {
    pub fn with_state(state: PersistedState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
        }
    }

    pub fn stored(&self) -> Option<PersistedState> {
        self.state.lock().unwrap().clone()
    }
}

#[async_trait]
impl StateRepository for InMemoryStateRepository {
    async fn load(&self) -> Result<Option<PersistedState>> {
        Ok(self.stored())
    }

    async fn save_settings(&self, settings: &Settings) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.get_or_insert_with(PersistedState::default).settings = settings.clone();
        Ok(())
    }

    async fn save_sessions(&self, sessions: &[Session]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.get_or_insert_with(PersistedState::default).sessions = sessions.to_vec();
        Ok(())
    }
}
