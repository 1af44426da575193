use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tagchat_core::session::Session;
use tokio::sync::RwLock;

/// In-memory map from document key to its session.
///
/// The store is a cheap, cloneable handle; clones share the same map. Each
/// operation takes the lock exactly once, so no caller ever observes a
/// partially applied write. Sessions are handed out by value: callers
/// mutate their copy and `put` it back.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the session stored under `key`.
    pub async fn get(&self, key: &str) -> Option<Session> {
        let sessions = self.sessions.read().await;
        sessions.get(key).cloned()
    }

    /// Inserts or overwrites the session under `key`.
    pub async fn put(&self, key: impl Into<String>, session: Session) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(key.into(), session);
    }

    /// Removes the session under `key`. Removing an absent key is a no-op.
    pub async fn remove(&self, key: &str) -> Option<Session> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(key)
    }

    /// Removes the session under `key` only if it was not updated since
    /// `observed_last_updated` was read.
    ///
    /// Returns true when the session was removed.
    pub async fn remove_if_unchanged(&self, key: &str, observed_last_updated: DateTime<Utc>) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get(key) {
            Some(session) if session.last_updated == observed_last_updated => {
                sessions.remove(key);
                true
            }
            _ => false,
        }
    }

    /// Returns a copy of every entry, in no particular order.
    pub async fn all_entries(&self) -> Vec<(String, Session)> {
        let sessions = self.sessions.read().await;
        sessions
            .iter()
            .map(|(key, session)| (key.clone(), session.clone()))
            .collect()
    }

    /// Returns every session sorted by key.
    pub async fn snapshot(&self) -> Vec<Session> {
        let mut entries = self.all_entries().await;
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        entries.into_iter().map(|(_, session)| session).collect()
    }

    /// Loads previously persisted sessions, keyed by their own key.
    ///
    /// Detached sessions have no document and are skipped.
    pub async fn restore(&self, restored: impl IntoIterator<Item = Session>) -> usize {
        let mut sessions = self.sessions.write().await;
        let mut count = 0;
        for session in restored {
            if session.is_detached() {
                tracing::warn!("Skipping persisted session without a document key");
                continue;
            }
            sessions.insert(session.key.clone(), session);
            count += 1;
        }
        count
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tagchat_core::session::Turn;

    #[tokio::test]
    async fn test_put_get_remove() {
        let store = SessionStore::new();
        assert!(store.is_empty().await);

        store.put("a.md", Session::new("a.md", "sys")).await;
        assert_eq!(store.get("a.md").await.map(|s| s.key), Some("a.md".to_string()));
        assert_eq!(store.len().await, 1);

        assert!(store.remove("a.md").await.is_some());
        assert!(store.remove("a.md").await.is_none());
        assert!(store.get("a.md").await.is_none());
    }

    #[tokio::test]
    async fn test_clones_share_the_map() {
        let store = SessionStore::new();
        let other = store.clone();

        other.put("a.md", Session::new("a.md", "sys")).await;
        assert!(store.get("a.md").await.is_some());
    }

    #[tokio::test]
    async fn test_snapshot_is_sorted_and_restore_skips_detached() {
        let store = SessionStore::new();
        let restored = store
            .restore(vec![
                Session::new("b.md", "sys"),
                Session::detached("sys"),
                Session::new("a.md", "sys"),
            ])
            .await;
        assert_eq!(restored, 2);

        let keys: Vec<_> = store.snapshot().await.into_iter().map(|s| s.key).collect();
        assert_eq!(keys, vec!["a.md".to_string(), "b.md".to_string()]);
    }

    #[tokio::test]
    async fn test_remove_if_unchanged_keeps_refreshed_sessions() {
        let store = SessionStore::new();
        let observed = Utc::now() - Duration::days(20);
        let mut session = Session::new_at("a.md", "sys", observed);
        store.put("a.md", session.clone()).await;

        session.push_at(Turn::user("still here"), Utc::now());
        store.put("a.md", session).await;

        assert!(!store.remove_if_unchanged("a.md", observed).await);
        assert!(store.get("a.md").await.is_some());

        let current = store.get("a.md").await.map(|s| s.last_updated);
        let Some(current) = current else {
            panic!("session should still be stored");
        };
        assert!(store.remove_if_unchanged("a.md", current).await);
        assert!(store.is_empty().await);
    }
}
