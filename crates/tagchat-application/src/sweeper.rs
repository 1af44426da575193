//! Retention sweeper.

use crate::session::SessionStore;
use crate::settings_service::SettingsService;
use chrono::{DateTime, Utc};
use std::sync::Arc;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Whole days between `last_updated` and `now`, rounded up.
///
/// Thirty minutes count as one day; exactly zero elapsed time is day 0.
pub fn elapsed_days(last_updated: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (now - last_updated).num_milliseconds().abs();
    (millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
}

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Number of sessions looked at.
    pub examined: usize,
    /// Keys of the evicted sessions, sorted.
    pub evicted: Vec<String>,
}

/// Evicts sessions older than the configured retention.
pub struct RetentionSweeper {
    store: SessionStore,
    settings: Arc<SettingsService>,
}

impl RetentionSweeper {
    pub fn new(store: SessionStore, settings: Arc<SettingsService>) -> Self {
        Self { store, settings }
    }

    pub async fn sweep(&self) -> SweepReport {
        self.sweep_at(Utc::now()).await
    }

    /// Sweeps as if the current time were `now`.
    ///
    /// The first pass only reads the store. The second pass removes each
    /// marked session unless it was updated in between.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> SweepReport {
        let retention = i64::from(self.settings.settings().retention_days);
        let entries = self.store.all_entries().await;

        let marked: Vec<_> = entries
            .iter()
            // updated after the sweep started
            .filter(|(_, session)| session.last_updated <= now)
            .filter(|(_, session)| elapsed_days(session.last_updated, now) > retention)
            .map(|(key, session)| (key.clone(), session.last_updated))
            .collect();

        let mut evicted = Vec::with_capacity(marked.len());
        for (key, observed) in marked {
            if self.store.remove_if_unchanged(&key, observed).await {
                tracing::info!("Evicted stale session '{}'", key);
                evicted.push(key);
            } else {
                tracing::debug!("Session '{}' changed during sweep; kept", key);
            }
        }
        evicted.sort();

        let report = SweepReport {
            examined: entries.len(),
            evicted,
        };
        tracing::info!(
            "Retention sweep: {} examined, {} evicted (retention {} days)",
            report.examined,
            report.evicted.len(),
            retention
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::InMemoryStateRepository;
    use chrono::Duration;
    use tagchat_core::config::Settings;
    use tagchat_core::session::Session;

    fn sweeper(retention_days: u32) -> (RetentionSweeper, SessionStore) {
        let store = SessionStore::new();
        let settings = Settings {
            retention_days,
            ..Settings::default()
        };
        let settings = Arc::new(SettingsService::new(
            settings,
            Arc::new(InMemoryStateRepository::default()),
        ));
        (RetentionSweeper::new(store.clone(), settings), store)
    }

    #[test]
    fn test_elapsed_days_rounds_up() {
        let now = Utc::now();
        assert_eq!(elapsed_days(now, now), 0);
        assert_eq!(elapsed_days(now - Duration::minutes(30), now), 1);
        assert_eq!(elapsed_days(now - Duration::days(1), now), 1);
        assert_eq!(elapsed_days(now - Duration::days(1) - Duration::seconds(1), now), 2);
    }

    #[tokio::test]
    async fn test_retention_boundary() {
        let (sweeper, store) = sweeper(10);
        let now = Utc::now();
        store
            .put("kept.md", Session::new_at("kept.md", "sys", now - Duration::days(10)))
            .await;
        store
            .put("gone.md", Session::new_at("gone.md", "sys", now - Duration::days(11)))
            .await;

        let report = sweeper.sweep_at(now).await;

        assert_eq!(report.examined, 2);
        assert_eq!(report.evicted, vec!["gone.md".to_string()]);
        assert!(store.get("kept.md").await.is_some());
        assert!(store.get("gone.md").await.is_none());
    }

    #[tokio::test]
    async fn test_zero_retention_evicts_anything_older_than_now() {
        let (sweeper, store) = sweeper(0);
        let now = Utc::now();
        store
            .put("a.md", Session::new_at("a.md", "sys", now - Duration::minutes(5)))
            .await;
        store.put("b.md", Session::new_at("b.md", "sys", now)).await;

        let report = sweeper.sweep_at(now).await;

        assert_eq!(report.evicted, vec!["a.md".to_string()]);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_sessions_updated_after_sweep_start_survive() {
        let (sweeper, store) = sweeper(1);
        let sweep_started = Utc::now() - Duration::days(5);
        store
            .put("fresh.md", Session::new_at("fresh.md", "sys", Utc::now()))
            .await;

        let report = sweeper.sweep_at(sweep_started).await;

        assert!(report.evicted.is_empty());
        assert!(store.get("fresh.md").await.is_some());
    }
}
