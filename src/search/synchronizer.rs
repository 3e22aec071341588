

use std::future::Future;

use serde::Serialize;
use sha2::{Digest, Sha256};
use strum::{EnumString, IntoStaticStr};
use tracing::{debug, warn};

use crate::core::cache::ObjectStore;
use crate::core::config::CacheExpirationSettings;
use crate::core::error::Result;
use crate::utils::safe_truncate_ellipsis;

const ABANDONED_MESSAGE: &str = "abandoned before completion";


#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum QueryStatus {
    InProgress,
    Completed,
    NotFound,
    Error,
}

impl QueryStatus {
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}


/// Deterministic id for a request, so identical searches on different
/// workers map to the same key. Unset fields must already be omitted by the
/// input's serializer.
pub fn query_digest<T: Serialize>(input: &T) -> Result<String> {
    let canonical = serde_json::to_string(input)?;
    Ok(format!("{:x}", Sha256::digest(canonical.as_bytes())))
}

fn status_key(query_id: &str) -> String {
    format!("{query_id}:status")
}

fn message_key(query_id: &str) -> String {
    format!("{query_id}:status:message")
}


/// Lets workers share one in-flight computation per query id through the
/// object store. Coordination is advisory: statuses are last-writer-wins
/// and expire by TTL.
pub struct QuerySynchronizer<S: ObjectStore> {
    store: S,
    settings: CacheExpirationSettings,
}

impl<S: ObjectStore> QuerySynchronizer<S> {
    pub fn new(store: S, settings: CacheExpirationSettings) -> Self {
        Self { store, settings }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &CacheExpirationSettings {
        &self.settings
    }

    /// Missing or unreadable statuses count as `NotFound`.
    pub fn get_status(&self, query_id: &str) -> QueryStatus {
        self.store
            .get(&status_key(query_id))
            .and_then(|value| value.parse().ok())
            .unwrap_or(QueryStatus::NotFound)
    }

    pub fn error_message(&self, query_id: &str) -> Option<String> {
        self.store.get(&message_key(query_id))
    }

    fn write_status(&self, query_id: &str, status: QueryStatus) {
        let ttl = match status {
            QueryStatus::InProgress => self.settings.in_progress_ttl(),
            QueryStatus::Completed => self.settings.completed_ttl(),
            QueryStatus::Error | QueryStatus::NotFound => self.settings.error_ttl(),
        };
        self.store.put(&status_key(query_id), status.as_str(), Some(ttl));
        debug!("Query {} is now {}", query_id, status.as_str());
    }

    fn write_error(&self, query_id: &str, message: &str) {
        self.write_status(query_id, QueryStatus::Error);
        self.store
            .put(&message_key(query_id), message, Some(self.settings.error_message_ttl()));
        warn!("Query {} failed: {}", query_id, safe_truncate_ellipsis(message, 200));
    }

    /// Marks the query in progress. The returned guard records the outcome;
    /// dropping it unresolved records an error.
    pub fn lock(&self, query_id: &str) -> StatusGuard<'_, S> {
        self.write_status(query_id, QueryStatus::InProgress);
        StatusGuard {
            synchronizer: self,
            query_id: query_id.to_string(),
            resolved: false,
        }
    }

    /// Runs `work` under a lock and returns its result unchanged.
    pub async fn run<T, F>(&self, query_id: &str, work: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let guard = self.lock(query_id);
        match work.await {
            Ok(value) => {
                guard.complete();
                Ok(value)
            }
            Err(err) => {
                guard.fail(&err.to_string());
                Err(err)
            }
        }
    }

    /// Waits while another worker holds the query, polling at the configured
    /// interval. True only if the query ended up completed.
    pub async fn attach(&self, query_id: &str) -> bool {
        let mut status = self.get_status(query_id);
        while status == QueryStatus::InProgress {
            tokio::time::sleep(self.settings.poll_interval()).await;
            status = self.get_status(query_id);
        }
        debug!("Attached to query {} with status {}", query_id, status.as_str());
        status == QueryStatus::Completed
    }
}


/// Scoped `in_progress` marker returned by [`QuerySynchronizer::lock`].
#[must_use = "dropping the guard immediately marks the query as failed"]
pub struct StatusGuard<'a, S: ObjectStore> {
    synchronizer: &'a QuerySynchronizer<S>,
    query_id: String,
    resolved: bool,
}

impl<S: ObjectStore> StatusGuard<'_, S> {
    pub fn query_id(&self) -> &str {
        &self.query_id
    }

    pub fn complete(mut self) {
        self.resolved = true;
        self.synchronizer.write_status(&self.query_id, QueryStatus::Completed);
    }

    pub fn fail(mut self, message: &str) {
        self.resolved = true;
        self.synchronizer.write_error(&self.query_id, message);
    }
}

impl<S: ObjectStore> Drop for StatusGuard<'_, S> {
    fn drop(&mut self) {
        if !self.resolved {
            self.synchronizer.write_error(&self.query_id, ABANDONED_MESSAGE);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cache::InMemoryObjectStore;
    use crate::core::error::DirectoryError;
    use crate::search::input::SearchDirectoryInput;
    use std::sync::Arc;
    use std::time::{Duration, Instant};
    use tokio_test::{assert_err, assert_ok};

    fn synchronizer() -> (QuerySynchronizer<InMemoryObjectStore>, String) {
        let sync = QuerySynchronizer::new(InMemoryObjectStore::default(), CacheExpirationSettings::default());
        let query_id = assert_ok!(query_digest(&SearchDirectoryInput::name("foo")));
        (sync, query_id)
    }

    #[test]
    fn test_digest_is_stable() {
        let first = query_digest(&SearchDirectoryInput::name("foo")).unwrap();
        let second = query_digest(&SearchDirectoryInput::name("foo")).unwrap();
        let other = query_digest(&SearchDirectoryInput::name("bar")).unwrap();
        assert_eq!(first, second);
        assert_ne!(first, other);
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_query_sync() {
        let (sync, query_id) = synchronizer();
        assert_eq!(sync.get_status(&query_id), QueryStatus::NotFound);

        let guard = sync.lock(&query_id);
        assert_eq!(sync.get_status(&query_id), QueryStatus::InProgress);
        guard.complete();
        assert_eq!(sync.get_status(&query_id), QueryStatus::Completed);
    }

    #[test]
    fn test_query_sync_error() {
        let (sync, query_id) = synchronizer();
        sync.lock(&query_id).fail("oh dear!");
        assert_eq!(sync.get_status(&query_id), QueryStatus::Error);
        assert_eq!(sync.store().get(&format!("{query_id}:status:message")).as_deref(), Some("oh dear!"));
    }

    #[test]
    fn test_dropped_guard_records_error() {
        let (sync, query_id) = synchronizer();
        {
            let _guard = sync.lock(&query_id);
        }
        assert_eq!(sync.get_status(&query_id), QueryStatus::Error);
        assert_eq!(sync.error_message(&query_id).as_deref(), Some(ABANDONED_MESSAGE));
    }

    #[test]
    fn test_unknown_status_is_not_found() {
        let (sync, query_id) = synchronizer();
        sync.store().put(&format!("{query_id}:status"), "garbage", None);
        assert_eq!(sync.get_status(&query_id), QueryStatus::NotFound);
    }

    #[tokio::test]
    async fn test_run_returns_error_unchanged() {
        let (sync, query_id) = synchronizer();
        let result: Result<()> = sync
            .run(&query_id, async { Err(DirectoryError::upstream(503, "oh dear!")) })
            .await;
        let err = assert_err!(result);
        assert!(matches!(err, DirectoryError::Upstream { status: 503, .. }));
        assert_eq!(sync.get_status(&query_id), QueryStatus::Error);
        assert!(sync.error_message(&query_id).is_some_and(|message| message.contains("oh dear!")));
    }

    #[tokio::test]
    async fn test_run_completes() {
        let (sync, query_id) = synchronizer();
        let value = assert_ok!(sync.run(&query_id, async { Ok(42) }).await);
        assert_eq!(value, 42);
        assert_eq!(sync.get_status(&query_id), QueryStatus::Completed);
    }

    #[tokio::test]
    async fn test_attach_in_progress() {
        let settings = CacheExpirationSettings {
            poll_interval_ms: 200,
            ..Default::default()
        };
        let sync = QuerySynchronizer::new(InMemoryObjectStore::default(), settings);
        sync.store().put("foo:status", "in_progress", Some(Duration::from_secs(1)));

        let before = Instant::now();
        assert!(!sync.attach("foo").await);
        assert!(before.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_attach_waits_for_completion() {
        let (sync, query_id) = synchronizer();
        let sync = Arc::new(sync);
        let guard = sync.lock(&query_id);

        let follower = {
            let sync = Arc::clone(&sync);
            let query_id = query_id.clone();
            tokio::spawn(async move {
                let before = Instant::now();
                (sync.attach(&query_id).await, before.elapsed())
            })
        };

        tokio::time::sleep(Duration::from_millis(2500)).await;
        guard.complete();

        let (completed, elapsed) = follower.await.unwrap();
        assert!(completed);
        assert!(elapsed >= Duration::from_millis(2500), "returned after {elapsed:?}");
        assert!(elapsed < Duration::from_millis(4000), "returned after {elapsed:?}");
    }

    #[tokio::test]
    async fn test_attach_completed() {
        let (sync, query_id) = synchronizer();
        sync.store()
            .put(&format!("{query_id}:status"), "completed", Some(Duration::from_secs(2)));

        let before = Instant::now();
        assert!(sync.attach(&query_id).await);
        assert!(before.elapsed() < Duration::from_secs(1));
    }
}
