//! Activity log storage trait.

use super::event::ActivityEntry;
use crate::error::Result;
use async_trait::async_trait;
use std::future::Future;

/// Trait for activity log storage.
///
/// Implement this trait to persist the estate activity trail to your
/// database.
///
/// # Example
///
/// ```rust,ignore
/// use executry::activity::{ActivityStore, ActivityEntry};
/// use async_trait::async_trait;
///
/// struct MyActivityStore { db: DatabaseConnection }
///
/// #[async_trait]
/// impl ActivityStore for MyActivityStore {
///     async fn record_activity(&self, entry: &ActivityEntry) -> Result<()> {
///         self.db.insert_activity(entry).await?;
///         Ok(())
///     }
///
///     async fn get_estate_activity(
///         &self,
///         estate_id: &str,
///         limit: usize,
///     ) -> Result<Vec<ActivityEntry>> {
///         self.db.query_activity_by_estate(estate_id, limit).await
///     }
/// }
/// ```
#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Record an activity entry.
    async fn record_activity(&self, entry: &ActivityEntry) -> Result<()>;

    /// Get the activity trail for an estate.
    ///
    /// Returns entries ordered by timestamp descending (newest first).
    async fn get_estate_activity(&self, estate_id: &str, limit: usize) -> Result<Vec<ActivityEntry>>;

    /// Get activity performed by a user across estates.
    ///
    /// Returns entries where the user was the actor, ordered by timestamp descending.
    async fn get_actor_activity(&self, actor_id: &str, limit: usize) -> Result<Vec<ActivityEntry>>;
}

/// Optional activity log trait for fire-and-forget recording.
///
/// This trait allows managers to optionally record activity without
/// blocking on the result. Implementations should handle errors gracefully.
pub trait OptionalActivityLog: Send + Sync + Clone + 'static {
    /// Record an activity entry (fire and forget).
    ///
    /// Errors are logged but not propagated.
    fn record(&self, entry: ActivityEntry) -> impl Future<Output = ()> + Send;
}

/// No-op implementation for when activity logging is disabled.
impl OptionalActivityLog for () {
    async fn record(&self, _entry: ActivityEntry) {
        // No-op
    }
}

/// Wrapper to enable activity logging with a real store.
#[derive(Clone)]
pub struct WithActivityLog<A: ActivityStore + Clone>(pub A);

impl<A: ActivityStore + Clone + 'static> OptionalActivityLog for WithActivityLog<A> {
    async fn record(&self, entry: ActivityEntry) {
        // Fire and forget - log errors but don't propagate
        if let Err(e) = self.0.record_activity(&entry).await {
            tracing::warn!(
                error = %e,
                event = %entry.event,
                estate_id = %entry.estate_id,
                "Failed to record activity entry"
            );
        }
    }
}

/// In-memory activity store for testing.
#[cfg(any(test, feature = "test-estates"))]
pub mod test {
    use super::*;
    use std::sync::{Arc, RwLock};

    /// In-memory activity store for testing.
    ///
    /// Wraps data in Arc for cheap cloning.
    #[derive(Default, Clone)]
    pub struct InMemoryActivityStore {
        inner: Arc<RwLock<Vec<ActivityEntry>>>,
    }

    impl InMemoryActivityStore {
        /// Create a new in-memory store.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Get all recorded entries (for testing).
        pub fn get_all_entries(&self) -> Vec<ActivityEntry> {
            self.inner.read().unwrap().clone()
        }
    }

    #[async_trait]
    impl ActivityStore for InMemoryActivityStore {
        async fn record_activity(&self, entry: &ActivityEntry) -> Result<()> {
            self.inner.write().unwrap().push(entry.clone());
            Ok(())
        }

        async fn get_estate_activity(
            &self,
            estate_id: &str,
            limit: usize,
        ) -> Result<Vec<ActivityEntry>> {
            let entries = self.inner.read().unwrap();
            let mut found: Vec<ActivityEntry> = entries
                .iter()
                .filter(|e| e.estate_id == estate_id)
                .cloned()
                .collect();
            found.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            found.truncate(limit);
            Ok(found)
        }

        async fn get_actor_activity(
            &self,
            actor_id: &str,
            limit: usize,
        ) -> Result<Vec<ActivityEntry>> {
            let entries = self.inner.read().unwrap();
            let mut found: Vec<ActivityEntry> = entries
                .iter()
                .filter(|e| e.actor_id == actor_id)
                .cloned()
                .collect();
            found.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            found.truncate(limit);
            Ok(found)
        }
    }

}
