//! Find-or-create resolution of drama titles
//!
//! Quote submissions name their drama by free-text title. The resolver maps a
//! title to the id of the single drama row carrying it, creating the row on
//! first use. Concurrent submissions for the same new title must converge on
//! one row: the unique constraint on `dramas.title` arbitrates, and a writer
//! whose insert is swallowed by `ON CONFLICT DO NOTHING` re-reads the winner.

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Lookup/insert attempts before a title is reported as unresolvable
pub const MAX_RESOLVE_ATTEMPTS: usize = 3;

/// Longest accepted drama title, in characters
pub const MAX_TITLE_LENGTH: usize = 255;

/// Storage operations needed to resolve a title
#[async_trait]
pub trait DramaStore: Send + Sync {
    /// Id of the drama with exactly this title
    async fn find_id_by_title(&self, title: &str) -> DatabaseResult<Option<Uuid>>;

    /// Insert a drama unless the title is taken.
    ///
    /// Returns `None` when another row already holds the title.
    async fn insert_if_absent(&self, title: &str) -> DatabaseResult<Option<Uuid>>;
}

/// How a title was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The drama already existed
    Existing(Uuid),
    /// This call created the drama
    Created(Uuid),
    /// Another writer created the drama between our lookup and insert
    RaceRecovered(Uuid),
}

impl Resolution {
    pub fn id(self) -> Uuid {
        match self {
            Resolution::Existing(id) | Resolution::Created(id) | Resolution::RaceRecovered(id) => id,
        }
    }
}

/// Resolution errors
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Drama title is required")]
    EmptyTitle,

    #[error("Drama title must be at most {} characters long", MAX_TITLE_LENGTH)]
    TitleTooLong,

    #[error("Drama {0:?} could not be found or created")]
    Unresolved(String),

    #[error(transparent)]
    Store(#[from] DatabaseError),
}

/// Resolves drama titles to ids
#[derive(Clone)]
pub struct EntityResolver<S> {
    store: S,
}

impl<S: DramaStore> EntityResolver<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Id of the drama titled `title`, creating it if needed
    pub async fn resolve(&self, title: &str) -> Result<Uuid, ResolveError> {
        Ok(self.resolve_detailed(title).await?.id())
    }

    /// Like [`resolve`](Self::resolve) but reports how the id was obtained
    pub async fn resolve_detailed(&self, title: &str) -> Result<Resolution, ResolveError> {
        if title.trim().is_empty() {
            return Err(ResolveError::EmptyTitle);
        }

        if title.chars().count() > MAX_TITLE_LENGTH {
            return Err(ResolveError::TitleTooLong);
        }

        for attempt in 1..=MAX_RESOLVE_ATTEMPTS {
            if let Some(id) = self.store.find_id_by_title(title).await? {
                return Ok(if attempt == 1 {
                    Resolution::Existing(id)
                } else {
                    debug!(drama_id = %id, attempt, "Recovered drama {:?} created concurrently", title);
                    Resolution::RaceRecovered(id)
                });
            }

            if let Some(id) = self.store.insert_if_absent(title).await? {
                debug!(drama_id = %id, "Created drama {:?}", title);
                return Ok(Resolution::Created(id));
            }
        }

        Err(ResolveError::Unresolved(title.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::sync::Barrier;
    use tokio_test::assert_err;

    /// Title-unique in-memory store
    #[derive(Clone, Default)]
    struct MemoryStore {
        rows: Arc<Mutex<HashMap<String, Uuid>>>,
        lookups: Arc<AtomicUsize>,
        // Holds the first N lookups until all N have arrived
        gate: Option<(usize, Arc<Barrier>)>,
    }

    impl MemoryStore {
        fn gated(callers: usize) -> Self {
            Self {
                gate: Some((callers, Arc::new(Barrier::new(callers)))),
                ..Self::default()
            }
        }

        fn row_count(&self) -> usize {
            self.rows.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl DramaStore for MemoryStore {
        async fn find_id_by_title(&self, title: &str) -> DatabaseResult<Option<Uuid>> {
            let call = self.lookups.fetch_add(1, Ordering::SeqCst);
            let found = self.rows.lock().unwrap().get(title).copied();
            if let Some((callers, barrier)) = &self.gate {
                if call < *callers {
                    barrier.wait().await;
                }
            }
            Ok(found)
        }

        async fn insert_if_absent(&self, title: &str) -> DatabaseResult<Option<Uuid>> {
            let mut rows = self.rows.lock().unwrap();
            if rows.contains_key(title) {
                return Ok(None);
            }
            let id = Uuid::new_v4();
            rows.insert(title.to_string(), id);
            Ok(Some(id))
        }
    }

    /// Never finds a row and never wins an insert
    struct StarvedStore;

    #[async_trait]
    impl DramaStore for StarvedStore {
        async fn find_id_by_title(&self, _title: &str) -> DatabaseResult<Option<Uuid>> {
            Ok(None)
        }

        async fn insert_if_absent(&self, _title: &str) -> DatabaseResult<Option<Uuid>> {
            Ok(None)
        }
    }

    struct OfflineStore;

    #[async_trait]
    impl DramaStore for OfflineStore {
        async fn find_id_by_title(&self, _title: &str) -> DatabaseResult<Option<Uuid>> {
            Err(DatabaseError::Configuration("offline".to_string()))
        }

        async fn insert_if_absent(&self, _title: &str) -> DatabaseResult<Option<Uuid>> {
            Err(DatabaseError::Configuration("offline".to_string()))
        }
    }

    #[tokio::test]
    async fn sequential_resolves_reuse_the_row() {
        let store = MemoryStore::default();
        let resolver = EntityResolver::new(store.clone());

        let first = resolver.resolve_detailed("Goblin").await.unwrap();
        let second = resolver.resolve_detailed("Goblin").await.unwrap();

        assert!(matches!(first, Resolution::Created(_)));
        assert_eq!(second, Resolution::Existing(first.id()));
        assert_eq!(store.row_count(), 1);
    }

    #[tokio::test]
    async fn titles_match_exactly() {
        let store = MemoryStore::default();
        let resolver = EntityResolver::new(store.clone());

        let plain = resolver.resolve("Crash Landing on You").await.unwrap();
        let lower = resolver.resolve("crash landing on you").await.unwrap();
        let padded = resolver.resolve(" Crash Landing on You").await.unwrap();

        assert_ne!(plain, lower);
        assert_ne!(plain, padded);
        assert_eq!(store.row_count(), 3);
    }

    #[tokio::test]
    async fn blank_titles_are_rejected_before_storage() {
        let resolver = EntityResolver::new(OfflineStore);

        assert!(matches!(resolver.resolve("").await, Err(ResolveError::EmptyTitle)));
        assert!(matches!(resolver.resolve("   ").await, Err(ResolveError::EmptyTitle)));
    }

    #[tokio::test]
    async fn overlong_titles_are_rejected_before_storage() {
        let resolver = EntityResolver::new(OfflineStore);

        let too_long = "드".repeat(MAX_TITLE_LENGTH + 1);
        assert!(matches!(
            resolver.resolve(&too_long).await,
            Err(ResolveError::TitleTooLong)
        ));

        // At the limit the title reaches the store
        let at_limit = "드".repeat(MAX_TITLE_LENGTH);
        assert!(matches!(
            resolver.resolve(&at_limit).await,
            Err(ResolveError::Store(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_resolves_create_one_row() {
        let store = MemoryStore::default();
        let resolver = Arc::new(EntityResolver::new(store.clone()));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let resolver = resolver.clone();
                tokio::spawn(async move { resolver.resolve("New Show").await })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(store.row_count(), 1);
        assert!(ids.iter().all(|id| *id == ids[0]));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn losers_of_an_insert_race_recover_the_winner() {
        const CALLERS: usize = 8;
        let store = MemoryStore::gated(CALLERS);
        let resolver = Arc::new(EntityResolver::new(store.clone()));

        let handles: Vec<_> = (0..CALLERS)
            .map(|_| {
                let resolver = resolver.clone();
                tokio::spawn(async move { resolver.resolve_detailed("New Show").await })
            })
            .collect();

        let mut outcomes = Vec::new();
        for handle in handles {
            outcomes.push(handle.await.unwrap().unwrap());
        }

        let created: Vec<_> = outcomes
            .iter()
            .filter(|outcome| matches!(outcome, Resolution::Created(_)))
            .collect();
        let recovered = outcomes
            .iter()
            .filter(|outcome| matches!(outcome, Resolution::RaceRecovered(_)))
            .count();

        assert_eq!(created.len(), 1);
        assert_eq!(recovered, CALLERS - 1);
        assert!(outcomes.iter().all(|o| o.id() == created[0].id()));
        assert_eq!(store.row_count(), 1);
    }

    #[tokio::test]
    async fn gives_up_after_bounded_attempts() {
        let resolver = EntityResolver::new(StarvedStore);

        let err = assert_err!(resolver.resolve("Vanishing Show").await);
        assert!(matches!(err, ResolveError::Unresolved(title) if title == "Vanishing Show"));
    }

    #[tokio::test]
    async fn store_failures_propagate() {
        let resolver = EntityResolver::new(OfflineStore);

        let err = assert_err!(resolver.resolve("Goblin").await);
        assert!(matches!(err, ResolveError::Store(DatabaseError::Configuration(_))));
    }
}
