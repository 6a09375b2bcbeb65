//! Command handling infrastructure.

use std::marker::PhantomData;

use common::DocumentKey;
use document_store::{DocumentStore, DocumentStoreExt, PutOptions, Version};

use crate::aggregate::{Aggregate, DomainEvent};
use crate::error::DomainError;

/// Number of times a command is re-run after losing a write race.
pub const DEFAULT_MAX_CONFLICT_RETRIES: u32 = 3;

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult<A: Aggregate> {
    /// The aggregate after applying the new events.
    pub aggregate: A,

    /// The events that were applied and persisted. Empty for a no-op.
    pub events: Vec<A::Event>,

    /// The stored version of the aggregate after the command.
    pub new_version: Version,
}

/// Trait for commands that can be executed against an aggregate.
///
/// Commands represent an intention to perform an action. They may be rejected
/// if the aggregate's current state doesn't allow the action.
pub trait Command: Send + Sync {
    /// The type of aggregate this command targets.
    type Aggregate: Aggregate;

    /// Returns the key of the document this command targets.
    fn document_key(&self) -> DocumentKey;
}

/// Handler for executing commands against document-backed aggregates.
///
/// The handler is responsible for:
/// 1. Loading the aggregate document and its version
/// 2. Executing the command to produce events
/// 3. Applying the events and writing the whole document back, expecting the
///    version it was loaded at
/// 4. Re-running the cycle when another writer got there first
pub struct CommandHandler<S, A>
where
    S: DocumentStore,
    A: Aggregate,
{
    store: S,
    max_conflict_retries: u32,
    _phantom: PhantomData<A>,
}

impl<S, A> CommandHandler<S, A>
where
    S: DocumentStore,
    A: Aggregate,
{
    /// Creates a new command handler with the given document store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
            _phantom: PhantomData,
        }
    }

    /// Sets how many times a conflicting command is re-run.
    pub fn with_max_conflict_retries(mut self, retries: u32) -> Self {
        self.max_conflict_retries = retries;
        self
    }

    /// Loads an aggregate, returning None if it was never written.
    pub async fn load(&self, key: &DocumentKey) -> Result<Option<A>, DomainError> {
        let loaded = self.store.get_json::<A>(A::collection(), key).await?;

        Ok(loaded.map(|(mut aggregate, version)| {
            aggregate.set_version(version);
            aggregate
        }))
    }

    /// Executes a command and persists the resulting state.
    ///
    /// The command function receives the current aggregate state (the default
    /// instance if the document doesn't exist) and returns either a list of
    /// events to apply, or an error. It may run more than once when the write
    /// loses an optimistic concurrency race, so it must not have side effects.
    pub async fn execute<F>(
        &self,
        key: &DocumentKey,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        F: Fn(&A) -> Result<Vec<A::Event>, A::Error> + Send + Sync,
        DomainError: From<A::Error>,
    {
        let mut attempt = 0;

        loop {
            let mut aggregate = self.load(key).await?.unwrap_or_default();
            let current_version = aggregate.version();

            // Execute command to get events
            let events = command_fn(&aggregate)?;

            if events.is_empty() {
                return Ok(CommandResult {
                    aggregate,
                    events: vec![],
                    new_version: current_version,
                });
            }

            aggregate.apply_events(events.iter().cloned());

            let options = if current_version == Version::initial() {
                PutOptions::expect_new()
            } else {
                PutOptions::expect_version(current_version)
            };

            match self
                .store
                .put_json(A::collection(), key, &aggregate, options)
                .await
            {
                Ok(new_version) => {
                    aggregate.set_version(new_version);

                    for event in &events {
                        metrics::counter!("cart_events_total", "event_type" => event.event_type())
                            .increment(1);
                    }

                    return Ok(CommandResult {
                        aggregate,
                        events,
                        new_version,
                    });
                }
                Err(e) if e.is_conflict() && attempt < self.max_conflict_retries => {
                    attempt += 1;
                    metrics::counter!("cart_conflict_retries_total").increment(1);
                    tracing::warn!(
                        aggregate_type = A::aggregate_type(),
                        key = %key,
                        attempt,
                        error = %e,
                        "Write conflict, retrying command"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use document_store::{
        Document, DocumentQuery, DocumentStoreError, InMemoryDocumentStore, Result as StoreResult,
    };
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::cart::CartError;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    enum TallyEvent {
        Opened,
        Added(i64),
    }

    impl DomainEvent for TallyEvent {
        fn event_type(&self) -> &'static str {
            match self {
                TallyEvent::Opened => "TallyOpened",
                TallyEvent::Added(_) => "TallyAdded",
            }
        }
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Tally {
        opened: bool,
        sum: i64,
        #[serde(skip)]
        version: Version,
    }

    impl Tally {
        fn open(&self) -> Result<Vec<TallyEvent>, CartError> {
            if self.opened {
                return Ok(vec![]);
            }
            Ok(vec![TallyEvent::Opened])
        }

        fn add(&self, amount: i64) -> Result<Vec<TallyEvent>, CartError> {
            if !self.opened {
                return Err(CartError::CartNotFound);
            }
            Ok(vec![TallyEvent::Added(amount)])
        }
    }

    impl Aggregate for Tally {
        type Event = TallyEvent;
        type Error = CartError;

        fn aggregate_type() -> &'static str {
            "Tally"
        }

        fn collection() -> &'static str {
            "tallies"
        }

        fn is_created(&self) -> bool {
            self.opened
        }

        fn version(&self) -> Version {
            self.version
        }

        fn set_version(&mut self, version: Version) {
            self.version = version;
        }

        fn apply(&mut self, event: Self::Event) {
            match event {
                TallyEvent::Opened => self.opened = true,
                TallyEvent::Added(amount) => self.sum += amount,
            }
        }
    }

    /// Store whose first `failures` writes lose a race against another writer.
    struct RacingStore {
        inner: InMemoryDocumentStore,
        failures: AtomicU32,
    }

    #[async_trait]
    impl DocumentStore for RacingStore {
        async fn put(&self, document: Document, options: PutOptions) -> StoreResult<Version> {
            if self.failures.load(Ordering::SeqCst) > 0 {
                self.failures.fetch_sub(1, Ordering::SeqCst);
                let mut competing = document.clone();
                competing.body["sum"] = serde_json::json!(1000);
                self.inner.put(competing, PutOptions::new()).await?;
            }
            self.inner.put(document, options).await
        }

        async fn get(
            &self,
            collection: &str,
            key: &DocumentKey,
        ) -> StoreResult<Option<Document>> {
            self.inner.get(collection, key).await
        }

        async fn delete(
            &self,
            collection: &str,
            key: &DocumentKey,
            options: PutOptions,
        ) -> StoreResult<bool> {
            self.inner.delete(collection, key, options).await
        }

        async fn query(&self, query: DocumentQuery) -> StoreResult<Vec<Document>> {
            self.inner.query(query).await
        }

        async fn get_version(
            &self,
            collection: &str,
            key: &DocumentKey,
        ) -> StoreResult<Option<Version>> {
            self.inner.get_version(collection, key).await
        }
    }

    fn key() -> DocumentKey {
        DocumentKey::new("tally-1")
    }

    #[tokio::test]
    async fn test_execute_creates_and_updates_document() {
        let handler = CommandHandler::<_, Tally>::new(InMemoryDocumentStore::new());

        let result = handler.execute(&key(), |t| t.open()).await.unwrap();
        assert_eq!(result.new_version, Version::first());
        assert_eq!(result.events.len(), 1);

        let result = handler.execute(&key(), |t| t.add(5)).await.unwrap();
        assert_eq!(result.new_version, Version::new(2));
        assert_eq!(result.aggregate.sum, 5);

        let loaded = handler.load(&key()).await.unwrap().unwrap();
        assert_eq!(loaded.sum, 5);
        assert_eq!(loaded.version(), Version::new(2));
    }

    #[tokio::test]
    async fn test_empty_events_write_nothing() {
        let store = InMemoryDocumentStore::new();
        let handler = CommandHandler::<_, Tally>::new(store.clone());
        handler.execute(&key(), |t| t.open()).await.unwrap();

        let result = handler.execute(&key(), |t| t.open()).await.unwrap();

        assert!(result.events.is_empty());
        assert_eq!(result.new_version, Version::first());
        assert_eq!(
            store.get_version("tallies", &key()).await.unwrap(),
            Some(Version::first())
        );
    }

    #[tokio::test]
    async fn test_command_error_writes_nothing() {
        let store = InMemoryDocumentStore::new();
        let handler = CommandHandler::<_, Tally>::new(store.clone());

        let result = handler.execute(&key(), |t| t.add(1)).await;

        assert!(matches!(
            result,
            Err(DomainError::Cart(CartError::CartNotFound))
        ));
        assert_eq!(store.document_count("tallies").await, 0);
    }

    #[tokio::test]
    async fn test_load_missing_returns_none() {
        let handler = CommandHandler::<_, Tally>::new(InMemoryDocumentStore::new());
        assert!(handler.load(&key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_conflict_is_retried_on_fresh_state() {
        let store = RacingStore {
            inner: InMemoryDocumentStore::new(),
            failures: AtomicU32::new(0),
        };
        let handler = CommandHandler::<_, Tally>::new(store);
        handler.execute(&key(), |t| t.open()).await.unwrap();

        handler.store.failures.store(2, Ordering::SeqCst);
        let result = handler.execute(&key(), |t| t.add(1)).await.unwrap();

        // The competing writes set the sum to 1000; the retried command adds on top.
        assert_eq!(result.aggregate.sum, 1001);
        assert_eq!(result.new_version, Version::new(4));
    }

    #[tokio::test]
    async fn test_conflict_surfaces_after_retries_exhausted() {
        let store = RacingStore {
            inner: InMemoryDocumentStore::new(),
            failures: AtomicU32::new(0),
        };
        let handler = CommandHandler::<_, Tally>::new(store).with_max_conflict_retries(1);
        handler.execute(&key(), |t| t.open()).await.unwrap();

        handler.store.failures.store(5, Ordering::SeqCst);
        let result = handler.execute(&key(), |t| t.add(1)).await;

        match result {
            Err(DomainError::DocumentStore(DocumentStoreError::ConcurrencyConflict {
                ..
            })) => {}
            other => panic!("expected conflict, got {other:?}"),
        }
    }
}
