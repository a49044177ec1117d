//! Remote resource cache.
//!
//! Entries are keyed by [`Fingerprint`]. Identical concurrent queries share one
//! in-flight request. Each entry declares the [`Tag`]s it provides; a successful
//! mutation marks every entry whose tags match its invalidation tags as stale,
//! and a stale entry refetches on its next read.
//!
//! Fetches run on a spawned task: a caller that stops waiting does not cancel
//! the request, and the entry still settles when the response arrives.

mod fingerprint;
mod tags;

pub use fingerprint::Fingerprint;
pub use tags::{Tag, BOOKS, SESSION};

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::{error::ApiError, StateReset};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    Pending,
    Fulfilled,
    Rejected,
}

/// Entry state transitions delivered to subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum CacheEvent {
    Started(Fingerprint),
    Settled {
        fingerprint: Fingerprint,
        status: EntryStatus,
    },
    Invalidated(Fingerprint),
}

/// Snapshot of one cached query
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub status: EntryStatus,
    /// Last successful value; kept while a refetch is pending
    pub value: Option<V>,
    pub error: Option<ApiError>,
    pub tags: HashSet<Tag>,
    pub stale: bool,
    settled_at: Option<Instant>,
    generation: u64,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, ttl: Option<Duration>) -> bool {
        if self.stale || self.status != EntryStatus::Fulfilled {
            return false;
        }
        match (self.settled_at, ttl) {
            (Some(at), Some(ttl)) => at.elapsed() < ttl,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}

type InFlight<V> = Shared<BoxFuture<'static, Result<V, ApiError>>>;

struct Slot<V> {
    entry: CacheEntry<V>,
    in_flight: Option<InFlight<V>>,
}

struct Store<V> {
    slots: HashMap<Fingerprint, Slot<V>>,
    /// Reverse index: provided tag -> entries providing it
    index: HashMap<Tag, HashSet<Fingerprint>>,
    generation: u64,
}

impl<V> Store<V> {
    fn unindex(&mut self, fingerprint: &Fingerprint, tags: &HashSet<Tag>) {
        for tag in tags {
            if let Some(fingerprints) = self.index.get_mut(tag) {
                fingerprints.remove(fingerprint);
                if fingerprints.is_empty() {
                    self.index.remove(tag);
                }
            }
        }
    }

    fn index(&mut self, fingerprint: &Fingerprint, tags: &HashSet<Tag>) {
        for tag in tags {
            self.index
                .entry(tag.clone())
                .or_default()
                .insert(fingerprint.clone());
        }
    }
}

enum Lookup<V> {
    Hit(V),
    Wait(InFlight<V>),
}

/// Fingerprint-keyed query store with tag invalidation
pub struct QueryCache<V> {
    store: Arc<Mutex<Store<V>>>,
    events: broadcast::Sender<CacheEvent>,
    ttl: Option<Duration>,
}

impl<V> Clone for QueryCache<V> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            events: self.events.clone(),
            ttl: self.ttl,
        }
    }
}

impl<V> QueryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache; `ttl` of `None` keeps entries until invalidated
    pub fn new(ttl: Option<Duration>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store: Arc::new(Mutex::new(Store {
                slots: HashMap::new(),
                index: HashMap::new(),
                generation: 0,
            })),
            events,
            ttl,
        }
    }

    /// Read through the cache.
    ///
    /// Returns the fulfilled value when fresh, joins the in-flight request when
    /// one exists and the entry has not been invalidated since it started, and
    /// otherwise starts `fetch`.
    pub async fn query<F, Fut>(
        &self,
        fingerprint: Fingerprint,
        tags: Vec<Tag>,
        fetch: F,
    ) -> Result<V, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, ApiError>> + Send + 'static,
    {
        match self.lookup(fingerprint, tags, fetch) {
            Lookup::Hit(value) => Ok(value),
            Lookup::Wait(in_flight) => in_flight.await,
        }
    }

    /// Run a mutation; on success, invalidate every entry matching `invalidates`
    pub async fn mutate<T, Fut>(&self, invalidates: &[Tag], request: Fut) -> Result<T, ApiError>
    where
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let result = request.await;
        if result.is_ok() {
            self.invalidate(invalidates);
        }
        result
    }

    /// Mark matching entries stale; returns how many were touched
    pub fn invalidate(&self, tags: &[Tag]) -> usize {
        let targets: Vec<Fingerprint> = {
            let mut store = self.lock();
            let targets: HashSet<Fingerprint> = store
                .index
                .iter()
                .filter(|(provided, _)| tags.iter().any(|tag| tag.matches(provided)))
                .flat_map(|(_, fingerprints)| fingerprints.iter().cloned())
                .collect();

            for fingerprint in &targets {
                if let Some(slot) = store.slots.get_mut(fingerprint) {
                    slot.entry.stale = true;
                }
            }
            targets.into_iter().collect()
        };

        tracing::debug!(
            tags = ?tags.iter().map(ToString::to_string).collect::<Vec<_>>(),
            entries = targets.len(),
            "Invalidated cache entries"
        );
        for fingerprint in &targets {
            let _ = self.events.send(CacheEvent::Invalidated(fingerprint.clone()));
        }
        targets.len()
    }

    /// Snapshot of the entry for `fingerprint`
    pub fn entry(&self, fingerprint: &Fingerprint) -> Option<CacheEntry<V>> {
        self.lock()
            .slots
            .get(fingerprint)
            .map(|slot| slot.entry.clone())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    /// Entry transitions as a stream
    pub fn events(&self) -> BroadcastStream<CacheEvent> {
        BroadcastStream::new(self.events.subscribe())
    }

    /// Drop every entry; results of requests still in flight are discarded
    pub fn clear(&self) {
        let mut store = self.lock();
        store.slots.clear();
        store.index.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup<F, Fut>(&self, fingerprint: Fingerprint, tags: Vec<Tag>, fetch: F) -> Lookup<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, ApiError>> + Send + 'static,
    {
        let mut store = self.lock();

        if let Some(slot) = store.slots.get(&fingerprint) {
            // A request started before an invalidation may carry pre-mutation data
            if let Some(in_flight) = slot.in_flight.as_ref().filter(|_| !slot.entry.stale) {
                tracing::debug!(%fingerprint, "Joining in-flight request");
                return Lookup::Wait(in_flight.clone());
            }
            if slot.entry.is_fresh(self.ttl) {
                if let Some(value) = &slot.entry.value {
                    tracing::debug!(%fingerprint, "Cache hit");
                    return Lookup::Hit(value.clone());
                }
            }
        }

        store.generation += 1;
        let generation = store.generation;
        tracing::debug!(%fingerprint, generation, "Cache miss, fetching");

        let request = fetch();
        let cache = self.clone();
        let key = fingerprint.clone();
        let task = tokio::spawn(async move {
            let result = request.await;
            cache.settle(&key, generation, &result);
            result
        });
        let in_flight = async move {
            task.await.unwrap_or_else(|e| {
                tracing::error!("Cache fetch task failed: {}", e);
                Err(ApiError::unexpected())
            })
        }
        .boxed()
        .shared();

        let tags: HashSet<Tag> = tags.into_iter().collect();
        let previous = store.slots.remove(&fingerprint);
        let value = match previous {
            Some(slot) => {
                store.unindex(&fingerprint, &slot.entry.tags);
                slot.entry.value
            }
            None => None,
        };
        store.index(&fingerprint, &tags);
        store.slots.insert(
            fingerprint.clone(),
            Slot {
                entry: CacheEntry {
                    status: EntryStatus::Pending,
                    value,
                    error: None,
                    tags,
                    stale: false,
                    settled_at: None,
                    generation,
                },
                in_flight: Some(in_flight.clone()),
            },
        );
        drop(store);

        let _ = self.events.send(CacheEvent::Started(fingerprint));
        Lookup::Wait(in_flight)
    }

    fn settle(&self, fingerprint: &Fingerprint, generation: u64, result: &Result<V, ApiError>) {
        let status = {
            let mut store = self.lock();
            let Some(slot) = store.slots.get_mut(fingerprint) else {
                tracing::debug!(%fingerprint, "Discarding result for cleared entry");
                return;
            };
            if slot.entry.generation != generation {
                return;
            }

            slot.in_flight = None;
            slot.entry.settled_at = Some(Instant::now());
            match result {
                Ok(value) => {
                    slot.entry.status = EntryStatus::Fulfilled;
                    slot.entry.value = Some(value.clone());
                    slot.entry.error = None;
                }
                Err(error) => {
                    tracing::debug!(%fingerprint, %error, "Query rejected");
                    slot.entry.status = EntryStatus::Rejected;
                    slot.entry.error = Some(error.clone());
                }
            }
            slot.entry.status
        };

        let _ = self.events.send(CacheEvent::Settled {
            fingerprint: fingerprint.clone(),
            status,
        });
    }

    fn lock(&self) -> MutexGuard<'_, Store<V>> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<V> StateReset for QueryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn reset(&self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    fn list_key() -> Fingerprint {
        Fingerprint::new("books").with_param("page", 1)
    }

    fn counting(calls: &Arc<AtomicUsize>, value: u32) -> impl Future<Output = Result<u32, ApiError>> {
        let calls = Arc::clone(calls);
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(value)
        }
    }

    #[tokio::test]
    async fn test_fulfilled_entry_is_served_from_cache() {
        let cache = QueryCache::new(None);
        let calls = Arc::new(AtomicUsize::new(0));

        let first = cache
            .query(list_key(), vec![Tag::general(BOOKS)], || counting(&calls, 1))
            .await;
        let second = cache
            .query(list_key(), vec![Tag::general(BOOKS)], || counting(&calls, 2))
            .await;

        assert_eq!(first, Ok(1));
        assert_eq!(second, Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.entry(&list_key()).unwrap().status, EntryStatus::Fulfilled);
    }

    #[tokio::test]
    async fn test_concurrent_identical_queries_share_one_request() {
        let cache = QueryCache::new(None);
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());

        let fetch = || {
            let calls = Arc::clone(&calls);
            let gate = Arc::clone(&gate);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                gate.notified().await;
                Ok(7)
            }
        };

        let (a, b, _) = tokio::join!(
            cache.query(list_key(), vec![Tag::general(BOOKS)], fetch),
            cache.query(list_key(), vec![Tag::general(BOOKS)], fetch),
            async {
                tokio::task::yield_now().await;
                gate.notify_one();
            }
        );

        assert_eq!(a, Ok(7));
        assert_eq!(b, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidation_forces_refetch() {
        let cache = QueryCache::new(None);
        let calls = Arc::new(AtomicUsize::new(0));

        cache
            .query(list_key(), vec![Tag::general(BOOKS)], || counting(&calls, 1))
            .await
            .unwrap();
        assert_eq!(cache.invalidate(&[Tag::general(BOOKS)]), 1);
        assert!(cache.entry(&list_key()).unwrap().stale);

        let value = cache
            .query(list_key(), vec![Tag::general(BOOKS)], || counting(&calls, 2))
            .await;
        assert_eq!(value, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_read_after_mutation_does_not_join_earlier_request() {
        let cache = QueryCache::new(None);
        let gate = Arc::new(Notify::new());

        let first = {
            let cache = cache.clone();
            let gate = Arc::clone(&gate);
            tokio::spawn(async move {
                cache
                    .query(list_key(), vec![Tag::general(BOOKS)], || async move {
                        gate.notified().await;
                        Ok(1u32)
                    })
                    .await
            })
        };
        while cache.entry(&list_key()).is_none() {
            tokio::task::yield_now().await;
        }
        assert_eq!(cache.entry(&list_key()).unwrap().status, EntryStatus::Pending);

        cache
            .mutate(&[Tag::general(BOOKS)], async { Ok::<_, ApiError>(()) })
            .await
            .unwrap();
        let second = cache
            .query(list_key(), vec![Tag::general(BOOKS)], || async { Ok(2u32) })
            .await;
        assert_eq!(second, Ok(2));

        gate.notify_one();
        assert_eq!(first.await.unwrap(), Ok(1));

        // The older request settles late and must not overwrite the newer value
        let entry = cache.entry(&list_key()).unwrap();
        assert_eq!(entry.status, EntryStatus::Fulfilled);
        assert_eq!(entry.value, Some(2));
        assert!(!entry.stale);
    }

    #[tokio::test]
    async fn test_general_tag_reaches_detail_entries() {
        let cache = QueryCache::new(None);
        let calls = Arc::new(AtomicUsize::new(0));
        let detail = Fingerprint::new("books/3");
        let other = Fingerprint::new("books/4");

        cache
            .query(detail.clone(), vec![Tag::item(BOOKS, 3)], || counting(&calls, 3))
            .await
            .unwrap();
        cache
            .query(other.clone(), vec![Tag::item(BOOKS, 4)], || counting(&calls, 4))
            .await
            .unwrap();

        assert_eq!(cache.invalidate(&[Tag::item(BOOKS, 3)]), 1);
        assert!(!cache.entry(&other).unwrap().stale);

        assert_eq!(cache.invalidate(&[Tag::general(BOOKS)]), 2);
        assert!(cache.entry(&other).unwrap().stale);
        assert_eq!(cache.invalidate(&[Tag::general(SESSION)]), 0);
    }

    #[tokio::test]
    async fn test_failed_mutation_leaves_cache_untouched() {
        let cache = QueryCache::new(None);
        let calls = Arc::new(AtomicUsize::new(0));
        cache
            .query(list_key(), vec![Tag::general(BOOKS)], || counting(&calls, 1))
            .await
            .unwrap();

        let result: Result<(), ApiError> = cache
            .mutate(&[Tag::general(BOOKS)], async { Err(ApiError::network()) })
            .await;
        assert!(result.is_err());
        assert!(!cache.entry(&list_key()).unwrap().stale);

        cache
            .mutate(&[Tag::general(BOOKS)], async { Ok::<_, ApiError>(()) })
            .await
            .unwrap();
        assert!(cache.entry(&list_key()).unwrap().stale);
    }

    #[tokio::test]
    async fn test_rejected_entry_refetches() {
        let cache = QueryCache::new(None);
        let failed: Result<u32, ApiError> = cache
            .query(list_key(), vec![], || async { Err(ApiError::network()) })
            .await;
        assert!(failed.is_err());

        let entry = cache.entry(&list_key()).unwrap();
        assert_eq!(entry.status, EntryStatus::Rejected);
        assert_eq!(entry.error, Some(ApiError::network()));

        let value = cache.query(list_key(), vec![], || async { Ok(5) }).await;
        assert_eq!(value, Ok(5));
    }

    #[tokio::test]
    async fn test_zero_ttl_always_refetches() {
        let cache = QueryCache::new(Some(Duration::ZERO));
        let calls = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            cache
                .query(list_key(), vec![], || counting(&calls, 1))
                .await
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_subscribers_see_transitions() {
        let cache = QueryCache::new(None);
        let mut events = cache.subscribe();

        cache.query(list_key(), vec![], || async { Ok(1u32) }).await.unwrap();

        assert_eq!(events.recv().await.unwrap(), CacheEvent::Started(list_key()));
        assert_eq!(
            events.recv().await.unwrap(),
            CacheEvent::Settled {
                fingerprint: list_key(),
                status: EntryStatus::Fulfilled
            }
        );
    }

    #[tokio::test]
    async fn test_reset_drops_entries() {
        let cache = QueryCache::new(None);
        cache.query(list_key(), vec![Tag::general(BOOKS)], || async { Ok(1u32) }).await.unwrap();
        assert_eq!(cache.len(), 1);

        cache.reset();
        assert!(cache.is_empty());
        assert_eq!(cache.invalidate(&[Tag::general(BOOKS)]), 0);
    }
}
