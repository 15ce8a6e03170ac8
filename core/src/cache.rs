//! Keyed cache of server data.
//!
//! # Design
//! Each `QueryKey` addresses one entry holding the last good value, whether
//! it is stale, the last error, and at most one in-flight fetch. All state
//! lives behind one mutex that is never held across an `.await`, so every
//! update goes through the short critical sections below and readers never
//! see a half-written entry.
//!
//! Concurrent readers of a key share a single `Shared` fetch future. Each
//! reader holds a `FlightGuard`; when the last reader of an unfinished fetch
//! goes away the fetch is dropped and its result never lands. A bumped epoch
//! (on `clear`) makes late results land nowhere as well.
//!
//! `invalidate` marks a running flight superseded rather than dropping it:
//! its readers still get their result, but it never lands, and the next fetch
//! of the key is chained behind it. A key never has two requests on the wire.
//!
//! Values are type-erased (`Arc<dyn Any>`); `Query<V>` pins each key to its
//! value type and `AppContext` downcasts on the way out.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::debug;

use crate::error::ApiError;
use crate::types::{PostId, StoryId, UserId};

/// Identity of one cached server resource: a resource name plus an optional
/// scoping id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Posts,
    Post(PostId),
    UserPosts(UserId),
    MyPosts,
    PostComments(PostId),
    MyComments,
    PostLikes(PostId),
    PostLikers(PostId),
    MyLikes,
    Me,
    User(UserId),
    AllUsers,
    FollowStats(UserId),
    Followers(UserId),
    Following(UserId),
    MyFollowers,
    MyFollowing,
    ActiveStories,
    UserStories(UserId),
    MyStories,
    Story(StoryId),
}

impl QueryKey {
    pub fn name(self) -> &'static str {
        match self {
            QueryKey::Posts => "posts",
            QueryKey::Post(_) => "post",
            QueryKey::UserPosts(_) => "userPosts",
            QueryKey::MyPosts => "myPosts",
            QueryKey::PostComments(_) => "postComments",
            QueryKey::MyComments => "myComments",
            QueryKey::PostLikes(_) => "postLikes",
            QueryKey::PostLikers(_) => "postLikers",
            QueryKey::MyLikes => "myLikes",
            QueryKey::Me => "me",
            QueryKey::User(_) => "user",
            QueryKey::AllUsers => "allUsers",
            QueryKey::FollowStats(_) => "followStats",
            QueryKey::Followers(_) => "followers",
            QueryKey::Following(_) => "following",
            QueryKey::MyFollowers => "myFollowers",
            QueryKey::MyFollowing => "myFollowing",
            QueryKey::ActiveStories => "activeStories",
            QueryKey::UserStories(_) => "userStories",
            QueryKey::MyStories => "myStories",
            QueryKey::Story(_) => "story",
        }
    }

    pub fn scope(self) -> Option<i64> {
        match self {
            QueryKey::Post(id)
            | QueryKey::UserPosts(id)
            | QueryKey::PostComments(id)
            | QueryKey::PostLikes(id)
            | QueryKey::PostLikers(id)
            | QueryKey::User(id)
            | QueryKey::FollowStats(id)
            | QueryKey::Followers(id)
            | QueryKey::Following(id)
            | QueryKey::UserStories(id)
            | QueryKey::Story(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scope() {
            Some(id) => write!(f, "({}, {id})", self.name()),
            None => write!(f, "({})", self.name()),
        }
    }
}

pub type CachedValue = Arc<dyn Any + Send + Sync>;
pub type FetchOutcome = Result<CachedValue, ApiError>;

/// Produces a fresh fetch of one key. Kept on the entry so invalidation can
/// refetch observed keys.
pub type Fetcher = Arc<dyn Fn() -> BoxFuture<'static, FetchOutcome> + Send + Sync>;

struct Flight {
    id: u64,
    future: Shared<BoxFuture<'static, FetchOutcome>>,
    waiters: usize,
    superseded: bool,
}

struct Entry {
    value: Option<CachedValue>,
    stale: bool,
    error: Option<ApiError>,
    flight: Option<Flight>,
    fetcher: Option<Fetcher>,
    observers: usize,
    version: watch::Sender<u64>,
}

impl Entry {
    fn new() -> Self {
        Self {
            value: None,
            stale: true,
            error: None,
            flight: None,
            fetcher: None,
            observers: 0,
            version: watch::channel(0).0,
        }
    }

    fn touch(&self) {
        self.version.send_modify(|v| *v += 1);
    }

    fn reset(&mut self) {
        self.value = None;
        self.stale = true;
        self.error = None;
        self.flight = None;
        self.fetcher = None;
        self.touch();
    }

    fn is_vacant(&self) -> bool {
        self.value.is_none() && self.flight.is_none() && self.observers == 0
    }
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<QueryKey, Entry>,
    epoch: u64,
    next_flight: u64,
}

/// What a read of one key produced.
#[derive(Clone)]
pub struct Snapshot {
    pub value: Option<CachedValue>,
    pub error: Option<ApiError>,
}

/// Process-wide cache handle; clones share state.
#[derive(Clone, Default)]
pub struct QueryCache {
    state: Arc<Mutex<CacheState>>,
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("QueryCache")
            .field("entries", &state.entries.len())
            .field("epoch", &state.epoch)
            .finish()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of `key` without fetching or creating an entry.
    pub fn peek(&self, key: &QueryKey) -> Snapshot {
        let state = self.state.lock();
        match state.entries.get(key) {
            Some(entry) => Snapshot {
                value: entry.value.clone(),
                error: entry.error.clone(),
            },
            None => Snapshot {
                value: None,
                error: None,
            },
        }
    }

    pub fn is_stale(&self, key: &QueryKey) -> bool {
        let state = self.state.lock();
        state.entries.get(key).map_or(true, |entry| entry.stale)
    }

    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        let state = self.state.lock();
        state
            .entries
            .get(key)
            .is_some_and(|entry| entry.flight.is_some())
    }

    /// Serve `key`, fetching through `fetcher` when it is empty or stale.
    ///
    /// Joins an in-flight fetch for the same key instead of starting a new
    /// one. Failures keep the previous value and are reported alongside it.
    pub async fn read(&self, key: QueryKey, fetcher: Fetcher, retry: bool) -> Snapshot {
        let (shared, id, epoch) = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            let epoch = state.epoch;
            let flight_id = state.next_flight;
            let entry = state.entries.entry(key).or_insert_with(Entry::new);
            entry.fetcher = Some(fetcher.clone());

            if !entry.stale {
                if let Some(value) = &entry.value {
                    return Snapshot {
                        value: Some(value.clone()),
                        error: None,
                    };
                }
            }

            if let Some(flight) = entry.flight.as_mut().filter(|flight| !flight.superseded) {
                flight.waiters += 1;
                debug!(%key, "joining in-flight fetch");
                (flight.future.clone(), flight.id, epoch)
            } else {
                let fetch = fetch_with_retry(fetcher, retry);
                let future = match entry.flight.take() {
                    Some(previous) => {
                        debug!(%key, "fetch queued behind superseded flight");
                        previous.future.then(move |_| fetch).boxed().shared()
                    }
                    None => {
                        debug!(%key, "fetching");
                        fetch.boxed().shared()
                    }
                };
                entry.flight = Some(Flight {
                    id: flight_id,
                    future: future.clone(),
                    waiters: 1,
                    superseded: false,
                });
                state.next_flight += 1;
                (future, flight_id, epoch)
            }
        };

        let mut guard = FlightGuard {
            cache: self,
            key,
            id,
            finished: false,
        };
        let outcome = shared.await;
        guard.finished = true;
        self.land(key, id, epoch, outcome)
    }

    /// Refetch `key` with the fetcher of its last read, if it has one.
    pub async fn refresh(&self, key: QueryKey) -> Option<Snapshot> {
        let fetcher = {
            let mut state = self.state.lock();
            let entry = state.entries.get_mut(&key)?;
            entry.stale = true;
            entry.fetcher.clone()?
        };
        Some(self.read(key, fetcher, true).await)
    }

    /// Mark `key` stale so the next read refetches. A fetch already in flight
    /// for it is superseded: its waiters still get their result, it no longer
    /// lands in the cache, and the refetch waits for it to settle.
    ///
    /// Returns whether the key currently has observers.
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        let mut state = self.state.lock();
        let Some(entry) = state.entries.get_mut(key) else {
            return false;
        };
        entry.stale = true;
        if let Some(flight) = entry.flight.as_mut() {
            flight.superseded = true;
        }
        entry.touch();
        debug!(%key, observers = entry.observers, "invalidated");
        entry.observers > 0 && entry.fetcher.is_some()
    }

    /// Drop every value and in-flight fetch. Results of fetches started
    /// before the clear are discarded when they arrive.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.epoch += 1;
        state.entries.retain(|_, entry| {
            if entry.observers == 0 {
                return false;
            }
            entry.reset();
            true
        });
        debug!(epoch = state.epoch, "cache cleared");
    }

    /// Register interest in `key`.
    pub fn subscribe(&self, key: QueryKey) -> Subscription {
        let mut state = self.state.lock();
        let entry = state.entries.entry(key).or_insert_with(Entry::new);
        entry.observers += 1;
        let receiver = entry.version.subscribe();
        Subscription {
            cache: self.clone(),
            key,
            receiver,
        }
    }

    pub fn observers(&self, key: &QueryKey) -> usize {
        let state = self.state.lock();
        state.entries.get(key).map_or(0, |entry| entry.observers)
    }

    fn land(&self, key: QueryKey, id: u64, epoch: u64, outcome: FetchOutcome) -> Snapshot {
        let mut state = self.state.lock();
        let current = state.epoch == epoch;
        let Some(entry) = state.entries.get_mut(&key) else {
            return unlanded(None, outcome);
        };
        if !current || !entry.flight.as_ref().is_some_and(|flight| flight.id == id) {
            // Someone else landed this flight, or the cache was cleared.
            return unlanded(entry.value.clone(), outcome);
        }
        if entry.flight.take().is_some_and(|flight| flight.superseded) {
            debug!(%key, "superseded fetch settled");
            return unlanded(entry.value.clone(), outcome);
        }

        match outcome {
            Ok(value) => {
                entry.value = Some(value.clone());
                entry.stale = false;
                entry.error = None;
                entry.touch();
                Snapshot {
                    value: Some(value),
                    error: None,
                }
            }
            Err(error) => {
                entry.error = Some(error.clone());
                entry.touch();
                Snapshot {
                    value: entry.value.clone(),
                    error: Some(error),
                }
            }
        }
    }

    fn abandon(&self, key: QueryKey, id: u64) {
        let mut state = self.state.lock();
        let Some(entry) = state.entries.get_mut(&key) else {
            return;
        };
        let Some(flight) = entry.flight.as_mut().filter(|flight| flight.id == id) else {
            return;
        };
        flight.waiters -= 1;
        if flight.waiters == 0 {
            debug!(%key, "fetch abandoned by every reader");
            entry.flight = None;
            if entry.is_vacant() {
                state.entries.remove(&key);
            }
        }
    }

    fn unsubscribe(&self, key: QueryKey) {
        let mut state = self.state.lock();
        if let Some(entry) = state.entries.get_mut(&key) {
            entry.observers = entry.observers.saturating_sub(1);
            if entry.is_vacant() {
                state.entries.remove(&key);
            }
        }
    }
}

/// The reader's view of a fetch whose result was not stored.
fn unlanded(previous: Option<CachedValue>, outcome: FetchOutcome) -> Snapshot {
    match outcome {
        Ok(value) => Snapshot {
            value: Some(value),
            error: None,
        },
        Err(error) => Snapshot {
            value: previous,
            error: Some(error),
        },
    }
}

async fn fetch_with_retry(fetcher: Fetcher, retry: bool) -> FetchOutcome {
    match fetcher().await {
        Err(error) if retry && error.is_retryable() => {
            debug!(%error, "retrying fetch once");
            fetcher().await
        }
        outcome => outcome,
    }
}

/// Tracks one reader of an in-flight fetch; dropping it unfinished means the
/// reader went away.
struct FlightGuard<'a> {
    cache: &'a QueryCache,
    key: QueryKey,
    id: u64,
    finished: bool,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.cache.abandon(self.key, self.id);
        }
    }
}

/// A live interest in one key. Dropping it unregisters the observer.
pub struct Subscription {
    cache: QueryCache,
    key: QueryKey,
    receiver: watch::Receiver<u64>,
}

impl Subscription {
    pub fn key(&self) -> QueryKey {
        self.key
    }

    /// Wait for the next change (store, failure, invalidation or clear) of
    /// the key.
    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }

    /// Whether a change happened since the last `changed`.
    pub fn has_changed(&self) -> bool {
        self.receiver.has_changed().unwrap_or(false)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cache.unsubscribe(self.key);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("key", &self.key).finish()
    }
}
