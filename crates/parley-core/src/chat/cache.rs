//! Process-local cache of live provider contexts.
//!
//! Maps session ids to their in-memory conversation state. The cache is
//! advisory: absence of an entry never means the session does not exist,
//! only that the context must be rebuilt from the store. Capacity is
//! bounded with least-recently-used eviction.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::context::ProviderContext;

/// A cached context plus its recency stamp.
struct CacheSlot {
    context: Arc<Mutex<ProviderContext>>,
    last_used: u64,
}

/// Bounded, concurrent map from session id to live provider context.
///
/// Each entry wraps its context in a `tokio::sync::Mutex`; holding that
/// lock is what serializes exchanges per session. Entries for distinct
/// sessions share no lock.
///
/// Invariant: at most one live context per session id at any time within
/// the process -- concurrent installs for the same id collapse to a
/// single winner in [`ContextCache::insert`].
pub struct ContextCache {
    slots: DashMap<Uuid, CacheSlot>,
    capacity: usize,
    clock: AtomicU64,
}

impl ContextCache {
    /// Create a cache holding at most `capacity` contexts (floor of 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: DashMap::new(),
            capacity: capacity.max(1),
            clock: AtomicU64::new(0),
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Pure lookup. Bumps the entry's recency on hit; never creates.
    pub fn get(&self, session_id: &Uuid) -> Option<Arc<Mutex<ProviderContext>>> {
        let stamp = self.tick();
        self.slots.get_mut(session_id).map(|mut slot| {
            slot.last_used = stamp;
            slot.context.clone()
        })
    }

    /// Install a context for a session, or return the one already
    /// installed if another task won the race.
    ///
    /// Returning the incumbent (rather than replacing it) is what keeps
    /// two concurrent rehydrations of the same session from ending up
    /// with two divergent live contexts.
    pub fn insert(&self, session_id: Uuid, context: ProviderContext) -> Arc<Mutex<ProviderContext>> {
        let stamp = self.tick();
        let installed = match self.slots.entry(session_id) {
            Entry::Occupied(mut occupied) => {
                occupied.get_mut().last_used = stamp;
                occupied.get().context.clone()
            }
            Entry::Vacant(vacant) => {
                let context = Arc::new(Mutex::new(context));
                vacant.insert(CacheSlot {
                    context: context.clone(),
                    last_used: stamp,
                });
                context
            }
        };
        self.evict_to_capacity(&session_id);
        installed
    }

    /// Evict a session's context. Called when the session is deleted.
    pub fn remove(&self, session_id: &Uuid) {
        self.slots.remove(session_id);
    }

    /// Number of live contexts.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the cache holds no contexts.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Drop least-recently-used entries until within capacity.
    ///
    /// An evicted context that is still mid-exchange stays alive through
    /// its `Arc`; its turns are persisted as usual and the next request
    /// for that session replays from the store.
    fn evict_to_capacity(&self, keep: &Uuid) {
        while self.slots.len() > self.capacity {
            let oldest = self
                .slots
                .iter()
                .filter(|entry| entry.key() != keep)
                .min_by_key(|entry| entry.value().last_used)
                .map(|entry| *entry.key());
            match oldest {
                Some(id) => {
                    self.slots.remove(&id);
                }
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_never_creates() {
        let cache = ContextCache::new(4);
        assert!(cache.get(&Uuid::now_v7()).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_insert_then_get() {
        let cache = ContextCache::new(4);
        let id = Uuid::now_v7();
        cache.insert(id, ProviderContext::empty());

        assert!(cache.get(&id).is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_insert_race_collapses_to_one_context() {
        let cache = ContextCache::new(4);
        let id = Uuid::now_v7();

        let first = cache.insert(id, ProviderContext::empty());
        let second = cache.insert(id, ProviderContext::empty());

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_remove_evicts() {
        let cache = ContextCache::new(4);
        let id = Uuid::now_v7();
        cache.insert(id, ProviderContext::empty());
        cache.remove(&id);

        assert!(cache.get(&id).is_none());
    }

    #[test]
    fn test_lru_eviction_at_capacity() {
        let cache = ContextCache::new(2);
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        let c = Uuid::now_v7();

        cache.insert(a, ProviderContext::empty());
        cache.insert(b, ProviderContext::empty());
        // Touch `a` so `b` is the least recently used.
        cache.get(&a);
        cache.insert(c, ProviderContext::empty());

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&a).is_some());
        assert!(cache.get(&b).is_none());
        assert!(cache.get(&c).is_some());
    }

    #[test]
    fn test_capacity_floor_of_one() {
        let cache = ContextCache::new(0);
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();

        cache.insert(a, ProviderContext::empty());
        cache.insert(b, ProviderContext::empty());

        assert_eq!(cache.len(), 1);
        assert!(cache.get(&b).is_some());
    }
}
