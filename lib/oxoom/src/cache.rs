//! The second-level cache shared by all persistence contexts of a session.
//!
//! The cache stores committed entity snapshots keyed by type, identifier and context, and
//! hands out deep copies. Lock acquisition is advisory and non-blocking: a `false` return
//! means the caller proceeds without the cache rather than waiting for it.

use crate::config::{CacheKind, OomConfig};
use crate::entity::OntologyEntity;
use oxaxiom::NamedResource;
use rustc_hash::FxHashMap;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, Instant};

type Key = (NamedResource, NamedResource, Option<NamedResource>);

/// The shared entity cache.
///
/// All operations take `&self`; implementations synchronize internally. `get` returns a deep
/// copy of the cached snapshot, never the snapshot itself.
pub trait CacheManager: Send + Sync {
    /// Stores a committed snapshot of the entity.
    fn add(
        &self,
        type_iri: &NamedResource,
        identifier: &NamedResource,
        entity: Box<dyn OntologyEntity>,
        context: Option<&NamedResource>,
    );

    /// A deep copy of the cached entity, if present and still valid.
    fn get(
        &self,
        type_iri: &NamedResource,
        identifier: &NamedResource,
        context: Option<&NamedResource>,
    ) -> Option<Box<dyn OntologyEntity>>;

    fn contains(
        &self,
        type_iri: &NamedResource,
        identifier: &NamedResource,
        context: Option<&NamedResource>,
    ) -> bool;

    fn evict(
        &self,
        type_iri: &NamedResource,
        identifier: &NamedResource,
        context: Option<&NamedResource>,
    );

    fn evict_type(&self, type_iri: &NamedResource);

    /// Drops all entries stored under the given context (`None` is the default context).
    fn evict_context(&self, context: Option<&NamedResource>);

    fn evict_all(&self);

    /// Declares which entity types carry inferred attributes.
    fn set_inferred_types(&self, types: Vec<NamedResource>);

    /// Drops all entries of types with inferred attributes. Called after commits that changed
    /// the store, since a change anywhere may invalidate inferred values everywhere.
    fn clear_inferred_objects(&self);

    /// Tries to take the shared read lock without blocking.
    fn acquire_read_lock(&self) -> bool;

    /// Releases the shared read lock. Releasing an unheld lock is a no-op.
    fn release_read_lock(&self);

    /// Tries to take the exclusive write lock without blocking.
    fn acquire_write_lock(&self) -> bool;

    /// Releases the exclusive write lock. Releasing an unheld lock is a no-op.
    fn release_write_lock(&self);
}

/// Builds the cache manager the configuration asks for.
pub(crate) fn new_cache_manager(config: &OomConfig) -> Box<dyn CacheManager> {
    if !config.cache_enabled() {
        return Box::new(DisabledCacheManager);
    }
    match config.cache_kind() {
        CacheKind::Ttl => Box::new(TtlCacheManager::new(config.ttl(), config.sweep_interval())),
        CacheKind::Lru => Box::new(LruCacheManager::new(config.lru_capacity())),
    }
}

/// Non-blocking advisory reader/writer gate.
///
/// Positive state counts readers, `-1` marks a writer. Acquisition never blocks and release
/// of an unheld lock is a no-op.
#[derive(Debug, Default)]
struct CacheGate {
    state: AtomicI64,
}

impl CacheGate {
    fn acquire_read(&self) -> bool {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            if current < 0 {
                return false;
            }
            match self.state.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(observed) => current = observed,
            }
        }
    }

    fn release_read(&self) {
        let mut current = self.state.load(Ordering::Acquire);
        while current > 0 {
            match self.state.compare_exchange_weak(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return,
                Err(observed) => current = observed,
            }
        }
    }

    fn acquire_write(&self) -> bool {
        self.state
            .compare_exchange(0, -1, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn release_write(&self) {
        let _ = self
            .state
            .compare_exchange(-1, 0, Ordering::AcqRel, Ordering::Acquire);
    }
}

/// The always-empty cache used when caching is disabled.
///
/// Every operation is a no-op, every lookup misses and every lock acquisition succeeds, so
/// callers need no disabled-cache special casing.
#[derive(Debug, Default)]
pub struct DisabledCacheManager;

impl CacheManager for DisabledCacheManager {
    fn add(
        &self,
        _type_iri: &NamedResource,
        _identifier: &NamedResource,
        _entity: Box<dyn OntologyEntity>,
        _context: Option<&NamedResource>,
    ) {
    }

    fn get(
        &self,
        _type_iri: &NamedResource,
        _identifier: &NamedResource,
        _context: Option<&NamedResource>,
    ) -> Option<Box<dyn OntologyEntity>> {
        None
    }

    fn contains(
        &self,
        _type_iri: &NamedResource,
        _identifier: &NamedResource,
        _context: Option<&NamedResource>,
    ) -> bool {
        false
    }

    fn evict(
        &self,
        _type_iri: &NamedResource,
        _identifier: &NamedResource,
        _context: Option<&NamedResource>,
    ) {
    }

    fn evict_type(&self, _type_iri: &NamedResource) {}

    fn evict_context(&self, _context: Option<&NamedResource>) {}

    fn evict_all(&self) {}

    fn set_inferred_types(&self, _types: Vec<NamedResource>) {}

    fn clear_inferred_objects(&self) {}

    fn acquire_read_lock(&self) -> bool {
        true
    }

    fn release_read_lock(&self) {}

    fn acquire_write_lock(&self) -> bool {
        true
    }

    fn release_write_lock(&self) {}
}

struct TtlEntry {
    entity: Box<dyn OntologyEntity>,
    touched: Instant,
}

struct TtlContent {
    entries: FxHashMap<Key, TtlEntry>,
    last_sweep: Instant,
}

/// Cache with time-to-live eviction. Access refreshes an entry's lifetime; expired entries
/// are swept out periodically.
pub struct TtlCacheManager {
    ttl: Duration,
    sweep_interval: Duration,
    content: Mutex<TtlContent>,
    inferred_types: Mutex<Vec<NamedResource>>,
    gate: CacheGate,
}

impl TtlCacheManager {
    pub fn new(ttl: Duration, sweep_interval: Duration) -> Self {
        Self {
            ttl,
            sweep_interval,
            content: Mutex::new(TtlContent {
                entries: FxHashMap::default(),
                last_sweep: Instant::now(),
            }),
            inferred_types: Mutex::new(Vec::new()),
            gate: CacheGate::default(),
        }
    }

    fn locked(&self) -> std::sync::MutexGuard<'_, TtlContent> {
        let mut content = self
            .content
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if content.last_sweep.elapsed() >= self.sweep_interval {
            let ttl = self.ttl;
            content.entries.retain(|_, entry| entry.touched.elapsed() < ttl);
            content.last_sweep = Instant::now();
        }
        content
    }
}

impl CacheManager for TtlCacheManager {
    fn add(
        &self,
        type_iri: &NamedResource,
        identifier: &NamedResource,
        entity: Box<dyn OntologyEntity>,
        context: Option<&NamedResource>,
    ) {
        self.locked().entries.insert(
            (type_iri.clone(), identifier.clone(), context.cloned()),
            TtlEntry {
                entity,
                touched: Instant::now(),
            },
        );
    }

    fn get(
        &self,
        type_iri: &NamedResource,
        identifier: &NamedResource,
        context: Option<&NamedResource>,
    ) -> Option<Box<dyn OntologyEntity>> {
        let mut content = self.locked();
        let key = (type_iri.clone(), identifier.clone(), context.cloned());
        let entry = content.entries.get_mut(&key)?;
        if entry.touched.elapsed() >= self.ttl {
            content.entries.remove(&key);
            return None;
        }
        entry.touched = Instant::now();
        Some(entry.entity.clone_entity())
    }

    fn contains(
        &self,
        type_iri: &NamedResource,
        identifier: &NamedResource,
        context: Option<&NamedResource>,
    ) -> bool {
        let content = self.locked();
        content
            .entries
            .get(&(type_iri.clone(), identifier.clone(), context.cloned()))
            .is_some_and(|entry| entry.touched.elapsed() < self.ttl)
    }

    fn evict(
        &self,
        type_iri: &NamedResource,
        identifier: &NamedResource,
        context: Option<&NamedResource>,
    ) {
        self.locked()
            .entries
            .remove(&(type_iri.clone(), identifier.clone(), context.cloned()));
    }

    fn evict_type(&self, type_iri: &NamedResource) {
        self.locked()
            .entries
            .retain(|(cached_type, _, _), _| cached_type != type_iri);
    }

    fn evict_context(&self, context: Option<&NamedResource>) {
        self.locked()
            .entries
            .retain(|(_, _, cached_context), _| cached_context.as_ref() != context);
    }

    fn evict_all(&self) {
        self.locked().entries.clear();
    }

    fn set_inferred_types(&self, types: Vec<NamedResource>) {
        *self
            .inferred_types
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = types;
    }

    fn clear_inferred_objects(&self) {
        let inferred = self
            .inferred_types
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if inferred.is_empty() {
            return;
        }
        self.locked()
            .entries
            .retain(|(cached_type, _, _), _| !inferred.contains(cached_type));
    }

    fn acquire_read_lock(&self) -> bool {
        self.gate.acquire_read()
    }

    fn release_read_lock(&self) {
        self.gate.release_read();
    }

    fn acquire_write_lock(&self) -> bool {
        self.gate.acquire_write()
    }

    fn release_write_lock(&self) {
        self.gate.release_write();
    }
}

struct LruEntry {
    entity: Box<dyn OntologyEntity>,
    last_access: u64,
}

struct LruContent {
    entries: FxHashMap<Key, LruEntry>,
    clock: u64,
}

/// Bounded cache evicting the least recently accessed entry on overflow.
pub struct LruCacheManager {
    capacity: usize,
    content: Mutex<LruContent>,
    inferred_types: Mutex<Vec<NamedResource>>,
    gate: CacheGate,
}

impl LruCacheManager {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            content: Mutex::new(LruContent {
                entries: FxHashMap::default(),
                clock: 0,
            }),
            inferred_types: Mutex::new(Vec::new()),
            gate: CacheGate::default(),
        }
    }

    fn locked(&self) -> std::sync::MutexGuard<'_, LruContent> {
        self.content.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CacheManager for LruCacheManager {
    fn add(
        &self,
        type_iri: &NamedResource,
        identifier: &NamedResource,
        entity: Box<dyn OntologyEntity>,
        context: Option<&NamedResource>,
    ) {
        let mut content = self.locked();
        content.clock += 1;
        let stamp = content.clock;
        content.entries.insert(
            (type_iri.clone(), identifier.clone(), context.cloned()),
            LruEntry {
                entity,
                last_access: stamp,
            },
        );
        if content.entries.len() > self.capacity {
            if let Some(oldest) = content
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_access)
                .map(|(key, _)| key.clone())
            {
                content.entries.remove(&oldest);
            }
        }
    }

    fn get(
        &self,
        type_iri: &NamedResource,
        identifier: &NamedResource,
        context: Option<&NamedResource>,
    ) -> Option<Box<dyn OntologyEntity>> {
        let mut content = self.locked();
        content.clock += 1;
        let stamp = content.clock;
        let entry = content
            .entries
            .get_mut(&(type_iri.clone(), identifier.clone(), context.cloned()))?;
        entry.last_access = stamp;
        Some(entry.entity.clone_entity())
    }

    fn contains(
        &self,
        type_iri: &NamedResource,
        identifier: &NamedResource,
        context: Option<&NamedResource>,
    ) -> bool {
        self.locked()
            .entries
            .contains_key(&(type_iri.clone(), identifier.clone(), context.cloned()))
    }

    fn evict(
        &self,
        type_iri: &NamedResource,
        identifier: &NamedResource,
        context: Option<&NamedResource>,
    ) {
        self.locked()
            .entries
            .remove(&(type_iri.clone(), identifier.clone(), context.cloned()));
    }

    fn evict_type(&self, type_iri: &NamedResource) {
        self.locked()
            .entries
            .retain(|(cached_type, _, _), _| cached_type != type_iri);
    }

    fn evict_context(&self, context: Option<&NamedResource>) {
        self.locked()
            .entries
            .retain(|(_, _, cached_context), _| cached_context.as_ref() != context);
    }

    fn evict_all(&self) {
        self.locked().entries.clear();
    }

    fn set_inferred_types(&self, types: Vec<NamedResource>) {
        *self
            .inferred_types
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = types;
    }

    fn clear_inferred_objects(&self) {
        let inferred = self
            .inferred_types
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if inferred.is_empty() {
            return;
        }
        self.locked()
            .entries
            .retain(|(cached_type, _, _), _| !inferred.contains(cached_type));
    }

    fn acquire_read_lock(&self) -> bool {
        self.gate.acquire_read()
    }

    fn release_read_lock(&self) {
        self.gate.release_read();
    }

    fn acquire_write_lock(&self) -> bool {
        self.gate.acquire_write()
    }

    fn release_write_lock(&self) {
        self.gate.release_write();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::AttributeValue;
    use std::any::Any;

    struct Snapshot {
        identifier: Option<NamedResource>,
        name: Option<String>,
    }

    impl OntologyEntity for Snapshot {
        fn type_iri(&self) -> NamedResource {
            NamedResource::new_unchecked("http://example.com/Snapshot")
        }

        fn identifier(&self) -> Option<&NamedResource> {
            self.identifier.as_ref()
        }

        fn set_identifier(&mut self, identifier: NamedResource) {
            self.identifier = Some(identifier);
        }

        fn value_of(&self, _attribute: &str) -> AttributeValue {
            self.name
                .clone()
                .map_or(AttributeValue::None, |name| AttributeValue::Literal(name.into()))
        }

        fn set_value(&mut self, _attribute: &str, _value: AttributeValue) {}

        fn clone_entity(&self) -> Box<dyn OntologyEntity> {
            Box::new(Self {
                identifier: self.identifier.clone(),
                name: self.name.clone(),
            })
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn resource(iri: &str) -> NamedResource {
        NamedResource::new_unchecked(iri)
    }

    fn snapshot(identifier: &NamedResource) -> Box<dyn OntologyEntity> {
        Box::new(Snapshot {
            identifier: Some(identifier.clone()),
            name: Some("cached".into()),
        })
    }

    #[test]
    fn disabled_cache_misses_and_locks_always_succeed() {
        let cache = DisabledCacheManager;
        let type_iri = resource("http://example.com/T");
        let identifier = resource("http://example.com/i");
        cache.add(&type_iri, &identifier, snapshot(&identifier), None);
        assert!(cache.get(&type_iri, &identifier, None).is_none());
        assert!(!cache.contains(&type_iri, &identifier, None));
        assert!(cache.acquire_read_lock());
        assert!(cache.acquire_write_lock());
        cache.release_write_lock();
        cache.release_write_lock();
    }

    #[test]
    fn ttl_cache_round_trips_copies() {
        let cache = TtlCacheManager::new(Duration::from_secs(60), Duration::from_secs(1));
        let type_iri = resource("http://example.com/T");
        let identifier = resource("http://example.com/i");
        cache.add(&type_iri, &identifier, snapshot(&identifier), None);
        assert!(cache.contains(&type_iri, &identifier, None));
        let cached = cache.get(&type_iri, &identifier, None).unwrap();
        assert_eq!(cached.identifier(), Some(&identifier));
        // entries are partitioned by context
        let context = resource("http://example.com/ctx");
        assert!(!cache.contains(&type_iri, &identifier, Some(&context)));
    }

    #[test]
    fn ttl_cache_expires_entries() {
        let cache = TtlCacheManager::new(Duration::ZERO, Duration::from_secs(3600));
        let type_iri = resource("http://example.com/T");
        let identifier = resource("http://example.com/i");
        cache.add(&type_iri, &identifier, snapshot(&identifier), None);
        assert!(cache.get(&type_iri, &identifier, None).is_none());
        assert!(!cache.contains(&type_iri, &identifier, None));
    }

    #[test]
    fn lru_cache_evicts_the_least_recently_accessed() {
        let cache = LruCacheManager::new(2);
        let type_iri = resource("http://example.com/T");
        let first = resource("http://example.com/1");
        let second = resource("http://example.com/2");
        let third = resource("http://example.com/3");
        cache.add(&type_iri, &first, snapshot(&first), None);
        cache.add(&type_iri, &second, snapshot(&second), None);
        // touch the older entry so the newer one becomes the eviction victim
        assert!(cache.get(&type_iri, &first, None).is_some());
        cache.add(&type_iri, &third, snapshot(&third), None);
        assert!(cache.contains(&type_iri, &first, None));
        assert!(!cache.contains(&type_iri, &second, None));
        assert!(cache.contains(&type_iri, &third, None));
    }

    #[test]
    fn evict_context_keeps_other_contexts() {
        let cache = TtlCacheManager::new(Duration::from_secs(60), Duration::from_secs(1));
        let type_iri = resource("http://example.com/T");
        let identifier = resource("http://example.com/i");
        let context = resource("http://example.com/ctx");
        cache.add(&type_iri, &identifier, snapshot(&identifier), None);
        cache.add(&type_iri, &identifier, snapshot(&identifier), Some(&context));
        cache.evict_context(Some(&context));
        assert!(cache.contains(&type_iri, &identifier, None));
        assert!(!cache.contains(&type_iri, &identifier, Some(&context)));
    }

    #[test]
    fn clear_inferred_objects_only_touches_inferred_types() {
        let cache = LruCacheManager::new(16);
        let inferred_type = resource("http://example.com/Inferred");
        let plain_type = resource("http://example.com/Plain");
        let identifier = resource("http://example.com/i");
        cache.set_inferred_types(vec![inferred_type.clone()]);
        cache.add(&inferred_type, &identifier, snapshot(&identifier), None);
        cache.add(&plain_type, &identifier, snapshot(&identifier), None);
        cache.clear_inferred_objects();
        assert!(!cache.contains(&inferred_type, &identifier, None));
        assert!(cache.contains(&plain_type, &identifier, None));
    }

    #[test]
    fn write_lock_excludes_readers_and_release_is_idempotent() {
        let gate = CacheGate::default();
        assert!(gate.acquire_write());
        assert!(!gate.acquire_read());
        assert!(!gate.acquire_write());
        gate.release_write();
        gate.release_write();
        assert!(gate.acquire_read());
        assert!(gate.acquire_read());
        assert!(!gate.acquire_write());
        gate.release_read();
        gate.release_read();
        gate.release_read();
        assert!(gate.acquire_write());
    }
}
