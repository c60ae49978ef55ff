//! Live handler map with a lazily rebuilt, lock-free frozen snapshot.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwapOption;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use super::RequestHandlerBase;
use crate::logging::log_registry_operation;

static GLOBAL_REGISTRY: OnceLock<Arc<MediatorRegistry>> = OnceLock::new();

/// Immutable snapshot of the registry, tagged with the write generation it was
/// copied from.
pub struct FrozenCache {
    generation: u64,
    handlers: HashMap<TypeId, Arc<dyn RequestHandlerBase>>,
}

impl FrozenCache {
    pub fn get(&self, request_type: &TypeId) -> Option<&Arc<dyn RequestHandlerBase>> {
        self.handlers.get(request_type)
    }

    pub fn contains(&self, request_type: &TypeId) -> bool {
        self.handlers.contains_key(request_type)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Write generation the snapshot reflects.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Names of the request types in the snapshot, sorted.
    pub fn request_type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self
            .handlers
            .values()
            .map(|handler| handler.request_type_name())
            .collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for FrozenCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrozenCache")
            .field("generation", &self.generation)
            .field("handlers", &self.request_type_names())
            .finish()
    }
}

/// Registry statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryStats {
    pub live_entries: usize,
    pub frozen_entries: Option<usize>,
    pub frozen_valid: bool,
    pub generation: u64,
}

/// Thread-safe map from request `TypeId` to its type-erased invoker.
///
/// Entries are written rarely (startup, first sight of a request type) and read on
/// every runtime-typed dispatch. First registration for a key wins; later ones are
/// ignored.
pub struct MediatorRegistry {
    handlers: DashMap<TypeId, Arc<dyn RequestHandlerBase>>,
    frozen: ArcSwapOption<FrozenCache>,
    generation: AtomicU64,
}

impl MediatorRegistry {
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
            frozen: ArcSwapOption::empty(),
            generation: AtomicU64::new(0),
        }
    }

    /// The process-wide registry.
    pub fn global() -> Arc<MediatorRegistry> {
        GLOBAL_REGISTRY
            .get_or_init(|| Arc::new(MediatorRegistry::new()))
            .clone()
    }

    /// Add every entry whose key is not registered yet. Returns how many were added.
    pub fn register<I>(&self, entries: I) -> usize
    where
        I: IntoIterator<Item = (TypeId, Arc<dyn RequestHandlerBase>)>,
    {
        let mut added = 0;
        for (request_type, handler) in entries {
            match self.handlers.entry(request_type) {
                Entry::Vacant(vacant) => {
                    debug!(
                        request_type = handler.request_type_name(),
                        "Registered request handler wrapper"
                    );
                    vacant.insert(handler);
                    added += 1;
                }
                Entry::Occupied(occupied) => {
                    debug!(
                        request_type = occupied.get().request_type_name(),
                        "Request handler wrapper already registered, keeping existing"
                    );
                }
            }
        }

        if added > 0 {
            self.invalidate();
            let details = format!("{added} added");
            log_registry_operation(
                "register",
                None,
                self.handlers.len(),
                "ok",
                Some(&details),
            );
        }
        added
    }

    /// Return the handler for `request_type`, creating it with `factory` if absent.
    ///
    /// Under a race for the same new key the factory may run more than once, but only
    /// the first inserted handler is retained and every caller receives that one.
    pub fn get_or_add<F>(&self, request_type: TypeId, factory: F) -> Arc<dyn RequestHandlerBase>
    where
        F: FnOnce(TypeId) -> Arc<dyn RequestHandlerBase>,
    {
        if let Some(handler) = self.try_get_handler(request_type) {
            return handler;
        }

        let created = factory(request_type);
        let (handler, inserted) = match self.handlers.entry(request_type) {
            Entry::Occupied(occupied) => (occupied.get().clone(), false),
            Entry::Vacant(vacant) => {
                vacant.insert(created.clone());
                (created, true)
            }
        };

        if inserted {
            debug!(
                request_type = handler.request_type_name(),
                "Added request handler wrapper on first use"
            );
            self.invalidate();
        }
        handler
    }

    /// Look up a handler, preferring a current frozen snapshot over the live map.
    pub fn try_get_handler(&self, request_type: TypeId) -> Option<Arc<dyn RequestHandlerBase>> {
        let snapshot = self.frozen.load();
        if let Some(frozen) = snapshot.as_deref() {
            if self.is_current(frozen) {
                return frozen.get(&request_type).cloned();
            }
        }

        self.handlers
            .get(&request_type)
            .map(|entry| entry.value().clone())
    }

    /// Return the current snapshot, rebuilding it from the live map if it is missing
    /// or behind the latest write.
    pub fn get_frozen_cache(&self) -> Arc<FrozenCache> {
        let observed = self.frozen.load_full();
        if let Some(frozen) = &observed {
            if self.is_current(frozen) {
                return frozen.clone();
            }
        }

        let generation = self.generation.load(Ordering::Acquire);
        let rebuilt = Arc::new(FrozenCache {
            generation,
            handlers: self
                .handlers
                .iter()
                .map(|entry| (*entry.key(), entry.value().clone()))
                .collect(),
        });

        let previous = self.frozen.compare_and_swap(&observed, Some(rebuilt.clone()));
        if same_snapshot(&previous, &observed) {
            debug!(
                generation,
                entries = rebuilt.len(),
                "Installed frozen handler cache"
            );
            return rebuilt;
        }

        // Lost the race: prefer the winner unless it is older than our copy.
        match (*previous).as_ref() {
            Some(winner) if winner.generation >= generation => winner.clone(),
            _ => rebuilt,
        }
    }

    /// Remove one entry. Returns whether it existed.
    pub fn unregister(&self, request_type: TypeId) -> bool {
        self.invalidate();
        let removed = self.handlers.remove(&request_type).is_some();
        self.invalidate();

        if removed {
            let details = format!("{request_type:?}");
            log_registry_operation(
                "unregister",
                None,
                self.handlers.len(),
                "removed",
                Some(&details),
            );
        }
        removed
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.invalidate();
        self.handlers.clear();
        self.invalidate();
        log_registry_operation("clear", None, 0, "cleared", None);
    }

    /// Entry count, from the current snapshot when one exists, else the live map.
    pub fn count(&self) -> usize {
        let snapshot = self.frozen.load();
        match snapshot.as_deref() {
            Some(frozen) if self.is_current(frozen) => frozen.len(),
            _ => self.handlers.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn contains(&self, request_type: TypeId) -> bool {
        self.try_get_handler(request_type).is_some()
    }

    pub fn stats(&self) -> RegistryStats {
        let snapshot = self.frozen.load();
        let frozen = snapshot.as_deref();
        RegistryStats {
            live_entries: self.handlers.len(),
            frozen_entries: frozen.map(FrozenCache::len),
            frozen_valid: frozen.is_some_and(|frozen| self.is_current(frozen)),
            generation: self.generation.load(Ordering::Acquire),
        }
    }

    fn is_current(&self, frozen: &FrozenCache) -> bool {
        frozen.generation == self.generation.load(Ordering::Acquire)
    }

    fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.frozen.store(None);
    }
}

impl Default for MediatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MediatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediatorRegistry")
            .field("stats", &self.stats())
            .finish()
    }
}

fn same_snapshot(a: &Option<Arc<FrozenCache>>, b: &Option<Arc<FrozenCache>>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        _ => false,
    }
}
