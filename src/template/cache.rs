//! Template cache keyed by literal shape
//!
//! Distinct template shapes are bounded by source code, so the default policy
//! never evicts. A bounded policy can be plugged in without touching
//! resolution.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexSet;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};

use super::TemplateKey;
use crate::error::ParseError;
use crate::parser::{TNode, TemplateParser};

/// Decides which cached shapes to drop
///
/// The cache notifies the policy of every hit and insertion. After an
/// insertion it removes whatever keys the policy returns.
pub trait EvictionPolicy: Send + Sync {
    fn on_hit(&self, key: &TemplateKey);
    fn on_insert(&self, key: &TemplateKey) -> Vec<TemplateKey>;
    fn on_clear(&self) {}
}

/// Keep every shape for the life of the cache
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl EvictionPolicy for Unbounded {
    fn on_hit(&self, _key: &TemplateKey) {}

    fn on_insert(&self, _key: &TemplateKey) -> Vec<TemplateKey> {
        Vec::new()
    }
}

/// Keep at most `capacity` shapes, dropping the least recently used
#[derive(Debug)]
pub struct LeastRecentlyUsed {
    capacity: usize,
    // Front is least recently used
    order: Mutex<IndexSet<TemplateKey>>,
}

impl LeastRecentlyUsed {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            order: Mutex::new(IndexSet::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl EvictionPolicy for LeastRecentlyUsed {
    fn on_hit(&self, key: &TemplateKey) {
        let mut order = self.order.lock();
        if let Some(index) = order.get_index_of(key) {
            let last = order.len() - 1;
            order.move_index(index, last);
        }
    }

    fn on_insert(&self, key: &TemplateKey) -> Vec<TemplateKey> {
        let mut order = self.order.lock();
        order.shift_remove(key);
        order.insert(key.clone());
        let mut evicted = Vec::new();
        while order.len() > self.capacity {
            if let Some(oldest) = order.shift_remove_index(0) {
                evicted.push(oldest);
            }
        }
        evicted
    }

    fn on_clear(&self) {
        self.order.lock().clear();
    }
}

/// Counters reported by [`TemplateCache::stats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Maps template shapes to their parsed placeholder trees
pub struct TemplateCache {
    entries: RwLock<HashMap<TemplateKey, Arc<TNode>>>,
    policy: Box<dyn EvictionPolicy>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl Default for TemplateCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TemplateCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateCache")
            .field("len", &self.len())
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl TemplateCache {
    /// An unbounded cache
    pub fn new() -> Self {
        Self::with_policy(Unbounded)
    }

    pub fn with_policy(policy: impl EvictionPolicy + 'static) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            policy: Box::new(policy),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Unbounded for `None`, least recently used eviction otherwise
    pub fn with_capacity(capacity: Option<usize>) -> Self {
        match capacity {
            None => Self::new(),
            Some(capacity) => Self::with_policy(LeastRecentlyUsed::new(capacity)),
        }
    }

    /// Return the cached tree for `key`, parsing it on first use
    ///
    /// Callers racing on the first use of a key may each parse, but all of
    /// them get the tree stored by the first to finish.
    pub fn get_or_parse(
        &self,
        key: &TemplateKey,
        parser: &dyn TemplateParser,
    ) -> Result<Arc<TNode>, ParseError> {
        if let Some(tree) = self.get(key) {
            return Ok(tree);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(template = %key, "template cache miss, parsing");
        let parsed = Arc::new(parser.parse(key)?);

        // Entries and policy change together so the policy never loses track of a key
        let mut entries = self.entries.write();
        if let Some(existing) = entries.get(key) {
            return Ok(Arc::clone(existing));
        }
        entries.insert(key.clone(), Arc::clone(&parsed));
        let evicted = self.policy.on_insert(key);
        for old in &evicted {
            entries.remove(old);
            debug!(template = %old, "evicted template");
        }
        self.evictions.fetch_add(evicted.len() as u64, Ordering::Relaxed);
        Ok(parsed)
    }

    /// Look up a cached tree without parsing
    pub fn get(&self, key: &TemplateKey) -> Option<Arc<TNode>> {
        let tree = self.entries.read().get(key).cloned()?;
        self.hits.fetch_add(1, Ordering::Relaxed);
        self.policy.on_hit(key);
        trace!(template = %key, "template cache hit");
        Some(tree)
    }

    pub fn contains(&self, key: &TemplateKey) -> bool {
        self.entries.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut entries = self.entries.write();
        entries.clear();
        self.policy.on_clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}
