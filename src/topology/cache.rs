//! Cache of adjacency indices shared across queries.
//!
//! Connectivity does not change between frames, so one [`AdjacencyIndex`] per
//! instance serves every query of a session. Entries remember the instance
//! version they were built from and are rebuilt if the instance changed.

use crate::topology::adjacency::AdjacencyIndex;
use crate::topology::instance::Instance;
use dashmap::DashMap;
use std::sync::Arc;

/// Anything that caches derived topology should implement this.
pub trait InvalidateCache {
    /// Invalidate *all* internal caches so future queries recompute correctly.
    fn invalidate_cache(&mut self);
}

impl<T: InvalidateCache + ?Sized> InvalidateCache for Box<T> {
    #[inline]
    fn invalidate_cache(&mut self) {
        (**self).invalidate_cache();
    }
}

/// Per-instance adjacency indices, safe to share between threads.
#[derive(Debug, Default)]
pub struct AdjacencyCache {
    entries: DashMap<String, Arc<AdjacencyIndex>>,
}

impl AdjacencyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached index for `instance`, building it on first use or
    /// when the instance version moved on.
    pub fn get_or_build(&self, instance: &Instance) -> Arc<AdjacencyIndex> {
        if let Some(hit) = self.entries.get(instance.name()) {
            if hit.source_version() == instance.version() {
                log::debug!("reusing adjacency for instance `{}`", instance.name());
                return Arc::clone(&hit);
            }
        }
        let built = Arc::new(AdjacencyIndex::build(instance));
        self.entries
            .insert(instance.name().to_string(), Arc::clone(&built));
        built
    }

    /// Drops the entry for one instance.
    pub fn invalidate(&self, instance: &str) {
        self.entries.remove(instance);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl InvalidateCache for AdjacencyCache {
    fn invalidate_cache(&mut self) {
        self.entries.clear();
    }
}
