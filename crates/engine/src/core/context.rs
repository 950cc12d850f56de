use crate::core::EngineConfig;
use crate::document::Document;
use crate::properties::{CodepointRecord, PropertyStore};
use lru::LruCache;
use parking_lot::RwLock;
use std::any::Any;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Derived data shared by the detectors of a single analysis.
pub struct DerivedCache {
    entries: LruCache<&'static str, Arc<dyn Any + Send + Sync>>,
}

impl DerivedCache {
    pub fn new(max_size: usize) -> Self {
        let capacity = NonZeroUsize::new(max_size.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
        }
    }

    pub fn get_or_compute<T, F>(&mut self, key: &'static str, compute: F) -> Arc<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        if let Some(entry) = self.entries.get(key) {
            if let Ok(value) = Arc::clone(entry).downcast::<T>() {
                return value;
            }
        }

        let value = Arc::new(compute());
        self.entries
            .put(key, Arc::clone(&value) as Arc<dyn Any + Send + Sync>);
        value
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Everything a detector sees: the document, the property store and the
/// engine configuration, plus a cache for values several detectors derive
/// from the same text (word runs, script profiles).
pub struct DetectionContext<'a> {
    document: &'a Document,
    store: &'a PropertyStore,
    config: &'a EngineConfig,
    cache: RwLock<DerivedCache>,
}

impl<'a> DetectionContext<'a> {
    pub fn new(document: &'a Document, store: &'a PropertyStore, config: &'a EngineConfig) -> Self {
        Self {
            document,
            store,
            config,
            cache: RwLock::new(DerivedCache::new(config.max_cache_size)),
        }
    }

    pub fn document(&self) -> &'a Document {
        self.document
    }

    pub fn text(&self) -> &'a [char] {
        self.document.text()
    }

    pub fn source_id(&self) -> &'a str {
        self.document.source_id()
    }

    pub fn store(&self) -> &'a PropertyStore {
        self.store
    }

    pub fn config(&self) -> &'a EngineConfig {
        self.config
    }

    pub fn record_at(&self, offset: usize) -> CodepointRecord<'a> {
        self.store.lookup_char(self.document.text()[offset])
    }

    pub fn get_or_compute<T, F>(&self, key: &'static str, compute: F) -> Arc<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        self.cache.write().get_or_compute(key, compute)
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.read().len()
    }
}
