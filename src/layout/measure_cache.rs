//! LRU cache of measured slot sizes

use std::num::NonZeroUsize;

use lru::LruCache;

/// Cache key for a measured slot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeasureKey {
    /// Page index
    pub page: usize,
    /// Target render width (stored as hundredths of a pixel for stable hashing)
    pub width_centi: u64,
}

impl MeasureKey {
    /// Create a key from the width the page was painted at
    #[must_use]
    pub fn new(page: usize, render_width: f64) -> Self {
        Self {
            page,
            width_centi: (render_width.max(0.0) * 100.0).round() as u64,
        }
    }
}

/// Actual rendered heights, keyed by page and render width.
///
/// A measurement only holds for the width it was taken at; keeping older
/// widths around lets a zoom back to a previous level reuse them.
pub struct MeasurementCache {
    cache: LruCache<MeasureKey, f64>,
}

impl MeasurementCache {
    pub const DEFAULT_CAPACITY: usize = 512;

    /// Create a new cache with the given capacity
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
        }
    }

    /// Look up a measurement without promoting it
    #[must_use]
    pub fn peek(&self, key: &MeasureKey) -> Option<f64> {
        self.cache.peek(key).copied()
    }

    pub fn insert(&mut self, key: MeasureKey, size: f64) {
        self.cache.put(key, size);
    }

    /// Clear all measurements
    pub fn invalidate_all(&mut self) {
        self.cache.clear();
    }

    /// Drop every width variant of one page
    pub fn invalidate_page(&mut self, page: usize) {
        let keys_to_remove: Vec<_> = self
            .cache
            .iter()
            .filter(|(k, _)| k.page == page)
            .map(|(k, _)| *k)
            .collect();

        for key in keys_to_remove {
            self.cache.pop(&key);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.cache.cap().get()
    }
}

impl Default for MeasurementCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
