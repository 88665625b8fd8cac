//! Per-page intrinsic size storage

use std::collections::BTreeSet;

use super::types::PageMeta;

/// Intrinsic page sizes for one attached document.
///
/// Pages without real metadata report the placeholder. Entries may arrive in
/// any order.
#[derive(Clone, Debug)]
pub struct PageMetadataStore {
    placeholder: PageMeta,
    pages: Vec<Option<PageMeta>>,
    failed: BTreeSet<usize>,
}

impl PageMetadataStore {
    #[must_use]
    pub fn new(placeholder: PageMeta) -> Self {
        Self {
            placeholder,
            pages: Vec::new(),
            failed: BTreeSet::new(),
        }
    }

    /// Drop all entries and size the store for `count` pages
    pub fn reset(&mut self, count: usize) {
        self.pages.clear();
        self.pages.resize(count, None);
        self.failed.clear();
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn placeholder(&self) -> PageMeta {
        self.placeholder
    }

    /// Size for `index`, or the placeholder when unknown
    #[must_use]
    pub fn get(&self, index: usize) -> PageMeta {
        self.pages
            .get(index)
            .copied()
            .flatten()
            .unwrap_or(self.placeholder)
    }

    /// Replace the entry for `index`. Returns true if the stored size changed.
    pub fn set(&mut self, index: usize, meta: PageMeta) -> bool {
        let Some(slot) = self.pages.get_mut(index) else {
            return false;
        };
        let previous = slot.unwrap_or(self.placeholder);
        *slot = Some(meta);
        self.failed.remove(&index);
        previous != meta
    }

    /// Record that `index` could not be measured; it keeps the placeholder
    pub fn mark_failed(&mut self, index: usize) {
        if index < self.pages.len() {
            self.pages[index] = None;
            self.failed.insert(index);
        }
    }

    #[must_use]
    pub fn is_known(&self, index: usize) -> bool {
        matches!(self.pages.get(index), Some(Some(_)))
    }

    #[must_use]
    pub fn is_failed(&self, index: usize) -> bool {
        self.failed.contains(&index)
    }

    /// Number of pages with real metadata
    #[must_use]
    pub fn known_count(&self) -> usize {
        self.pages.iter().filter(|p| p.is_some()).count()
    }

    #[must_use]
    pub fn failed_pages(&self) -> Vec<usize> {
        self.failed.iter().copied().collect()
    }
}
