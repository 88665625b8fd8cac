//! Visible window computation and measurement correction

use log::debug;

use super::estimate::SizeEstimator;
use super::measure_cache::{MeasureKey, MeasurementCache};
use super::meta::PageMetadataStore;
use super::offsets::OffsetIndex;
use super::types::{Align, ScrollRequest, SlotExtent, Viewport, VisibleWindow};
use crate::error::NavigationError;

/// Slot layout for one document.
///
/// Slot sizes come from the estimator until the renderer reports a measured
/// height, which then wins until the page's render width changes.
pub struct Virtualizer {
    estimator: SizeEstimator,
    offsets: OffsetIndex,
    /// Width each page is painted at under the current layout
    render_widths: Vec<f64>,
    measured: Vec<Option<f64>>,
    cache: MeasurementCache,
    scale: f64,
    available_width: f64,
}

impl Virtualizer {
    #[must_use]
    pub fn new(estimator: SizeEstimator, cache_capacity: usize) -> Self {
        Self {
            estimator,
            offsets: OffsetIndex::new(),
            render_widths: Vec::new(),
            measured: Vec::new(),
            cache: MeasurementCache::new(cache_capacity),
            scale: 1.0,
            available_width: estimator.available_width(0.0),
        }
    }

    #[must_use]
    pub fn estimator(&self) -> &SizeEstimator {
        &self.estimator
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.offsets.len()
    }

    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    #[must_use]
    pub fn available_width(&self) -> f64 {
        self.available_width
    }

    /// Forget everything learned about the previous document and lay out
    /// `store` from scratch
    pub fn reset(&mut self, store: &PageMetadataStore) {
        self.cache.invalidate_all();
        self.measured.clear();
        self.render_widths.clear();
        self.relayout(store);
    }

    /// Change the zoom factor. Returns false if it is unchanged.
    pub fn set_scale(&mut self, scale: f64, store: &PageMetadataStore) -> bool {
        if self.scale == scale {
            return false;
        }
        self.scale = scale;
        self.relayout(store);
        true
    }

    /// Change the page column width. Returns false if it is unchanged.
    pub fn set_available_width(&mut self, width: f64, store: &PageMetadataStore) -> bool {
        if self.available_width == width {
            return false;
        }
        self.available_width = width;
        self.relayout(store);
        true
    }

    /// Recompute every slot from the store
    pub fn relayout(&mut self, store: &PageMetadataStore) {
        let count = store.count();
        self.render_widths.resize(count, 0.0);
        self.measured.resize(count, None);

        let mut sizes = Vec::with_capacity(count);
        for index in 0..count {
            sizes.push(self.resolve_slot(store, index));
        }
        self.offsets.rebuild(sizes);

        debug!(
            "Relayout: {} slots, scale {:.2}, width {:.1}, {} measured",
            count,
            self.scale,
            self.available_width,
            self.measured.iter().filter(|m| m.is_some()).count()
        );
    }

    /// Recompute one slot after its metadata changed. Returns true if the
    /// slot size moved.
    ///
    /// Measurements of the page are discarded: they were taken against the
    /// old metadata.
    pub fn refresh_page(&mut self, store: &PageMetadataStore, index: usize) -> bool {
        if index >= self.count() {
            return false;
        }
        self.measured[index] = None;
        self.cache.invalidate_page(index);
        let size = self.resolve_slot(store, index);
        self.offsets.set_size(index, size)
    }

    /// Replace the estimate for `index` with its rendered size.
    ///
    /// Returns true if offsets changed. Repeating a correction is a no-op.
    /// Sizes must be positive: an empty slot could never be the first visible.
    pub fn measure_element(&mut self, index: usize, actual_size: f64) -> bool {
        if index >= self.count() || !actual_size.is_finite() || actual_size <= 0.0 {
            debug!("Ignoring measurement {actual_size} for slot {index}");
            return false;
        }
        if self.measured[index] == Some(actual_size) {
            return false;
        }

        self.measured[index] = Some(actual_size);
        self.cache
            .insert(MeasureKey::new(index, self.render_widths[index]), actual_size);
        self.offsets.set_size(index, actual_size)
    }

    #[must_use]
    pub fn is_measured(&self, index: usize) -> bool {
        matches!(self.measured.get(index), Some(Some(_)))
    }

    /// Width the page at `index` should be painted at
    #[must_use]
    pub fn render_width(&self, index: usize) -> Option<f64> {
        self.render_widths.get(index).copied()
    }

    #[must_use]
    pub fn size_of(&self, index: usize) -> Option<f64> {
        self.offsets.size_of(index)
    }

    pub fn offset_of(&mut self, index: usize) -> Option<f64> {
        self.offsets.offset_of(index)
    }

    pub fn total_size(&mut self) -> f64 {
        self.offsets.total_size()
    }

    /// Offsets and total, fully recomputed
    pub fn snapshot(&mut self) -> (Vec<f64>, f64) {
        self.offsets.snapshot()
    }

    /// Slots to render for `viewport`, widened by `overscan` items each side
    pub fn compute_visible_window(
        &mut self,
        viewport: &Viewport,
        overscan: usize,
    ) -> VisibleWindow {
        let count = self.count();
        let Some((first, last)) =
            self.offsets
                .range_for_viewport(viewport.scroll_offset, viewport.height, overscan)
        else {
            return VisibleWindow::default();
        };
        let (first_visible, last_visible) = self
            .offsets
            .range_for_viewport(viewport.scroll_offset, viewport.height, 0)
            .unwrap_or((first, last));

        let first_index = first.saturating_sub(overscan);
        let last_index = last.saturating_add(overscan).min(count - 1);

        let mut items = Vec::with_capacity(last_index - first_index + 1);
        for index in first_index..=last_index {
            let start = self.offsets.offset_of(index).unwrap_or_default();
            let size = self.offsets.size_of(index).unwrap_or_default();
            items.push(SlotExtent { index, start, size });
        }

        VisibleWindow {
            first_index,
            last_index,
            first_visible,
            last_visible,
            items,
            total_size: self.offsets.total_size(),
        }
    }

    /// Scroll position that brings `index` into view with `align`.
    ///
    /// Only computes the target; the caller asks the container to move.
    pub fn scroll_to_index(
        &mut self,
        index: usize,
        align: Align,
        viewport: &Viewport,
    ) -> Result<ScrollRequest, NavigationError> {
        let count = self.count();
        if count == 0 {
            return Err(NavigationError::EmptyDocument);
        }
        let (Some(start), Some(size)) = (self.offsets.offset_of(index), self.offsets.size_of(index))
        else {
            return Err(NavigationError::OutOfRange { index, count });
        };

        let offset = match align {
            Align::Start => start,
            Align::Center => (start - (viewport.height - size) / 2.0).max(0.0),
        };

        Ok(ScrollRequest {
            index,
            offset,
            align,
        })
    }

    fn resolve_slot(&mut self, store: &PageMetadataStore, index: usize) -> f64 {
        let meta = store.get(index);
        let width = self
            .estimator
            .render_width(meta, self.available_width, self.scale);

        let key = MeasureKey::new(index, width);
        let kept = if MeasureKey::new(index, self.render_widths[index]) == key {
            self.measured[index]
        } else {
            None
        };
        self.render_widths[index] = width;
        self.measured[index] = self.cache.peek(&key).or(kept);

        self.measured[index].unwrap_or_else(|| {
            self.estimator
                .estimate(meta, self.available_width, self.scale)
        })
    }
}
