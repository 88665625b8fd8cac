//! Virtualized page layout
//!
//! Leaf-first: [`PageMetadataStore`] holds intrinsic sizes, [`SizeEstimator`]
//! turns them into slot heights, [`OffsetIndex`] keeps cumulative offsets and
//! [`Virtualizer`] answers window and navigation queries on top of them.

mod estimate;
mod measure_cache;
mod meta;
mod offsets;
mod types;
mod virtualizer;

pub use estimate::SizeEstimator;
pub use measure_cache::{MeasureKey, MeasurementCache};
pub use meta::PageMetadataStore;
pub use offsets::OffsetIndex;
pub use types::*;
pub use virtualizer::Virtualizer;

/// Default number of extra slots rendered on each side of the viewport
pub const DEFAULT_OVERSCAN: usize = 2;

/// Tunables for the layout engine
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutConfig {
    pub estimator: SizeEstimator,
    pub overscan: usize,
    pub default_zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub measurement_cache_size: usize,
}

impl LayoutConfig {
    /// Clamp a requested zoom into the allowed range, handling NaN/Inf
    #[must_use]
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        if zoom.is_finite() {
            zoom.clamp(self.min_zoom, self.max_zoom)
        } else {
            self.default_zoom
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            estimator: SizeEstimator::default(),
            overscan: DEFAULT_OVERSCAN,
            default_zoom: 1.0,
            min_zoom: 0.6,
            max_zoom: 2.0,
            measurement_cache_size: MeasurementCache::DEFAULT_CAPACITY,
        }
    }
}
