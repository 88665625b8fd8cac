//! Slot size estimation from intrinsic page size, zoom and available width

use super::types::PageMeta;

/// Converts intrinsic page sizes into slot heights.
///
/// Every method is a pure function of its arguments, so re-measurement can
/// call it any number of times without drift.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SizeEstimator {
    /// Fixed height added to every slot (padding + caption)
    pub chrome: f64,
    /// Horizontal space the container reserves around pages
    pub gutter: f64,
    /// Narrowest page column
    pub min_page_width: f64,
    /// Widest page column
    pub max_page_width: f64,
    /// Used in place of unusable metadata
    pub placeholder: PageMeta,
}

impl SizeEstimator {
    pub const DEFAULT_CHROME: f64 = 72.0;
    pub const DEFAULT_GUTTER: f64 = 48.0;
    pub const DEFAULT_MIN_PAGE_WIDTH: f64 = 320.0;
    pub const DEFAULT_MAX_PAGE_WIDTH: f64 = 1024.0;
    pub const DEFAULT_PLACEHOLDER: PageMeta = PageMeta::new(612.0, 792.0);

    /// Page column width for a container of `viewport_width`
    #[must_use]
    pub fn available_width(&self, viewport_width: f64) -> f64 {
        let width = (viewport_width - self.gutter).min(self.max_page_width);
        width.max(self.min_page_width)
    }

    /// Width the page is painted at
    #[must_use]
    pub fn render_width(&self, meta: PageMeta, available_width: f64, scale: f64) -> f64 {
        let meta = self.sanitize(meta);
        available_width.min(meta.width) * scale
    }

    /// Estimated slot height in pixels
    #[must_use]
    pub fn estimate(&self, meta: PageMeta, available_width: f64, scale: f64) -> f64 {
        let meta = self.sanitize(meta);
        let render_width = available_width.min(meta.width) * scale;
        let render_height = meta.height * render_width / meta.width;
        render_height + self.chrome
    }

    fn sanitize(&self, meta: PageMeta) -> PageMeta {
        if meta.is_usable() {
            meta
        } else {
            self.placeholder
        }
    }
}

impl Default for SizeEstimator {
    fn default() -> Self {
        Self {
            chrome: Self::DEFAULT_CHROME,
            gutter: Self::DEFAULT_GUTTER,
            min_page_width: Self::DEFAULT_MIN_PAGE_WIDTH,
            max_page_width: Self::DEFAULT_MAX_PAGE_WIDTH,
            placeholder: Self::DEFAULT_PLACEHOLDER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letter_page_at_natural_width() {
        let est = SizeEstimator::default();
        let size = est.estimate(PageMeta::new(612.0, 792.0), 912.0, 1.0);
        assert_eq!(size, 792.0 + 72.0);
    }

    #[test]
    fn narrow_column_shrinks_page() {
        let est = SizeEstimator::default();
        // 306 / 612 = 0.5
        let size = est.estimate(PageMeta::new(612.0, 792.0), 306.0, 1.0);
        assert_eq!(size, 396.0 + 72.0);
    }

    #[test]
    fn scale_multiplies_render_height_only() {
        let est = SizeEstimator::default();
        let meta = PageMeta::new(612.0, 792.0);
        let base = est.estimate(meta, 912.0, 1.0) - est.chrome;
        let zoomed = est.estimate(meta, 912.0, 1.5) - est.chrome;
        assert_eq!(zoomed, base * 1.5);
    }

    #[test]
    fn estimate_is_repeatable() {
        let est = SizeEstimator::default();
        let meta = PageMeta::new(595.0, 842.0);
        let first = est.estimate(meta, 700.0, 1.3);
        for _ in 0..100 {
            assert_eq!(est.estimate(meta, 700.0, 1.3), first);
        }
    }

    #[test]
    fn unusable_meta_falls_back_to_placeholder() {
        let est = SizeEstimator::default();
        let expected = est.estimate(est.placeholder, 912.0, 1.0);
        assert_eq!(est.estimate(PageMeta::new(0.0, 792.0), 912.0, 1.0), expected);
        assert_eq!(
            est.estimate(PageMeta::new(f64::NAN, 10.0), 912.0, 1.0),
            expected
        );
    }

    #[test]
    fn available_width_is_clamped() {
        let est = SizeEstimator::default();
        assert_eq!(est.available_width(960.0), 912.0);
        assert_eq!(est.available_width(4000.0), 1024.0);
        assert_eq!(est.available_width(200.0), 320.0);
    }

    #[test]
    fn render_width_uses_narrower_of_page_and_column() {
        let est = SizeEstimator::default();
        let meta = PageMeta::new(612.0, 792.0);
        assert_eq!(est.render_width(meta, 912.0, 1.0), 612.0);
        assert_eq!(est.render_width(meta, 500.0, 2.0), 1000.0);
    }
}
